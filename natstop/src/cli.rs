//! Command-line surface of `nats-top`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::Result;
use crate::http::{Target, TlsOptions};
use crate::options::{DisplayOptions, DEFAULT_LIMIT};
use crate::profiles::ProfileEntry;
use crate::sort::SortKey;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_MONITOR_PORT: u16 = 8222;

fn parse_sort(s: &str) -> std::result::Result<SortKey, String> {
    s.parse::<SortKey>().map_err(|_| {
        format!(
            "not a valid option to sort by: {s} (one of {})",
            SortKey::choices()
        )
    })
}

fn parse_limit(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("invalid number of connections: {s}")),
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "nats-top",
    version,
    about = "top-like monitor for a NATS server, driven by its HTTP monitoring port"
)]
pub struct Cli {
    /// Server host to monitor [default: 127.0.0.1]
    #[arg(short = 's', long = "server")]
    pub server: Option<String>,

    /// Monitoring port
    #[arg(short = 'm', long = "port", default_value_t = DEFAULT_MONITOR_PORT)]
    pub port: u16,

    /// HTTPS monitoring port; implies TLS
    #[arg(long = "https-port")]
    pub https_port: Option<u16>,

    /// Number of connections to request
    #[arg(short = 'n', long = "conns", default_value_t = DEFAULT_LIMIT, value_parser = parse_limit)]
    pub conns: usize,

    /// Seconds between polls
    #[arg(short = 'd', long = "delay", default_value_t = 1,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub delay: u64,

    /// Sort key for the connection list
    #[arg(long, default_value = "cid", value_parser = parse_sort)]
    pub sort: SortKey,

    /// Reverse-resolve client addresses
    #[arg(long)]
    pub lookup: bool,

    /// Show raw byte and message counts instead of scaled units
    #[arg(short = 'b', long = "raw-bytes")]
    pub raw_bytes: bool,

    /// Show each connection's subscriptions
    #[arg(long)]
    pub subs: bool,

    /// Show per-connection rates instead of totals
    #[arg(long)]
    pub rates: bool,

    /// Write a single snapshot to FILE and exit ("-" for stdout)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Emit delimiter-separated records instead of the table (one-shot)
    #[arg(short = 'l', long)]
    pub delimiter: Option<String>,

    /// Quit after this many refreshes
    #[arg(short = 'r', long = "max-refresh", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_refresh: Option<u64>,

    /// Client certificate (PEM)
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// Client private key (PEM)
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// CA certificate to verify the server with (PEM)
    #[arg(long)]
    pub cacert: Option<PathBuf>,

    /// Skip server certificate verification
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Named connection profile to load, or to create from -s and TLS flags
    #[arg(long)]
    pub profile: Option<String>,

    /// Overwrite an existing profile that differs from the given flags
    #[arg(long, requires = "profile")]
    pub save: bool,

    /// Append logs here (interactive mode logs nowhere otherwise)
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,
}

impl Cli {
    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            sort: self.sort,
            limit: self.conns,
            show_subs: self.subs,
            show_rates: self.rates,
            raw_bytes: self.raw_bytes,
            lookup_dns: self.lookup,
        }
    }

    /// Either flag selects a single snapshot instead of the live screen.
    pub fn is_one_shot(&self) -> bool {
        self.output.is_some() || self.delimiter.is_some()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.delay)
    }

    fn wants_tls(&self) -> bool {
        self.https_port.is_some()
            || self.cert.is_some()
            || self.key.is_some()
            || self.cacert.is_some()
            || self.insecure
    }

    /// Profile entry described by the flags, used to create a new profile.
    /// `None` without `-s`, since then there is nothing to store.
    pub fn profile_entry(&self) -> Option<ProfileEntry> {
        let lossy = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());
        self.server.as_ref().map(|server| ProfileEntry {
            url: server.clone(),
            tls_cert: lossy(&self.cert),
            tls_key: lossy(&self.key),
            tls_ca: lossy(&self.cacert),
        })
    }

    /// Flags win over the profile, the profile over defaults.
    pub fn target(&self, profile: Option<&ProfileEntry>) -> Result<Target> {
        let host = match (&self.server, profile) {
            (Some(s), _) => crate::profiles::extract_host(s)?,
            (None, Some(p)) => p.monitor_host()?,
            (None, None) => DEFAULT_HOST.to_string(),
        };

        let pick = |flag: &Option<PathBuf>, stored: Option<&String>| {
            flag.clone().or_else(|| stored.map(PathBuf::from))
        };
        let tls = if self.wants_tls() || profile.is_some_and(ProfileEntry::has_tls) {
            Some(TlsOptions {
                ca_cert: pick(&self.cacert, profile.and_then(|p| p.tls_ca.as_ref())),
                cert: pick(&self.cert, profile.and_then(|p| p.tls_cert.as_ref())),
                key: pick(&self.key, profile.and_then(|p| p.tls_key.as_ref())),
                insecure: self.insecure,
            })
        } else {
            None
        };

        let port = match (&tls, self.https_port) {
            (Some(_), Some(p)) => p,
            _ => self.port,
        };
        Ok(Target {
            host,
            port,
            tls,
            timeout: Duration::from_secs(self.timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("nats-top").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]).unwrap();
        let opts = cli.display_options();
        assert_eq!(opts, DisplayOptions::default());
        assert!(!cli.is_one_shot());
        assert_eq!(cli.poll_interval(), Duration::from_secs(1));

        let t = cli.target(None).unwrap();
        assert_eq!(t.host, "127.0.0.1");
        assert_eq!(t.port, 8222);
        assert!(t.tls.is_none());
        assert_eq!(t.timeout, Duration::from_secs(5));
    }

    #[test]
    fn short_flags() {
        let cli = parse(&[
            "-s", "nats.local", "-m", "9222", "-n", "10", "-d", "3", "-b", "-o", "-", "-l", ",",
            "-r", "4",
        ])
        .unwrap();
        assert_eq!(cli.conns, 10);
        assert_eq!(cli.delay, 3);
        assert!(cli.raw_bytes);
        assert_eq!(cli.output, Some(PathBuf::from("-")));
        assert_eq!(cli.delimiter.as_deref(), Some(","));
        assert_eq!(cli.max_refresh, Some(4));
        assert!(cli.is_one_shot());
        let t = cli.target(None).unwrap();
        assert_eq!((t.host.as_str(), t.port), ("nats.local", 9222));
    }

    #[test]
    fn rejects_bad_values() {
        let err = parse(&["--sort", "bogus"]).unwrap_err().to_string();
        assert!(err.contains("not a valid option to sort by: bogus"), "{err}");
        assert!(parse(&["-n", "0"]).is_err());
        assert!(parse(&["-d", "0"]).is_err());
        assert!(parse(&["--save"]).is_err());
    }

    #[test]
    fn sort_and_toggles_flow_into_options() {
        let cli = parse(&["--sort", "bytes_to", "--subs", "--rates", "--lookup"]).unwrap();
        let o = cli.display_options();
        assert_eq!(o.sort, SortKey::BytesTo);
        assert!(o.show_subs && o.show_rates && o.lookup_dns);
        assert!(!o.raw_bytes);
    }

    #[test]
    fn https_port_enables_tls() {
        let cli = parse(&["--https-port", "8443", "-k"]).unwrap();
        let t = cli.target(None).unwrap();
        assert_eq!(t.port, 8443);
        let tls = t.tls.unwrap();
        assert!(tls.insecure);
        assert!(tls.ca_cert.is_none());
    }

    #[test]
    fn profile_fills_in_missing_flags() {
        let profile = ProfileEntry {
            url: "nats://a.example:4222,nats://b.example:4222".into(),
            tls_ca: Some("/ca.pem".into()),
            ..Default::default()
        };
        let cli = parse(&["--profile", "prod"]).unwrap();
        let t = cli.target(Some(&profile)).unwrap();
        assert_eq!(t.host, "a.example");
        assert_eq!(t.port, 8222);
        assert_eq!(t.tls.unwrap().ca_cert, Some(PathBuf::from("/ca.pem")));

        let cli = parse(&["--profile", "prod", "-s", "override", "--cacert", "/mine.pem"]).unwrap();
        let t = cli.target(Some(&profile)).unwrap();
        assert_eq!(t.host, "override");
        assert_eq!(t.tls.unwrap().ca_cert, Some(PathBuf::from("/mine.pem")));
    }

    #[test]
    fn profile_entry_needs_a_server() {
        assert!(parse(&["--profile", "x"]).unwrap().profile_entry().is_none());
        let e = parse(&["--profile", "x", "-s", "h", "--key", "/k.pem"])
            .unwrap()
            .profile_entry()
            .unwrap();
        assert_eq!(e.url, "h");
        assert_eq!(e.tls_key.as_deref(), Some("/k.pem"));
    }
}
