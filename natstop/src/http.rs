//! Minimal HTTP client for the server's monitoring endpoints.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Certificate, Client, Identity};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::options::DisplayOptions;
use crate::types::{Connz, Varz};

const DIAG_BODY_LIMIT: usize = 80;

/// TLS material for an `https://` monitoring port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsOptions {
    pub ca_cert: Option<PathBuf>,
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
    pub insecure: bool,
}

/// Where and how to reach the monitoring port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    /// `Some` switches the base URI to `https://`.
    pub tls: Option<TlsOptions>,
    pub timeout: Duration,
}

impl Target {
    pub fn base_uri(&self) -> Result<Url> {
        if self.host.trim().is_empty() {
            return Err(Error::configuration("please specify the monitoring host"));
        }
        let scheme = if self.tls.is_some() { "https" } else { "http" };
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        Url::parse(&format!("{scheme}://{host}:{}", self.port))
            .map_err(|e| Error::configuration(format!("invalid monitoring address: {e}")))
    }
}

#[derive(Debug, Clone)]
pub struct StatusClient {
    http: Client,
    base: Url,
}

impl StatusClient {
    pub fn new(target: &Target) -> Result<Self> {
        let base = target.base_uri()?;
        let mut builder = Client::builder().timeout(target.timeout);
        if let Some(tls) = &target.tls {
            builder = configure_tls(builder, tls)?;
        }
        let http = builder
            .build()
            .map_err(|e| Error::configuration(format!("could not build http client: {e}")))?;
        Ok(Self { http, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub async fn fetch_varz(&self) -> Result<Varz> {
        let url = self.endpoint("/varz")?;
        self.get_json(url).await
    }

    /// `/connz` shaped by the operator's current limit, sort key and
    /// subscription-detail toggle.
    pub async fn fetch_connz(&self, opts: &DisplayOptions) -> Result<Connz> {
        let url = self.connz_url(opts)?;
        self.get_json(url).await
    }

    fn connz_url(&self, opts: &DisplayOptions) -> Result<Url> {
        let mut url = self.endpoint("/connz")?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("limit", &opts.limit.to_string());
            q.append_pair("sort", opts.sort.as_str());
            if opts.show_subs {
                q.append_pair("subs", "1");
            }
        }
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::configuration(format!("invalid path '{path}': {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(%url, "polling");
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(Error::Protocol {
                status: status.as_u16(),
                body: diag_prefix(&body),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

// First line of the body, at most DIAG_BODY_LIMIT bytes.
fn diag_prefix(body: &[u8]) -> String {
    let end = body
        .iter()
        .position(|b| *b == b'\r' || *b == b'\n')
        .unwrap_or(body.len())
        .min(DIAG_BODY_LIMIT);
    String::from_utf8_lossy(&body[..end]).into_owned()
}

fn configure_tls(
    mut builder: reqwest::ClientBuilder,
    tls: &TlsOptions,
) -> Result<reqwest::ClientBuilder> {
    builder = builder.use_rustls_tls();
    if let Some(ca) = &tls.ca_cert {
        let pem = read_pem(ca)?;
        let cert = Certificate::from_pem(&pem)
            .map_err(|e| Error::configuration(format!("invalid CA certificate {}: {e}", ca.display())))?;
        builder = builder.add_root_certificate(cert);
    }
    match (&tls.cert, &tls.key) {
        (Some(cert), Some(key)) => {
            // rustls wants key and chain in one PEM buffer
            let mut pem = read_pem(key)?;
            pem.push(b'\n');
            pem.extend(read_pem(cert)?);
            let id = Identity::from_pem(&pem)
                .map_err(|e| Error::configuration(format!("invalid client certificate: {e}")))?;
            builder = builder.identity(id);
        }
        (None, None) => {}
        _ => {
            return Err(Error::configuration(
                "client certificate and key must be given together",
            ))
        }
    }
    if tls.insecure {
        builder = builder.danger_accept_invalid_certs(true);
    }
    Ok(builder)
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::configuration(format!("could not read {}: {e}", path.display())))
}
