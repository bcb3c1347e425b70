//! Connection profiles: named server URL + TLS material, kept as JSON under
//! $XDG_CONFIG_HOME/natstop/profiles.json (fallback ~/.config/natstop/profiles.json).

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProfileEntry {
    /// Server URL, or a comma separated list of them as clients use; the
    /// first host is the one monitored.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca: Option<String>,
}

impl ProfileEntry {
    pub fn monitor_host(&self) -> Result<String> {
        extract_host(&self.url)
    }

    pub fn has_tls(&self) -> bool {
        self.tls_cert.is_some() || self.tls_key.is_some() || self.tls_ca.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfilesFile {
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileEntry>,
    #[serde(default)]
    pub version: u32,
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("natstop")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("natstop")
    }
}

pub fn profiles_path() -> PathBuf {
    config_dir().join("profiles.json")
}

/// A missing file is an empty set of profiles; a corrupt one is an error
/// rather than something we would silently overwrite later.
pub fn load_from(path: &Path) -> Result<ProfilesFile> {
    match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).map_err(|e| {
            Error::configuration(format!("malformed profiles file {}: {e}", path.display()))
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(ProfilesFile::default()),
        Err(e) => Err(e.into()),
    }
}

pub fn save_to(path: &Path, p: &ProfilesFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(p)?;
    fs::write(path, data)?;
    Ok(())
}

/// Host part of the first URL in a (possibly comma separated) server list.
/// `nats://a:4222,nats://b:4222` -> `a`. A bare `host[:port]` is accepted.
pub fn extract_host(url: &str) -> Result<String> {
    let first = url
        .split(',')
        .map(str::trim)
        .find(|s| !s.is_empty())
        .ok_or_else(|| Error::configuration("profile url is empty"))?;
    if first.parse::<IpAddr>().is_ok() {
        return Ok(first.to_string());
    }
    let full = if first.contains("://") {
        first.to_string()
    } else {
        format!("nats://{first}")
    };
    let parsed = Url::parse(&full)
        .map_err(|e| Error::configuration(format!("invalid server url {first:?}: {e}")))?;
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::configuration(format!("no host in server url {first:?}")))?;
    Ok(host.trim_start_matches('[').trim_end_matches(']').to_string())
}

#[derive(Debug, PartialEq, Eq)]
pub enum ResolveProfile {
    /// Use the entry built from command-line inputs (caller may persist it).
    Direct(ProfileEntry),
    /// Loaded from an existing profile entry.
    Loaded(ProfileEntry),
    /// A profile name with nothing to load and nothing to create it from.
    Unknown(String),
    /// No profile involved.
    None,
}

pub struct ProfileRequest {
    pub profile_name: Option<String>,
    pub entry: Option<ProfileEntry>,
}

impl ProfileRequest {
    pub fn resolve(self, pf: &ProfilesFile) -> ResolveProfile {
        match (self.profile_name, self.entry) {
            (_, Some(entry)) => ResolveProfile::Direct(entry),
            (Some(name), None) => match pf.profiles.get(&name) {
                Some(entry) => ResolveProfile::Loaded(entry.clone()),
                None => ResolveProfile::Unknown(name),
            },
            (None, None) => ResolveProfile::None,
        }
    }
}

/// Stores `entry` under `name` when it is new, or when it differs and
/// `overwrite` is set. Returns whether the file was written.
pub fn remember(
    path: &Path,
    pf: &mut ProfilesFile,
    name: &str,
    entry: &ProfileEntry,
    overwrite: bool,
) -> Result<bool> {
    let write = match pf.profiles.get(name) {
        None => true,
        Some(existing) => existing != entry && overwrite,
    };
    if write {
        pf.profiles.insert(name.to_string(), entry.clone());
        save_to(path, pf)?;
    }
    Ok(write)
}
