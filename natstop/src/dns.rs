//! Reverse-DNS lookups of client addresses, cached for the life of the process.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

pub trait Resolver: Send + Sync {
    fn reverse(&self, ip: IpAddr) -> Option<String>;
}

/// Uses the system resolver (`getnameinfo`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn reverse(&self, ip: IpAddr) -> Option<String> {
        dns_lookup::lookup_addr(&ip).ok()
    }
}

pub struct DnsCache {
    resolver: Arc<dyn Resolver>,
    // ip -> name; failed lookups map to the ip itself so they are not retried
    names: HashMap<String, String>,
}

impl DnsCache {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            resolver,
            names: HashMap::new(),
        }
    }

    pub fn system() -> Self {
        Self::new(Arc::new(SystemResolver))
    }

    /// Names for `ips`, resolving (off the async runtime) only the ones not
    /// seen before.
    pub async fn resolve_all<'a, I>(&mut self, ips: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let wanted: Vec<&str> = ips.into_iter().collect();
        for ip in &wanted {
            if self.names.contains_key(*ip) {
                continue;
            }
            let name = match ip.parse::<IpAddr>() {
                Ok(addr) => {
                    let resolver = Arc::clone(&self.resolver);
                    tokio::task::spawn_blocking(move || resolver.reverse(addr))
                        .await
                        .ok()
                        .flatten()
                }
                Err(_) => None,
            };
            if name.is_none() {
                tracing::debug!(ip, "reverse lookup failed");
            }
            self.names
                .insert(ip.to_string(), name.unwrap_or_else(|| ip.to_string()));
        }
        wanted
            .into_iter()
            .filter_map(|ip| self.names.get(ip).map(|n| (ip.to_string(), n.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    impl Resolver for Counting {
        fn reverse(&self, ip: IpAddr) -> Option<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            match ip {
                IpAddr::V4(v4) if v4.is_loopback() => Some("localhost".into()),
                _ => None,
            }
        }
    }

    #[tokio::test]
    async fn resolves_once_and_falls_back_to_ip() {
        let resolver = Arc::new(Counting(AtomicUsize::new(0)));
        let mut cache = DnsCache::new(resolver.clone());

        let names = cache.resolve_all(["127.0.0.1", "10.0.0.9", "not-an-ip"]).await;
        assert_eq!(names["127.0.0.1"], "localhost");
        assert_eq!(names["10.0.0.9"], "10.0.0.9");
        assert_eq!(names["not-an-ip"], "not-an-ip");
        assert_eq!(resolver.0.load(Ordering::SeqCst), 2);

        cache.resolve_all(["127.0.0.1", "10.0.0.9"]).await;
        assert_eq!(resolver.0.load(Ordering::SeqCst), 2);
    }
}
