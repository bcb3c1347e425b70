//! Polling engine: fetches `/varz` and `/connz` on a fixed cadence, derives
//! rates against the previous poll and publishes immutable snapshots.

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};

use crate::dns::DnsCache;
use crate::error::Result;
use crate::http::StatusClient;
use crate::options::DisplayOptions;
use crate::snapshot::{RateTracker, ServerSnapshot};
use crate::types::Varz;

pub struct Engine {
    client: StatusClient,
    options: watch::Receiver<DisplayOptions>,
    shutdown: watch::Receiver<bool>,
    tracker: RateTracker,
    dns: DnsCache,
}

impl Engine {
    pub fn new(
        client: StatusClient,
        options: watch::Receiver<DisplayOptions>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            client,
            options,
            shutdown,
            tracker: RateTracker::new(),
            dns: DnsCache::system(),
        }
    }

    pub fn with_dns(mut self, dns: DnsCache) -> Self {
        self.dns = dns;
        self
    }

    /// Smoke test performed once before any UI is set up.
    pub async fn check_connectivity(&self) -> Result<Varz> {
        self.client.fetch_varz().await
    }

    /// One poll. A failure yields an error-only snapshot and drops the rate
    /// baseline, so the next success starts again from zero rates.
    pub async fn build_snapshot(&mut self) -> ServerSnapshot {
        // Options are read once per poll; edits land on the next one.
        let opts = self.options.borrow().clone();

        let fetched = async {
            let varz = self.client.fetch_varz().await?;
            let connz = self.client.fetch_connz(&opts).await?;
            Ok::<_, crate::error::Error>((varz, connz))
        }
        .await;

        let (varz, connz) = match fetched {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(error = %err, "poll failed");
                self.tracker.reset();
                return ServerSnapshot::failed(err);
            }
        };

        let rates = self.tracker.observe(&varz, &connz, Instant::now());

        let hostnames = if opts.lookup_dns {
            self.dns
                .resolve_all(connz.connections.iter().map(|c| c.ip.as_str()))
                .await
        } else {
            Default::default()
        };

        tracing::trace!(
            conns = connz.connections.len(),
            in_msgs_rate = rates.in_msgs,
            out_msgs_rate = rates.out_msgs,
            "snapshot built"
        );

        ServerSnapshot {
            varz,
            connz,
            rates,
            hostnames,
            error: None,
        }
    }

    /// Single snapshot with no baseline (rates are zero), for one-shot output.
    pub async fn fetch_once(&mut self) -> ServerSnapshot {
        self.tracker.reset();
        self.build_snapshot().await
    }

    /// Publishes one snapshot per `period` until shutdown is signalled or the
    /// receiver goes away. The first snapshot is sent right away.
    pub async fn run(mut self, tx: mpsc::Sender<ServerSnapshot>, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = stopped(&mut self.shutdown) => break,
                _ = ticker.tick() => {}
            }

            let snapshot = self.build_snapshot().await;

            tokio::select! {
                biased;
                _ = stopped(&mut self.shutdown) => break,
                sent = tx.send(snapshot) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("engine stopped");
    }
}

// Resolves once the flag is set or every sender is gone.
async fn stopped(rx: &mut watch::Receiver<bool>) {
    // wait_for checks the current value first
    let _ = rx.wait_for(|stop| *stop).await;
}
