//! Per-poll snapshots and the rate tracking that turns cumulative counters
//! into per-second rates.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::types::{Connz, Varz};

/// In/out messages and bytes per second.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConnRates {
    pub in_msgs: f64,
    pub out_msgs: f64,
    pub in_bytes: f64,
    pub out_bytes: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateSet {
    pub in_msgs: f64,
    pub out_msgs: f64,
    pub in_bytes: f64,
    pub out_bytes: f64,
    /// cid -> rates; a cid missing here renders as zero.
    pub connections: HashMap<u64, ConnRates>,
}

impl RateSet {
    pub fn for_conn(&self, cid: u64) -> ConnRates {
        self.connections.get(&cid).copied().unwrap_or_default()
    }
}

/// One complete poll. Never mutated after the engine publishes it.
#[derive(Debug, Default)]
pub struct ServerSnapshot {
    pub varz: Varz,
    pub connz: Connz,
    pub rates: RateSet,
    /// ip -> reverse-DNS name, only populated while lookups are enabled.
    pub hostnames: HashMap<String, String>,
    pub error: Option<Error>,
}

impl ServerSnapshot {
    /// A poll that failed: no data at all, not the previous poll's data.
    pub fn failed(err: Error) -> Self {
        Self {
            error: Some(err),
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    in_msgs: i64,
    out_msgs: i64,
    in_bytes: i64,
    out_bytes: i64,
}

impl Counters {
    fn rates_since(&self, prev: &Counters, secs: f64) -> ConnRates {
        let per_sec = |cur: i64, prev: i64| cur.saturating_sub(prev).max(0) as f64 / secs;
        ConnRates {
            in_msgs: per_sec(self.in_msgs, prev.in_msgs),
            out_msgs: per_sec(self.out_msgs, prev.out_msgs),
            in_bytes: per_sec(self.in_bytes, prev.in_bytes),
            out_bytes: per_sec(self.out_bytes, prev.out_bytes),
        }
    }
}

#[derive(Debug)]
struct Baseline {
    at: Instant,
    totals: Counters,
    conns: HashMap<u64, (Option<DateTime<Utc>>, Counters)>,
}

/// Remembers the previous successful poll so the next one can be diffed.
#[derive(Debug, Default)]
pub struct RateTracker {
    prev: Option<Baseline>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_baseline(&self) -> bool {
        self.prev.is_some()
    }

    /// Forget the previous poll; the next `observe` reports zero rates.
    pub fn reset(&mut self) {
        self.prev = None;
    }

    /// Rates of `varz`/`connz` relative to the previous call, then makes this
    /// poll the new baseline.
    pub fn observe(&mut self, varz: &Varz, connz: &Connz, now: Instant) -> RateSet {
        let totals = Counters {
            in_msgs: varz.in_msgs,
            out_msgs: varz.out_msgs,
            in_bytes: varz.in_bytes,
            out_bytes: varz.out_bytes,
        };
        let conns: HashMap<u64, (Option<DateTime<Utc>>, Counters)> = connz
            .connections
            .iter()
            .map(|c| {
                let counters = Counters {
                    in_msgs: c.in_msgs,
                    out_msgs: c.out_msgs,
                    in_bytes: c.in_bytes,
                    out_bytes: c.out_bytes,
                };
                (c.cid, (c.start, counters))
            })
            .collect();

        let mut rates = RateSet::default();
        if let Some(prev) = &self.prev {
            let secs = now.saturating_duration_since(prev.at).as_secs_f64();
            if secs > 0.0 {
                let agg = totals.rates_since(&prev.totals, secs);
                rates.in_msgs = agg.in_msgs;
                rates.out_msgs = agg.out_msgs;
                rates.in_bytes = agg.in_bytes;
                rates.out_bytes = agg.out_bytes;

                for (cid, (start, cur)) in &conns {
                    // A reused cid with a different start time is a new connection.
                    if let Some((prev_start, prev_counters)) = prev.conns.get(cid) {
                        if prev_start == start {
                            rates
                                .connections
                                .insert(*cid, cur.rates_since(prev_counters, secs));
                        }
                    }
                }
            }
        }

        self.prev = Some(Baseline {
            at: now,
            totals,
            conns,
        });
        rates
    }
}
