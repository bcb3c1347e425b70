//! Sort keys for the connection list and the ranking applied before rendering.

use std::borrow::Borrow;
use std::cmp::{Ordering, Reverse};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::types::ConnInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Cid,
    Subs,
    Pending,
    MsgsTo,
    MsgsFrom,
    BytesTo,
    BytesFrom,
    Last,
    Idle,
    Uptime,
}

impl SortKey {
    pub const ALL: [SortKey; 10] = [
        SortKey::Cid,
        SortKey::Subs,
        SortKey::Pending,
        SortKey::MsgsTo,
        SortKey::MsgsFrom,
        SortKey::BytesTo,
        SortKey::BytesFrom,
        SortKey::Last,
        SortKey::Idle,
        SortKey::Uptime,
    ];

    /// Value understood by the server's `sort` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Cid => "cid",
            SortKey::Subs => "subs",
            SortKey::Pending => "pending",
            SortKey::MsgsTo => "msgs_to",
            SortKey::MsgsFrom => "msgs_from",
            SortKey::BytesTo => "bytes_to",
            SortKey::BytesFrom => "bytes_from",
            SortKey::Last => "last",
            SortKey::Idle => "idle",
            SortKey::Uptime => "uptime",
        }
    }

    /// `cid|subs|pending|...` for prompts and help.
    pub fn choices() -> String {
        SortKey::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| Error::invalid_input(format!("invalid order: {s}")))
    }
}

/// Orders connections in place. `Cid` is ascending, every other key puts
/// the largest (busiest, most backlogged, longest idle...) first. Stable.
///
/// Works on owned records or on references into a snapshot.
pub fn rank<C: Borrow<ConnInfo>>(conns: &mut [C], key: SortKey) {
    match key {
        SortKey::Cid => conns.sort_by_key(|c| info(c).cid),
        SortKey::Subs => conns.sort_by_key(|c| Reverse(info(c).num_subs)),
        SortKey::Pending => conns.sort_by_key(|c| Reverse(info(c).pending_bytes)),
        SortKey::MsgsTo => conns.sort_by_key(|c| Reverse(info(c).out_msgs)),
        SortKey::MsgsFrom => conns.sort_by_key(|c| Reverse(info(c).in_msgs)),
        SortKey::BytesTo => conns.sort_by_key(|c| Reverse(info(c).out_bytes)),
        SortKey::BytesFrom => conns.sort_by_key(|c| Reverse(info(c).in_bytes)),
        // most recent activity first
        SortKey::Last => conns.sort_by(|a, b| {
            cmp_time(info(a).last_activity, info(b).last_activity, true)
        }),
        // longest idle = oldest activity first
        SortKey::Idle => conns.sort_by(|a, b| {
            cmp_time(info(a).last_activity, info(b).last_activity, false)
        }),
        // longest-lived = oldest start first
        SortKey::Uptime => conns.sort_by(|a, b| cmp_time(info(a).start, info(b).start, false)),
    }
}

fn info<C: Borrow<ConnInfo>>(c: &C) -> &ConnInfo {
    c.borrow()
}

// Missing timestamps always sink to the bottom, whichever the direction.
fn cmp_time<T: Ord>(a: Option<T>, b: Option<T>, newest_first: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if newest_first => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn conn(cid: u64, pending: i64) -> ConnInfo {
        ConnInfo {
            cid,
            pending_bytes: pending,
            ..Default::default()
        }
    }

    fn cids(conns: &[ConnInfo]) -> Vec<u64> {
        conns.iter().map(|c| c.cid).collect()
    }

    #[test]
    fn parse_known_and_unknown_keys() {
        assert_eq!("msgs_to".parse::<SortKey>().unwrap(), SortKey::MsgsTo);
        assert_eq!(" idle ".parse::<SortKey>().unwrap(), SortKey::Idle);
        let err = "bogus".parse::<SortKey>().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(err.to_string(), "invalid order: bogus");
        for k in SortKey::ALL {
            assert_eq!(k.as_str().parse::<SortKey>().unwrap(), k);
        }
    }

    #[test]
    fn pending_descending() {
        let mut v = vec![conn(1, 10), conn(2, 500), conn(3, 20)];
        rank(&mut v, SortKey::Pending);
        assert_eq!(cids(&v), vec![2, 3, 1]);
    }

    #[test]
    fn cid_ascending() {
        let mut v = vec![conn(9, 0), conn(3, 0), conn(5, 0)];
        rank(&mut v, SortKey::Cid);
        assert_eq!(cids(&v), vec![3, 5, 9]);
    }

    #[test]
    fn equal_keys_keep_response_order() {
        let mut v = vec![conn(4, 7), conn(1, 7), conn(3, 9), conn(2, 7)];
        rank(&mut v, SortKey::Pending);
        assert_eq!(cids(&v), vec![3, 4, 1, 2]);
    }

    #[test]
    fn idle_and_last_are_mirror_images() {
        let at = |s| Some(Utc.timestamp_opt(s, 0).unwrap());
        let mut v = vec![
            ConnInfo { cid: 1, last_activity: at(100), ..Default::default() },
            ConnInfo { cid: 2, last_activity: None, ..Default::default() },
            ConnInfo { cid: 3, last_activity: at(300), ..Default::default() },
        ];
        rank(&mut v, SortKey::Last);
        assert_eq!(cids(&v), vec![3, 1, 2]);
        rank(&mut v, SortKey::Idle);
        assert_eq!(cids(&v), vec![1, 3, 2]);
    }

    #[test]
    fn uptime_puts_oldest_start_first() {
        let at = |s| Some(Utc.timestamp_opt(s, 0).unwrap());
        let mut v = vec![
            ConnInfo { cid: 1, start: at(500), ..Default::default() },
            ConnInfo { cid: 2, start: at(100), ..Default::default() },
        ];
        rank(&mut v, SortKey::Uptime);
        assert_eq!(cids(&v), vec![2, 1]);
    }

    #[test]
    fn ranks_borrowed_records() {
        let owned = vec![conn(2, 1), conn(1, 3)];
        let mut refs: Vec<&ConnInfo> = owned.iter().collect();
        rank(&mut refs, SortKey::Pending);
        assert_eq!(refs[0].cid, 1);
        rank(&mut refs, SortKey::Cid);
        assert_eq!(refs[0].cid, 1);
        assert_eq!(refs[1].cid, 2);
    }
}
