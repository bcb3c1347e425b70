//! Types that mirror the server's monitoring JSON (`/varz`, `/connz`).
//!
//! Only the fields the monitor displays or ranks by are modeled; anything
//! else the server sends is ignored, and anything missing falls back to its
//! default so older servers still decode.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Aggregate server status from `/varz`.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Varz {
    pub server_id: String,
    pub server_name: String,
    pub version: String,
    pub host: String,
    pub port: u16,
    pub uptime: String,
    pub mem: i64,
    pub cores: u32,
    pub cpu: f64,
    pub connections: u64,
    pub slow_consumers: i64,
    // cumulative totals; the engine diffs them to compute rates
    pub in_msgs: i64,
    pub out_msgs: i64,
    pub in_bytes: i64,
    pub out_bytes: i64,
}

/// One page of the connection list from `/connz`.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Connz {
    pub server_id: String,
    pub num_connections: usize,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub connections: Vec<ConnInfo>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ConnInfo {
    pub cid: u64,
    pub name: String,
    pub ip: String,
    pub port: u16,
    pub start: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub uptime: String,
    pub idle: String,
    pub pending_bytes: i64,
    pub in_msgs: i64,
    pub out_msgs: i64,
    pub in_bytes: i64,
    pub out_bytes: i64,
    #[serde(rename = "subscriptions")]
    pub num_subs: u32,
    pub lang: String,
    pub version: String,
    pub subscriptions_list: Option<Vec<String>>,
}

impl ConnInfo {
    pub fn host_port(&self) -> String {
        if self.ip.contains(':') {
            format!("[{}]:{}", self.ip, self.port)
        } else {
            format!("{}:{}", self.ip, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varz_ignores_unknown_fields() {
        let json = r#"{
            "server_id": "NDJWE4SOUJOJT2TY5Y2YQEOAHGAK5VIGXTGKWJSFHVCII4ITI3LBHSPV",
            "version": "2.10.7",
            "go": "go1.21.5",
            "cpu": 2.5,
            "mem": 14237696,
            "in_msgs": 10, "out_msgs": 20, "in_bytes": 300, "out_bytes": 400,
            "slow_consumers": 1,
            "cluster": {"name": "c1"}
        }"#;
        let v: Varz = serde_json::from_str(json).unwrap();
        assert_eq!(v.version, "2.10.7");
        assert_eq!(v.mem, 14237696);
        assert_eq!(v.out_bytes, 400);
        assert_eq!(v.slow_consumers, 1);
        assert_eq!(v.server_name, "");
    }

    #[test]
    fn connz_decodes_connections() {
        let json = r#"{
            "num_connections": 1, "total": 1, "offset": 0, "limit": 1024,
            "connections": [{
                "cid": 7, "kind": "Client", "ip": "127.0.0.1", "port": 52110,
                "start": "2024-03-01T10:00:00.123456789Z",
                "last_activity": "2024-03-01T10:05:00Z",
                "rtt": "120µs", "uptime": "5m0s", "idle": "0s",
                "pending_bytes": 0, "in_msgs": 5, "out_msgs": 6,
                "in_bytes": 50, "out_bytes": 60, "subscriptions": 2,
                "lang": "go", "version": "1.31.0",
                "subscriptions_list": ["foo", "bar.>"]
            }]
        }"#;
        let c: Connz = serde_json::from_str(json).unwrap();
        assert_eq!(c.connections.len(), 1);
        let conn = &c.connections[0];
        assert_eq!(conn.cid, 7);
        assert_eq!(conn.num_subs, 2);
        assert_eq!(conn.host_port(), "127.0.0.1:52110");
        assert!(conn.start.is_some());
        assert_eq!(
            conn.subscriptions_list.as_deref(),
            Some(&["foo".to_string(), "bar.>".to_string()][..])
        );
    }

    #[test]
    fn ipv6_host_is_bracketed() {
        let c = ConnInfo {
            ip: "::1".into(),
            port: 4222,
            ..Default::default()
        };
        assert_eq!(c.host_port(), "[::1]:4222");
    }
}
