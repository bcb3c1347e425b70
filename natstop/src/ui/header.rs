//! Server summary block shown above the connection table.

use std::fmt::Write;

use crate::options::DisplayOptions;
use crate::snapshot::ServerSnapshot;
use crate::ui::util::{format_bytes, format_count, format_rate_bytes, format_rate_count};

pub fn render_header(s: &ServerSnapshot, opts: &DisplayOptions) -> String {
    let raw = opts.raw_bytes;
    let v = &s.varz;
    let r = &s.rates;

    let mut out = String::new();
    let _ = writeln!(out, "NATS server version {} (uptime: {})", v.version, v.uptime);
    if let Some(err) = &s.error {
        let _ = writeln!(out, "Error: {err}");
    }
    let _ = writeln!(out, "Server: {}", v.server_name);
    let _ = writeln!(out, "  ID:   {}", v.server_id);
    let _ = writeln!(
        out,
        "  Load: CPU:  {:.1}%  Memory: {}  Slow Consumers: {}",
        v.cpu,
        format_bytes(raw, v.mem),
        v.slow_consumers
    );
    let _ = writeln!(
        out,
        "  In:   Msgs: {}  Bytes: {}  Msgs/Sec: {}  Bytes/Sec: {}",
        format_count(raw, v.in_msgs),
        format_bytes(raw, v.in_bytes),
        format_rate_count(raw, r.in_msgs),
        format_rate_bytes(raw, r.in_bytes)
    );
    let _ = writeln!(
        out,
        "  Out:  Msgs: {}  Bytes: {}  Msgs/Sec: {}  Bytes/Sec: {}",
        format_count(raw, v.out_msgs),
        format_bytes(raw, v.out_bytes),
        format_rate_count(raw, r.out_msgs),
        format_rate_bytes(raw, r.out_bytes)
    );
    out.push('\n');

    let c = &s.connz;
    if c.total > c.num_connections {
        let _ = writeln!(
            out,
            "Connections Polled: {} (of {})",
            c.num_connections, c.total
        );
    } else {
        let _ = writeln!(out, "Connections Polled: {}", c.num_connections);
    }
    out
}
