//! Connection table (fixed-width, for the terminal) and its delimiter-separated
//! export form. Both share one column set so they never drift apart.

use chrono::Local;

use crate::options::DisplayOptions;
use crate::snapshot::ServerSnapshot;
use crate::sort::rank;
use crate::types::ConnInfo;
use crate::ui::util::{format_bytes, format_count, format_rate_bytes, format_rate_count};

struct Column {
    title: &'static str,
    // values wider than this widen the column instead of being cut
    min_width: usize,
}

const fn col(title: &'static str, min_width: usize) -> Column {
    Column { title, min_width }
}

fn columns(s: &ServerSnapshot, opts: &DisplayOptions) -> Vec<Column> {
    let mut cols = vec![col("HOST", 20), col("CID", 6)];
    if show_names(s) {
        cols.push(col("NAME", 10));
    }
    cols.push(col("SUBS", 5));
    cols.push(col("PENDING", 9));
    if opts.show_rates {
        cols.extend([
            col("MSGS_TO/s", 10),
            col("MSGS_FROM/s", 11),
            col("BYTES_TO/s", 10),
            col("BYTES_FROM/s", 12),
        ]);
    } else {
        cols.extend([
            col("MSGS_TO", 10),
            col("MSGS_FROM", 10),
            col("BYTES_TO", 10),
            col("BYTES_FROM", 10),
        ]);
    }
    cols.extend([
        col("LANG", 8),
        col("VERSION", 10),
        col("UPTIME", 10),
        col("LAST_ACTIVITY", 19),
    ]);
    if opts.show_subs {
        cols.push(col("SUBSCRIPTIONS", 0));
    }
    cols
}

// The NAME column only earns its space when someone actually set a name.
fn show_names(s: &ServerSnapshot) -> bool {
    s.connz.connections.iter().any(|c| !c.name.is_empty())
}

fn ranked<'a>(s: &'a ServerSnapshot, opts: &DisplayOptions) -> Vec<&'a ConnInfo> {
    let mut conns: Vec<&ConnInfo> = s.connz.connections.iter().collect();
    rank(&mut conns, opts.sort);
    conns
}

fn host_cell(c: &ConnInfo, s: &ServerSnapshot, opts: &DisplayOptions) -> String {
    match s.hostnames.get(&c.ip) {
        Some(name) if opts.lookup_dns && name != &c.ip => format!("{name}:{}", c.port),
        _ => c.host_port(),
    }
}

fn cells(
    c: &ConnInfo,
    s: &ServerSnapshot,
    opts: &DisplayOptions,
    with_name: bool,
    sub_sep: &str,
) -> Vec<String> {
    let raw = opts.raw_bytes;
    let mut row = vec![host_cell(c, s, opts), c.cid.to_string()];
    if with_name {
        row.push(c.name.clone());
    }
    row.push(c.num_subs.to_string());
    row.push(format_bytes(raw, c.pending_bytes));
    if opts.show_rates {
        let r = s.rates.for_conn(c.cid);
        row.extend([
            format_rate_count(raw, r.out_msgs),
            format_rate_count(raw, r.in_msgs),
            format_rate_bytes(raw, r.out_bytes),
            format_rate_bytes(raw, r.in_bytes),
        ]);
    } else {
        row.extend([
            format_count(raw, c.out_msgs),
            format_count(raw, c.in_msgs),
            format_bytes(raw, c.out_bytes),
            format_bytes(raw, c.in_bytes),
        ]);
    }
    row.push(c.lang.clone());
    row.push(c.version.clone());
    row.push(c.uptime.clone());
    row.push(
        c.last_activity
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
    );
    if opts.show_subs {
        row.push(
            c.subscriptions_list
                .as_deref()
                .unwrap_or_default()
                .join(sub_sep),
        );
    }
    row
}

/// Fixed-width table. Widths are recomputed every frame from the widest
/// value, so nothing is ever truncated.
pub fn render_table(s: &ServerSnapshot, opts: &DisplayOptions) -> String {
    let cols = columns(s, opts);
    let with_name = show_names(s);
    let rows: Vec<Vec<String>> = ranked(s, opts)
        .into_iter()
        .map(|c| cells(c, s, opts, with_name, ", "))
        .collect();

    let widths: Vec<usize> = cols
        .iter()
        .enumerate()
        .map(|(i, col)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain([col.title.len(), col.min_width])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let titles: Vec<String> = cols.iter().map(|c| c.title.to_string()).collect();
    push_padded(&mut out, &titles, &widths);
    for row in &rows {
        push_padded(&mut out, row, &widths);
    }
    out
}

fn push_padded(out: &mut String, cells: &[String], widths: &[usize]) {
    out.push_str("  ");
    let last = cells.len().saturating_sub(1);
    for (i, (cell, &w)) in cells.iter().zip(widths).enumerate() {
        if i == last {
            out.push_str(cell);
        } else {
            out.push_str(&format!("{cell:<w$}  "));
        }
    }
    // no trailing padding
    let trimmed = out.trim_end_matches(' ').len();
    out.truncate(trimmed);
    out.push('\n');
}

/// One header line plus one line per connection, fields joined by `delim`.
/// A value can never contain the delimiter: subscription lists use another
/// inner separator and stray occurrences are replaced.
pub fn render_delimited(s: &ServerSnapshot, opts: &DisplayOptions, delim: &str) -> String {
    let cols = columns(s, opts);
    let with_name = show_names(s);
    let inner = if delim == " " { ";" } else { " " };

    let mut out = String::new();
    let titles: Vec<String> = cols.iter().map(|c| scrub(c.title, delim)).collect();
    out.push_str(&titles.join(delim));
    out.push('\n');
    for c in ranked(s, opts) {
        let row: Vec<String> = cells(c, s, opts, with_name, inner)
            .into_iter()
            .map(|v| scrub(&v, delim))
            .collect();
        out.push_str(&row.join(delim));
        out.push('\n');
    }
    out
}

fn scrub(value: &str, delim: &str) -> String {
    if delim.is_empty() || !value.contains(delim) {
        return value.to_string();
    }
    let replacement = if delim == "_" { "-" } else { "_" };
    value.replace(delim, replacement)
}
