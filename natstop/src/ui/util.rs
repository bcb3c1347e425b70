//! Small UI helpers: human-readable byte sizes and message counts.

const KIBIBYTE: f64 = 1024.0;
const BYTE_SUFFIXES: [&str; 3] = ["K", "M", "G"];

const THOUSAND: f64 = 1000.0;
const COUNT_SUFFIXES: [&str; 4] = ["K", "M", "B", "T"];

/// Binary-prefixed size (`1.0K`, `3.5M`, ...). `raw` prints the exact value.
pub fn format_bytes(raw: bool, value: i64) -> String {
    scaled(raw, value, KIBIBYTE, &BYTE_SUFFIXES)
}

/// Decimal-prefixed count (`1.0K`, `2.3B`, ...). `raw` prints the exact value.
pub fn format_count(raw: bool, value: i64) -> String {
    scaled(raw, value, THOUSAND, &COUNT_SUFFIXES)
}

pub fn format_rate_bytes(raw: bool, rate: f64) -> String {
    format_bytes(raw, rate.round() as i64)
}

pub fn format_rate_count(raw: bool, rate: f64) -> String {
    format_count(raw, rate.round() as i64)
}

fn scaled(raw: bool, value: i64, base: f64, suffixes: &[&str]) -> String {
    let v = value as f64;
    if raw || v.abs() < base {
        return value.to_string();
    }
    let mut scaled = v / base;
    let mut idx = 0;
    while scaled.abs() >= base && idx + 1 < suffixes.len() {
        scaled /= base;
        idx += 1;
    }
    format!("{scaled:.1}{}", suffixes[idx])
}
