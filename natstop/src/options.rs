//! Operator-controlled display state shared by the controller, engine and renderer.

use crate::sort::SortKey;

pub const DEFAULT_LIMIT: usize = 1024;

/// Written only by the controller; the engine takes a copy at the start of
/// each poll, so a change applies from the next request on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    pub sort: SortKey,
    /// How many connections to ask `/connz` for.
    pub limit: usize,
    pub show_subs: bool,
    pub show_rates: bool,
    pub raw_bytes: bool,
    pub lookup_dns: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            sort: SortKey::Cid,
            limit: DEFAULT_LIMIT,
            show_subs: false,
            show_rates: false,
            raw_bytes: false,
            lookup_dns: false,
        }
    }
}
