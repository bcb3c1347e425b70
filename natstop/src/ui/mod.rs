//! Presentation: turns a snapshot plus the active display options into text.

pub mod connections;
pub mod header;
pub mod help;
pub mod theme;
pub mod util;

use crate::options::DisplayOptions;
use crate::snapshot::ServerSnapshot;

/// Full text for one frame. With a delimiter the output is the export
/// record stream (header line + one record per connection); without, the
/// server summary followed by the fixed-width table. Never fails: an empty
/// or failed snapshot renders zeroed fields and the carried error.
pub fn render(s: &ServerSnapshot, opts: &DisplayOptions, delimiter: Option<&str>) -> String {
    match delimiter {
        Some(d) => connections::render_delimited(s, opts, d),
        None => {
            let mut out = header::render_header(s, opts);
            out.push_str(&connections::render_table(s, opts));
            out
        }
    }
}
