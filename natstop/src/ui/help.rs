//! Help screen text.

use crate::sort::SortKey;

pub fn help_text() -> String {
    format!(
        "\
nats-top monitor help:

  o<option>  Set primary sort key to <option>.
             Option can be one of: {{{}}}
             This can be set in the command line too with --sort.

  n<limit>   Set sample size of connections to request from the server.
             This can be set in the command line as well via -n.
             The server applies the sort before the limit, which allows
             queries like 'connection with largest number of
             subscriptions': -n 1 --sort subs

  s          Toggle displaying connection subscriptions.
  d          Toggle activating DNS address lookup for clients.
  b          Toggle displaying raw bytes.
  r          Toggle showing per-connection rates instead of totals.
  q          Quit nats-top.

Press any key to continue...",
        SortKey::choices()
    )
}
