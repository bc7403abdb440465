use hsd_journal::Journal;
use hsd_store::HostStore;
use std::sync::Arc;

/// Shared state handed to every handler. The API never mutates the
/// store or journal directly — it only reads `list`/`get`/`take` and
/// forwards `confirm`, matching §4.6/§4.9's "only the store/journal may
/// mutate state" split.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<HostStore>,
    pub journal: Arc<Journal>,
    /// Compared against the password half of the HTTP basic-auth header;
    /// the username is accepted as-is (§6 specifies a single shared
    /// secret, `HSD_API_PASSWORD`, not per-user credentials).
    pub api_password: Arc<str>,
}
