//! The in-memory authoritative table, §4.6.
//!
//! §9 REDESIGN FLAGS calls out "pointer-rich shared mutable maps" as
//! needing re-expression: here that's an owned table of per-row locks,
//! with snapshots (plain `Host` clones) handed across component
//! boundaries rather than raw references into the table.

use hsd_core::{Host, Network, PublicKey};
use parking_lot::RwLock as SyncRwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock as AsyncRwLock;

pub type RowHandle = Arc<AsyncRwLock<Host>>;

#[derive(Default)]
pub struct Table {
    rows: SyncRwLock<HashMap<(Network, PublicKey), RowHandle>>,
}

impl Table {
    pub fn get_handle(&self, network: Network, pk: PublicKey) -> Option<RowHandle> {
        self.rows.read().get(&(network, pk)).cloned()
    }

    /// Inserts a brand-new row if absent, otherwise returns the existing
    /// handle. I1: the map itself is the uniqueness authority.
    pub fn get_or_insert_with(
        &self,
        network: Network,
        pk: PublicKey,
        make: impl FnOnce() -> Host,
    ) -> (RowHandle, bool) {
        if let Some(handle) = self.get_handle(network, pk) {
            return (handle, false);
        }
        let mut rows = self.rows.write();
        if let Some(handle) = rows.get(&(network, pk)) {
            return (handle.clone(), false);
        }
        let handle = Arc::new(AsyncRwLock::new(make()));
        rows.insert((network, pk), handle.clone());
        (handle, true)
    }

    pub async fn snapshot(&self, network: Network, pk: PublicKey) -> Option<Host> {
        let handle = self.get_handle(network, pk)?;
        Some(handle.read().await.clone())
    }

    pub async fn all_snapshots(&self) -> Vec<Host> {
        let handles: Vec<RowHandle> = self.rows.read().values().cloned().collect();
        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            out.push(handle.read().await.clone());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
