use std::sync::{Arc, Mutex, PoisonError};

use docsnip_text::TfIdfIndex;

/// Holds the index of the last manifest seen, keyed by its fingerprint.
///
/// Entries are immutable once stored; a different fingerprint replaces them.
#[derive(Default)]
pub struct IndexCache {
    slot: Mutex<Option<(u64, Arc<TfIdfIndex>)>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fingerprint: u64) -> Option<Arc<TfIdfIndex>> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().filter(|(fp, _)| *fp == fingerprint).map(|(_, index)| Arc::clone(index))
    }

    pub fn put(&self, fingerprint: u64, index: Arc<TfIdfIndex>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some((fingerprint, index));
    }
}
