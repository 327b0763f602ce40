// src/store/mod.rs
// =============================================================================
// The persistence collaborator for discovered emails.
//
// The engine talks to storage through one small trait with existence-check-
// then-insert semantics: the store itself decides whether an address is new,
// and a duplicate insert comes back as Exists, never as an error. That
// matters because concurrent crawls (or repeated runs) may race to insert
// the same address - the store is the sole arbiter of new-vs-duplicate; the
// crawler's in-memory found-set only exists to save round-trips.
//
// MemoryStore is the in-process implementation used by the CLI and tests.
// A remote store (SQL, HTTP API, ...) implements the same trait outside
// this crate.
// =============================================================================

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::extract::EmailFinding;

// What the store did with an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
    /// The address was new and has been inserted
    Inserted,
    /// The address was already present; nothing was written
    Exists,
}

// Result of one store call
#[derive(Debug, Clone, Serialize)]
pub struct StoreOutcome {
    pub status: StoreStatus,
    pub id: u64,
}

/// Deduplicating email persistence.
///
/// Callers normalize the address to lowercase before calling; the store
/// keys its own existence check on that normalized form. Failures are
/// returned as errors and treated as non-fatal by the orchestrator.
#[async_trait]
pub trait EmailStore: Send + Sync {
    async fn store_email(&self, finding: &EmailFinding) -> Result<StoreOutcome>;
}

// In-memory store: a mutex-guarded map from address to id
#[derive(Debug, Default)]
pub struct MemoryStore {
    emails: Mutex<HashMap<String, u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of distinct addresses stored so far
    pub async fn len(&self) -> usize {
        self.emails.lock().await.len()
    }
}

#[async_trait]
impl EmailStore for MemoryStore {
    async fn store_email(&self, finding: &EmailFinding) -> Result<StoreOutcome> {
        let mut emails = self.emails.lock().await;

        // Existence check and insert under one lock, so two tasks storing
        // the same address can't both see "absent"
        if let Some(&id) = emails.get(&finding.address) {
            return Ok(StoreOutcome {
                status: StoreStatus::Exists,
                id,
            });
        }

        let id = emails.len() as u64 + 1;
        emails.insert(finding.address.clone(), id);
        Ok(StoreOutcome {
            status: StoreStatus::Inserted,
            id,
        })
    }
}
