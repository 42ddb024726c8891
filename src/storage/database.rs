// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded document database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `certificates`: certificate_id → serialized Certificate
//! - `payment_sessions`: session_id → serialized PaymentSession
//!
//! Every write is a single-document insert or delete. Values are JSON bytes.

use std::path::Path;

use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use serde::{de::DeserializeOwned, Serialize};

// =============================================================================
// Table Definitions
// =============================================================================

/// Key/value shape shared by every document table.
pub(crate) type DocTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Primary table: certificate_id → serialized Certificate (JSON bytes).
pub(crate) const CERTIFICATES: DocTable = TableDefinition::new("certificates");

/// Pending checkouts: session_id → serialized PaymentSession (JSON bytes).
pub(crate) const PAYMENT_SESSIONS: DocTable = TableDefinition::new("payment_sessions");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Database
// =============================================================================

/// Embedded ACID document store shared by all repositories.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CERTIFICATES)?;
            let _ = write_txn.open_table(PAYMENT_SESSIONS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Verify that a read transaction can be opened against every table.
    pub fn health_check(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(CERTIFICATES)?;
        let _ = read_txn.open_table(PAYMENT_SESSIONS)?;
        Ok(())
    }

    /// Insert a document under `key`, failing if the key is already taken.
    ///
    /// The existence check and the insert share one write transaction, so
    /// concurrent callers racing on the same key see exactly one success.
    pub(crate) fn insert_new<T: Serialize>(
        &self,
        table: DocTable,
        key: &str,
        value: &T,
    ) -> StorageResult<()> {
        let json = serde_json::to_vec(value)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table)?;
            if table.get(key)?.is_some() {
                return Err(StorageError::AlreadyExists(key.to_string()));
            }
            table.insert(key, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a single document by key.
    pub(crate) fn get<T: DeserializeOwned>(
        &self,
        table: DocTable,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Delete every document matching `predicate`. Returns the number removed.
    ///
    /// Documents that no longer deserialize are left in place.
    pub(crate) fn remove_where<T, F>(
        &self,
        table: DocTable,
        predicate: F,
    ) -> StorageResult<usize>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(table)?;

            let mut doomed = Vec::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                match serde_json::from_slice::<T>(value.value()) {
                    Ok(doc) if predicate(&doc) => doomed.push(key.value().to_string()),
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(key = %key.value(), error = %e, "Skipping undecodable document");
                    }
                }
            }

            for key in &doomed {
                table.remove(key.as_str())?;
            }
            doomed.len()
        };
        write_txn.commit()?;
        Ok(removed)
    }
}

// =============================================================================
// Tests
// =============================================================================
