// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store used by tests and offline runs.
//!
//! Documents are kept as JSON values so they go through the same serde
//! round trip as documents written to Firestore.

use crate::error::AppError;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(None);
        };
        docs.get(id).cloned().map(decode).transpose()
    }

    /// Write a document. With `create_only`, an existing document is an error.
    pub fn put<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        record: &T,
        create_only: bool,
    ) -> Result<(), AppError> {
        let value = serde_json::to_value(record)
            .map_err(|e| AppError::Database(format!("Failed to encode document: {}", e)))?;

        let mut docs = self.collections.entry(collection.to_string()).or_default();
        if create_only && docs.contains_key(id) {
            return Err(AppError::Database(format!(
                "Document already exists: {}/{}",
                collection, id
            )));
        }
        docs.insert(id.to_string(), value);
        Ok(())
    }

    /// Remove a document, returning whether it existed.
    pub fn remove(&self, collection: &str, id: &str) -> bool {
        self.collections
            .get_mut(collection)
            .map(|mut docs| docs.remove(id).is_some())
            .unwrap_or(false)
    }

    /// All documents whose string `field` equals `value`.
    pub fn query<T: DeserializeOwned>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        docs.values()
            .filter(|doc| doc.get(field).and_then(Value::as_str) == Some(value))
            .cloned()
            .map(decode)
            .collect()
    }

    /// IDs of up to `limit` documents, in key order.
    pub fn page_ids(&self, collection: &str, limit: usize) -> Vec<String> {
        self.collections
            .get(collection)
            .map(|docs| docs.keys().take(limit).cloned().collect())
            .unwrap_or_default()
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Database(format!("Failed to decode document: {}", e)))
}
