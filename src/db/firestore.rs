// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides generic document operations (get, add, set, delete, query,
//! batch delete) plus typed helpers for:
//! - Users (keyed by identity provider uid)
//! - Contacts (auto IDs, owned by a user)
//! - Invoices (auto IDs, owned by a user)

use crate::db::{collections, MemoryStore, Record};
use crate::error::AppError;
use crate::ids;
use crate::models::{Contact, Invoice, User, UserSummary};
use std::sync::Arc;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const MAX_BATCH_SIZE: u32 = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
}

fn db_err(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

fn not_found(collection: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{}/{}", collection, id))
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create an in-memory database (tests and offline runs).
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
        }
    }

    // ─── Generic Document Operations ─────────────────────────────

    /// Fetch a document by ID, or `NotFound`.
    pub async fn get<T: Record>(&self, collection: &str, id: &str) -> Result<T, AppError> {
        let found: Option<T> = match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collection)
                .obj()
                .one(id)
                .await
                .map_err(db_err)?,
            Backend::Memory(mem) => mem.get(collection, id)?,
        };

        let mut record = found.ok_or_else(|| not_found(collection, id))?;
        record.set_id(id.to_string());
        Ok(record)
    }

    /// Create a document under a freshly generated ID and return the ID.
    ///
    /// The ID is also stored on `record`.
    pub async fn add<T: Record>(&self, collection: &str, record: &mut T) -> Result<String, AppError> {
        let id = ids::document_id()?;
        record.set_id(id.clone());

        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .insert()
                    .into(collection)
                    .document_id(&id)
                    .object(&*record)
                    .execute()
                    .await
                    .map_err(db_err)?;
            }
            Backend::Memory(mem) => mem.put(collection, &id, &*record, true)?,
        }

        tracing::debug!(collection, id = %id, "Document added");
        Ok(id)
    }

    /// Create or overwrite a document with a caller-chosen ID.
    pub async fn set<T: Record>(&self, collection: &str, id: &str, record: &T) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(id)
                    .object(record)
                    .execute()
                    .await
                    .map_err(db_err)?;
            }
            Backend::Memory(mem) => mem.put(collection, id, record, false)?,
        }
        Ok(())
    }

    /// Delete a document, or `NotFound` if it does not exist.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                // Firestore deletes are idempotent, so check existence first.
                let existing = client
                    .fluent()
                    .select()
                    .by_id_in(collection)
                    .one(id)
                    .await
                    .map_err(db_err)?;
                if existing.is_none() {
                    return Err(not_found(collection, id));
                }

                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(id)
                    .execute()
                    .await
                    .map_err(db_err)?;
            }
            Backend::Memory(mem) => {
                if !mem.remove(collection, id) {
                    return Err(not_found(collection, id));
                }
            }
        }

        tracing::debug!(collection, id, "Document deleted");
        Ok(())
    }

    /// All documents in `collection` whose `field` equals `value`.
    pub async fn query<T: Record>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collection)
                .filter(|q| q.for_all([q.field(field).eq(value)]))
                .obj()
                .query()
                .await
                .map_err(db_err),
            Backend::Memory(mem) => mem.query(collection, field, value),
        }
    }

    /// Delete every document in `collection`, one page at a time, stopping
    /// when a page comes back empty. Returns the number deleted.
    pub async fn batch_delete(&self, collection: &str, page_size: u32) -> Result<usize, AppError> {
        let page_size = page_size.clamp(1, MAX_BATCH_SIZE);
        let mut deleted = 0;

        loop {
            let ids = self.page_ids(collection, page_size).await?;
            if ids.is_empty() {
                break;
            }
            self.delete_ids(collection, &ids).await?;
            deleted += ids.len();
        }

        tracing::info!(collection, deleted, "Collection cleared");
        Ok(deleted)
    }

    async fn page_ids(&self, collection: &str, page_size: u32) -> Result<Vec<String>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let docs = client
                    .fluent()
                    .select()
                    .from(collection)
                    .limit(page_size)
                    .query()
                    .await
                    .map_err(db_err)?;

                Ok(docs
                    .iter()
                    .filter_map(|doc| doc.name.rsplit('/').next().map(str::to_string))
                    .collect())
            }
            Backend::Memory(mem) => Ok(mem.page_ids(collection, page_size as usize)),
        }
    }

    /// Delete a page of documents in a single transaction.
    async fn delete_ids(&self, collection: &str, ids: &[String]) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let mut transaction = client
                    .begin_transaction()
                    .await
                    .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

                for id in ids {
                    client
                        .fluent()
                        .delete()
                        .from(collection)
                        .document_id(id)
                        .add_to_transaction(&mut transaction)
                        .map_err(|e| {
                            AppError::Database(format!(
                                "Failed to add deletion to transaction for {}: {}",
                                collection, e
                            ))
                        })?;
                }

                transaction.commit().await.map_err(|e| {
                    AppError::Database(format!("Failed to commit batch deletion: {}", e))
                })?;
            }
            Backend::Memory(mem) => {
                for id in ids {
                    mem.remove(collection, id);
                }
            }
        }
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, uid: &str) -> Result<User, AppError> {
        self.get(collections::USERS, uid).await
    }

    /// Store a user under its uid.
    pub async fn set_user(&self, user: &User) -> Result<(), AppError> {
        if user.id.is_empty() {
            return Err(AppError::BadRequest("user id must not be empty".to_string()));
        }
        self.set(collections::USERS, &user.id, user).await
    }

    pub async fn delete_user(&self, uid: &str) -> Result<(), AppError> {
        self.delete(collections::USERS, uid).await
    }

    pub async fn delete_all_users(&self, page_size: u32) -> Result<usize, AppError> {
        self.batch_delete(collections::USERS, page_size).await
    }

    // ─── Contact Operations ──────────────────────────────────────

    pub async fn get_contact(&self, id: &str) -> Result<Contact, AppError> {
        self.get(collections::CONTACTS, id).await
    }

    /// Create a contact and return its generated ID.
    pub async fn add_contact(&self, contact: &mut Contact) -> Result<String, AppError> {
        ensure_owner(&contact.user_id)?;
        self.add(collections::CONTACTS, contact).await
    }

    pub async fn delete_contact(&self, id: &str) -> Result<(), AppError> {
        self.delete(collections::CONTACTS, id).await
    }

    pub async fn contacts_for_user(&self, uid: &str) -> Result<Vec<Contact>, AppError> {
        self.query(collections::CONTACTS, "user_id", uid).await
    }

    pub async fn delete_all_contacts(&self, page_size: u32) -> Result<usize, AppError> {
        self.batch_delete(collections::CONTACTS, page_size).await
    }

    // ─── Invoice Operations ──────────────────────────────────────

    pub async fn get_invoice(&self, id: &str) -> Result<Invoice, AppError> {
        self.get(collections::INVOICES, id).await
    }

    /// Create an invoice and return its generated ID.
    pub async fn add_invoice(&self, invoice: &mut Invoice) -> Result<String, AppError> {
        ensure_owner(&invoice.user_id)?;
        self.add(collections::INVOICES, invoice).await
    }

    pub async fn delete_invoice(&self, id: &str) -> Result<(), AppError> {
        self.delete(collections::INVOICES, id).await
    }

    /// All invoices owned by a user, oldest number first.
    pub async fn invoices_for_user(&self, uid: &str) -> Result<Vec<Invoice>, AppError> {
        let mut invoices: Vec<Invoice> = self.query(collections::INVOICES, "user_id", uid).await?;
        invoices.sort_by_key(|inv| inv.number);
        Ok(invoices)
    }

    /// Sum of all invoice totals for a user, and of the paid ones.
    pub async fn invoice_totals_for_user(&self, uid: &str) -> Result<UserSummary, AppError> {
        let invoices = self.invoices_for_user(uid).await?;
        Ok(summarize(&invoices))
    }

    pub async fn delete_all_invoices(&self, page_size: u32) -> Result<usize, AppError> {
        self.batch_delete(collections::INVOICES, page_size).await
    }
}

fn ensure_owner(user_id: &str) -> Result<(), AppError> {
    if user_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "owning user id must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn summarize(invoices: &[Invoice]) -> UserSummary {
    invoices
        .iter()
        .fold(UserSummary::default(), |mut summary, invoice| {
            let total = invoice.total();
            summary.invoice_total += total;
            if invoice.paid {
                summary.invoice_paid += total;
            }
            summary
        })
}
