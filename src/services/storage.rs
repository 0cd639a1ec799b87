// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Blob storage for rendered invoice PDFs.

use crate::error::AppError;
use object_store::{memory::InMemory, path::Path as ObjectPath, ObjectStore, PutPayload};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Uploads are abandoned after this long.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(50);

const PDF_PREFIX: &str = "invoices";

/// PDF storage backed by any `object_store` implementation.
#[derive(Clone)]
pub struct PdfStorage {
    store: Arc<dyn ObjectStore>,
}

impl PdfStorage {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Google Cloud Storage bucket using ambient credentials.
    pub fn gcs(bucket: &str) -> Result<Self, AppError> {
        let store = object_store::gcp::GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| AppError::Storage(format!("Failed to open bucket {}: {}", bucket, e)))?;

        tracing::info!(bucket, "Using Cloud Storage for PDFs");
        Ok(Self::new(Arc::new(store)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    /// Upload a local file as `name`.
    pub async fn upload(&self, name: &str, local_path: &Path) -> Result<(), AppError> {
        let bytes = tokio::fs::read(local_path).await.map_err(|e| {
            AppError::Storage(format!("Failed to read {}: {}", local_path.display(), e))
        })?;
        let size = bytes.len();
        let location = object_path(name);

        tokio::time::timeout(
            UPLOAD_TIMEOUT,
            self.store.put(&location, PutPayload::from(bytes)),
        )
        .await
        .map_err(|_| AppError::Storage(format!("Upload of {} timed out", name)))?
        .map_err(|e| AppError::Storage(format!("Upload of {} failed: {}", name, e)))?;

        tracing::info!(object = %location, size, "PDF uploaded");
        Ok(())
    }

    /// Fetch the bytes stored under `name`.
    pub async fn download(&self, name: &str) -> Result<Vec<u8>, AppError> {
        let location = object_path(name);

        let result = match self.store.get(&location).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(AppError::NotFound(format!("pdf {}", name)));
            }
            Err(e) => {
                return Err(AppError::Storage(format!("Download of {} failed: {}", name, e)));
            }
        };

        let bytes = result
            .bytes()
            .await
            .map_err(|e| AppError::Storage(format!("Download of {} failed: {}", name, e)))?;
        Ok(bytes.to_vec())
    }

    /// Remove the object stored under `name`. Already-missing objects are
    /// not an error.
    pub async fn delete(&self, name: &str) -> Result<(), AppError> {
        let location = object_path(name);

        match self.store.delete(&location).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {}
            Err(e) => {
                return Err(AppError::Storage(format!("Delete of {} failed: {}", name, e)));
            }
        }

        tracing::info!(object = %location, "PDF deleted");
        Ok(())
    }
}

/// Object names are `invoices/<name>.pdf`.
fn object_path(name: &str) -> ObjectPath {
    ObjectPath::from(format!("{}/{}.pdf", PDF_PREFIX, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_download() {
        let storage = PdfStorage::in_memory();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.pdf");
        tokio::fs::write(&path, b"%PDF-1.3 test").await.unwrap();

        storage.upload("abc", &path).await.unwrap();
        assert_eq!(storage.download("abc").await.unwrap(), b"%PDF-1.3 test");
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let storage = PdfStorage::in_memory();
        assert!(matches!(
            storage.download("nope").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_object_and_tolerates_missing() {
        let storage = PdfStorage::in_memory();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.pdf");
        tokio::fs::write(&path, b"%PDF-1.3 test").await.unwrap();
        storage.upload("abc", &path).await.unwrap();

        storage.delete("abc").await.unwrap();
        assert!(matches!(
            storage.download("abc").await,
            Err(AppError::NotFound(_))
        ));

        storage.delete("abc").await.unwrap();
    }

    #[tokio::test]
    async fn missing_local_file_is_storage_error() {
        let storage = PdfStorage::in_memory();
        let err = storage
            .upload("abc", Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }

    #[test]
    fn object_names() {
        assert_eq!(object_path("abc").as_ref(), "invoices/abc.pdf");
    }
}
