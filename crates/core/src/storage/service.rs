//! Presigned-upload service over Apache OpenDAL operators.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use opendal::{Operator, services};
use uuid::Uuid;

use notara_shared::types::{EnterpriseId, ReleaseId};

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Presigned URL handed to the client for a direct upload.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method the client must use, PUT for uploads.
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
    /// Required headers for the request.
    pub headers: HashMap<String, String>,
}

/// Request to generate an upload URL for a release image.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Enterprise the image belongs to.
    pub enterprise_id: EnterpriseId,
    /// Release the image documents. `None` while the release is still a
    /// draft on the client; the key uses a `pending` segment until then.
    pub release_id: Option<ReleaseId>,
    /// Server-generated id for this upload, keys stay unique even when the
    /// same filename is sent twice.
    pub upload_id: Uuid,
    /// Original filename.
    pub filename: String,
    /// Content type (MIME type).
    pub content_type: String,
    /// File size in bytes.
    pub file_size: u64,
}

/// Storage service for release images.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Builds the service, instantiating the backing operator.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider settings are rejected.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Maps the provider onto an OpenDAL operator.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => finish_operator(
                services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region),
            ),
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => finish_operator(
                services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container),
            ),
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?;
                finish_operator(services::Fs::default().root(root))
            }
        }
    }

    /// Checks an upload's declared MIME type and size against the limits.
    ///
    /// # Errors
    ///
    /// Returns an error if either check fails.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }

        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }

        Ok(())
    }

    /// Generate the storage key for a release image.
    ///
    /// Format: `{enterprise_id}/{release_id}/{upload_id}/{sanitized_filename}`,
    /// with `pending` in place of the release id while the release does not
    /// exist yet. Tenancy is visible in the key itself.
    #[must_use]
    pub fn generate_storage_key(req: &UploadRequest) -> String {
        let sanitized_filename = sanitize_filename(&req.filename);
        let release_part = req
            .release_id
            .map_or_else(|| "pending".to_string(), |id| id.to_string());

        format!(
            "{}/{}/{}/{}",
            req.enterprise_id, release_part, req.upload_id, sanitized_filename
        )
    }

    /// Validates the request, then presigns a PUT for the derived key.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or presigning is not supported.
    pub async fn presign_upload(&self, req: &UploadRequest) -> Result<PresignedUrl, StorageError> {
        self.validate_upload(&req.content_type, req.file_size)?;

        let key = Self::generate_storage_key(req);
        let ttl = Duration::from_secs(self.config.presign_upload_ttl_secs);

        let signed = self
            .operator
            .presign_write(&key, ttl)
            .await
            .map_err(StorageError::from)?;

        let ttl_secs = i64::try_from(self.config.presign_upload_ttl_secs).unwrap_or(i64::MAX);

        Ok(PresignedUrl {
            url: signed.uri().to_string(),
            method: signed.method().to_string(),
            expires_at: Utc::now() + chrono::Duration::seconds(ttl_secs),
            headers: HashMap::from([("Content-Type".to_string(), req.content_type.clone())]),
        })
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }
}

/// Finalizes an OpenDAL builder into an operator.
fn finish_operator(builder: impl opendal::Builder) -> Result<Operator, StorageError> {
    Ok(Operator::new(builder)
        .map_err(|e| StorageError::configuration(e.to_string()))?
        .finish())
}

/// Sanitize filename for storage key.
///
/// Only ASCII alphanumerics, dots, hyphens, and underscores survive;
/// everything else becomes an underscore.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload_request(release_id: Option<ReleaseId>) -> UploadRequest {
        UploadRequest {
            enterprise_id: EnterpriseId::from_i32(42),
            release_id,
            upload_id: Uuid::parse_str("6ba7b811-9dad-11d1-80b4-00c04fd430c8").unwrap(),
            filename: "nota-fiscal.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            file_size: 1024,
        }
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("nota-fiscal.jpg"), "nota-fiscal.jpg");
        assert_eq!(sanitize_filename("nota fiscal (2).jpg"), "nota_fiscal__2_.jpg");
        assert_eq!(sanitize_filename("comprovação.pdf"), "comprova____o.pdf");
    }

    #[test]
    fn test_storage_key_embeds_tenancy() {
        let req = upload_request(Some(ReleaseId::from_i32(7)));
        let key = StorageService::generate_storage_key(&req);
        assert_eq!(
            key,
            "42/7/6ba7b811-9dad-11d1-80b4-00c04fd430c8/nota-fiscal.jpg"
        );
    }

    #[test]
    fn test_storage_key_for_draft_release() {
        let req = upload_request(None);
        let key = StorageService::generate_storage_key(&req);
        assert_eq!(
            key,
            "42/pending/6ba7b811-9dad-11d1-80b4-00c04fd430c8/nota-fiscal.jpg"
        );
    }

    #[test]
    fn test_validate_upload_size() {
        let config =
            StorageConfig::new(StorageProvider::local_fs("./test")).with_max_file_size(1024);
        let service = StorageService::from_config(config).expect("should create service");

        assert!(service.validate_upload("image/jpeg", 512).is_ok());

        let err = service.validate_upload("image/jpeg", 2048).unwrap_err();
        assert!(matches!(err, StorageError::FileTooLarge { .. }));
    }

    #[test]
    fn test_validate_upload_mime_type() {
        let config = StorageConfig::new(StorageProvider::local_fs("./test"));
        let service = StorageService::from_config(config).expect("should create service");

        assert!(service.validate_upload("image/png", 1024).is_ok());
        assert!(service.validate_upload("application/pdf", 1024).is_ok());

        let err = service
            .validate_upload("application/x-executable", 1024)
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidMimeType { .. }));
    }
}

#[cfg(test)]
mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Sanitized filenames never contain characters a storage path
        /// could choke on.
        #[test]
        fn prop_sanitized_filename_safe_chars(filename in ".*") {
            let sanitized = sanitize_filename(&filename);
            for c in sanitized.chars() {
                prop_assert!(
                    c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_',
                    "unexpected character {c:?}"
                );
            }
        }

        /// Keys always have four segments with tenancy up front.
        #[test]
        fn prop_storage_key_shape(
            enterprise in 1i32..10_000,
            release in proptest::option::of(1i32..10_000),
            filename in "[a-zA-Z0-9_-]{1,40}\\.[a-z]{2,4}",
        ) {
            let req = UploadRequest {
                enterprise_id: EnterpriseId::from_i32(enterprise),
                release_id: release.map(ReleaseId::from_i32),
                upload_id: Uuid::new_v4(),
                filename,
                content_type: "image/jpeg".to_string(),
                file_size: 1024,
            };

            let key = StorageService::generate_storage_key(&req);
            let parts: Vec<&str> = key.split('/').collect();

            prop_assert_eq!(parts.len(), 4);
            prop_assert_eq!(parts[0], enterprise.to_string());
            match release {
                Some(id) => prop_assert_eq!(parts[1], id.to_string()),
                None => prop_assert_eq!(parts[1], "pending"),
            }
        }

        /// Size validation accepts exactly the sizes within the limit.
        #[test]
        fn prop_file_size_validation(
            max_size in 1024u64..10_000_000,
            file_size in 0u64..20_000_000,
        ) {
            let config = StorageConfig::new(StorageProvider::local_fs("./test"))
                .with_max_file_size(max_size);
            let service = StorageService::from_config(config).expect("should create service");

            let result = service.validate_upload("image/png", file_size);
            if file_size <= max_size {
                prop_assert!(result.is_ok());
            } else {
                prop_assert!(matches!(result, Err(StorageError::FileTooLarge { .. })));
            }
        }
    }
}
