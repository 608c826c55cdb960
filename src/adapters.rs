use std::{collections::HashMap, path::Path};

use crate::model::{self, config::ObjectStoreConfig, fs::AccessLevel};

#[cfg(test)]
pub mod mock;
pub mod s3;

/// Minimal object store surface the filesystem adapter is written against.
///
/// Missing objects are `Ok(None)` / `Ok(false)`; `Err` is reserved for transport
/// and service failures.
pub trait ObjectStore {
    fn fs_get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<Vec<u8>>, model::fs::FSError>;

    /// Streams the object into `local_path`, creating or truncating it.
    fn fs_download_object(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> Result<bool, model::fs::FSError>;

    fn fs_put_object(
        &self,
        body: Vec<u8>,
        bucket: &str,
        key: &str,
        acl: AccessLevel,
        metadata: &HashMap<String, String>,
        content_type: Option<&str>,
    ) -> Result<(), model::fs::FSError>;

    /// Server-side copy. The destination always takes `acl` and `content_type`.
    #[allow(clippy::too_many_arguments)]
    fn fs_copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dest_bucket: &str,
        dest_key: &str,
        acl: AccessLevel,
        metadata: &HashMap<String, String>,
        content_type: Option<&str>,
    ) -> Result<(), model::fs::FSError>;

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError>;

    fn fs_head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<model::fs::FSObject>, model::fs::FSError>;
}

/// Creates the long-lived store handle once a usable configuration is known.
pub trait Connector {
    fn connect(
        &self,
        config: &ObjectStoreConfig,
    ) -> Result<Box<dyn ObjectStore>, model::fs::FSError>;
}
