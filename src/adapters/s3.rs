use std::{
    collections::HashMap,
    fs::File,
    io::Write,
    path::Path,
    time::{Duration, SystemTime},
};

use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::{ByteStream, DateTime},
    types::{Grant, MetadataDirective, ObjectCannedAcl, Permission},
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::warn;

use crate::{
    adapters,
    model::{self, config::ObjectStoreConfig, fs::AccessLevel},
    util,
};

const DEFAULT_REGION: &str = "us-east-1";
const ALL_USERS_GROUP: &str = "http://acs.amazonaws.com/groups/global/AllUsers";
const CREDENTIALS_PROVIDER_NAME: &str = "cdnfs";

/// Unreserved characters and `/` stay literal in the copy source key.
const COPY_SOURCE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

impl adapters::ObjectStore for aws_sdk_s3::Client {
    fn fs_get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<Vec<u8>>, model::fs::FSError> {
        let req = self.get_object().bucket(bucket).key(key);

        let o = match util::poll::poll_until_ready(req.send()) {
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_no_such_key() {
                        return Ok(None);
                    }
                }

                return Err(model::fs::FSError::backend(
                    key,
                    format!("failed to get_object: {}", err),
                ));
            }
            Ok(o) => o,
        };

        let bytes = util::poll::poll_until_ready(o.body.collect()).map_err(|err| {
            model::fs::FSError::backend(key, format!("failed to collect body: {}", err))
        })?;

        Ok(Some(bytes.into_bytes().to_vec()))
    }

    fn fs_download_object(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> Result<bool, model::fs::FSError> {
        let req = self.get_object().bucket(bucket).key(key);

        let mut o = match util::poll::poll_until_ready(req.send()) {
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_no_such_key() {
                        return Ok(false);
                    }
                }

                return Err(model::fs::FSError::backend(
                    key,
                    format!("failed to get_object: {}", err),
                ));
            }
            Ok(o) => o,
        };

        let mut file = File::create(local_path)?;
        while let Some(chunk) = util::poll::poll_until_ready(o.body.try_next()).map_err(|err| {
            model::fs::FSError::backend(key, format!("failed to stream body: {}", err))
        })? {
            file.write_all(&chunk)?;
        }
        file.flush()?;

        Ok(true)
    }

    fn fs_put_object(
        &self,
        body: Vec<u8>,
        bucket: &str,
        key: &str,
        acl: AccessLevel,
        metadata: &HashMap<String, String>,
        content_type: Option<&str>,
    ) -> Result<(), model::fs::FSError> {
        let req = self
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .acl(canned_acl(acl))
            .set_metadata(non_empty(metadata))
            .set_content_type(content_type.map(str::to_string));

        util::poll::poll_until_ready(req.send()).map_err(|err| {
            model::fs::FSError::backend(key, format!("failed to put_object: {}", err))
        })?;

        Ok(())
    }

    fn fs_copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dest_bucket: &str,
        dest_key: &str,
        acl: AccessLevel,
        metadata: &HashMap<String, String>,
        content_type: Option<&str>,
    ) -> Result<(), model::fs::FSError> {
        let req = self
            .copy_object()
            .copy_source(copy_source(src_bucket, src_key))
            .bucket(dest_bucket)
            .key(dest_key)
            .acl(canned_acl(acl))
            .metadata_directive(MetadataDirective::Replace)
            .set_metadata(non_empty(metadata))
            .set_content_type(content_type.map(str::to_string));

        util::poll::poll_until_ready(req.send()).map_err(|err| {
            model::fs::FSError::backend(
                dest_key,
                format!("failed to copy_object from: {}, {}", src_key, err),
            )
        })?;

        Ok(())
    }

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError> {
        let req = self.delete_object().bucket(bucket).key(key);

        util::poll::poll_until_ready(req.send()).map_err(|err| {
            model::fs::FSError::backend(key, format!("failed to delete_object: {}", err))
        })?;

        Ok(())
    }

    fn fs_head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<model::fs::FSObject>, model::fs::FSError> {
        let req = self.head_object().bucket(bucket).key(key);

        let ho = match util::poll::poll_until_ready(req.send()) {
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_not_found() {
                        return Ok(None);
                    }
                }

                return Err(model::fs::FSError::backend(
                    key,
                    format!("failed to head_object: {}", err),
                ));
            }
            Ok(ho) => ho,
        };

        let req = self.get_object_acl().bucket(bucket).key(key);
        let access_level = match util::poll::poll_until_ready(req.send()) {
            Err(err) => {
                // Buckets with ACLs disabled reject this call; report the default tier.
                warn!(key = key, error_message = %err, "failed to get_object_acl");
                AccessLevel::default()
            }
            Ok(acl) => access_level_from_grants(acl.grants()),
        };

        Ok(Some(model::fs::FSObject {
            key: key.to_string(),
            size: ho.content_length().unwrap_or(0),
            modified_time: to_system_time(ho.last_modified()),
            access_level,
        }))
    }
}

/// Builds clients from the engine's key/secret, falling back to the default AWS chain.
#[derive(Debug, Default)]
pub struct S3Connector;

impl adapters::Connector for S3Connector {
    fn connect(
        &self,
        config: &ObjectStoreConfig,
    ) -> Result<Box<dyn adapters::ObjectStore>, model::fs::FSError> {
        let region = config
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mut loader =
            aws_config::defaults(aws_config::BehaviorVersion::latest()).region(Region::new(region));

        if config.has_static_credentials() {
            loader = loader.credentials_provider(Credentials::new(
                config.key.clone(),
                config.secret.clone(),
                None,
                None,
                CREDENTIALS_PROVIDER_NAME,
            ));
        }

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let shared = util::poll::poll_until_ready(loader.load());
        if shared.credentials_provider().is_none() {
            return Err(model::fs::FSError::ConnectionFailed(format!(
                "no credentials available for bucket: {}",
                config.bucket
            )));
        }

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.endpoint.is_some())
            .build();

        Ok(Box::new(aws_sdk_s3::Client::from_conf(s3_config)))
    }
}

fn canned_acl(acl: AccessLevel) -> ObjectCannedAcl {
    match acl {
        AccessLevel::Private => ObjectCannedAcl::Private,
        AccessLevel::PublicRead => ObjectCannedAcl::PublicRead,
        AccessLevel::PublicReadWrite => ObjectCannedAcl::PublicReadWrite,
    }
}

fn non_empty(metadata: &HashMap<String, String>) -> Option<HashMap<String, String>> {
    if metadata.is_empty() {
        None
    } else {
        Some(metadata.clone())
    }
}

fn to_system_time(last_modified: Option<&DateTime>) -> SystemTime {
    match last_modified {
        Some(dt) if dt.secs() >= 0 => {
            SystemTime::UNIX_EPOCH + Duration::new(dt.secs() as u64, dt.subsec_nanos())
        }
        _ => SystemTime::UNIX_EPOCH,
    }
}

/// Derives the canned tier from the grants given to the AllUsers group.
fn access_level_from_grants(grants: &[Grant]) -> AccessLevel {
    let mut level = AccessLevel::Private;

    for grant in grants {
        let public = grant
            .grantee()
            .and_then(|grantee| grantee.uri())
            .is_some_and(|uri| uri == ALL_USERS_GROUP);
        if !public {
            continue;
        }

        match grant.permission() {
            Some(Permission::Write) | Some(Permission::FullControl) => {
                return AccessLevel::PublicReadWrite;
            }
            Some(Permission::Read) => level = AccessLevel::PublicRead,
            _ => {}
        }
    }

    level
}

/// `bucket/key` with the key percent-encoded, as `x-amz-copy-source` expects.
fn copy_source(bucket: &str, key: &str) -> String {
    format!("{}/{}", bucket, utf8_percent_encode(key, COPY_SOURCE_SET))
}
