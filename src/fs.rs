use std::{
    collections::HashMap,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::SystemTime,
};

use tracing::{debug, warn};

use crate::{
    adapters,
    config::ConfigProvider,
    model::{self, config::ObjectStoreConfig, fs::AccessLevel},
    util,
};

const STAGING_PREFIX: &str = "cdnfs_";

/// Filesystem adapter over a flat-namespace object store.
///
/// Configuration is re-read on every call; the store handle is created on first
/// use and kept for the lifetime of the adapter.
pub struct ObjectFS {
    pub config: Box<dyn ConfigProvider>,
    pub connector: Box<dyn adapters::Connector>,
    pub store: Mutex<Option<Arc<dyn adapters::ObjectStore>>>,
    pub staging_dir: PathBuf,
    pub upload_basedir: Option<PathBuf>,
}

/// Resolved configuration plus a connected store, valid for one operation.
pub struct Session {
    pub config: ObjectStoreConfig,
    pub store: Arc<dyn adapters::ObjectStore>,
}

impl Session {
    fn bucket(&self) -> &str {
        &self.config.bucket
    }
}

impl ObjectFS {
    pub fn new(config: Box<dyn ConfigProvider>, connector: Box<dyn adapters::Connector>) -> Self {
        Self {
            config,
            connector,
            store: Mutex::new(None),
            staging_dir: std::env::temp_dir(),
            upload_basedir: None,
        }
    }

    pub fn with_staging_dir(mut self, staging_dir: PathBuf) -> Self {
        self.staging_dir = staging_dir;
        self
    }

    pub fn with_upload_basedir(mut self, upload_basedir: Option<PathBuf>) -> Self {
        self.upload_basedir = upload_basedir;
        self
    }

    /// Resolves configuration and connects if needed. Nothing touches the network
    /// unless a remote engine with a bucket is configured.
    pub fn session(&self) -> Result<Session, model::fs::FSError> {
        let config = ObjectStoreConfig::resolve(self.config.as_ref())?;

        let mut guard = self.store.lock().map_err(|err| {
            model::fs::FSError::ConnectionFailed(format!("failed to acquire store guard: {}", err))
        })?;

        let store = match guard.as_ref() {
            Some(store) => store.clone(),
            None => {
                let store: Arc<dyn adapters::ObjectStore> =
                    Arc::from(self.connector.connect(&config)?);
                *guard = Some(store.clone());
                store
            }
        };

        Ok(Session { config, store })
    }

    pub fn try_read_all(&self, path: &str) -> Result<Vec<u8>, model::fs::FSError> {
        let session = self.session()?;
        let key = util::path::to_object_key(path);

        session
            .store
            .fs_get_object(session.bucket(), key)?
            .ok_or_else(|| model::fs::FSError::ObjectNotFound(key.to_string()))
    }

    /// Reads the object line by line, keeping line terminators. Bytes that are not
    /// valid UTF-8 are replaced rather than failing the read.
    ///
    /// The object is staged in a temporary file under `staging_dir` that is removed
    /// on every return path.
    pub fn try_read_lines(&self, path: &str) -> Result<Vec<String>, model::fs::FSError> {
        let session = self.session()?;
        let key = util::path::to_object_key(path);

        let staged = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&self.staging_dir)?;

        if !session
            .store
            .fs_download_object(session.bucket(), key, staged.path())?
        {
            return Err(model::fs::FSError::ObjectNotFound(key.to_string()));
        }

        let mut reader = BufReader::new(staged.reopen()?);
        let mut lines = Vec::new();
        let mut line = Vec::new();
        while reader.read_until(b'\n', &mut line)? > 0 {
            lines.push(String::from_utf8_lossy(&line).into_owned());
            line.clear();
        }

        Ok(lines)
    }

    /// Uploads `contents`. The remote object is authoritative afterwards: a local
    /// file at `path` is removed once the upload succeeds.
    pub fn try_write_all(
        &self,
        path: &str,
        contents: &[u8],
        mode: Option<u32>,
    ) -> Result<(), model::fs::FSError> {
        let session = self.session()?;
        let key = util::path::to_object_key(path);

        session.store.fs_put_object(
            contents.to_vec(),
            session.bucket(),
            key,
            util::perms::to_access_level(mode),
            &HashMap::new(),
            util::mime::resolve(path),
        )?;

        let local = Path::new(path);
        if local.is_file() {
            if let Err(err) = std::fs::remove_file(local) {
                warn!(path = path, error_message = %err, "failed to remove local copy");
            }
        }

        Ok(())
    }

    /// Server-side copy. The destination is always overwritten; `_overwrite` is
    /// accepted for interface compatibility only.
    pub fn try_copy(
        &self,
        src: &str,
        dest: &str,
        _overwrite: bool,
    ) -> Result<(), model::fs::FSError> {
        let session = self.session()?;
        let src_key = util::path::to_object_key(src);
        let dest_key = util::path::to_object_key(dest);

        let acl = self.access_level(&session, src_key);
        session.store.fs_copy_object(
            session.bucket(),
            src_key,
            session.bucket(),
            dest_key,
            acl,
            &HashMap::new(),
            util::mime::resolve(dest_key),
        )
    }

    /// Copy followed by delete. Not atomic: if the delete fails both objects remain.
    /// Moving a path onto its own object key is a no-op.
    pub fn try_move(&self, src: &str, dest: &str, overwrite: bool) -> Result<(), model::fs::FSError> {
        if util::path::to_object_key(src) == util::path::to_object_key(dest) {
            return Ok(());
        }

        self.try_copy(src, dest, overwrite)?;
        self.try_delete(src, false)
    }

    /// Deletes the object at `path`, or at `path` joined onto the upload base
    /// directory when only that form exists. `_recursive` has no effect.
    pub fn try_delete(&self, path: &str, _recursive: bool) -> Result<(), model::fs::FSError> {
        let session = self.session()?;

        let target = if self.exists_in(&session, path)? {
            path.to_string()
        } else {
            let joined = match &self.upload_basedir {
                Some(base) => util::path::path_join(base, path),
                None => {
                    return Err(model::fs::FSError::ObjectNotFound(
                        util::path::to_object_key(path).to_string(),
                    ))
                }
            };

            let joined = joined.to_string_lossy().into_owned();
            if !self.exists_in(&session, &joined)? {
                return Err(model::fs::FSError::ObjectNotFound(
                    util::path::to_object_key(&joined).to_string(),
                ));
            }

            joined
        };

        session
            .store
            .fs_delete_object(session.bucket(), util::path::to_object_key(&target))
    }

    /// Fetches the whole object to find out whether it exists.
    pub fn try_exists(&self, path: &str) -> Result<bool, model::fs::FSError> {
        let session = self.session()?;
        self.exists_in(&session, path)
    }

    pub fn try_is_readable(&self, path: &str) -> Result<bool, model::fs::FSError> {
        let session = self.session()?;
        let key = util::path::to_object_key(path);

        Ok(session
            .store
            .fs_head_object(session.bucket(), key)?
            .is_some_and(|info| info.access_level.is_public_readable()))
    }

    /// Backend modification time. Also serves as access time, which the backend lacks.
    pub fn try_modified_time(&self, path: &str) -> Result<SystemTime, model::fs::FSError> {
        Ok(self
            .existing_info(path)?
            .map(|info| info.modified_time)
            .unwrap_or_else(SystemTime::now))
    }

    pub fn try_size(&self, path: &str) -> Result<i64, model::fs::FSError> {
        Ok(self.existing_info(path)?.map(|info| info.size).unwrap_or(0))
    }

    /// Canonical POSIX mode of the object's access level.
    pub fn try_getchmod(&self, path: &str) -> Result<u32, model::fs::FSError> {
        let session = self.session()?;
        let key = util::path::to_object_key(path);

        Ok(util::perms::to_posix_mode(self.access_level(&session, key)))
    }

    /// Re-copies the object onto itself with the access level derived from `mode`.
    pub fn try_chmod(&self, path: &str, mode: Option<u32>) -> Result<(), model::fs::FSError> {
        let session = self.session()?;
        let key = util::path::to_object_key(path);

        if !self.exists_in(&session, path)? {
            return Err(model::fs::FSError::ObjectNotFound(key.to_string()));
        }

        session.store.fs_copy_object(
            session.bucket(),
            key,
            session.bucket(),
            key,
            util::perms::to_access_level(mode),
            &HashMap::new(),
            util::mime::resolve(key),
        )
    }

    pub fn try_owner(&self) -> Result<String, model::fs::FSError> {
        Ok(ObjectStoreConfig::resolve(self.config.as_ref())?.bucket)
    }

    /// Object listing is not supported; the bucket name stands in for the listing.
    pub fn try_list_directory(&self, _path: &str) -> Result<Vec<String>, model::fs::FSError> {
        let config = ObjectStoreConfig::resolve(self.config.as_ref())?;
        Ok(vec![config.bucket])
    }

    pub fn try_public_url(&self, path: &str) -> Result<String, model::fs::FSError> {
        let config = ObjectStoreConfig::resolve(self.config.as_ref())?;
        let domain = util::object::cdn_domain(self.config.as_ref(), &config);

        Ok(util::object::public_url(&domain, path))
    }

    fn exists_in(&self, session: &Session, path: &str) -> Result<bool, model::fs::FSError> {
        let key = util::path::to_object_key(path);
        Ok(session.store.fs_get_object(session.bucket(), key)?.is_some())
    }

    /// `Err` when the object is absent; `Ok(None)` when it exists but its metadata
    /// could not be read.
    fn existing_info(
        &self,
        path: &str,
    ) -> Result<Option<model::fs::FSObject>, model::fs::FSError> {
        let session = self.session()?;
        let key = util::path::to_object_key(path);

        if !self.exists_in(&session, path)? {
            return Err(model::fs::FSError::ObjectNotFound(key.to_string()));
        }

        match session.store.fs_head_object(session.bucket(), key) {
            Ok(Some(info)) => {
                debug!(key = %info.key, size = info.size, "read object metadata");
                Ok(Some(info))
            }
            Ok(None) => {
                warn!(key = key, "object vanished before metadata lookup");
                Ok(None)
            }
            Err(err) => {
                warn!(key = key, error_message = %err, "failed to read object metadata");
                Ok(None)
            }
        }
    }

    fn access_level(&self, session: &Session, key: &str) -> AccessLevel {
        match session.store.fs_head_object(session.bucket(), key) {
            Ok(Some(info)) => info.access_level,
            Ok(None) => AccessLevel::default(),
            Err(err) => {
                warn!(key = key, error_message = %err, "failed to read access level");
                AccessLevel::default()
            }
        }
    }
}
