use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
    time::SystemTime,
};

use crate::{
    adapters,
    model::{self, config::ObjectStoreConfig, fs::AccessLevel},
};

#[derive(Clone, Debug)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub acl: AccessLevel,
    pub content_type: Option<String>,
    pub modified_time: SystemTime,
}

#[derive(Debug, Default)]
struct State {
    objects: HashMap<(String, String), StoredObject>,
    calls: Vec<String>,
    failing: Vec<&'static str>,
}

/// In-memory store. Clones share state so tests can inspect what the adapter did.
#[derive(Clone, Debug, Default)]
pub struct MockClient {
    state: Arc<Mutex<State>>,
}

impl MockClient {
    pub fn insert(&self, bucket: &str, key: &str, body: &[u8], acl: AccessLevel) {
        let mut state = self.state.lock().unwrap();
        state.objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: body.to_vec(),
                acl,
                content_type: None,
                modified_time: SystemTime::UNIX_EPOCH,
            },
        );
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Makes every later call to `operation` (e.g. "delete") fail.
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.push(operation);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.split(' ').next() == Some(operation))
            .count()
    }

    fn record(&self, operation: &'static str, key: &str) -> Result<(), model::fs::FSError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("{} {}", operation, key));

        if state.failing.contains(&operation) {
            return Err(model::fs::FSError::backend(
                key,
                format!("injected {} failure", operation),
            ));
        }

        Ok(())
    }
}

impl adapters::ObjectStore for MockClient {
    fn fs_get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<Vec<u8>>, model::fs::FSError> {
        self.record("get", key)?;
        Ok(self.object(bucket, key).map(|o| o.body))
    }

    fn fs_download_object(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> Result<bool, model::fs::FSError> {
        self.record("download", key)?;
        match self.object(bucket, key) {
            None => Ok(false),
            Some(o) => {
                std::fs::write(local_path, o.body)?;
                Ok(true)
            }
        }
    }

    fn fs_put_object(
        &self,
        body: Vec<u8>,
        bucket: &str,
        key: &str,
        acl: AccessLevel,
        _metadata: &HashMap<String, String>,
        content_type: Option<&str>,
    ) -> Result<(), model::fs::FSError> {
        self.record("put", key)?;

        let mut state = self.state.lock().unwrap();
        state.objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                acl,
                content_type: content_type.map(str::to_string),
                modified_time: SystemTime::now(),
            },
        );

        Ok(())
    }

    fn fs_copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dest_bucket: &str,
        dest_key: &str,
        acl: AccessLevel,
        _metadata: &HashMap<String, String>,
        content_type: Option<&str>,
    ) -> Result<(), model::fs::FSError> {
        self.record("copy", dest_key)?;

        let mut state = self.state.lock().unwrap();
        let source = state
            .objects
            .get(&(src_bucket.to_string(), src_key.to_string()))
            .cloned()
            .ok_or_else(|| model::fs::FSError::backend(src_key, "NoSuchKey"))?;

        state.objects.insert(
            (dest_bucket.to_string(), dest_key.to_string()),
            StoredObject {
                body: source.body,
                acl,
                content_type: content_type.map(str::to_string),
                modified_time: SystemTime::now(),
            },
        );

        Ok(())
    }

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError> {
        self.record("delete", key)?;

        let mut state = self.state.lock().unwrap();
        state
            .objects
            .remove(&(bucket.to_string(), key.to_string()));

        Ok(())
    }

    fn fs_head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<model::fs::FSObject>, model::fs::FSError> {
        self.record("head", key)?;

        Ok(self.object(bucket, key).map(|o| model::fs::FSObject {
            key: key.to_string(),
            size: o.body.len() as i64,
            modified_time: o.modified_time,
            access_level: o.acl,
        }))
    }
}

/// Hands out clones of one `MockClient`, or refuses to connect.
#[derive(Clone, Debug, Default)]
pub struct MockConnector {
    pub client: MockClient,
    pub refuse: bool,
}

impl adapters::Connector for MockConnector {
    fn connect(
        &self,
        config: &ObjectStoreConfig,
    ) -> Result<Box<dyn adapters::ObjectStore>, model::fs::FSError> {
        if self.refuse {
            return Err(model::fs::FSError::ConnectionFailed(format!(
                "refused for bucket: {}",
                config.bucket
            )));
        }

        Ok(Box::new(self.client.clone()))
    }
}
