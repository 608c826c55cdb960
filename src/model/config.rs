use crate::{config::ConfigProvider, model};

/// Remote engine selected by `cdn.engine`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineKind {
    None,
    S3,
    /// CloudFront in front of an S3 bucket; objects still live in S3.
    Cdn,
}

impl EngineKind {
    pub fn parse(value: &str) -> Self {
        match value {
            "s3" => EngineKind::S3,
            "cf" => EngineKind::Cdn,
            _ => EngineKind::None,
        }
    }

    /// Prefix of the engine's settings under `cdn.`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::None => "none",
            EngineKind::S3 => "s3",
            EngineKind::Cdn => "cf",
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, EngineKind::S3 | EngineKind::Cdn)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectStoreConfig {
    pub engine: EngineKind,
    pub bucket: String,
    pub key: String,
    pub secret: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

impl ObjectStoreConfig {
    /// Reads the engine settings. Fails unless a remote engine and a bucket are configured.
    pub fn resolve(provider: &dyn ConfigProvider) -> Result<Self, model::fs::FSError> {
        let engine = provider.engine_kind();
        if !engine.is_remote() {
            return Err(model::fs::FSError::ConfigurationMissing);
        }

        let setting = |name: &str| provider.get_string(&format!("cdn.{}.{}", engine.as_str(), name));
        let optional = |name: &str| Some(setting(name)).filter(|value| !value.is_empty());

        let bucket = setting("bucket");
        if bucket.is_empty() {
            return Err(model::fs::FSError::ConfigurationMissing);
        }

        Ok(Self {
            engine,
            bucket,
            key: setting("key"),
            secret: setting("secret"),
            region: optional("region"),
            endpoint: optional("endpoint"),
        })
    }

    pub fn has_static_credentials(&self) -> bool {
        !self.key.is_empty() && !self.secret.is_empty()
    }
}
