use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::model::config::EngineKind;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Typed access to host settings addressed by dotted keys such as `cdn.s3.bucket`.
pub trait ConfigProvider {
    /// Returns the value at `key`, or an empty string when it is missing or not a string.
    fn get_string(&self, key: &str) -> String;

    /// Returns the string elements at `key`. A bare string counts as a single element.
    fn get_array(&self, key: &str) -> Vec<String>;

    fn engine_kind(&self) -> EngineKind {
        EngineKind::parse(&self.get_string("cdn.engine"))
    }
}

/// Local settings of the adapter itself, read from the `[filesystem]` table.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FilesystemSettings {
    pub staging_dir: Option<PathBuf>,
    pub upload_basedir: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct TomlConfig {
    root: toml::Table,
}

impl TomlConfig {
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let root = contents.parse::<toml::Table>()?;
        Ok(Self { root })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn filesystem(&self) -> Result<FilesystemSettings, ConfigError> {
        match self.root.get("filesystem") {
            None => Ok(FilesystemSettings::default()),
            Some(value) => Ok(value.clone().try_into()?),
        }
    }

    fn lookup(&self, key: &str) -> Option<&toml::Value> {
        let mut segments = key.split('.');
        let mut value = self.root.get(segments.next()?)?;
        for segment in segments {
            value = value.as_table()?.get(segment)?;
        }

        Some(value)
    }
}

impl ConfigProvider for TomlConfig {
    fn get_string(&self, key: &str) -> String {
        self.lookup(key)
            .and_then(|value| value.as_str())
            .unwrap_or("")
            .to_string()
    }

    fn get_array(&self, key: &str) -> Vec<String> {
        match self.lookup(key) {
            Some(toml::Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str())
                .map(|item| item.to_string())
                .collect(),
            Some(toml::Value::String(item)) => vec![item.clone()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[cdn]
engine = "s3"

[cdn.s3]
bucket = "media-assets"
key = "AK"
secret = "SK"
cname = ["cdn.example.com", "cdn2.example.com"]

[cdn.cf]
cname = "static.example.com"

[filesystem]
staging_dir = "/var/tmp/cdnfs"
upload_basedir = "/var/www/wp-content/uploads"
"#;

    #[test]
    fn test_get_string() {
        let config = TomlConfig::parse(SAMPLE).unwrap();

        let cases = vec![
            ("cdn.engine", "s3"),
            ("cdn.s3.bucket", "media-assets"),
            ("cdn.s3.missing", ""),
            ("cdn.s3", ""),
            ("cdn.s3.cname", ""),
            ("nothing.at.all", ""),
            ("", ""),
        ];

        for (key, expected) in cases {
            assert_eq!(config.get_string(key), expected, "failed for case: {}", key);
        }
    }

    #[test]
    fn test_get_array() {
        let config = TomlConfig::parse(SAMPLE).unwrap();

        assert_eq!(
            config.get_array("cdn.s3.cname"),
            vec!["cdn.example.com".to_string(), "cdn2.example.com".to_string()]
        );
        assert_eq!(
            config.get_array("cdn.cf.cname"),
            vec!["static.example.com".to_string()]
        );
        assert!(config.get_array("cdn.s3.bucket.nope").is_empty());
    }

    #[test]
    fn test_engine_kind() {
        let config = TomlConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.engine_kind(), EngineKind::S3);

        let empty = TomlConfig::default();
        assert_eq!(empty.engine_kind(), EngineKind::None);
    }

    #[test]
    fn test_filesystem_settings() {
        let config = TomlConfig::parse(SAMPLE).unwrap();
        let settings = config.filesystem().unwrap();

        assert_eq!(settings.staging_dir, Some(PathBuf::from("/var/tmp/cdnfs")));
        assert_eq!(
            settings.upload_basedir,
            Some(PathBuf::from("/var/www/wp-content/uploads"))
        );

        let settings = TomlConfig::default().filesystem().unwrap();
        assert!(settings.staging_dir.is_none());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            TomlConfig::parse("[cdn\nengine = "),
            Err(ConfigError::Parse(_))
        ));
    }
}
