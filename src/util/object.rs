use crate::{config::ConfigProvider, model::config::ObjectStoreConfig, util};

/// Public origin the configured objects are served from.
///
/// The first CNAME configured for the engine wins; otherwise the bucket's own
/// virtual-hosted S3 endpoint is used.
pub fn cdn_domain(provider: &dyn ConfigProvider, config: &ObjectStoreConfig) -> String {
    let cnames = provider.get_array(&format!("cdn.{}.cname", config.engine.as_str()));

    match cnames.into_iter().find(|cname| !cname.is_empty()) {
        Some(cname) => format!("http://{}", cname),
        None => format!("https://{}.s3.amazonaws.com", config.bucket),
    }
}

pub fn public_url(domain: &str, path: &str) -> String {
    let key = util::path::to_object_key(path).trim_start_matches('/');
    format!("{}/{}", domain.trim_end_matches('/'), key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TomlConfig;

    #[test]
    fn test_cdn_domain() {
        let cases = vec![
            (
                "[cdn]\nengine = \"s3\"\n[cdn.s3]\nbucket = \"media-assets\"",
                "https://media-assets.s3.amazonaws.com",
            ),
            (
                "[cdn]\nengine = \"cf\"\n[cdn.cf]\nbucket = \"media-assets\"\ncname = [\"cdn.example.com\"]",
                "http://cdn.example.com",
            ),
            (
                "[cdn]\nengine = \"s3\"\n[cdn.s3]\nbucket = \"media-assets\"\ncname = [\"\"]",
                "https://media-assets.s3.amazonaws.com",
            ),
        ];

        for (input, expected) in cases {
            let provider = TomlConfig::parse(input).unwrap();
            let config = ObjectStoreConfig::resolve(&provider).unwrap();
            assert_eq!(cdn_domain(&provider, &config), expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_public_url() {
        let cases = vec![
            (
                "http://cdn.example.com",
                "/var/www/wp-content/uploads/a.png",
                "http://cdn.example.com/wp-content/uploads/a.png",
            ),
            (
                "https://b.s3.amazonaws.com/",
                "/other/a.png",
                "https://b.s3.amazonaws.com/other/a.png",
            ),
        ];

        for (domain, path, expected) in cases {
            assert_eq!(public_url(domain, path), expected, "failed for case: {}", path);
        }
    }
}
