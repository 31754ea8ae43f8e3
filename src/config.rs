//! Router configuration.
//!
//! A [`Config`] holds the router-wide defaults: the CORS domain written on
//! every response and the media types routes consume and produce unless they
//! say otherwise. Build one in code or load it from TOML:
//!
//! ```toml
//! cors_domain = "https://example.com"
//! consumes = ["application/json", "application/yaml"]
//! produces = ["application/json"]
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::Error;
use crate::mime::MimeType;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Value of `Access-Control-Allow-Origin`. Defaults to `*`.
    pub cors_domain: String,
    /// Media types `post`, `put` and `patch` routes accept by default.
    pub consumes: Vec<MimeType>,
    /// Media types routes produce by default. The first entry is the
    /// fallback when negotiation finds nothing better.
    pub produces: Vec<MimeType>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cors_domain: "*".to_owned(),
            consumes: vec![MimeType::json()],
            produces: vec![MimeType::json()],
        }
    }
}

impl Config {
    /// Parses a configuration from TOML text.
    pub fn from_toml(toml_str: &str) -> Result<Self, Error> {
        toml_str.parse()
    }

    /// Reads and parses a TOML configuration file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn with_cors_domain(mut self, domain: impl Into<String>) -> Self {
        self.cors_domain = domain.into();
        self
    }

    pub fn with_consumes(mut self, types: impl IntoIterator<Item = MimeType>) -> Self {
        self.consumes = types.into_iter().collect();
        self
    }

    pub fn with_produces(mut self, types: impl IntoIterator<Item = MimeType>) -> Self {
        self.produces = types.into_iter().collect();
        self
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_json_and_any_origin() {
        let config = Config::default();
        assert_eq!(config.cors_domain, "*");
        assert_eq!(config.consumes, vec![MimeType::json()]);
        assert_eq!(config.produces, vec![MimeType::json()]);
    }

    #[test]
    fn empty_toml_is_the_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            cors_domain = "https://example.com"
            produces = ["application/yaml", "text/plain; charset=utf-8"]
            "#,
        )
        .unwrap();
        assert_eq!(config.cors_domain, "https://example.com");
        assert_eq!(config.consumes, vec![MimeType::json()]);
        assert_eq!(config.produces, vec![MimeType::yaml(), MimeType::plain_text()]);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = "cors_domain = [".parse::<Config>().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().starts_with("config:"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn builders_override() {
        let config = Config::default()
            .with_cors_domain("https://a.example")
            .with_consumes([MimeType::yaml()]);
        assert_eq!(config.cors_domain, "https://a.example");
        assert_eq!(config.consumes, vec![MimeType::yaml()]);
    }
}
