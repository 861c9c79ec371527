// Copyright 2025 The Spoditor Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Spoditor configuration file
//!
//! ```toml
//! [annotation]
//! prefix = "spoditor.io/"
//! separator = "_"
//!
//! [identity]
//! label = "statefulset.kubernetes.io/pod-name"
//!
//! [pipeline]
//! handlers = ["mount-volume", "host-port"]
//! ```

use crate::domain::annotation::AnnotationSyntax;
use crate::infrastructure::constants::{
    ANNOTATION_PREFIX, ANNOTATION_SEPARATOR, DEFAULT_CONF_FILE, DEFAULT_HANDLERS, ENV_CONF_FILE,
    LABEL_STATEFULSET_POD_NAME,
};
use crate::shared::error::{Result, SpoditorError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::read_to_string;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoditorConf {
    pub annotation: AnnotationConf,
    pub identity: IdentityConf,
    pub pipeline: PipelineConf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConf {
    pub prefix: String,
    /// Single character.
    pub separator: String,
}

impl Default for AnnotationConf {
    fn default() -> Self {
        Self {
            prefix: ANNOTATION_PREFIX.to_string(),
            separator: ANNOTATION_SEPARATOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConf {
    pub label: String,
}

impl Default for IdentityConf {
    fn default() -> Self {
        Self {
            label: LABEL_STATEFULSET_POD_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConf {
    /// Handler features in execution order.
    pub handlers: Vec<String>,
}

impl Default for PipelineConf {
    fn default() -> Self {
        Self {
            handlers: DEFAULT_HANDLERS.iter().map(|h| h.to_string()).collect(),
        }
    }
}

impl SpoditorConf {
    /// Load configuration from TOML file
    pub fn from<T: AsRef<str>>(path: T) -> Result<Self> {
        let content = read_to_string(path.as_ref()).map_err(|e| {
            SpoditorError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.as_ref(),
                e
            ))
        })?;

        let conf: Self = toml::from_str(&content)?;
        tracing::debug!(path = path.as_ref(), "loaded configuration");
        Ok(conf)
    }

    /// Resolves the config file: an explicit path, then `$SPODITOR_CONF_FILE`,
    /// then the default location if it exists, else built-in defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from(path);
        }

        if let Ok(path) = std::env::var(ENV_CONF_FILE) {
            if !path.is_empty() {
                return Self::from(path);
            }
        }

        if Path::new(DEFAULT_CONF_FILE).exists() {
            return Self::from(DEFAULT_CONF_FILE);
        }

        tracing::debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    pub fn separator(&self) -> Result<char> {
        let mut chars = self.annotation.separator.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(SpoditorError::ConfigError(format!(
                "annotation.separator must be a single character, got '{}'",
                self.annotation.separator
            ))),
        }
    }

    pub fn annotation_syntax(&self) -> Result<AnnotationSyntax> {
        AnnotationSyntax::new(self.annotation.prefix.clone(), self.separator()?)
    }

    pub fn validate(&self) -> Result<()> {
        let separator = self.separator()?;
        self.annotation_syntax()?;

        if self.identity.label.trim().is_empty() {
            return Err(SpoditorError::config_error(
                "identity.label must not be empty",
            ));
        }

        let mut seen = HashSet::new();
        for handler in &self.pipeline.handlers {
            if !DEFAULT_HANDLERS.contains(&handler.as_str()) {
                return Err(SpoditorError::ConfigError(format!(
                    "Unknown handler '{}', expected one of: {}",
                    handler,
                    DEFAULT_HANDLERS.join(", ")
                )));
            }

            if !seen.insert(handler.as_str()) {
                return Err(SpoditorError::ConfigError(format!(
                    "Handler '{}' is registered more than once",
                    handler
                )));
            }

            if handler.contains(separator) {
                return Err(SpoditorError::ConfigError(format!(
                    "Feature '{}' contains the annotation separator '{}'",
                    handler, separator
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let conf = SpoditorConf::default();
        assert_eq!(conf.annotation.prefix, "spoditor.io/");
        assert_eq!(conf.separator().unwrap(), '_');
        assert_eq!(conf.identity.label, "statefulset.kubernetes.io/pod-name");
        assert_eq!(conf.pipeline.handlers, vec!["mount-volume", "host-port"]);
        assert!(conf.validate().is_ok());
    }

    #[test]
    fn test_from_file_with_partial_sections() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[annotation]
prefix = "example.com/"

[pipeline]
handlers = ["host-port"]
"#
        )
        .unwrap();

        let conf = SpoditorConf::from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(conf.annotation.prefix, "example.com/");
        assert_eq!(conf.annotation.separator, "_");
        assert_eq!(conf.identity, IdentityConf::default());
        assert_eq!(conf.pipeline.handlers, vec!["host-port"]);
    }

    #[test]
    fn test_from_missing_file() {
        let err = SpoditorConf::from("/nonexistent/spoditor.toml").unwrap_err();
        assert!(matches!(err, SpoditorError::ConfigError(_)));
    }

    #[test]
    fn test_from_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[annotation\nprefix = ").unwrap();

        let err = SpoditorConf::from(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SpoditorError::TomlParse(_)));
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[identity]\nlabel = \"example.com/pod\"").unwrap();

        let conf = SpoditorConf::load(file.path().to_str()).unwrap();
        assert_eq!(conf.identity.label, "example.com/pod");
    }

    #[test]
    fn test_validate_rejects_bad_separator() {
        let mut conf = SpoditorConf::default();
        conf.annotation.separator = "__".to_string();
        assert!(conf.validate().is_err());

        conf.annotation.separator = "-".to_string();
        assert!(conf.validate().is_err());

        conf.annotation.separator = String::new();
        assert!(conf.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_separator_inside_feature() {
        let mut conf = SpoditorConf::default();
        conf.annotation.separator = "t".to_string();
        let err = conf.validate().unwrap_err();
        assert!(err.to_string().contains("contains the annotation separator"));
    }

    #[test]
    fn test_validate_handlers() {
        let mut conf = SpoditorConf::default();
        conf.pipeline.handlers = vec!["host-port".to_string(), "sidecar".to_string()];
        assert!(conf.validate().unwrap_err().to_string().contains("Unknown handler"));

        conf.pipeline.handlers = vec!["host-port".to_string(), "host-port".to_string()];
        assert!(conf.validate().unwrap_err().to_string().contains("more than once"));

        conf.pipeline.handlers = Vec::new();
        assert!(conf.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_label() {
        let mut conf = SpoditorConf::default();
        conf.identity.label = " ".to_string();
        assert!(conf.validate().is_err());
    }
}
