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

use super::SpoditorConf;
use crate::shared::error::{Result, SpoditorError};
use std::collections::HashMap;

pub const KEY_ANNOTATION_PREFIX: &str = "spoditor.annotation.prefix";
pub const KEY_ANNOTATION_SEPARATOR: &str = "spoditor.annotation.separator";
pub const KEY_IDENTITY_LABEL: &str = "spoditor.identity.label";
pub const KEY_PIPELINE_HANDLERS: &str = "spoditor.pipeline.handlers";

const KNOWN_KEYS: [&str; 4] = [
    KEY_ANNOTATION_PREFIX,
    KEY_ANNOTATION_SEPARATOR,
    KEY_IDENTITY_LABEL,
    KEY_PIPELINE_HANDLERS,
];

/// Applies `-D key=value` overrides on top of the loaded configuration.
pub fn apply_to_conf(configs: &HashMap<String, String>, conf: &mut SpoditorConf) {
    if let Some(prefix) = configs.get(KEY_ANNOTATION_PREFIX) {
        conf.annotation.prefix = prefix.clone();
    }

    if let Some(separator) = configs.get(KEY_ANNOTATION_SEPARATOR) {
        conf.annotation.separator = separator.clone();
    }

    if let Some(label) = configs.get(KEY_IDENTITY_LABEL) {
        conf.identity.label = label.clone();
    }

    if let Some(handlers) = configs.get(KEY_PIPELINE_HANDLERS) {
        conf.pipeline.handlers = handlers
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
    }

    for key in configs.keys() {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            tracing::warn!(key = %key, "ignoring unknown configuration key");
        }
    }
}

/// Parses `-D key=value` properties. Values may contain `=`; keys may not be empty.
pub fn parse_dynamic_configs(properties: &[String]) -> Result<HashMap<String, String>> {
    properties
        .iter()
        .map(|property| -> Result<(String, String)> {
            let (key, value) = property.split_once('=').ok_or_else(|| {
                SpoditorError::config_error(format!(
                    "invalid property '{}', expected key=value",
                    property
                ))
            })?;

            let key = key.trim();
            if key.is_empty() {
                return Err(SpoditorError::config_error(format!(
                    "property '{}' has an empty key",
                    property
                )));
            }

            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}
