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

use std::num::ParseIntError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpoditorError>;

/// Why a pod could not be identified as a StatefulSet member.
///
/// None of these are fatal: the pipeline admits such pods unchanged.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("missing StatefulSet pod name label '{label}'")]
    MissingLabel { label: String },

    #[error("invalid StatefulSet pod name format: '{value}'")]
    InvalidFormat { value: String },

    #[error("failed to parse pod ordinal '{value}': {source}")]
    OrdinalParse {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Failures raised while parsing annotations or mutating the pod spec.
///
/// Any of these aborts the pipeline for one admission request; the
/// original pod is admitted unmodified.
#[derive(Error, Debug)]
pub enum MutationError {
    #[error("invalid '{feature}' configuration: {source}")]
    Parse {
        feature: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("conflicting '{feature}' annotations with qualifiers [{}]", .qualifiers.join(", "))]
    DuplicateFeature {
        feature: &'static str,
        qualifiers: Vec<String>,
    },

    #[error("host port for '{port}' in container '{container}' out of range: {base} + {ordinal}")]
    HostPortOutOfRange {
        container: String,
        port: String,
        base: i32,
        ordinal: u32,
    },
}

impl MutationError {
    pub fn parse(feature: &'static str, source: serde_json::Error) -> Self {
        Self::Parse { feature, source }
    }

    /// True for errors raised while decoding annotations, before any mutation.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::DuplicateFeature { .. })
    }
}

#[derive(Error, Debug)]
pub enum SpoditorError {
    #[error("Kubernetes API error: {0}")]
    KubeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Resource not found: {resource_type} '{name}' in namespace '{namespace}'")]
    NotFound {
        resource_type: String,
        name: String,
        namespace: String,
    },

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<kube::Error> for SpoditorError {
    fn from(err: kube::Error) -> Self {
        SpoditorError::KubeError(err.to_string())
    }
}

impl SpoditorError {
    pub fn config_error(context: impl Into<String>) -> Self {
        Self::ConfigError(context.into())
    }

    pub fn not_found(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}
