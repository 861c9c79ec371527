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

//! StatefulSet pod identity
//!
//! The StatefulSet controller labels every pod it creates with
//! `statefulset.kubernetes.io/pod-name=<set>-<ordinal>`. This label is the
//! only signal used to decide whether a pod is in scope.

use crate::infrastructure::constants::LABEL_STATEFULSET_POD_NAME;
use crate::shared::error::IdentityError;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static POD_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)-([0-9]+)$").expect("valid pod name pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodIdentity {
    pub stateful_set: String,
    pub ordinal: u32,
}

impl fmt::Display for PodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.stateful_set, self.ordinal)
    }
}

pub trait PodIdentifier: Send + Sync {
    /// Returns the owning StatefulSet and the pod ordinal, or why the
    /// object is not a StatefulSet pod.
    fn extract(&self, metadata: &ObjectMeta) -> Result<PodIdentity, IdentityError>;
}

/// Reads identity from the StatefulSet pod name label.
#[derive(Debug, Clone)]
pub struct LabelIdentifier {
    label: String,
}

impl LabelIdentifier {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for LabelIdentifier {
    fn default() -> Self {
        Self::new(LABEL_STATEFULSET_POD_NAME)
    }
}

impl PodIdentifier for LabelIdentifier {
    fn extract(&self, metadata: &ObjectMeta) -> Result<PodIdentity, IdentityError> {
        let Some(value) = metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(&self.label))
        else {
            tracing::debug!(pod = ?metadata.name, label = %self.label, "StatefulSet label not found");
            return Err(IdentityError::MissingLabel {
                label: self.label.clone(),
            });
        };

        parse_pod_name(value)
    }
}

/// Splits `<name>-<ordinal>`; the name may itself contain hyphens.
pub fn parse_pod_name(value: &str) -> Result<PodIdentity, IdentityError> {
    let caps = POD_NAME_RE
        .captures(value)
        .ok_or_else(|| IdentityError::InvalidFormat {
            value: value.to_string(),
        })?;

    let name = &caps[1];
    let ordinal_str = &caps[2];
    let ordinal = ordinal_str
        .parse::<u32>()
        .map_err(|source| IdentityError::OrdinalParse {
            value: ordinal_str.to_string(),
            source,
        })?;

    tracing::debug!(stateful_set = name, ordinal, "extracted StatefulSet identity");

    Ok(PodIdentity {
        stateful_set: name.to_string(),
        ordinal,
    })
}
