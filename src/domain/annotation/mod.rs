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

//! Qualified annotations
//!
//! Keys look like `<prefix><feature>` or `<prefix><feature><sep><qualifier>`,
//! e.g. `spoditor.io/mount-volume_0-2`. The qualifier is whatever follows the
//! last separator, so feature names must not contain the separator.

pub mod qualifier;

use crate::infrastructure::constants::{ANNOTATION_PREFIX, ANNOTATION_SEPARATOR};
use crate::shared::error::SpoditorError;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use std::fmt;

pub use self::qualifier::{matches, OrdinalQualifier};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifiedName {
    pub feature: String,
    pub qualifier: String,
}

impl QualifiedName {
    pub fn new(feature: impl Into<String>, qualifier: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            qualifier: qualifier.into(),
        }
    }

    pub fn unqualified(feature: impl Into<String>) -> Self {
        Self::new(feature, "")
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.qualifier.is_empty() {
            write!(f, "{}", self.feature)
        } else {
            write!(f, "{}[{}]", self.feature, self.qualifier)
        }
    }
}

/// Annotations under the reserved prefix, keyed by feature and qualifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualifiedAnnotations {
    entries: BTreeMap<QualifiedName, String>,
}

impl QualifiedAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later inserts for the same name replace earlier ones.
    pub fn insert(&mut self, name: QualifiedName, value: impl Into<String>) {
        self.entries.insert(name, value.into());
    }

    pub fn get(&self, name: &QualifiedName) -> Option<&String> {
        self.entries.get(name)
    }

    /// Entries for one feature, ordered by qualifier.
    pub fn for_feature<'a>(
        &'a self,
        feature: &'a str,
    ) -> impl Iterator<Item = (&'a QualifiedName, &'a String)> + 'a {
        self.entries.iter().filter(move |(k, _)| k.feature == feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QualifiedName, &String)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(QualifiedName, String)> for QualifiedAnnotations {
    fn from_iter<I: IntoIterator<Item = (QualifiedName, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Prefix and separator of the annotation namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSyntax {
    prefix: String,
    separator: char,
}

impl Default for AnnotationSyntax {
    fn default() -> Self {
        Self {
            prefix: ANNOTATION_PREFIX.to_string(),
            separator: ANNOTATION_SEPARATOR,
        }
    }
}

impl AnnotationSyntax {
    /// The separator must never appear inside a qualifier, so digits and
    /// `-` are rejected.
    pub fn new(prefix: impl Into<String>, separator: char) -> Result<Self, SpoditorError> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(SpoditorError::config_error(
                "annotation prefix must not be empty",
            ));
        }
        if separator.is_ascii_digit() || separator == '-' || separator.is_whitespace() {
            return Err(SpoditorError::ConfigError(format!(
                "annotation separator '{}' collides with qualifier syntax",
                separator
            )));
        }
        Ok(Self { prefix, separator })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Splits an annotation key, or `None` if it is outside the namespace.
    pub fn parse_key(&self, key: &str) -> Option<QualifiedName> {
        let name = key.strip_prefix(self.prefix.as_str())?;
        Some(match name.rfind(self.separator) {
            Some(i) => QualifiedName::new(&name[..i], &name[i + self.separator.len_utf8()..]),
            None => QualifiedName::unqualified(name),
        })
    }

    /// Builds the annotation key for a feature and qualifier.
    pub fn key(&self, feature: &str, qualifier: &str) -> String {
        if qualifier.is_empty() {
            format!("{}{}", self.prefix, feature)
        } else {
            format!("{}{}{}{}", self.prefix, feature, self.separator, qualifier)
        }
    }

    pub fn collect(&self, metadata: &ObjectMeta) -> QualifiedAnnotations {
        let mut result = QualifiedAnnotations::new();

        let Some(annotations) = metadata.annotations.as_ref() else {
            return result;
        };

        for (key, value) in annotations {
            match self.parse_key(key) {
                Some(name) => {
                    tracing::debug!(key = %key, qualified = %name, "found annotation");
                    result.insert(name, value.clone());
                }
                None => {
                    tracing::trace!(key = %key, "skipping irrelevant annotation");
                }
            }
        }

        result
    }
}
