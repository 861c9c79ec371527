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

//! Mutation handlers
//!
//! Each handler owns one annotation feature. It parses the collected
//! annotations into its own configuration type and applies that
//! configuration to a pod spec for a given ordinal.

pub mod host_port;
pub mod mount_volume;

use crate::domain::annotation::{self, QualifiedAnnotations};
use crate::infrastructure::constants::{FEATURE_HOST_PORT, FEATURE_MOUNT_VOLUME};
use crate::shared::error::MutationError;
use k8s_openapi::api::core::v1::{EnvVar, PodSpec};
use serde::de::DeserializeOwned;

pub use self::host_port::{HostPortConfig, HostPortHandler};
pub use self::mount_volume::{MountVolumeConfig, MountVolumeHandler};

/// A handler configuration together with the qualifier it was declared under.
#[derive(Debug, Clone, PartialEq)]
pub struct Qualified<T> {
    pub qualifier: String,
    pub value: T,
}

impl<T> Qualified<T> {
    pub fn new(qualifier: impl Into<String>, value: T) -> Self {
        Self {
            qualifier: qualifier.into(),
            value,
        }
    }

    pub fn applies_to(&self, ordinal: u32) -> bool {
        annotation::matches(ordinal, &self.qualifier)
    }
}

pub trait AnnotationHandler: Send + Sync {
    type Config: Send + Sync;

    /// Feature name this handler consumes, e.g. `host-port`.
    fn feature(&self) -> &'static str;

    /// `Ok(None)` when no annotation for this feature is present.
    fn parse(
        &self,
        annotations: &QualifiedAnnotations,
    ) -> Result<Option<Qualified<Self::Config>>, MutationError>;

    /// Must be a no-op when the qualifier does not match `ordinal`.
    fn mutate(
        &self,
        spec: &mut PodSpec,
        ordinal: u32,
        config: &Qualified<Self::Config>,
    ) -> Result<(), MutationError>;
}

/// What happened when one handler ran against a pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// No annotation for the feature.
    NotConfigured,
    /// Annotation present but its qualifier excludes this ordinal.
    Excluded,
    Applied,
}

/// Object-safe view of an [`AnnotationHandler`], used by the pipeline to
/// hold handlers with different configuration types in one list.
pub trait Handler: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        annotations: &QualifiedAnnotations,
        spec: &mut PodSpec,
        ordinal: u32,
    ) -> Result<HandlerOutcome, MutationError>;
}

impl<H: AnnotationHandler> Handler for H {
    fn name(&self) -> &'static str {
        self.feature()
    }

    fn apply(
        &self,
        annotations: &QualifiedAnnotations,
        spec: &mut PodSpec,
        ordinal: u32,
    ) -> Result<HandlerOutcome, MutationError> {
        let Some(config) = self.parse(annotations)? else {
            return Ok(HandlerOutcome::NotConfigured);
        };

        if !config.applies_to(ordinal) {
            tracing::info!(
                feature = self.feature(),
                qualifier = %config.qualifier,
                ordinal,
                "qualifier excludes this pod"
            );
            return Ok(HandlerOutcome::Excluded);
        }

        self.mutate(spec, ordinal, &config)?;
        Ok(HandlerOutcome::Applied)
    }
}

/// The shipped handler for `feature`, if any.
pub fn builtin(feature: &str) -> Option<Box<dyn Handler>> {
    match feature {
        FEATURE_HOST_PORT => Some(Box::new(HostPortHandler::new())),
        FEATURE_MOUNT_VOLUME => Some(Box::new(MountVolumeHandler::new())),
        _ => None,
    }
}

/// Finds the single annotation for `feature` and decodes its JSON value.
///
/// More than one annotation for the same feature (under different
/// qualifiers) is rejected rather than picking one arbitrarily.
pub fn parse_single<T: DeserializeOwned>(
    feature: &'static str,
    annotations: &QualifiedAnnotations,
) -> Result<Option<Qualified<T>>, MutationError> {
    let mut matching = annotations.for_feature(feature);

    let Some((name, value)) = matching.next() else {
        return Ok(None);
    };

    let rest: Vec<String> = matching.map(|(k, _)| k.qualifier.clone()).collect();
    if !rest.is_empty() {
        let mut qualifiers = vec![name.qualifier.clone()];
        qualifiers.extend(rest);
        return Err(MutationError::DuplicateFeature {
            feature,
            qualifiers,
        });
    }

    tracing::debug!(feature, qualifier = %name.qualifier, "parsing annotation configuration");

    let config: T =
        serde_json::from_str(value).map_err(|e| MutationError::parse(feature, e))?;

    Ok(Some(Qualified::new(name.qualifier.clone(), config)))
}

/// Replaces the variable with the same name, or appends it.
pub(crate) fn upsert_env_var(env: &mut Vec<EnvVar>, var: EnvVar) {
    match env.iter_mut().find(|e| e.name == var.name) {
        Some(existing) => *existing = var,
        None => env.push(var),
    }
}
