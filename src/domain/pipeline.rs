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

//! Mutation pipeline
//!
//! [`PodMutator`] identifies a pod, collects its annotations once and runs
//! every registered handler in order against a copy of the pod. A failing
//! handler stops the pipeline and the caller admits the original pod.

use crate::domain::annotation::AnnotationSyntax;
use crate::domain::config::SpoditorConf;
use crate::domain::handler::{self, Handler, HandlerOutcome};
use crate::domain::identity::{LabelIdentifier, PodIdentifier, PodIdentity};
use crate::infrastructure::constants::DEFAULT_HANDLERS;
use crate::shared::error::{IdentityError, MutationError, Result, SpoditorError};
use k8s_openapi::api::core::v1::Pod;

#[derive(Debug)]
pub enum MutationOutcome {
    /// Not a StatefulSet pod; admitted unchanged.
    NotStatefulSet(IdentityError),
    Mutated {
        identity: PodIdentity,
        pod: Box<Pod>,
        /// Features whose handler ran for this ordinal, in execution order.
        applied: Vec<&'static str>,
    },
    Failed {
        identity: PodIdentity,
        feature: &'static str,
        error: MutationError,
    },
}

impl MutationOutcome {
    /// The pod to admit: the mutated copy on success, otherwise `original`.
    pub fn into_admitted(self, original: Pod) -> Pod {
        match self {
            Self::Mutated { pod, .. } => *pod,
            Self::NotStatefulSet(_) | Self::Failed { .. } => original,
        }
    }

    pub fn identity(&self) -> Option<&PodIdentity> {
        match self {
            Self::NotStatefulSet(_) => None,
            Self::Mutated { identity, .. } | Self::Failed { identity, .. } => Some(identity),
        }
    }

    pub fn applied(&self) -> &[&'static str] {
        match self {
            Self::Mutated { applied, .. } => applied,
            _ => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

pub struct PodMutator {
    identifier: Box<dyn PodIdentifier>,
    syntax: AnnotationSyntax,
    handlers: Vec<Box<dyn Handler>>,
}

impl PodMutator {
    pub fn builder() -> PodMutatorBuilder {
        PodMutatorBuilder::default()
    }

    /// Default syntax and identity label with the shipped handlers.
    pub fn standard() -> Self {
        let mut builder = Self::builder();
        for feature in DEFAULT_HANDLERS {
            if let Some(h) = handler::builtin(feature) {
                builder = builder.boxed_handler(h);
            }
        }
        builder.build()
    }

    pub fn from_conf(conf: &SpoditorConf) -> Result<Self> {
        conf.validate()?;

        let mut builder = Self::builder()
            .syntax(conf.annotation_syntax()?)
            .identifier(LabelIdentifier::new(conf.identity.label.clone()));

        for feature in &conf.pipeline.handlers {
            let h = handler::builtin(feature).ok_or_else(|| {
                SpoditorError::ConfigError(format!("Unknown handler '{}'", feature))
            })?;
            builder = builder.boxed_handler(h);
        }

        let mutator = builder.build();
        tracing::info!(handlers = ?mutator.handler_names(), "mutation pipeline ready");
        Ok(mutator)
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn syntax(&self) -> &AnnotationSyntax {
        &self.syntax
    }

    pub fn mutate(&self, pod: &Pod) -> MutationOutcome {
        let identity = match self.identifier.extract(&pod.metadata) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::debug!(pod = ?pod.metadata.name, reason = %e, "not a StatefulSet pod, skipping");
                return MutationOutcome::NotStatefulSet(e);
            }
        };

        let annotations = self.syntax.collect(&pod.metadata);
        for (name, _) in annotations.iter() {
            if !self.handlers.iter().any(|h| h.name() == name.feature) {
                tracing::debug!(annotation = %name, "no handler registered for feature");
            }
        }

        let mut mutated = pod.clone();
        let mut applied = Vec::new();

        let Some(spec) = mutated.spec.as_mut() else {
            tracing::warn!(pod = %identity, "pod has no spec, nothing to mutate");
            return MutationOutcome::Mutated {
                identity,
                pod: Box::new(mutated),
                applied,
            };
        };

        for h in &self.handlers {
            match h.apply(&annotations, spec, identity.ordinal) {
                Ok(HandlerOutcome::Applied) => {
                    tracing::info!(pod = %identity, feature = h.name(), "applied mutation");
                    applied.push(h.name());
                }
                Ok(HandlerOutcome::Excluded) | Ok(HandlerOutcome::NotConfigured) => {}
                Err(error) => {
                    tracing::error!(
                        pod = %identity,
                        feature = h.name(),
                        error = %error,
                        "mutation failed, admitting pod unchanged"
                    );
                    return MutationOutcome::Failed {
                        identity,
                        feature: h.name(),
                        error,
                    };
                }
            }
        }

        MutationOutcome::Mutated {
            identity,
            pod: Box::new(mutated),
            applied,
        }
    }

    /// Runs the pipeline and returns the pod to admit.
    pub fn admit(&self, pod: Pod) -> Pod {
        self.mutate(&pod).into_admitted(pod)
    }
}

impl Default for PodMutator {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Default)]
pub struct PodMutatorBuilder {
    identifier: Option<Box<dyn PodIdentifier>>,
    syntax: Option<AnnotationSyntax>,
    handlers: Vec<Box<dyn Handler>>,
}

impl PodMutatorBuilder {
    pub fn identifier(mut self, identifier: impl PodIdentifier + 'static) -> Self {
        self.identifier = Some(Box::new(identifier));
        self
    }

    pub fn syntax(mut self, syntax: AnnotationSyntax) -> Self {
        self.syntax = Some(syntax);
        self
    }

    /// Handlers run in the order they are added.
    pub fn handler(self, handler: impl Handler + 'static) -> Self {
        self.boxed_handler(Box::new(handler))
    }

    pub fn boxed_handler(mut self, handler: Box<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn build(self) -> PodMutator {
        PodMutator {
            identifier: self
                .identifier
                .unwrap_or_else(|| Box::new(LabelIdentifier::default())),
            syntax: self.syntax.unwrap_or_default(),
            handlers: self.handlers,
        }
    }
}
