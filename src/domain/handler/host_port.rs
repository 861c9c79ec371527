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

//! `host-port`: per-ordinal host port bindings
//!
//! ```json
//! {"containers":[{"name":"web","ports":[{"name":"http","containerPort":8080,"hostPort":30000}]}]}
//! ```
//!
//! Pod `k` binds `hostPort + k`, and every matched container receives
//! `POD_ORDINAL` plus one `PORT_<name>` variable per bound port.

use super::{parse_single, upsert_env_var, AnnotationHandler, Qualified};
use crate::domain::annotation::QualifiedAnnotations;
use crate::infrastructure::constants::{
    ENV_POD_ORDINAL, ENV_PORT_PREFIX, FEATURE_HOST_PORT, MAX_HOST_PORT,
};
use crate::shared::error::MutationError;
use k8s_openapi::api::core::v1::{ContainerPort, EnvVar, PodSpec};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostPortConfig {
    #[serde(default)]
    pub containers: Vec<ContainerPorts>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerPorts {
    pub name: String,
    #[serde(default)]
    pub ports: Vec<ContainerPort>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HostPortHandler;

impl HostPortHandler {
    pub fn new() -> Self {
        Self
    }
}

impl AnnotationHandler for HostPortHandler {
    type Config = HostPortConfig;

    fn feature(&self) -> &'static str {
        FEATURE_HOST_PORT
    }

    fn parse(
        &self,
        annotations: &QualifiedAnnotations,
    ) -> Result<Option<Qualified<HostPortConfig>>, MutationError> {
        parse_single(FEATURE_HOST_PORT, annotations)
    }

    fn mutate(
        &self,
        spec: &mut PodSpec,
        ordinal: u32,
        config: &Qualified<HostPortConfig>,
    ) -> Result<(), MutationError> {
        if !config.applies_to(ordinal) {
            return Ok(());
        }

        for declared in &config.value.containers {
            let mut matched = false;

            for container in spec
                .containers
                .iter_mut()
                .filter(|c| c.name == declared.name)
            {
                matched = true;
                let mut port_env = Vec::new();

                for port in &declared.ports {
                    let base = port.host_port.unwrap_or_default();
                    if base <= 0 {
                        continue;
                    }

                    let port_name = port.name.clone().unwrap_or_default();
                    let effective =
                        effective_host_port(base, ordinal).ok_or_else(|| {
                            MutationError::HostPortOutOfRange {
                                container: declared.name.clone(),
                                port: port_name.clone(),
                                base,
                                ordinal,
                            }
                        })?;

                    let ports = container.ports.get_or_insert_with(Vec::new);
                    match ports.iter_mut().find(|p| p.name == port.name) {
                        Some(existing) => {
                            tracing::info!(
                                container = %declared.name,
                                port = %port_name,
                                old = ?existing.host_port,
                                new = effective,
                                "modifying hostPort"
                            );
                            existing.host_port = Some(effective);
                        }
                        None => {
                            tracing::info!(
                                container = %declared.name,
                                port = %port_name,
                                host_port = effective,
                                "adding port"
                            );
                            ports.push(ContainerPort {
                                host_port: Some(effective),
                                ..port.clone()
                            });
                        }
                    }

                    port_env.push(env_var(
                        format!("{}{}", ENV_PORT_PREFIX, port_name),
                        effective.to_string(),
                    ));
                }

                let env = container.env.get_or_insert_with(Vec::new);
                upsert_env_var(env, env_var(ENV_POD_ORDINAL.to_string(), ordinal.to_string()));
                for var in port_env {
                    upsert_env_var(env, var);
                }
            }

            if !matched {
                tracing::debug!(container = %declared.name, "container not found in pod, skipping");
            }
        }

        Ok(())
    }
}

/// `base + ordinal`, or `None` past the valid port range.
pub fn effective_host_port(base: i32, ordinal: u32) -> Option<i32> {
    i32::try_from(ordinal)
        .ok()
        .and_then(|o| base.checked_add(o))
        .filter(|port| *port <= MAX_HOST_PORT)
}

fn env_var(name: String, value: String) -> EnvVar {
    EnvVar {
        name,
        value: Some(value),
        ..Default::default()
    }
}
