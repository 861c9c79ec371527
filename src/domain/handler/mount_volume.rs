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

//! `mount-volume`: per-ordinal ConfigMap and Secret volumes
//!
//! ```json
//! {
//!   "volumes": [{"name":"cfg","configMap":{"name":"app-config"}}],
//!   "containers": [{"name":"app","volumeMounts":[{"name":"cfg","mountPath":"/etc/app"}]}]
//! }
//! ```
//!
//! Pod `k` mounts ConfigMap `app-config-k`. Volumes and mounts are appended,
//! so applying the same configuration twice duplicates them.

use super::{parse_single, AnnotationHandler, Qualified};
use crate::domain::annotation::QualifiedAnnotations;
use crate::infrastructure::constants::FEATURE_MOUNT_VOLUME;
use crate::shared::error::MutationError;
use k8s_openapi::api::core::v1::{PodSpec, Volume, VolumeMount};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MountVolumeConfig {
    #[serde(default)]
    pub volumes: Vec<Volume>,
    #[serde(default)]
    pub containers: Vec<ContainerMounts>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerMounts {
    pub name: String,
    #[serde(default)]
    pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MountVolumeHandler;

impl MountVolumeHandler {
    pub fn new() -> Self {
        Self
    }
}

impl AnnotationHandler for MountVolumeHandler {
    type Config = MountVolumeConfig;

    fn feature(&self) -> &'static str {
        FEATURE_MOUNT_VOLUME
    }

    fn parse(
        &self,
        annotations: &QualifiedAnnotations,
    ) -> Result<Option<Qualified<MountVolumeConfig>>, MutationError> {
        let parsed: Option<Qualified<MountVolumeConfig>> =
            parse_single(FEATURE_MOUNT_VOLUME, annotations)?;

        Ok(parsed.filter(|config| {
            let has_volumes = !config.value.volumes.is_empty();
            if !has_volumes {
                tracing::info!(qualifier = %config.qualifier, "configuration has no volumes, skipping");
            }
            has_volumes
        }))
    }

    fn mutate(
        &self,
        spec: &mut PodSpec,
        ordinal: u32,
        config: &Qualified<MountVolumeConfig>,
    ) -> Result<(), MutationError> {
        if !config.applies_to(ordinal) {
            return Ok(());
        }

        let volumes = config
            .value
            .volumes
            .iter()
            .map(|volume| qualify_volume(volume, ordinal));
        spec.volumes.get_or_insert_with(Vec::new).extend(volumes);

        for declared in &config.value.containers {
            let mut matched = false;

            for container in spec
                .containers
                .iter_mut()
                .filter(|c| c.name == declared.name)
            {
                matched = true;
                tracing::info!(
                    container = %declared.name,
                    mounts = declared.volume_mounts.len(),
                    "adding volume mounts"
                );
                container
                    .volume_mounts
                    .get_or_insert_with(Vec::new)
                    .extend(declared.volume_mounts.iter().cloned());
            }

            if !matched {
                tracing::debug!(container = %declared.name, "container not found in pod, skipping");
            }
        }

        Ok(())
    }
}

/// Copies `volume`, suffixing ConfigMap and Secret references with the ordinal.
pub fn qualify_volume(volume: &Volume, ordinal: u32) -> Volume {
    let mut volume = volume.clone();

    if let Some(config_map) = volume.config_map.as_mut() {
        if !config_map.name.is_empty() {
            let renamed = ordinal_name(&config_map.name, ordinal);
            tracing::info!(volume = %volume.name, from = %config_map.name, to = %renamed, "renaming configmap reference");
            config_map.name = renamed;
        }
    }

    if let Some(secret_name) = volume
        .secret
        .as_mut()
        .and_then(|secret| secret.secret_name.as_mut())
    {
        if !secret_name.is_empty() {
            let renamed = ordinal_name(secret_name, ordinal);
            tracing::info!(volume = %volume.name, from = %secret_name, to = %renamed, "renaming secret reference");
            *secret_name = renamed;
        }
    }

    volume
}

fn ordinal_name(name: &str, ordinal: u32) -> String {
    format!("{}-{}", name, ordinal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::annotation::QualifiedName;
    use k8s_openapi::api::core::v1::{
        ConfigMapVolumeSource, Container, EmptyDirVolumeSource, SecretVolumeSource,
    };

    fn config_map_volume(name: &str, config_map: &str) -> Volume {
        Volume {
            name: name.to_string(),
            config_map: Some(ConfigMapVolumeSource {
                name: config_map.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn mount(name: &str, path: &str) -> VolumeMount {
        VolumeMount {
            name: name.to_string(),
            mount_path: path.to_string(),
            ..Default::default()
        }
    }

    fn app_spec() -> PodSpec {
        PodSpec {
            containers: vec![Container {
                name: "app".to_string(),
                volume_mounts: Some(vec![mount("data", "/data")]),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn app_config(qualifier: &str) -> Qualified<MountVolumeConfig> {
        Qualified::new(
            qualifier,
            MountVolumeConfig {
                volumes: vec![config_map_volume("cfg", "app-config")],
                containers: vec![ContainerMounts {
                    name: "app".to_string(),
                    volume_mounts: vec![mount("cfg", "/etc/app")],
                }],
            },
        )
    }

    #[test]
    fn test_mount_renames_config_map() {
        let mut spec = app_spec();
        MountVolumeHandler.mutate(&mut spec, 2, &app_config("")).unwrap();

        let volumes = spec.volumes.as_ref().unwrap();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].config_map.as_ref().unwrap().name, "app-config-2");

        let mounts = spec.containers[0].volume_mounts.as_ref().unwrap();
        assert_eq!(mounts, &vec![mount("data", "/data"), mount("cfg", "/etc/app")]);
    }

    #[test]
    fn test_mount_renames_secret() {
        let volume = Volume {
            name: "tls".to_string(),
            secret: Some(SecretVolumeSource {
                secret_name: Some("server-tls".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let qualified = qualify_volume(&volume, 5);
        assert_eq!(
            qualified.secret.unwrap().secret_name.as_deref(),
            Some("server-tls-5")
        );
        // source untouched
        assert_eq!(
            volume.secret.unwrap().secret_name.as_deref(),
            Some("server-tls")
        );
    }

    #[test]
    fn test_other_volume_types_are_copied() {
        let volume = Volume {
            name: "scratch".to_string(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        };
        assert_eq!(qualify_volume(&volume, 1), volume);
    }

    #[test]
    fn test_qualifier_excludes_pod() {
        let mut spec = app_spec();
        MountVolumeHandler
            .mutate(&mut spec, 3, &app_config("0-2"))
            .unwrap();
        assert_eq!(spec, app_spec());
    }

    #[test]
    fn test_reapplying_accumulates() {
        let mut spec = app_spec();
        let config = app_config("");
        MountVolumeHandler.mutate(&mut spec, 0, &config).unwrap();
        MountVolumeHandler.mutate(&mut spec, 0, &config).unwrap();

        assert_eq!(spec.volumes.as_ref().unwrap().len(), 2);
        assert_eq!(spec.containers[0].volume_mounts.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_unknown_container_gets_no_mounts() {
        let mut spec = PodSpec {
            containers: vec![Container {
                name: "other".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        MountVolumeHandler.mutate(&mut spec, 0, &app_config("")).unwrap();

        assert_eq!(spec.volumes.as_ref().unwrap().len(), 1);
        assert!(spec.containers[0].volume_mounts.is_none());
    }

    #[test]
    fn test_parse() {
        let mut annotations = QualifiedAnnotations::new();
        annotations.insert(
            QualifiedName::new("mount-volume", "0-2"),
            r#"{"volumes":[{"name":"cfg","configMap":{"name":"app-config"}}],
                "containers":[{"name":"app","volumeMounts":[{"name":"cfg","mountPath":"/etc/app"}]}]}"#,
        );

        let parsed = MountVolumeHandler.parse(&annotations).unwrap().unwrap();
        assert_eq!(parsed, app_config("0-2"));
    }

    #[test]
    fn test_parse_without_volumes_is_absent() {
        let mut annotations = QualifiedAnnotations::new();
        annotations.insert(
            QualifiedName::unqualified("mount-volume"),
            r#"{"volumes":[],"containers":[{"name":"app","volumeMounts":[]}]}"#,
        );
        assert!(MountVolumeHandler.parse(&annotations).unwrap().is_none());
    }

    #[test]
    fn test_parse_schema_mismatch() {
        let mut annotations = QualifiedAnnotations::new();
        annotations.insert(
            QualifiedName::unqualified("mount-volume"),
            r#"{"volumes":"cfg"}"#,
        );
        let err = MountVolumeHandler.parse(&annotations).unwrap_err();
        assert!(err.is_parse_error());
    }
}
