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

use crate::shared::error::{Result, SpoditorError};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Reads a YAML or JSON manifest into `T`.
pub fn load_manifest<T: DeserializeOwned>(file_path: &str) -> Result<T> {
    let path = resolve_manifest_path(file_path)?;

    if !path.exists() {
        return Err(SpoditorError::ConfigError(format!(
            "Manifest file does not exist: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path).map_err(|e| {
        SpoditorError::ConfigError(format!(
            "Failed to read manifest file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_manifest(&content).map_err(|e| {
        SpoditorError::InvalidManifest(format!("{}: {}", path.display(), e))
    })
}

/// YAML is a superset of JSON, so one parser covers both.
pub fn parse_manifest<T: DeserializeOwned>(content: &str) -> Result<T> {
    Ok(serde_yaml::from_str(content)?)
}

pub fn load_pod(file_path: &str) -> Result<Pod> {
    let pod: Pod = load_manifest(file_path)?;

    if pod.spec.is_none() {
        return Err(SpoditorError::InvalidManifest(format!(
            "Pod manifest {} is missing spec section",
            file_path
        )));
    }

    Ok(pod)
}

pub fn load_statefulset(file_path: &str) -> Result<StatefulSet> {
    load_manifest(file_path)
}

pub fn resolve_manifest_path(path: &str) -> Result<PathBuf> {
    let path = PathBuf::from(path);

    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()
            .map_err(|e| {
                SpoditorError::ConfigError(format!("Cannot get current directory: {}", e))
            })?
            .join(path))
    }
}

/// Builds the pods the StatefulSet controller would create, one per ordinal,
/// labelled with `identity_label` the way the controller labels them.
///
/// `replicas` overrides `spec.replicas`; a StatefulSet without either has one replica.
pub fn pods_for_statefulset(
    statefulset: &StatefulSet,
    replicas: Option<u32>,
    identity_label: &str,
) -> Result<Vec<Pod>> {
    let name = statefulset
        .metadata
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| SpoditorError::InvalidManifest("StatefulSet has no name".to_string()))?;

    let spec = statefulset.spec.as_ref().ok_or_else(|| {
        SpoditorError::InvalidManifest(format!("StatefulSet '{}' has no spec", name))
    })?;

    let replicas = match replicas {
        Some(r) => r,
        None => {
            let declared = spec.replicas.unwrap_or(1);
            u32::try_from(declared).map_err(|_| {
                SpoditorError::InvalidManifest(format!(
                    "StatefulSet '{}' has negative replicas: {}",
                    name, declared
                ))
            })?
        }
    };

    let template_meta = spec.template.metadata.clone().unwrap_or_default();

    let pods = (0..replicas)
        .map(|ordinal| {
            let pod_name = format!("{}-{}", name, ordinal);

            let mut labels = template_meta.labels.clone().unwrap_or_default();
            labels.insert(identity_label.to_string(), pod_name.clone());

            Pod {
                metadata: ObjectMeta {
                    name: Some(pod_name),
                    namespace: statefulset.metadata.namespace.clone(),
                    labels: Some(labels),
                    annotations: template_meta.annotations.clone(),
                    ..Default::default()
                },
                spec: spec.template.spec.clone(),
                ..Default::default()
            }
        })
        .collect();

    Ok(pods)
}

/// RFC 6902 patch turning `original` into `admitted`, as an admission
/// response carries it. Empty when nothing changed.
pub fn admission_patch(original: &Pod, admitted: &Pod) -> Result<json_patch::Patch> {
    let from = serde_json::to_value(original)?;
    let to = serde_json::to_value(admitted)?;
    Ok(json_patch::diff(&from, &to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const STATEFULSET: &str = r#"
apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: web
  namespace: demo
spec:
  replicas: 3
  serviceName: web
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
      annotations:
        spoditor.io/host-port: '{"containers":[]}'
    spec:
      containers:
        - name: web
          image: nginx
"#;

    #[test]
    fn test_load_pod_yaml_and_json() {
        let mut yaml = NamedTempFile::new().unwrap();
        writeln!(
            yaml,
            "apiVersion: v1\nkind: Pod\nmetadata:\n  name: web-0\nspec:\n  containers:\n    - name: web\n"
        )
        .unwrap();
        let pod = load_pod(yaml.path().to_str().unwrap()).unwrap();
        assert_eq!(pod.metadata.name.as_deref(), Some("web-0"));

        let mut json = NamedTempFile::new().unwrap();
        writeln!(
            json,
            r#"{{"apiVersion":"v1","kind":"Pod","metadata":{{"name":"web-1"}},"spec":{{"containers":[{{"name":"web"}}]}}}}"#
        )
        .unwrap();
        let pod = load_pod(json.path().to_str().unwrap()).unwrap();
        assert_eq!(pod.spec.unwrap().containers[0].name, "web");
    }

    #[test]
    fn test_load_pod_without_spec() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "apiVersion: v1\nkind: Pod\nmetadata:\n  name: web-0\n").unwrap();

        let err = load_pod(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SpoditorError::InvalidManifest(_)));
    }

    #[test]
    fn test_load_missing_manifest() {
        let err = load_pod("/nonexistent/pod.yaml").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_pods_for_statefulset() {
        let sts: StatefulSet = parse_manifest(STATEFULSET).unwrap();
        let pods = pods_for_statefulset(&sts, None, "statefulset.kubernetes.io/pod-name").unwrap();

        assert_eq!(pods.len(), 3);
        for (i, pod) in pods.iter().enumerate() {
            let expected = format!("web-{}", i);
            assert_eq!(pod.metadata.name.as_deref(), Some(expected.as_str()));
            assert_eq!(pod.metadata.namespace.as_deref(), Some("demo"));

            let labels = pod.metadata.labels.as_ref().unwrap();
            assert_eq!(labels.get("app").map(String::as_str), Some("web"));
            assert_eq!(
                labels.get("statefulset.kubernetes.io/pod-name"),
                Some(&expected)
            );
            assert!(pod
                .metadata
                .annotations
                .as_ref()
                .unwrap()
                .contains_key("spoditor.io/host-port"));
        }
    }

    #[test]
    fn test_pods_for_statefulset_replica_override() {
        let sts: StatefulSet = parse_manifest(STATEFULSET).unwrap();
        let pods = pods_for_statefulset(&sts, Some(1), "example.com/pod").unwrap();

        assert_eq!(pods.len(), 1);
        let labels = pods[0].metadata.labels.as_ref().unwrap();
        assert_eq!(labels.get("example.com/pod").map(String::as_str), Some("web-0"));
    }

    #[test]
    fn test_pods_for_statefulset_requires_name() {
        let mut sts: StatefulSet = parse_manifest(STATEFULSET).unwrap();
        sts.metadata.name = None;
        assert!(pods_for_statefulset(&sts, None, "l").is_err());
    }

    #[test]
    fn test_admission_patch() {
        let original: Pod = parse_manifest(
            "apiVersion: v1\nkind: Pod\nmetadata:\n  name: web-0\nspec:\n  containers:\n    - name: web\n",
        )
        .unwrap();

        assert!(admission_patch(&original, &original).unwrap().0.is_empty());

        let mut admitted = original.clone();
        admitted.spec.as_mut().unwrap().containers[0].image = Some("nginx".to_string());

        let patch = admission_patch(&original, &admitted).unwrap();
        let ops = serde_json::to_value(&patch).unwrap();
        assert_eq!(ops[0]["op"], "add");
        assert_eq!(ops[0]["path"], "/spec/containers/0/image");
        assert_eq!(ops[0]["value"], "nginx");
    }
}
