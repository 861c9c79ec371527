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

use spoditor::cli::display::PreviewStatus;
use spoditor::cli::preview::preview_rows;
use spoditor::domain::config::{apply_to_conf, parse_dynamic_configs};
use spoditor::infrastructure::kubernetes::manifest;
use spoditor::*;
use std::io::Write;
use tempfile::NamedTempFile;

const STATEFULSET: &str = r#"
apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: kafka
  namespace: streaming
spec:
  replicas: 3
  serviceName: kafka
  selector:
    matchLabels:
      app: kafka
  template:
    metadata:
      labels:
        app: kafka
      annotations:
        spoditor.io/host-port: |
          {"containers":[{"name":"broker","ports":[{"name":"external","containerPort":9094,"hostPort":31090}]}]}
        spoditor.io/mount-volume_-1: |
          {"volumes":[{"name":"tls","secret":{"secretName":"kafka-tls"}}],
           "containers":[{"name":"broker","volumeMounts":[{"name":"tls","mountPath":"/etc/tls"}]}]}
    spec:
      containers:
        - name: broker
          image: example/kafka:3.7
          ports:
            - name: external
              containerPort: 9094
"#;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_statefulset_preview_end_to_end() {
    let file = write_temp(STATEFULSET);
    let statefulset = manifest::load_statefulset(file.path().to_str().unwrap()).unwrap();

    let conf = SpoditorConf::default();
    let pods =
        manifest::pods_for_statefulset(&statefulset, None, &conf.identity.label).unwrap();
    assert_eq!(pods.len(), 3);

    let mutator = PodMutator::from_conf(&conf).unwrap();
    let rows = preview_rows(&mutator, &pods);

    let ports: Vec<_> = rows.iter().map(|r| r.host_ports.clone()).collect();
    assert_eq!(
        ports,
        vec![
            vec!["broker/external=31090".to_string()],
            vec!["broker/external=31091".to_string()],
            vec!["broker/external=31092".to_string()],
        ]
    );

    assert_eq!(rows[0].volumes, vec!["tls=secret/kafka-tls-0"]);
    assert_eq!(rows[1].volumes, vec!["tls=secret/kafka-tls-1"]);
    assert!(rows[2].volumes.is_empty());
    assert!(rows.iter().all(|r| r.status == PreviewStatus::Mutated));
}

#[test]
fn test_admission_patch_for_synthesized_pod() {
    let file = write_temp(STATEFULSET);
    let statefulset = manifest::load_statefulset(file.path().to_str().unwrap()).unwrap();
    let pods = manifest::pods_for_statefulset(
        &statefulset,
        Some(1),
        "statefulset.kubernetes.io/pod-name",
    )
    .unwrap();

    let original = pods[0].clone();
    let admitted = PodMutator::standard().admit(original.clone());
    let patch = manifest::admission_patch(&original, &admitted).unwrap();
    let ops = serde_json::to_value(&patch).unwrap();

    let paths: Vec<&str> = ops
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|op| op["path"].as_str())
        .collect();
    assert!(paths.iter().any(|p| p.starts_with("/spec/volumes")));
    assert!(paths.iter().any(|p| p.starts_with("/spec/containers/0/env")));
    assert!(paths.iter().all(|p| p.starts_with("/spec/")));
}

#[test]
fn test_config_file_with_overrides() {
    let file = write_temp(
        r#"
[annotation]
prefix = "ordinals.example.com/"

[pipeline]
handlers = ["mount-volume"]
"#,
    );

    let mut conf = SpoditorConf::from(file.path().to_str().unwrap()).unwrap();
    let overrides = parse_dynamic_configs(&["spoditor.pipeline.handlers=host-port".to_string()])
        .unwrap();
    apply_to_conf(&overrides, &mut conf);

    let mutator = PodMutator::from_conf(&conf).unwrap();
    assert_eq!(mutator.handler_names(), vec!["host-port"]);
    assert_eq!(mutator.syntax().prefix(), "ordinals.example.com/");
}

#[test]
fn test_invalid_config_is_rejected() {
    let file = write_temp("[annotation]\nseparator = \"7\"\n");
    let conf = SpoditorConf::from(file.path().to_str().unwrap()).unwrap();

    let err = PodMutator::from_conf(&conf).err().unwrap();
    assert!(matches!(err, SpoditorError::ConfigError(_)));
}

#[test]
fn test_invalid_manifest_is_reported() {
    let file = write_temp("apiVersion: apps/v1\nkind: StatefulSet\nspec: [\n");
    let err = manifest::load_statefulset(file.path().to_str().unwrap()).unwrap_err();
    assert!(matches!(err, SpoditorError::InvalidManifest(_)));
}
