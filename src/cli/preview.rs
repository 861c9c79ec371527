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

use super::commands::resolve_conf;
use super::display::{PreviewRow, PreviewStatus, TableRenderer};
use crate::domain::pipeline::{MutationOutcome, PodMutator};
use crate::infrastructure::kubernetes::manifest;
use crate::infrastructure::kubernetes::{SpoditorKubeClient, SpoditorKubeClientImpl};
use clap::Parser;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{Pod, Volume};

#[derive(Parser, Debug, Clone)]
pub struct PreviewCommand {
    /// StatefulSet manifest file (YAML or JSON)
    #[arg(
        long,
        short = 'f',
        required_unless_present = "statefulset",
        conflicts_with = "statefulset"
    )]
    pub file: Option<String>,

    /// Fetch the StatefulSet from the cluster by name
    #[arg(long, short = 's')]
    pub statefulset: Option<String>,

    /// Kubernetes namespace
    #[arg(long, short = 'n', default_value = "default")]
    pub namespace: String,

    /// Path to kubeconfig file
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Kubernetes context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Number of ordinals to preview (defaults to spec.replicas)
    #[arg(long)]
    pub replicas: Option<u32>,

    /// Path to spoditor configuration file (spoditor.toml)
    #[arg(long, value_name = "PATH")]
    pub config_file: Option<String>,

    /// Dynamic configuration properties (-D key=value)
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

impl PreviewCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let conf = resolve_conf(self.config_file.as_deref(), &self.properties)?;
        let mutator = PodMutator::from_conf(&conf)?;

        let statefulset = self.load_statefulset().await?;
        let pods = manifest::pods_for_statefulset(&statefulset, self.replicas, &conf.identity.label)?;

        let rows = preview_rows(&mutator, &pods);

        let name = statefulset.metadata.name.as_deref().unwrap_or_default();
        let namespace = statefulset
            .metadata
            .namespace
            .as_deref()
            .unwrap_or(&self.namespace);

        let renderer = TableRenderer::new();
        println!("{}", renderer.render_preview(name, namespace, &rows));

        Ok(())
    }

    async fn load_statefulset(&self) -> anyhow::Result<StatefulSet> {
        if let Some(ref file) = self.file {
            return Ok(manifest::load_statefulset(file)?);
        }

        let name = self
            .statefulset
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("either --file or --statefulset is required"))?;

        let client = SpoditorKubeClientImpl::new_with_config(
            self.namespace.clone(),
            self.kubeconfig.clone(),
            self.context.clone(),
        )
        .await?;

        Ok(client.get_statefulset(name).await?)
    }
}

pub fn preview_rows(mutator: &PodMutator, pods: &[Pod]) -> Vec<PreviewRow> {
    pods.iter()
        .map(|pod| preview_row(pod, mutator.mutate(pod)))
        .collect()
}

pub fn preview_row(original: &Pod, outcome: MutationOutcome) -> PreviewRow {
    let pod = original.metadata.name.clone().unwrap_or_default();
    let ordinal = outcome.identity().map(|i| i.ordinal);
    let applied: Vec<String> = outcome.applied().iter().map(|a| a.to_string()).collect();

    let status = match &outcome {
        MutationOutcome::NotStatefulSet(reason) => PreviewStatus::Skipped(reason.to_string()),
        MutationOutcome::Failed { feature, error, .. } => {
            PreviewStatus::Failed(format!("{}: {}", feature, error))
        }
        MutationOutcome::Mutated { .. } if applied.is_empty() => PreviewStatus::Unchanged,
        MutationOutcome::Mutated { .. } => PreviewStatus::Mutated,
    };

    let admitted = outcome.into_admitted(original.clone());

    PreviewRow {
        pod,
        ordinal,
        applied,
        host_ports: host_ports(&admitted),
        volumes: added_volumes(original, &admitted),
        status,
    }
}

fn host_ports(pod: &Pod) -> Vec<String> {
    let Some(spec) = pod.spec.as_ref() else {
        return Vec::new();
    };

    spec.containers
        .iter()
        .flat_map(|c| {
            c.ports.iter().flatten().filter_map(move |p| {
                p.host_port.map(|hp| {
                    format!(
                        "{}/{}={}",
                        c.name,
                        p.name.as_deref().unwrap_or("-"),
                        hp
                    )
                })
            })
        })
        .collect()
}

/// Volumes are only ever appended, so anything past the original count is new.
fn added_volumes(original: &Pod, admitted: &Pod) -> Vec<String> {
    let volumes = |pod: &Pod| -> Vec<Volume> {
        pod.spec
            .as_ref()
            .and_then(|s| s.volumes.clone())
            .unwrap_or_default()
    };

    let before = volumes(original).len();
    volumes(admitted)
        .iter()
        .skip(before)
        .map(describe_volume)
        .collect()
}

fn describe_volume(volume: &Volume) -> String {
    if let Some(cm) = volume.config_map.as_ref() {
        format!("{}=configmap/{}", volume.name, cm.name)
    } else if let Some(name) = volume.secret.as_ref().and_then(|s| s.secret_name.as_ref()) {
        format!("{}=secret/{}", volume.name, name)
    } else {
        volume.name.clone()
    }
}
