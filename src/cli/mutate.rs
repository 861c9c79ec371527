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
use super::display::StatusIcon;
use crate::domain::pipeline::{MutationOutcome, PodMutator};
use crate::infrastructure::kubernetes::manifest;
use crate::infrastructure::kubernetes::{SpoditorKubeClient, SpoditorKubeClientImpl};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use k8s_openapi::api::core::v1::Pod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
    /// RFC 6902 patch from the input pod to the admitted pod
    Patch,
}

#[derive(Parser, Debug, Clone)]
pub struct MutateCommand {
    /// Pod manifest file (YAML or JSON)
    #[arg(long, short = 'f', required_unless_present = "pod", conflicts_with = "pod")]
    pub file: Option<String>,

    /// Fetch a live pod from the cluster instead of reading a file
    #[arg(long)]
    pub pod: Option<String>,

    /// Kubernetes namespace
    #[arg(long, short = 'n', default_value = "default")]
    pub namespace: String,

    /// Path to kubeconfig file
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Kubernetes context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Output format
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Yaml)]
    pub output: OutputFormat,

    /// Exit with an error when the pipeline fails instead of printing the unmodified pod
    #[arg(long)]
    pub strict: bool,

    /// Path to spoditor configuration file (spoditor.toml)
    #[arg(long, value_name = "PATH")]
    pub config_file: Option<String>,

    /// Dynamic configuration properties (-D key=value)
    ///
    /// Keys: spoditor.annotation.prefix, spoditor.annotation.separator,
    /// spoditor.identity.label, spoditor.pipeline.handlers (comma-separated)
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

impl MutateCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let conf = resolve_conf(self.config_file.as_deref(), &self.properties)?;
        let mutator = PodMutator::from_conf(&conf)?;

        let pod = self.load_pod().await?;
        let outcome = mutator.mutate(&pod);
        let failed = report(&pod, &outcome);

        if self.strict {
            if let MutationOutcome::Failed { feature, error, .. } = &outcome {
                anyhow::bail!("{} handler failed: {}", feature, error);
            }
        }

        let admitted = outcome.into_admitted(pod.clone());
        println!("{}", render(&pod, &admitted, self.output)?);

        if failed {
            eprintln!("{}", "Pod would be admitted unmodified".yellow());
        }

        Ok(())
    }

    async fn load_pod(&self) -> anyhow::Result<Pod> {
        if let Some(ref file) = self.file {
            return Ok(manifest::load_pod(file)?);
        }

        let name = self
            .pod
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("either --file or --pod is required"))?;

        let client = SpoditorKubeClientImpl::new_with_config(
            self.namespace.clone(),
            self.kubeconfig.clone(),
            self.context.clone(),
        )
        .await?;

        Ok(client.get_pod(name).await?)
    }
}

/// Prints a one-line summary to stderr; returns whether the pipeline failed.
fn report(pod: &Pod, outcome: &MutationOutcome) -> bool {
    let name = pod.metadata.name.as_deref().unwrap_or("<unnamed>");

    match outcome {
        MutationOutcome::NotStatefulSet(reason) => {
            eprintln!("{} {}: skipped ({})", StatusIcon::UNKNOWN.yellow(), name, reason);
            false
        }
        MutationOutcome::Mutated { identity, applied, .. } if applied.is_empty() => {
            eprintln!(
                "{} {}: no annotations apply to ordinal {}",
                StatusIcon::UNCHANGED.bright_black(),
                identity,
                identity.ordinal
            );
            false
        }
        MutationOutcome::Mutated { identity, applied, .. } => {
            eprintln!(
                "{} {}: applied {}",
                StatusIcon::SUCCESS.green(),
                identity,
                applied.join(", ")
            );
            false
        }
        MutationOutcome::Failed {
            identity,
            feature,
            error,
        } => {
            eprintln!("{} {}: {} failed: {}", StatusIcon::ERROR.red(), identity, feature, error);
            true
        }
    }
}

pub fn render(original: &Pod, admitted: &Pod, format: OutputFormat) -> anyhow::Result<String> {
    let output = match format {
        OutputFormat::Yaml => serde_yaml::to_string(admitted)?,
        OutputFormat::Json => serde_json::to_string_pretty(admitted)?,
        OutputFormat::Patch => {
            let patch = manifest::admission_patch(original, admitted)?;
            serde_json::to_string_pretty(&patch)?
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{Container, PodSpec};

    fn pod(image: Option<&str>) -> Pod {
        Pod {
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "web".to_string(),
                    image: image.map(|i| i.to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_formats() {
        let original = pod(None);
        let admitted = pod(Some("nginx"));

        let yaml = render(&original, &admitted, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("image: nginx"));

        let json = render(&original, &admitted, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["spec"]["containers"][0]["image"], "nginx");

        let patch = render(&original, &admitted, OutputFormat::Patch).unwrap();
        let ops: serde_json::Value = serde_json::from_str(&patch).unwrap();
        assert_eq!(ops.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_render_patch_unchanged() {
        let original = pod(None);
        let patch = render(&original, &original, OutputFormat::Patch).unwrap();
        assert_eq!(patch.trim(), "[]");
    }
}
