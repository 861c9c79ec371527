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

// CLI command definitions

use super::mutate::MutateCommand;
use super::preview::PreviewCommand;
use crate::domain::config::{apply_to_conf, parse_dynamic_configs, SpoditorConf};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "spoditor",
    version,
    about = "Ordinal-aware pod mutation for Kubernetes StatefulSets",
    long_about = "Applies spoditor.io/* annotations to StatefulSet pods the way the admission webhook does, for debugging and previewing annotations offline"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Run the mutation pipeline against a single pod
    Mutate(MutateCommand),

    /// Show what every pod of a StatefulSet would receive
    Preview(PreviewCommand),
}

/// Loads the config file (explicit, `$SPODITOR_CONF_FILE`, default location
/// or built-in defaults) and applies `-D` overrides on top.
pub(crate) fn resolve_conf(
    config_file: Option<&str>,
    properties: &[String],
) -> anyhow::Result<SpoditorConf> {
    let mut conf = SpoditorConf::load(config_file)?;

    if !properties.is_empty() {
        let dynamic_configs = parse_dynamic_configs(properties)?;
        apply_to_conf(&dynamic_configs, &mut conf);
    }

    conf.validate()?;
    Ok(conf)
}
