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

//! Table rendering for CLI output

use super::{ColorTheme, StatusIcon};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewStatus {
    Mutated,
    Unchanged,
    /// Pipeline error; the pod would be admitted unmodified.
    Failed(String),
    Skipped(String),
}

impl PreviewStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mutated => "Mutated",
            Self::Unchanged => "Unchanged",
            Self::Failed(_) => "Failed",
            Self::Skipped(_) => "Skipped",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Failed(d) | Self::Skipped(d) => Some(d),
            _ => None,
        }
    }
}

/// One pod of a StatefulSet preview
#[derive(Debug, Clone)]
pub struct PreviewRow {
    pub pod: String,
    pub ordinal: Option<u32>,
    pub applied: Vec<String>,
    /// `container/port=hostPort`
    pub host_ports: Vec<String>,
    /// Volumes added by the pipeline, `name=source`
    pub volumes: Vec<String>,
    pub status: PreviewStatus,
}

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    /// Create a new table renderer with default theme
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    pub fn render_preview(&self, statefulset: &str, namespace: &str, rows: &[PreviewRow]) -> String {
        if rows.is_empty() {
            return format!("StatefulSet '{}' has no replicas to preview", statefulset);
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("POD").set_alignment(CellAlignment::Left),
                Cell::new("ORDINAL").set_alignment(CellAlignment::Center),
                Cell::new("APPLIED").set_alignment(CellAlignment::Left),
                Cell::new("HOST PORTS").set_alignment(CellAlignment::Left),
                Cell::new("VOLUMES").set_alignment(CellAlignment::Left),
                Cell::new("STATUS").set_alignment(CellAlignment::Center),
            ]);

        for row in rows {
            let ordinal = row
                .ordinal
                .map(|o| o.to_string())
                .unwrap_or_else(|| "-".to_string());

            table.add_row(vec![
                Cell::new(&row.pod),
                Cell::new(ordinal).set_alignment(CellAlignment::Center),
                Cell::new(join_or_dash(&row.applied)).fg(self.theme.info),
                Cell::new(join_or_dash(&row.host_ports)),
                Cell::new(join_or_dash(&row.volumes)),
                Cell::new(format!(
                    "{} {}",
                    StatusIcon::for_status(&row.status),
                    row.status.label()
                ))
                .fg(self.theme.status_color(&row.status)),
            ]);
        }

        let mut output = String::new();
        output.push_str(&format!(
            "╭─ {}/{} {} ─╮\n",
            namespace,
            statefulset,
            format!("[{} pods]", rows.len()).bright_black()
        ));
        output.push_str(&table.to_string());
        output.push('\n');

        for row in rows {
            if let Some(detail) = row.status.detail() {
                output.push_str(&format!(
                    "{} {}: {}\n",
                    StatusIcon::for_status(&row.status).red(),
                    row.pod,
                    detail
                ));
            }
        }

        output.push_str(&format!(
            "Legend: {} Mutated  {} Unchanged  {} Failed (admitted unmodified)\n",
            StatusIcon::SUCCESS.green(),
            StatusIcon::UNCHANGED.bright_black(),
            StatusIcon::ERROR.red()
        ));

        output
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pod: &str, ordinal: u32, status: PreviewStatus) -> PreviewRow {
        PreviewRow {
            pod: pod.to_string(),
            ordinal: Some(ordinal),
            applied: vec!["host-port".to_string()],
            host_ports: vec!["web/http=30000".to_string()],
            volumes: Vec::new(),
            status,
        }
    }

    #[test]
    fn test_render_empty_preview() {
        let output = TableRenderer::new().render_preview("web", "default", &[]);
        assert!(output.contains("no replicas"));
    }

    #[test]
    fn test_render_preview() {
        colored::control::set_override(false);
        let rows = vec![
            row("web-0", 0, PreviewStatus::Mutated),
            row("web-1", 1, PreviewStatus::Failed("invalid 'host-port' configuration".to_string())),
        ];

        let output = TableRenderer::new().render_preview("web", "demo", &rows);
        assert!(output.contains("demo/web"));
        assert!(output.contains("[2 pods]"));
        assert!(output.contains("web/http=30000"));
        assert!(output.contains("✓ Mutated"));
        assert!(output.contains("web-1: invalid 'host-port' configuration"));
    }

    #[test]
    fn test_status_detail() {
        assert_eq!(PreviewStatus::Mutated.detail(), None);
        assert_eq!(PreviewStatus::Skipped("no label".to_string()).detail(), Some("no label"));
    }
}
