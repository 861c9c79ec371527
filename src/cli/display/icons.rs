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

//! Status icons for CLI output

use super::table::PreviewStatus;

/// Status icons for different states
pub struct StatusIcon;

impl StatusIcon {
    /// At least one handler applied
    pub const SUCCESS: &'static str = "✓";

    /// Pipeline ran, nothing matched this ordinal
    pub const UNCHANGED: &'static str = "·";

    /// Pipeline failed, original pod admitted
    pub const ERROR: &'static str = "✗";

    /// Not a StatefulSet pod
    pub const UNKNOWN: &'static str = "?";

    pub fn for_status(status: &PreviewStatus) -> &'static str {
        match status {
            PreviewStatus::Mutated => Self::SUCCESS,
            PreviewStatus::Unchanged => Self::UNCHANGED,
            PreviewStatus::Failed(_) => Self::ERROR,
            PreviewStatus::Skipped(_) => Self::UNKNOWN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_status() {
        assert_eq!(StatusIcon::for_status(&PreviewStatus::Mutated), StatusIcon::SUCCESS);
        assert_eq!(StatusIcon::for_status(&PreviewStatus::Unchanged), StatusIcon::UNCHANGED);
        assert_eq!(
            StatusIcon::for_status(&PreviewStatus::Failed("bad".to_string())),
            StatusIcon::ERROR
        );
        assert_eq!(
            StatusIcon::for_status(&PreviewStatus::Skipped("no label".to_string())),
            StatusIcon::UNKNOWN
        );
    }
}
