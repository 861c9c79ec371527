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

//! Ordinal qualifiers
//!
//! A qualifier scopes an annotation to a subset of StatefulSet ordinals:
//!
//! | qualifier | matches            |
//! |-----------|--------------------|
//! | (empty)   | every ordinal      |
//! | `3`       | ordinal 3          |
//! | `1-5`     | 1 <= ordinal <= 5  |
//! | `3-`      | ordinal >= 3       |
//! | `-5`      | ordinal <= 5       |
//!
//! Anything else matches nothing.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)-([0-9]+)$").expect("valid range pattern"));
static EXACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid exact pattern"));
static LOWER_BOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)-$").expect("valid lower bound pattern"));
static UPPER_BOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-([0-9]+)$").expect("valid upper bound pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdinalQualifier {
    All,
    Range { min: u32, max: u32 },
    Exact(u32),
    AtLeast(u32),
    AtMost(u32),
    /// Syntactically invalid, or an exact value or lower bound past `u32::MAX`.
    Never,
}

impl OrdinalQualifier {
    /// Forms are tried in a fixed order; the first syntactic match wins.
    pub fn parse(qualifier: &str) -> Self {
        if qualifier.is_empty() {
            return Self::All;
        }

        if let Some(caps) = RANGE_RE.captures(qualifier) {
            return match caps[1].parse() {
                Ok(min) => Self::Range {
                    min,
                    max: upper_bound(&caps[2]),
                },
                Err(_) => Self::Never,
            };
        }

        if EXACT_RE.is_match(qualifier) {
            return qualifier.parse().map(Self::Exact).unwrap_or(Self::Never);
        }

        if let Some(caps) = LOWER_BOUND_RE.captures(qualifier) {
            return caps[1].parse().map(Self::AtLeast).unwrap_or(Self::Never);
        }

        if let Some(caps) = UPPER_BOUND_RE.captures(qualifier) {
            return Self::AtMost(upper_bound(&caps[1]));
        }

        Self::Never
    }

    pub fn matches(&self, ordinal: u32) -> bool {
        match *self {
            Self::All => true,
            // min > max is never satisfied, which is intended
            Self::Range { min, max } => min <= ordinal && ordinal <= max,
            Self::Exact(n) => ordinal == n,
            Self::AtLeast(min) => ordinal >= min,
            Self::AtMost(max) => ordinal <= max,
            Self::Never => false,
        }
    }
}

impl fmt::Display for OrdinalQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "*"),
            Self::Range { min, max } => write!(f, "{}-{}", min, max),
            Self::Exact(n) => write!(f, "{}", n),
            Self::AtLeast(min) => write!(f, "{}-", min),
            Self::AtMost(max) => write!(f, "-{}", max),
            Self::Never => write!(f, "<none>"),
        }
    }
}

/// Upper bounds past `u32::MAX` still admit every ordinal.
fn upper_bound(digits: &str) -> u32 {
    digits.parse().unwrap_or(u32::MAX)
}

/// Whether configuration scoped by `qualifier` applies to `ordinal`.
pub fn matches(ordinal: u32, qualifier: &str) -> bool {
    let parsed = OrdinalQualifier::parse(qualifier);
    let matched = parsed.matches(ordinal);
    tracing::trace!(ordinal, qualifier, parsed = %parsed, matched, "evaluated ordinal qualifier");
    matched
}
