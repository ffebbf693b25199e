//! Engineering domains and their prompt augmentations.
//!
//! Each domain appends instructional suffixes when certain trigger keywords
//! appear in the prompt (and, for the JSON hint, when the prompt does not
//! already ask for JSON). Augmentation never removes text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OptimizeError;

/// The engineering domain a request targets. Selects which augmentation
/// rules the prompt optimizer applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Devops,
    Sre,
    Cloud,
    Platform,
}

impl Domain {
    /// Canonical lowercase tag for this domain.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Devops => "devops",
            Domain::Sre => "sre",
            Domain::Cloud => "cloud",
            Domain::Platform => "platform",
        }
    }

    /// Transformation tag recorded when this domain's rules run.
    pub(crate) fn applied_tag(&self) -> String {
        format!("applied_{}_optimizations", self.as_str())
    }

    /// Apply this domain's conditional suffixes to `prompt`.
    pub(crate) fn augment(&self, prompt: &str) -> String {
        let lower = prompt.to_lowercase();
        let mut out = prompt.to_string();
        match self {
            Domain::Devops => {
                if lower.contains("analyze") && !lower.contains("json") {
                    out.push_str(
                        "\n\nProvide response in structured JSON format with clear \
                         sections for analysis, recommendations, and implementation steps.",
                    );
                }
                if lower.contains("recommend") {
                    out.push_str(
                        "\n\nFocus on actionable, production-ready solutions with \
                         specific commands and configurations.",
                    );
                }
            }
            Domain::Sre => {
                if lower.contains("incident") || lower.contains("outage") {
                    out.push_str(
                        "\n\nInclude SLO impact analysis and error budget implications \
                         in your response.",
                    );
                }
                if lower.contains("performance") {
                    out.push_str(
                        "\n\nProvide quantitative metrics and measurable targets in \
                         your analysis.",
                    );
                }
            }
            Domain::Cloud => {
                if lower.contains("architecture") || lower.contains("design") {
                    out.push_str(
                        "\n\nInclude cost implications and optimization opportunities \
                         in your recommendations.",
                    );
                }
                if lower.contains("migration") || lower.contains("deployment") {
                    out.push_str("\n\nAddress security, compliance, and governance considerations.");
                }
            }
            Domain::Platform => {
                if lower.contains("platform") || lower.contains("developer") {
                    out.push_str(
                        "\n\nPrioritize developer experience and productivity in your \
                         recommendations.",
                    );
                }
                if lower.contains("tool") || lower.contains("service") {
                    out.push_str(
                        "\n\nFocus on self-service capabilities and automation opportunities.",
                    );
                }
            }
        }
        out
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devops" => Ok(Domain::Devops),
            "sre" => Ok(Domain::Sre),
            "cloud" => Ok(Domain::Cloud),
            "platform" => Ok(Domain::Platform),
            other => Err(OptimizeError::UnknownDomain(other.to_string())),
        }
    }
}
