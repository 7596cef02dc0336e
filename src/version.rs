//! Version gate: decides whether a rule is deprecated and/or removed for the
//! target library version.

use semver::Version;
use tracing::warn;

use crate::catalog::Rule;
use crate::error::ConfigError;

/// Parse a version string leniently into a semver `Version`.
///
/// Accepts partial versions (`6`, `5.0`), full semver (`5.0.0-alpha.1`) and
/// PEP 440-style pre-releases glued to the numeric core (`5.0a1`, `5.0rc2`).
pub fn parse_version(input: &str) -> Option<Version> {
    let s = input.trim();
    let s = s.strip_prefix('v').unwrap_or(s);
    if s.is_empty() {
        return None;
    }

    let core_len = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (core, rest) = s.split_at(core_len);
    let core = core.trim_end_matches('.');

    let mut parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0");
    }

    let pre = rest.strip_prefix('-').unwrap_or(rest);
    let normalized = if pre.is_empty() {
        parts.join(".")
    } else if let Some(build) = pre.strip_prefix('+') {
        format!("{}+{build}", parts.join("."))
    } else {
        format!("{}-{pre}", parts.join("."))
    };
    Version::parse(&normalized).ok()
}

/// The target version a run is gated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionGate {
    target: Version,
}

/// Outcome of gating one rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateResult {
    pub deprecated: bool,
    pub removed: bool,
}

impl GateResult {
    /// Whether the rule produces findings at all.
    pub fn is_relevant(&self) -> bool {
        self.deprecated || self.removed
    }
}

impl VersionGate {
    pub fn new(target: &str) -> Result<Self, ConfigError> {
        parse_version(target)
            .map(|target| Self { target })
            .ok_or_else(|| ConfigError::InvalidVersion(target.to_string()))
    }

    pub fn target(&self) -> &Version {
        &self.target
    }

    pub fn check(&self, rule: &Rule) -> GateResult {
        GateResult {
            deprecated: self.reached(rule.deprecated.as_deref(), &rule.identifier),
            removed: self.reached(rule.removed.as_deref(), &rule.identifier),
        }
    }

    fn reached(&self, threshold: Option<&str>, rule_id: &str) -> bool {
        let Some(threshold) = threshold else {
            return false;
        };
        match parse_version(threshold) {
            Some(v) => v <= self.target,
            None => {
                warn!(rule = rule_id, version = threshold, "unparseable rule version, ignoring threshold");
                false
            }
        }
    }
}
