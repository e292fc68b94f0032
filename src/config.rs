//! Compiler options consumed by the semantic core
//!
//! Defaults match a plain `javac --release 21` run. Environment variables
//! with the `TOLC_` prefix override them, the same way the rest of the
//! compiler reads `TOLC_DEBUG` or `TOLC_CLASSPATH`.

use crate::error::{Error, Result};

/// Lint categories that can be enabled and suppressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LintCategory {
    Deprecation,
    Removal,
    Preview,
}

impl LintCategory {
    pub fn option(&self) -> &'static str {
        match self {
            LintCategory::Deprecation => "deprecation",
            LintCategory::Removal => "removal",
            LintCategory::Preview => "preview",
        }
    }

    pub fn from_option(s: &str) -> Option<Self> {
        match s {
            "deprecation" => Some(LintCategory::Deprecation),
            "removal" => Some(LintCategory::Removal),
            "preview" => Some(LintCategory::Preview),
            _ => None,
        }
    }

    pub const ALL: [LintCategory; 3] = [
        LintCategory::Deprecation,
        LintCategory::Removal,
        LintCategory::Preview,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Java feature release the sources are checked against
    pub source_level: u32,
    /// Whether preview language features and APIs are enabled
    pub preview_enabled: bool,
    /// Stop reporting errors after this many (0 = unlimited)
    pub max_errors: usize,
    pub max_warnings: usize,
    /// Enabled lint categories
    pub lint: Vec<LintCategory>,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_level: 21,
            preview_enabled: false,
            max_errors: 100,
            max_warnings: 100,
            lint: vec![LintCategory::Removal, LintCategory::Preview],
            verbose: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from `TOLC_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(level) = lookup("TOLC_SOURCE") {
            config.source_level = parse_number(&level, "TOLC_SOURCE")? as u32;
        }
        if let Some(preview) = lookup("TOLC_PREVIEW") {
            config.preview_enabled = parse_flag(&preview, "TOLC_PREVIEW")?;
        }
        if let Some(max) = lookup("TOLC_MAX_ERRORS") {
            config.max_errors = parse_number(&max, "TOLC_MAX_ERRORS")?;
        }
        if let Some(lint) = lookup("TOLC_LINT") {
            config.lint = parse_lint(&lint)?;
        }
        config.verbose = lookup("TOLC_DEBUG").is_some();
        Ok(config)
    }

    pub fn with_preview(mut self, enabled: bool) -> Self {
        self.preview_enabled = enabled;
        self
    }

    pub fn with_source_level(mut self, level: u32) -> Self {
        self.source_level = level;
        self
    }

    pub fn with_lint(mut self, lint: Vec<LintCategory>) -> Self {
        self.lint = lint;
        self
    }

    pub fn is_lint_enabled(&self, category: LintCategory) -> bool {
        self.lint.contains(&category)
    }

    /// Pattern labels in `switch` became final in Java 21
    pub fn allows_pattern_switch(&self) -> bool {
        self.source_level >= 21 || self.preview_enabled
    }
}

fn parse_number(value: &str, key: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| Error::config_error(format!("{} expects a number, got '{}'", key, value)))
}

fn parse_flag(value: &str, key: &str) -> Result<bool> {
    match value.trim() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => Err(Error::config_error(format!("{} expects a boolean, got '{}'", key, other))),
    }
}

fn parse_lint(value: &str) -> Result<Vec<LintCategory>> {
    let mut lint = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if item == "all" {
            return Ok(LintCategory::ALL.to_vec());
        }
        if item == "none" {
            return Ok(Vec::new());
        }
        match LintCategory::from_option(item) {
            Some(category) => lint.push(category),
            None => return Err(Error::config_error(format!("unknown lint category '{}'", item))),
        }
    }
    Ok(lint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_target_release_21() {
        let config = Config::default();
        assert_eq!(config.source_level, 21);
        assert!(!config.preview_enabled);
        assert!(config.allows_pattern_switch());
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("TOLC_SOURCE", "17"),
            ("TOLC_PREVIEW", "true"),
            ("TOLC_LINT", "deprecation,removal"),
        ]))
        .unwrap();
        assert_eq!(config.source_level, 17);
        assert!(config.preview_enabled);
        assert!(config.is_lint_enabled(LintCategory::Deprecation));
        assert!(!config.is_lint_enabled(LintCategory::Preview));
        assert!(config.allows_pattern_switch());
    }

    #[test]
    fn bad_values_are_config_errors() {
        let err = Config::from_lookup(lookup(&[("TOLC_MAX_ERRORS", "lots")])).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        let err = Config::from_lookup(lookup(&[("TOLC_LINT", "bogus")])).unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }
}
