//! Configuration for the reasoning pipeline

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How serious a critique finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Style or completeness nit
    Minor,
    /// Gap or weakly supported claim that changes how the answer reads
    Significant,
    /// Wrong statement of law or a citation that does not support its claim
    Critical,
}

impl Severity {
    /// Get the severity name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Significant => "significant",
            Severity::Critical => "critical",
        }
    }

    /// Parse a severity name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "minor" | "low" => Some(Severity::Minor),
            "significant" | "major" | "medium" => Some(Severity::Significant),
            "critical" | "high" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for the self-reflection pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionConfig {
    /// Run the critique/revise pass after each answer
    pub enabled: bool,

    /// Lowest issue severity that triggers a revision
    pub severity_threshold: Severity,

    /// Output token bound for the critique call
    pub critique_max_tokens: u32,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            severity_threshold: Severity::Significant,
            critique_max_tokens: 1024,
        }
    }
}

/// Fewest steps any plan may have
pub const PLAN_MIN_STEPS: usize = 2;

/// Most steps any plan may have
pub const PLAN_MAX_STEPS: usize = 6;

/// Configuration for the reasoning pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Fewest steps an accepted plan may have
    pub min_steps: usize,

    /// Most steps an accepted plan may have
    pub max_steps: usize,

    /// Attempts per external call, including the first
    pub max_attempts: u32,

    /// Timeout for a single attempt (seconds)
    pub call_timeout_secs: u64,

    /// Delay before the first retry; doubles on each further retry (milliseconds)
    pub backoff_base_ms: u64,

    /// Passages requested per RETRIEVE step
    pub retrieval_limit: usize,

    /// Passages scoring below this are dropped
    pub min_relevance: f32,

    /// Output token bound for the planning call
    pub plan_max_tokens: u32,

    /// Output token bound for GENERATE and VERIFY calls
    pub step_max_tokens: u32,

    /// Output token bound for synthesis and revision calls
    pub synthesis_max_tokens: u32,

    /// Characters of attached document text included in prompts
    pub document_excerpt_chars: usize,

    /// Self-reflection settings
    pub reflection: ReflectionConfig,
}

impl ReasonerConfig {
    /// Get the per-attempt timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Get the base retry delay as a Duration
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_steps < PLAN_MIN_STEPS {
            return Err(format!("min_steps must be at least {}", PLAN_MIN_STEPS));
        }
        if self.max_steps > PLAN_MAX_STEPS {
            return Err(format!("max_steps cannot exceed {}", PLAN_MAX_STEPS));
        }
        if self.min_steps > self.max_steps {
            return Err("min_steps cannot exceed max_steps".to_string());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be greater than 0".to_string());
        }
        if self.retrieval_limit == 0 {
            return Err("retrieval_limit must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_relevance) {
            return Err("min_relevance must be between 0.0 and 1.0".to_string());
        }
        if self.plan_max_tokens == 0 || self.step_max_tokens == 0 || self.synthesis_max_tokens == 0 {
            return Err("token limits must be greater than 0".to_string());
        }
        if self.reflection.enabled && self.reflection.critique_max_tokens == 0 {
            return Err("reflection.critique_max_tokens must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ReasonerConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            min_steps: 2,
            max_steps: 6,
            max_attempts: 3,
            call_timeout_secs: 60,
            backoff_base_ms: 500,
            retrieval_limit: 5,
            min_relevance: 0.1,
            plan_max_tokens: 1024,
            step_max_tokens: 1024,
            synthesis_max_tokens: 2048,
            document_excerpt_chars: 4000,
            reflection: ReflectionConfig::default(),
        }
    }
}

impl ReasonerConfig {
    /// Aggressive preset: short plans, fast failure, revise only on critical issues
    pub fn aggressive() -> Self {
        Self {
            min_steps: 2,
            max_steps: 4,
            max_attempts: 2,
            call_timeout_secs: 30,
            backoff_base_ms: 250,
            retrieval_limit: 3,
            min_relevance: 0.2,
            plan_max_tokens: 512,
            step_max_tokens: 512,
            synthesis_max_tokens: 1024,
            document_excerpt_chars: 2000,
            reflection: ReflectionConfig {
                enabled: true,
                severity_threshold: Severity::Critical,
                critique_max_tokens: 512,
            },
        }
    }

    /// Lenient preset: longer timeouts and documents, revise on any significant issue
    pub fn lenient() -> Self {
        Self {
            min_steps: 2,
            max_steps: 6,
            max_attempts: 5,
            call_timeout_secs: 180,
            backoff_base_ms: 1000,
            retrieval_limit: 8,
            min_relevance: 0.05,
            plan_max_tokens: 2048,
            step_max_tokens: 2048,
            synthesis_max_tokens: 4096,
            document_excerpt_chars: 12_000,
            reflection: ReflectionConfig {
                enabled: true,
                severity_threshold: Severity::Significant,
                critique_max_tokens: 2048,
            },
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ReasonerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(ReasonerConfig::aggressive().validate().is_ok());
        assert!(ReasonerConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_default_plan_bounds() {
        let config = ReasonerConfig::default();
        assert_eq!((config.min_steps, config.max_steps), (2, 6));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.reflection.severity_threshold, Severity::Significant);
    }

    #[test]
    fn test_invalid_step_bounds() {
        let mut config = ReasonerConfig::default();
        config.min_steps = 7;
        assert!(config.validate().is_err());

        config.min_steps = 0;
        assert!(config.validate().is_err());

        config.min_steps = 1;
        assert!(config.validate().is_err());

        let mut config = ReasonerConfig::default();
        config.max_steps = 7;
        assert!(config.validate().is_err());

        config.max_steps = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_stay_within_plan_bounds() {
        for config in [
            ReasonerConfig::default(),
            ReasonerConfig::aggressive(),
            ReasonerConfig::lenient(),
        ] {
            assert!(config.min_steps >= PLAN_MIN_STEPS);
            assert!(config.max_steps <= PLAN_MAX_STEPS);
        }
    }

    #[test]
    fn test_invalid_attempts_and_timeout() {
        let mut config = ReasonerConfig::default();
        config.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = ReasonerConfig::default();
        config.call_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_relevance() {
        let mut config = ReasonerConfig::default();
        config.min_relevance = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ReasonerConfig::lenient();
        let toml_str = config.to_toml().unwrap();
        let parsed = ReasonerConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = ReasonerConfig::from_toml(
            "max_steps = 4\n\n[reflection]\nseverity_threshold = \"critical\"\n",
        )
        .unwrap();

        assert_eq!(parsed.max_steps, 4);
        assert_eq!(parsed.min_steps, 2);
        assert_eq!(parsed.reflection.severity_threshold, Severity::Critical);
        assert!(parsed.reflection.enabled);
    }

    #[test]
    fn test_severity_ordering_and_parse() {
        assert!(Severity::Minor < Severity::Significant);
        assert!(Severity::Significant < Severity::Critical);
        assert_eq!(Severity::parse(" CRITICAL "), Some(Severity::Critical));
        assert_eq!(Severity::parse("major"), Some(Severity::Significant));
        assert_eq!(Severity::parse("urgent"), None);
    }
}
