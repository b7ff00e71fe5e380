use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token and cost accounting for one translation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageMetrics {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
    pub estimated_cost: f64,
    pub duration_ms: i64,
    pub provider: String,
    pub model: String,
}

impl Default for UsageMetrics {
    fn default() -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            estimated_cost: 0.0,
            duration_ms: 0,
            provider: "unknown".into(),
            model: "unknown".into(),
        }
    }
}

/// The translation attached to a chapter at runtime.
///
/// Every optional field of the persisted record is defaulted here, so
/// consumers never see half-filled metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translation: String,
    pub proposal: Option<String>,
    pub footnotes: Vec<String>,
    pub illustrations: Vec<String>,
    pub usage: UsageMetrics,
    pub version: i64,
    pub label: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Generation settings captured alongside a persisted translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSettingsSnapshot {
    pub provider: String,
    pub model: String,
    pub temperature: Option<f64>,
    pub system_prompt: Option<String>,
}

/// A translation row as persisted, optional fields and all.
#[derive(Debug, Clone)]
pub struct TranslationRecord {
    pub stable_id: String,
    pub translation: String,
    pub proposal: Option<String>,
    pub footnotes: Option<Vec<String>>,
    pub illustrations: Option<Vec<String>>,
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub estimated_cost: Option<f64>,
    pub duration_ms: Option<i64>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub system_prompt: Option<String>,
    pub version: i64,
    pub label: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TranslationRecord {
    pub fn new(stable_id: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            stable_id: stable_id.into(),
            translation: translation.into(),
            proposal: None,
            footnotes: None,
            illustrations: None,
            prompt_tokens: None,
            completion_tokens: None,
            total_tokens: None,
            estimated_cost: None,
            duration_ms: None,
            provider: None,
            model: None,
            temperature: None,
            system_prompt: None,
            version: 1,
            label: None,
            is_active: false,
            created_at: Utc::now(),
        }
    }

    /// Adapt the persisted row into the runtime shape, defaulting every
    /// absent optional field.
    pub fn to_result(&self) -> TranslationResult {
        TranslationResult {
            translation: self.translation.clone(),
            proposal: self.proposal.clone(),
            footnotes: self.footnotes.clone().unwrap_or_default(),
            illustrations: self.illustrations.clone().unwrap_or_default(),
            usage: UsageMetrics {
                prompt_tokens: self.prompt_tokens.unwrap_or(0),
                completion_tokens: self.completion_tokens.unwrap_or(0),
                total_tokens: self.total_tokens.unwrap_or(0),
                estimated_cost: self.estimated_cost.unwrap_or(0.0),
                duration_ms: self.duration_ms.unwrap_or(0),
                provider: self.provider.clone().unwrap_or_else(|| "unknown".into()),
                model: self.model.clone().unwrap_or_else(|| "unknown".into()),
            },
            version: self.version,
            label: self.label.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }

    pub fn settings_snapshot(&self) -> TranslationSettingsSnapshot {
        TranslationSettingsSnapshot {
            provider: self.provider.clone().unwrap_or_else(|| "unknown".into()),
            model: self.model.clone().unwrap_or_else(|| "unknown".into()),
            temperature: self.temperature,
            system_prompt: self.system_prompt.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_result_defaults_absent_fields() {
        let record = TranslationRecord::new("abc", "Hello");
        let result = record.to_result();

        assert_eq!(result.translation, "Hello");
        assert!(result.footnotes.is_empty());
        assert!(result.illustrations.is_empty());
        assert_eq!(result.usage.total_tokens, 0);
        assert_eq!(result.usage.provider, "unknown");
        assert_eq!(result.usage.model, "unknown");
    }

    #[test]
    fn test_to_result_preserves_present_fields() {
        let mut record = TranslationRecord::new("abc", "Hello");
        record.total_tokens = Some(1234);
        record.provider = Some("anthropic".into());
        record.footnotes = Some(vec!["note".into()]);
        record.version = 3;
        record.is_active = true;

        let result = record.to_result();
        assert_eq!(result.usage.total_tokens, 1234);
        assert_eq!(result.usage.provider, "anthropic");
        assert_eq!(result.footnotes, vec!["note".to_string()]);
        assert_eq!(result.version, 3);
        assert!(result.is_active);
    }

    #[test]
    fn test_settings_snapshot() {
        let mut record = TranslationRecord::new("abc", "Hello");
        record.model = Some("claude-sonnet".into());
        record.temperature = Some(0.3);

        let snapshot = record.settings_snapshot();
        assert_eq!(snapshot.provider, "unknown");
        assert_eq!(snapshot.model, "claude-sonnet");
        assert_eq!(snapshot.temperature, Some(0.3));
    }
}
