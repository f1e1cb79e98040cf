use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest `limit` a caller may request
pub const MAX_LIMIT: usize = 100;

/// Runtime-tunable search settings.
///
/// Read once at the start of every query, so updates apply to the next
/// query without restarting anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Default result limit when the caller gives none
    pub max_results: usize,

    /// Vector candidates scoring below this are dropped. A similarity of
    /// exactly 0 is never a hit, even with `min_score = 0`. Keyword scores
    /// are not filtered by this threshold.
    pub min_score: f32,

    pub vector_enabled: bool,
    pub keyword_enabled: bool,

    /// Weight of the vector score for sections found by both strategies
    pub vector_weight: f32,

    /// Weight of the keyword score for sections found by both strategies
    pub keyword_weight: f32,

    /// Multiplier for sections found by only one strategy (1.0 = no penalty)
    pub single_strategy_factor: f32,

    /// Longest accepted query, in characters after trimming
    pub max_query_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 10,
            min_score: 0.1,
            vector_enabled: true,
            keyword_enabled: true,
            vector_weight: 0.6,
            keyword_weight: 0.4,
            single_strategy_factor: 1.0,
            max_query_chars: 512,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 || self.max_results > MAX_LIMIT {
            return Err(invalid(format!(
                "max_results must be in 1..={MAX_LIMIT}, got {}",
                self.max_results
            )));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(invalid(format!(
                "min_score must be in [0, 1], got {}",
                self.min_score
            )));
        }
        for (name, weight) in [
            ("vector_weight", self.vector_weight),
            ("keyword_weight", self.keyword_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(format!(
                    "{name} must be a non-negative number, got {weight}"
                )));
            }
        }
        if self.vector_weight + self.keyword_weight <= 0.0 {
            return Err(invalid(
                "vector_weight and keyword_weight cannot both be zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.single_strategy_factor) {
            return Err(invalid(format!(
                "single_strategy_factor must be in [0, 1], got {}",
                self.single_strategy_factor
            )));
        }
        if self.max_query_chars == 0 {
            return Err(invalid("max_query_chars must be > 0".to_string()));
        }
        Ok(())
    }

    /// Parse and validate a TOML document. Missing keys take defaults;
    /// unknown keys are rejected.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SearchError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Merge `update` into a copy of `self` and validate the result.
    pub fn merged(&self, update: &SearchConfigUpdate) -> Result<Self> {
        let mut next = self.clone();
        if let Some(v) = update.max_results {
            next.max_results = v;
        }
        if let Some(v) = update.min_score {
            next.min_score = v;
        }
        if let Some(v) = update.vector_enabled {
            next.vector_enabled = v;
        }
        if let Some(v) = update.keyword_enabled {
            next.keyword_enabled = v;
        }
        if let Some(v) = update.vector_weight {
            next.vector_weight = v;
        }
        if let Some(v) = update.keyword_weight {
            next.keyword_weight = v;
        }
        if let Some(v) = update.single_strategy_factor {
            next.single_strategy_factor = v;
        }
        if let Some(v) = update.max_query_chars {
            next.max_query_chars = v;
        }
        next.validate()?;
        Ok(next)
    }
}

/// Partial update for [`SearchConfig`]; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct SearchConfigUpdate {
    pub max_results: Option<usize>,
    pub min_score: Option<f32>,
    pub vector_enabled: Option<bool>,
    pub keyword_enabled: Option<bool>,
    pub vector_weight: Option<f32>,
    pub keyword_weight: Option<f32>,
    pub single_strategy_factor: Option<f32>,
    pub max_query_chars: Option<usize>,
}

fn invalid(message: String) -> SearchError {
    SearchError::InvalidConfig(message)
}
