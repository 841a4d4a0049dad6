use std::collections::BTreeMap;

use plancheck_core::{CanonicalField, Subject, Vocabulary};
use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompareConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub header: HeaderConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Extra alias phrases, keyed by raw header text, valued by canonical field name.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

fn default_name() -> String {
    "plancheck".into()
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            reference: ReferenceConfig::default(),
            header: HeaderConfig::default(),
            matching: MatchingConfig::default(),
            embedding: EmbeddingConfig::default(),
            aliases: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reference catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferenceConfig {
    /// Workbook holding the reference catalog.
    pub file: Option<String>,
    pub objective_sheet: String,
    pub action_sheet: String,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            file: None,
            objective_sheet: "OEI".into(),
            action_sheet: "AEI".into(),
        }
    }
}

impl ReferenceConfig {
    pub fn sheet_for(&self, subject: Subject) -> &str {
        match subject {
            Subject::Objective => &self.objective_sheet,
            Subject::Action => &self.action_sheet,
        }
    }
}

// ---------------------------------------------------------------------------
// Header search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderConfig {
    /// Header may start in rows `0..max_start_row`.
    pub max_start_row: usize,
    /// Header may span `1..=max_header_height` rows.
    pub max_header_height: usize,
    /// Candidates with fewer non-empty combined names are rejected.
    pub min_non_empty: usize,
    /// Prefer the candidate mapping the most distinct canonical fields.
    pub schema_aware: bool,
    /// Minimum fuzzy score (0-100) to accept a column-name match.
    pub fuzzy_threshold: u8,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            max_start_row: 4,
            max_header_height: 3,
            min_non_empty: 1,
            schema_aware: true,
            fuzzy_threshold: 80,
        }
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchingConfig {
    /// Minimum similarity for a `Partial` classification.
    pub threshold: f32,
    /// Keep only submitted objectives whose code starts with this prefix.
    pub objective_code_prefix: Option<String>,
    /// Keep only submitted actions whose code starts with this prefix.
    pub action_code_prefix: Option<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: 0.75,
            objective_code_prefix: None,
            action_code_prefix: Some("AEI".into()),
        }
    }
}

impl MatchingConfig {
    pub fn code_prefix(&self, subject: Subject) -> Option<&str> {
        match subject {
            Subject::Objective => self.objective_code_prefix.as_deref(),
            Subject::Action => self.action_code_prefix.as_deref(),
        }
        .filter(|p| !p.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Embedding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    /// Deterministic local feature-hashing embedder.
    #[default]
    Hashing,
    /// OpenAI-compatible HTTP embeddings endpoint.
    Http,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    /// Vector length for the hashing embedder.
    pub dimensions: usize,
    pub endpoint: Option<String>,
    pub model: String,
    /// Environment variable holding the bearer token, if the endpoint needs one.
    pub api_key_env: Option<String>,
    pub timeout_secs: u64,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hashing,
            dimensions: 1024,
            endpoint: None,
            model: "paraphrase-multilingual-MiniLM-L12-v2".into(),
            api_key_env: None,
            timeout_secs: 30,
            batch_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl CompareConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: CompareConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if !(0.0..=1.0).contains(&self.matching.threshold) {
            return Err(ReconError::ConfigValidation(format!(
                "matching.threshold must be within 0.0..=1.0, got {}",
                self.matching.threshold
            )));
        }

        if self.header.fuzzy_threshold > 100 {
            return Err(ReconError::ConfigValidation(format!(
                "header.fuzzy_threshold must be within 0..=100, got {}",
                self.header.fuzzy_threshold
            )));
        }

        if self.header.max_start_row == 0 || self.header.max_header_height == 0 {
            return Err(ReconError::ConfigValidation(
                "header.max_start_row and header.max_header_height must be at least 1".into(),
            ));
        }

        match self.embedding.provider {
            EmbeddingProvider::Hashing if self.embedding.dimensions == 0 => {
                return Err(ReconError::ConfigValidation(
                    "embedding.dimensions must be at least 1".into(),
                ));
            }
            EmbeddingProvider::Http if self.embedding.endpoint.is_none() => {
                return Err(ReconError::ConfigValidation(
                    "embedding.provider = \"http\" requires embedding.endpoint".into(),
                ));
            }
            EmbeddingProvider::Http if self.embedding.batch_size == 0 => {
                return Err(ReconError::ConfigValidation(
                    "embedding.batch_size must be at least 1".into(),
                ));
            }
            _ => {}
        }

        self.alias_overrides()?;
        Ok(())
    }

    /// Parsed `[aliases]` entries.
    pub fn alias_overrides(&self) -> Result<Vec<(&str, CanonicalField)>, ReconError> {
        self.aliases
            .iter()
            .map(|(phrase, target)| {
                target
                    .parse::<CanonicalField>()
                    .map(|field| (phrase.as_str(), field))
                    .map_err(|e| ReconError::ConfigValidation(format!("aliases.\"{phrase}\": {e}")))
            })
            .collect()
    }

    /// Built-in vocabulary extended with this config's aliases.
    pub fn vocabulary(&self) -> Result<Vocabulary, ReconError> {
        Ok(Vocabulary::builtin().extended(self.alias_overrides()?))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
