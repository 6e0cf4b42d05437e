//! Runtime configuration
//!
//! Every field has a default, so an empty (or missing) TOML file yields a
//! working setup. The corpus and index directories can be overridden with the
//! `KB_DIR` and `INDEX_DIR` environment variables.
//!
//! ```toml
//! corpus_dir = "kb"
//! index_dir = "index"
//!
//! [chunking]
//! size = 900
//! overlap = 150
//!
//! [retrieval]
//! k = 6
//! mmr_lambda = 0.5
//! diversity = "fuzzy"
//!
//! # Replaces the default planner rules; the same goes for
//! # `agent.bonus_tiers` and `agent.tracked_concepts`
//! [[agent.plan_rules]]
//! triggers = ["dribble", "handle"]
//! subgoal = "ball handling drills"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::agent::{GroundingReflector, PlanRule, RulePlanner, TrackedConcept};
use crate::rerank::{KeywordBonus, KeywordTier};
use crate::{Error, Result};

/// Environment variable overriding [`Config::corpus_dir`].
pub const CORPUS_DIR_ENV: &str = "KB_DIR";
/// Environment variable overriding [`Config::index_dir`].
pub const INDEX_DIR_ENV: &str = "INDEX_DIR";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory scanned for source documents
    pub corpus_dir: PathBuf,
    /// Directory holding the persisted index artifacts
    pub index_dir: PathBuf,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub agent: AgentConfig,
    pub categories: CategoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("kb"),
            index_dir: PathBuf::from("index"),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            agent: AgentConfig::default(),
            categories: CategoryConfig::default(),
        }
    }
}

/// Sliding window parameters, in characters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: 900,
            overlap: 150,
        }
    }
}

/// How MMR measures redundancy between two candidates.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Diversity {
    /// Fuzzy partial text match ratio
    #[default]
    Fuzzy,
    /// Cosine similarity of the stored chunk embeddings
    Cosine,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of hits returned by a hybrid search
    pub k: usize,
    /// Relevance/diversity trade-off for MMR, in `[0, 1]`
    pub mmr_lambda: f32,
    /// Each source contributes `k * candidate_multiplier` candidates
    pub candidate_multiplier: usize,
    pub diversity: Diversity,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: 6,
            mmr_lambda: 0.5,
            candidate_multiplier: 5,
            diversity: Diversity::Fuzzy,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Hybrid search size used for each subgoal and for the refinement round
    pub search_k: usize,
    /// Hits kept per subgoal after the keyword bonus re-rank
    pub keep_per_subgoal: usize,
    /// Hits rendered into a draft
    pub draft_evidence: usize,
    /// Keyword-triggered subgoals added by the planner
    pub plan_rules: Vec<PlanRule>,
    /// Additive keyword bonuses applied before keeping the top hits
    pub bonus_tiers: Vec<KeywordTier>,
    /// Terms a draft may only mention when the evidence does
    pub tracked_concepts: Vec<TrackedConcept>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            search_k: 6,
            keep_per_subgoal: 3,
            draft_evidence: 4,
            plan_rules: RulePlanner::shooting().rules().to_vec(),
            bonus_tiers: KeywordBonus::shooting().tiers().to_vec(),
            tracked_concepts: GroundingReflector::shooting().concepts().to_vec(),
        }
    }
}

/// Filename keywords used to tag chunks with a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    pub vocabulary: Vec<String>,
    pub fallback: String,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            vocabulary: vec!["basketball".into(), "soccer".into(), "tennis".into()],
            fallback: "sports".into(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, or defaults when `path` is `None`.
    ///
    /// Environment overrides are applied after parsing and the result is
    /// validated before it is returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without touching the environment.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    fn apply_env(&mut self) {
        if let Some(dir) = std::env::var_os(CORPUS_DIR_ENV) {
            self.corpus_dir = PathBuf::from(dir);
        }
        if let Some(dir) = std::env::var_os(INDEX_DIR_ENV) {
            self.index_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let ChunkingConfig { size, overlap } = self.chunking;
        if size == 0 {
            return Err(Error::Config("chunk size must be positive".into()));
        }
        if overlap >= size {
            return Err(Error::Config(format!(
                "chunk overlap ({overlap}) must be smaller than chunk size ({size})"
            )));
        }
        let lambda = self.retrieval.mmr_lambda;
        if !(0.0..=1.0).contains(&lambda) {
            return Err(Error::Config(format!(
                "mmr_lambda must be within [0, 1], got {lambda}"
            )));
        }
        if self.retrieval.k == 0 || self.retrieval.candidate_multiplier == 0 {
            return Err(Error::Config(
                "k and candidate_multiplier must be positive".into(),
            ));
        }
        if self.agent.search_k == 0 || self.agent.keep_per_subgoal == 0 {
            return Err(Error::Config(
                "agent search_k and keep_per_subgoal must be positive".into(),
            ));
        }
        if let Some(rule) = self.agent.plan_rules.iter().find(|r| r.triggers.is_empty()) {
            return Err(Error::Config(format!(
                "plan rule \"{}\" has no triggers",
                rule.subgoal
            )));
        }
        if let Some(tier) = self.agent.bonus_tiers.iter().find(|t| !t.weight.is_finite()) {
            return Err(Error::Config(format!(
                "bonus tier weight must be finite, got {}",
                tier.weight
            )));
        }
        Ok(())
    }
}
