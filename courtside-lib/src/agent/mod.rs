//! Agentic question answering
//!
//! A small state machine drives each query:
//!
//! ```text
//! Planning -> Retrieving -> Synthesizing -> Reflecting -> Done
//!                                ^              |
//!                                |              v
//!                                +---------- Refining    (at most once)
//! ```
//!
//! The second pass through `Synthesizing` goes straight to `Done`; a refined
//! draft is never reflected on again.
//!
//! # Usage
//!
//! ```ignore
//! use courtside_lib::agent::AgentLoop;
//!
//! let agent = AgentLoop::new(handle, embedder, &config);
//! let draft = agent.answer("How should I adjust my shooting arc?")?;
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{AgentConfig, Config, RetrievalConfig};
use crate::embed::Embedder;
use crate::index::SnapshotHandle;
use crate::rerank::{rerank, BonusScorer, KeywordBonus};
use crate::search::{HybridRetriever, RetrievalHit};
use crate::Result;

/// Steps of the query state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Planning,
    Retrieving,
    Synthesizing,
    Reflecting,
    Refining,
    Done,
}

/// Everything one query accumulates. Owned by that query alone.
#[derive(Debug, Clone)]
pub struct AgentQueryState {
    pub query: String,
    pub subgoals: Vec<String>,
    pub evidence: Vec<RetrievalHit>,
    pub draft: String,
    pub issues: Vec<String>,
    pub refined: bool,
    /// States visited, in order, ending with [`AgentState::Done`]
    pub trace: Vec<AgentState>,
}

impl AgentQueryState {
    fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            subgoals: Vec::new(),
            evidence: Vec::new(),
            draft: String::new(),
            issues: Vec::new(),
            refined: false,
            trace: Vec::new(),
        }
    }
}

/// Plan, retrieve, draft, critique and (once) refine.
///
/// Safe to share across threads; each call to [`run`](Self::run) works on
/// the snapshot that was current when it started.
pub struct AgentLoop {
    handle: Arc<SnapshotHandle>,
    embedder: Arc<dyn Embedder>,
    retrieval: RetrievalConfig,
    config: AgentConfig,
    planner: Box<dyn Planner>,
    reflector: Box<dyn Reflector>,
    bonus: Box<dyn BonusScorer>,
}

impl AgentLoop {
    /// Agent using the planner rules, bonus tiers and tracked concepts from
    /// `config.agent` (the shooting vocabulary unless configured otherwise).
    pub fn new(handle: Arc<SnapshotHandle>, embedder: Arc<dyn Embedder>, config: &Config) -> Self {
        let agent = &config.agent;
        Self {
            handle,
            embedder,
            retrieval: config.retrieval.clone(),
            planner: Box::new(RulePlanner::new(agent.plan_rules.clone())),
            reflector: Box::new(GroundingReflector::new(agent.tracked_concepts.clone())),
            bonus: Box::new(KeywordBonus::new(agent.bonus_tiers.clone())),
            config: agent.clone(),
        }
    }

    #[must_use]
    pub fn with_planner(mut self, planner: impl Planner + 'static) -> Self {
        self.planner = Box::new(planner);
        self
    }

    #[must_use]
    pub fn with_reflector(mut self, reflector: impl Reflector + 'static) -> Self {
        self.reflector = Box::new(reflector);
        self
    }

    #[must_use]
    pub fn with_bonus(mut self, bonus: impl BonusScorer + 'static) -> Self {
        self.bonus = Box::new(bonus);
        self
    }

    /// Answer a query, returning only the final draft.
    pub fn answer(&self, query: &str) -> Result<String> {
        Ok(self.run(query)?.draft)
    }

    /// Run the full state machine for one query.
    ///
    /// Fails with [`Error::IndexUnavailable`](crate::Error::IndexUnavailable)
    /// before planning when no snapshot is loaded.
    pub fn run(&self, query: &str) -> Result<AgentQueryState> {
        let snapshot = self.handle.current()?;
        let retriever = HybridRetriever::new(snapshot, self.embedder.as_ref(), &self.retrieval);
        let mut state = AgentQueryState::new(query);
        let mut step = AgentState::Planning;

        loop {
            debug!(state = ?step, "agent step");
            state.trace.push(step);
            step = match step {
                AgentState::Planning => {
                    state.subgoals = self.planner.plan(query);
                    AgentState::Retrieving
                }
                AgentState::Retrieving => {
                    for subgoal in &state.subgoals {
                        let hits = retriever.search(subgoal, self.config.search_k)?;
                        let kept = rerank(hits, self.bonus.as_ref(), self.config.keep_per_subgoal);
                        state.evidence.extend(kept);
                    }
                    AgentState::Synthesizing
                }
                AgentState::Synthesizing => {
                    state.draft = synthesize(&state.evidence, self.config.draft_evidence);
                    if state.refined {
                        AgentState::Done
                    } else {
                        AgentState::Reflecting
                    }
                }
                AgentState::Reflecting => {
                    state.issues = self.reflector.reflect(&state.draft, &state.evidence);
                    if state.issues.is_empty() {
                        AgentState::Done
                    } else {
                        AgentState::Refining
                    }
                }
                AgentState::Refining => {
                    state.refined = true;
                    let refined = format!("{} {}", query, state.issues.join(" "));
                    info!(issues = state.issues.len(), "refining answer");
                    state
                        .evidence
                        .extend(retriever.search(&refined, self.config.search_k)?);
                    AgentState::Synthesizing
                }
                AgentState::Done => break,
            };
        }

        info!(
            subgoals = state.subgoals.len(),
            evidence = state.evidence.len(),
            refined = state.refined,
            "answered query"
        );
        Ok(state)
    }
}

mod planner;
mod reflect;
mod synth;

pub use planner::*;
pub use reflect::*;
pub use synth::*;
