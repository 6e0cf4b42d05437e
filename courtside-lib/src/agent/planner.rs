use std::collections::HashSet;

use serde::Deserialize;

/// Decomposes a query into ordered subgoals.
pub trait Planner: Send + Sync {
    /// Subgoals to retrieve for, original query first, without duplicates
    fn plan(&self, query: &str) -> Vec<String>;
}

/// Appends `subgoal` when any trigger occurs in the query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlanRule {
    pub triggers: Vec<String>,
    pub subgoal: String,
}

impl PlanRule {
    pub fn new<I, S>(triggers: I, subgoal: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            triggers: triggers.into_iter().map(|t| t.into().to_lowercase()).collect(),
            subgoal: subgoal.into(),
        }
    }

    fn fires(&self, query: &str) -> bool {
        self.triggers.iter().any(|t| query.contains(t.as_str()))
    }
}

/// Keyword-triggered planner. Triggers match case-insensitively as substrings.
#[derive(Debug, Clone)]
pub struct RulePlanner {
    rules: Vec<PlanRule>,
}

impl RulePlanner {
    /// Triggers are lower-cased here, so rules loaded from config match too.
    #[must_use]
    pub fn new(rules: Vec<PlanRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| PlanRule::new(rule.triggers, rule.subgoal))
            .collect();
        Self { rules }
    }

    /// Shot-trajectory and technique rules for coaching questions.
    #[must_use]
    pub fn shooting() -> Self {
        Self::new(vec![
            PlanRule::new(
                ["angle", "arc"],
                "release angle and entry angle guidance for shots and finishes",
            ),
            PlanRule::new(["form", "technique"], "form and technique cues"),
        ])
    }

    #[must_use]
    pub fn rules(&self) -> &[PlanRule] {
        &self.rules
    }
}

impl Default for RulePlanner {
    fn default() -> Self {
        Self::shooting()
    }
}

impl Planner for RulePlanner {
    fn plan(&self, query: &str) -> Vec<String> {
        let lowered = query.to_lowercase();
        let candidates = std::iter::once(query.to_string()).chain(
            self.rules
                .iter()
                .filter(|rule| rule.fires(&lowered))
                .map(|rule| rule.subgoal.clone()),
        );

        let mut seen = HashSet::new();
        candidates.filter(|s| seen.insert(s.clone())).collect()
    }
}
