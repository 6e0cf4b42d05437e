use serde::Deserialize;

use crate::search::RetrievalHit;

/// Issue raised when a query gathered no evidence at all.
pub const NO_EVIDENCE: &str = "No evidence retrieved.";

/// Critiques a draft against the evidence it was built from.
pub trait Reflector: Send + Sync {
    /// Grounding issues found; empty means the draft is acceptable
    fn reflect(&self, draft: &str, evidence: &[RetrievalHit]) -> Vec<String>;
}

/// A term that must be backed by evidence whenever the draft mentions it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackedConcept {
    pub term: String,
    pub issue: String,
}

impl TrackedConcept {
    pub fn new(term: impl Into<String>, issue: impl Into<String>) -> Self {
        Self {
            term: term.into().to_lowercase(),
            issue: issue.into(),
        }
    }
}

/// Flags tracked concepts that appear in the draft but in none of the evidence.
#[derive(Debug, Clone)]
pub struct GroundingReflector {
    concepts: Vec<TrackedConcept>,
}

impl GroundingReflector {
    #[must_use]
    pub fn new(concepts: Vec<TrackedConcept>) -> Self {
        let concepts = concepts
            .into_iter()
            .map(|c| TrackedConcept::new(c.term, c.issue))
            .collect();
        Self { concepts }
    }

    /// Checks that shot angles in a draft come from the evidence.
    #[must_use]
    pub fn shooting() -> Self {
        Self::new(vec![TrackedConcept::new(
            "angle",
            "Angles mentioned but not grounded; retrieve angle-specific chunks.",
        )])
    }

    #[must_use]
    pub fn concepts(&self) -> &[TrackedConcept] {
        &self.concepts
    }
}

impl Default for GroundingReflector {
    fn default() -> Self {
        Self::shooting()
    }
}

impl Reflector for GroundingReflector {
    fn reflect(&self, draft: &str, evidence: &[RetrievalHit]) -> Vec<String> {
        let draft = draft.to_lowercase();
        let combined = evidence
            .iter()
            .map(|hit| hit.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let mut issues: Vec<String> = self
            .concepts
            .iter()
            .filter(|c| draft.contains(&c.term) && !combined.contains(&c.term))
            .map(|c| c.issue.clone())
            .collect();
        if evidence.is_empty() {
            issues.push(NO_EVIDENCE.to_string());
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chunk::{Chunk, ChunkMetadata};
    use crate::search::HitOrigin;

    fn hit(text: &str) -> RetrievalHit {
        RetrievalHit {
            chunk: Arc::new(Chunk {
                id: "c".into(),
                text: text.to_string(),
                metadata: ChunkMetadata::default(),
            }),
            row: 0,
            score: 1.0,
            origin: HitOrigin::Merged,
        }
    }

    #[test]
    fn test_grounded_draft() {
        let issues = GroundingReflector::default()
            .reflect("Use a 45 degree Angle.", &[hit("entry angle near 45 degrees")]);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_ungrounded_concept() {
        let issues = GroundingReflector::default().reflect(
            "(Shooting_Angles.pdf) keep your elbow in",
            &[hit("keep your elbow in")],
        );
        assert_eq!(issues.len(), 1);
        assert!(issues[0].starts_with("Angles mentioned"));
    }

    #[test]
    fn test_no_evidence() {
        let issues = GroundingReflector::default().reflect("**Answer**", &[]);
        assert_eq!(issues, vec![NO_EVIDENCE.to_string()]);
    }

    #[test]
    fn test_concept_absent_from_draft() {
        let issues = GroundingReflector::default().reflect("follow through", &[hit("balance")]);
        assert!(issues.is_empty());
    }
}
