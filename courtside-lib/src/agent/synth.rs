use crate::chunk::{normalize, ChunkMetadata};
use crate::search::RetrievalHit;

const HEADER: &str = "**Answer (Agentic RAG):**";
const FOOTER: &str = "_Synthesis grounded in retrieved KB passages._";

/// Render a cited markdown draft from the first `cap` hits.
#[must_use]
pub fn synthesize(evidence: &[RetrievalHit], cap: usize) -> String {
    let mut lines = vec![HEADER.to_string(), String::new()];
    for hit in evidence.iter().take(cap) {
        lines.push(format!(
            "- {}  \n  _Source:_ {}",
            normalize(&hit.chunk.text),
            citation(&hit.chunk.metadata)
        ));
    }
    lines.push(String::new());
    lines.push(FOOTER.to_string());
    lines.join("\n")
}

/// `(filename • section • p.page)`, leaving out absent parts.
#[must_use]
pub fn citation(meta: &ChunkMetadata) -> String {
    let mut cite = format!("({}", meta.filename);
    if let Some(section) = meta.section.as_deref().filter(|s| !s.is_empty()) {
        cite.push_str(" • ");
        cite.push_str(section);
    }
    if let Some(page) = meta.page {
        cite.push_str(&format!(" • p.{page}"));
    }
    cite.push(')');
    cite
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chunk::Chunk;
    use crate::search::HitOrigin;

    fn hit(text: &str, section: Option<&str>, page: Option<u32>) -> RetrievalHit {
        RetrievalHit {
            chunk: Arc::new(Chunk {
                id: "c".into(),
                text: text.to_string(),
                metadata: ChunkMetadata {
                    filename: "Basketball_Guide.docx".into(),
                    category: "basketball".into(),
                    section: section.map(str::to_string),
                    page,
                    position: 0,
                },
            }),
            row: 0,
            score: 1.0,
            origin: HitOrigin::Vector,
        }
    }

    #[test]
    fn test_citation_parts() {
        assert_eq!(
            citation(&hit("", Some("Shooting"), Some(3)).chunk.metadata),
            "(Basketball_Guide.docx • Shooting • p.3)"
        );
        assert_eq!(
            citation(&hit("", None, Some(7)).chunk.metadata),
            "(Basketball_Guide.docx • p.7)"
        );
        assert_eq!(
            citation(&hit("", None, None).chunk.metadata),
            "(Basketball_Guide.docx)"
        );
    }

    #[test]
    fn test_draft_layout() {
        let draft = synthesize(&[hit("  high\n arc ", Some("Shooting"), None)], 4);
        let expected = "**Answer (Agentic RAG):**\n\n\
            - high arc  \n  _Source:_ (Basketball_Guide.docx • Shooting)\n\n\
            _Synthesis grounded in retrieved KB passages._";
        assert_eq!(draft, expected);
    }

    #[test]
    fn test_draft_caps_evidence() {
        let hits: Vec<RetrievalHit> = (0..6).map(|i| hit(&format!("cue {i}"), None, None)).collect();
        let draft = synthesize(&hits, 4);
        assert_eq!(draft.matches("_Source:_").count(), 4);
        assert!(draft.contains("cue 3"));
        assert!(!draft.contains("cue 4"));
    }

    #[test]
    fn test_empty_draft() {
        let draft = synthesize(&[], 4);
        assert!(draft.starts_with(HEADER));
        assert!(!draft.contains("_Source:_"));
    }
}
