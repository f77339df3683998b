//! Citations - traceable pointers from retrieved source text into an answer

use crate::plan::StepId;
use serde::{Deserialize, Serialize};

/// A passage returned by the Retrieval Service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Source identifier (statute section, case name, document id)
    pub source_id: String,

    /// Passage text
    pub snippet: String,

    /// Relevance score reported by the service (higher is better)
    pub score: f32,
}

impl RetrievedPassage {
    /// Create a passage
    pub fn new(source_id: impl Into<String>, snippet: impl Into<String>, score: f32) -> Self {
        Self {
            source_id: source_id.into(),
            snippet: snippet.into(),
            score,
        }
    }
}

/// Kind of authority a citation points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationKind {
    /// Case law ("Edwards v. Arthur Andersen LLP")
    Case,
    /// Statute or code section ("Cal. Bus. & Prof. Code § 16600")
    Statute,
    /// Anything else (secondary sources, uploaded documents)
    Other,
}

impl CitationKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            CitationKind::Case => "case",
            CitationKind::Statute => "statute",
            CitationKind::Other => "other",
        }
    }
}

/// A citation collected by a RETRIEVE step
///
/// Only constructible from a [`RetrievedPassage`], so every citation in an
/// answer traces back to the retrieval result that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    source_id: String,
    snippet: String,
    relevance_score: f32,
    step_id: StepId,
}

impl Citation {
    /// Record a retrieved passage as a citation owned by `step_id`
    pub fn from_retrieval(step_id: StepId, passage: &RetrievedPassage) -> Self {
        Self {
            source_id: passage.source_id.clone(),
            snippet: passage.snippet.clone(),
            relevance_score: passage.score,
            step_id,
        }
    }

    /// Source identifier
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Cited passage text
    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    /// Relevance score from retrieval
    pub fn relevance_score(&self) -> f32 {
        self.relevance_score
    }

    /// RETRIEVE step that produced this citation
    pub fn step_id(&self) -> StepId {
        self.step_id
    }

    /// Classify the cited authority from its source identifier
    pub fn kind(&self) -> CitationKind {
        let source = self.source_id.to_lowercase();
        if source.contains(" v. ") || source.contains(" v ") {
            CitationKind::Case
        } else if source.contains('§') || source.contains("sec.") || source.contains("u.s.c.") {
            CitationKind::Statute
        } else {
            CitationKind::Other
        }
    }

    /// Whether two citations point at the same source text
    pub fn same_source(&self, other: &Citation) -> bool {
        self.source_id == other.source_id && self.snippet == other.snippet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citation(source: &str) -> Citation {
        Citation::from_retrieval(StepId::new(1), &RetrievedPassage::new(source, "text", 0.9))
    }

    #[test]
    fn test_from_retrieval_keeps_provenance() {
        let passage = RetrievedPassage::new("Cal. Bus. & Prof. Code § 16600", "void", 0.82);
        let c = Citation::from_retrieval(StepId::new(3), &passage);
        assert_eq!(c.source_id(), "Cal. Bus. & Prof. Code § 16600");
        assert_eq!(c.snippet(), "void");
        assert_eq!(c.step_id(), StepId::new(3));
        assert!((c.relevance_score() - 0.82).abs() < f32::EPSILON);
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(citation("Edwards v. Arthur Andersen LLP, 44 Cal.4th 937 (2008)").kind(), CitationKind::Case);
        assert_eq!(citation("Cal. Bus. & Prof. Code § 16600").kind(), CitationKind::Statute);
        assert_eq!(citation("15 U.S.C. 1").kind(), CitationKind::Statute);
        assert_eq!(citation("Restatement (Second) of Contracts").kind(), CitationKind::Other);
    }

    #[test]
    fn test_same_source_ignores_step() {
        let passage = RetrievedPassage::new("doc", "text", 0.5);
        let a = Citation::from_retrieval(StepId::new(1), &passage);
        let b = Citation::from_retrieval(StepId::new(2), &passage);
        assert!(a.same_source(&b));
        assert_ne!(a, b);
    }
}
