//! Passage corpus: records, JSON loading and the built-in authorities

use crate::RetrievalError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A citable passage of legal authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Citation string for the authority ("Cal. Bus. & Prof. Code § 16600")
    pub source_id: String,

    /// Short heading (doctrine or section name)
    #[serde(default)]
    pub title: String,

    /// Passage text returned as the citation snippet
    pub text: String,
}

impl Passage {
    /// Create a passage
    pub fn new(
        source_id: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            title: title.into(),
            text: text.into(),
        }
    }

    /// Text that gets embedded for search (title plus body)
    pub fn searchable_text(&self) -> String {
        if self.title.is_empty() {
            self.text.clone()
        } else {
            format!("{}. {}", self.title, self.text)
        }
    }
}

/// Parse a corpus from a JSON array of passages
pub fn from_json(json: &str) -> Result<Vec<Passage>, RetrievalError> {
    let passages: Vec<Passage> = serde_json::from_str(json)?;

    for (position, passage) in passages.iter().enumerate() {
        if passage.source_id.trim().is_empty() {
            return Err(RetrievalError::Corpus(format!(
                "passage {} has an empty source_id",
                position + 1
            )));
        }
        if passage.text.trim().is_empty() {
            return Err(RetrievalError::Corpus(format!(
                "passage '{}' has no text",
                passage.source_id
            )));
        }
    }

    Ok(passages)
}

/// Load a corpus from a JSON file
pub fn load_json(path: impl AsRef<Path>) -> Result<Vec<Passage>, RetrievalError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        RetrievalError::Corpus(format!("failed to read {}: {}", path.display(), e))
    })?;
    from_json(&content)
}

/// The built-in corpus of contract-law authorities
pub fn builtin_corpus() -> Vec<Passage> {
    vec![
        Passage::new(
            "Cal. Bus. & Prof. Code § 16600",
            "California non-compete rule",
            "Except as provided in this chapter, every contract by which anyone is \
             restrained from engaging in a lawful profession, trade, or business of \
             any kind is to that extent void. Non-compete clauses in California \
             employment contracts are void and unenforceable.",
        ),
        Passage::new(
            "Cal. Bus. & Prof. Code § 16601",
            "Sale of business exception",
            "Any person who sells the goodwill of a business, or all of their ownership \
             interest in a business entity, may agree with the buyer to refrain from \
             carrying on a similar business within a specified geographic area, so long \
             as the buyer carries on a like business therein.",
        ),
        Passage::new(
            "Edwards v. Arthur Andersen LLP, 44 Cal. 4th 937 (2008)",
            "No narrow-restraint exception",
            "Section 16600 prohibits employee noncompetition agreements unless the \
             agreement falls within a statutory exception. Courts may not uphold a \
             restraint merely because it is narrowly tailored or reasonable.",
        ),
        Passage::new(
            "Greenfield v. Philles Records, Inc., 98 N.Y.2d 562 (2002)",
            "Four corners rule",
            "A written agreement that is complete, clear and unambiguous on its face \
             must be enforced according to the plain meaning of its terms. Extrinsic \
             evidence outside the four corners of the document is inadmissible to add \
             to or vary the writing.",
        ),
        Passage::new(
            "Mastrobuono v. Shearson Lehman Hutton, Inc., 514 U.S. 52 (1995)",
            "Contra proferentem",
            "Ambiguous contract language is construed against the party who drafted \
             it. Where the drafter chose the ambiguous wording, the interpretation \
             favoring the non-drafting party prevails.",
        ),
        Passage::new(
            "Williams v. Walker-Thomas Furniture Co., 350 F.2d 445 (D.C. Cir. 1965)",
            "Unconscionability",
            "Unconscionability includes an absence of meaningful choice on the part of \
             one of the parties together with contract terms which are unreasonably \
             favorable to the other party. Such terms may be refused enforcement.",
        ),
    ]
}
