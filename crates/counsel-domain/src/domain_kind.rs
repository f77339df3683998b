//! Domain kind - the area of law a question belongs to

use serde::{Deserialize, Serialize};
use std::fmt;

/// Area of law a question belongs to
///
/// The reasoner dispatches on this tag to pick the planning guidance,
/// retrieval hint and synthesis focus for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    /// Contract formation, interpretation and enforceability
    Contract,

    /// Disputes, procedure and remedies
    Litigation,

    /// Patents, copyright, trademarks and trade secrets
    IntellectualProperty,

    /// Statutory and agency compliance
    Regulatory,

    /// Anything not matching a more specific domain
    General,
}

const CONTRACT_TERMS: &[&str] = &[
    "contract", "clause", "agreement", "non-compete", "noncompete", "non-disclosure", "breach",
    "indemn", "warranty", "termination", "consideration", "covenant",
];

const LITIGATION_TERMS: &[&str] = &[
    "lawsuit", "litigation", "court", "plaintiff", "defendant", "motion",
    "discovery", "appeal", "trial", "damages", "settlement", "injunction",
];

const IP_TERMS: &[&str] = &[
    "patent", "copyright", "trademark", "trade secret", "infring", "fair use",
    "intellectual property", "licens",
];

const REGULATORY_TERMS: &[&str] = &[
    "regulation", "regulatory", "compliance", "gdpr", "hipaa", "agency", "statute",
    "filing", "disclosure", "privacy",
];

impl DomainKind {
    /// All domain kinds, most specific first
    pub const ALL: [DomainKind; 5] = [
        DomainKind::IntellectualProperty,
        DomainKind::Regulatory,
        DomainKind::Litigation,
        DomainKind::Contract,
        DomainKind::General,
    ];

    /// Get the domain name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainKind::Contract => "contract",
            DomainKind::Litigation => "litigation",
            DomainKind::IntellectualProperty => "intellectual_property",
            DomainKind::Regulatory => "regulatory",
            DomainKind::General => "general",
        }
    }

    /// Parse a domain from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "contract" | "contracts" => Some(DomainKind::Contract),
            "litigation" => Some(DomainKind::Litigation),
            "intellectual_property" | "ip" => Some(DomainKind::IntellectualProperty),
            "regulatory" | "compliance" => Some(DomainKind::Regulatory),
            "general" => Some(DomainKind::General),
            _ => None,
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            DomainKind::Contract => CONTRACT_TERMS,
            DomainKind::Litigation => LITIGATION_TERMS,
            DomainKind::IntellectualProperty => IP_TERMS,
            DomainKind::Regulatory => REGULATORY_TERMS,
            DomainKind::General => &[],
        }
    }

    /// Infer the domain from free text by keyword hits
    ///
    /// The kind with the most hits wins; ties go to the more specific kind
    /// (order of [`DomainKind::ALL`]). No hits yields `General`.
    ///
    /// # Examples
    ///
    /// ```
    /// use counsel_domain::DomainKind;
    ///
    /// assert_eq!(DomainKind::infer("Can I patent an algorithm?"), DomainKind::IntellectualProperty);
    /// assert_eq!(DomainKind::infer("What time is it?"), DomainKind::General);
    /// ```
    pub fn infer(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let mut best = (DomainKind::General, 0usize);

        for kind in Self::ALL {
            let hits = kind
                .keywords()
                .iter()
                .filter(|term| lowered.contains(*term))
                .count();
            if hits > best.1 {
                best = (kind, hits);
            }
        }

        best.0
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DomainKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid domain kind: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_contract() {
        assert_eq!(
            DomainKind::infer("Is a non-compete clause enforceable in California?"),
            DomainKind::Contract
        );
    }

    #[test]
    fn test_infer_litigation() {
        assert_eq!(
            DomainKind::infer("Should the defendant file a motion to dismiss before trial?"),
            DomainKind::Litigation
        );
    }

    #[test]
    fn test_infer_prefers_more_hits() {
        // one contract hit ("agreement") vs two IP hits
        let text = "Does the licensing agreement cover copyright in derivative works?";
        assert_eq!(DomainKind::infer(text), DomainKind::IntellectualProperty);
    }

    #[test]
    fn test_infer_general_fallback() {
        assert_eq!(DomainKind::infer("Hello there"), DomainKind::General);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(DomainKind::parse("IP"), Some(DomainKind::IntellectualProperty));
        assert_eq!(DomainKind::parse("intellectual-property"), Some(DomainKind::IntellectualProperty));
        assert_eq!(DomainKind::parse("Contracts"), Some(DomainKind::Contract));
        assert!(DomainKind::parse("tax").is_none());
        assert!("tax".parse::<DomainKind>().is_err());
    }
}
