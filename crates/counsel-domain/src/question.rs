//! Question module - the legal question submitted to the pipeline

use crate::domain_kind::DomainKind;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Unique identifier for a question based on UUIDv7
///
/// Chronologically sortable, so log lines and answers for the same session
/// order naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuestionId(u128);

impl QuestionId {
    /// Generate a new UUIDv7-based QuestionId
    ///
    /// # Examples
    ///
    /// ```
    /// use counsel_domain::QuestionId;
    ///
    /// let id = QuestionId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a QuestionId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a QuestionId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, QuestionError> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| QuestionError::InvalidId(e.to_string()))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for QuestionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl Serialize for QuestionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Errors raised while building a question
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuestionError {
    /// Question text is empty or whitespace
    #[error("Question text must not be empty")]
    EmptyText,

    /// Jurisdiction tag is empty or whitespace
    #[error("Jurisdiction tag must not be empty")]
    EmptyJurisdiction,

    /// Malformed identifier string
    #[error("Invalid question id: {0}")]
    InvalidId(String),
}

/// Reference to the document a question is asked about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentContext {
    /// Caller-supplied reference (file name, matter number, URL)
    pub reference: String,

    /// Text of the document, when available
    pub text: Option<String>,
}

impl DocumentContext {
    /// Reference-only context
    pub fn reference(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            text: None,
        }
    }

    /// Context with the document text attached
    pub fn with_text(reference: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            text: Some(text.into()),
        }
    }

    /// Leading `max_chars` characters of the document text
    pub fn excerpt(&self, max_chars: usize) -> Option<String> {
        self.text
            .as_ref()
            .map(|text| text.chars().take(max_chars).collect())
    }
}

/// A legal question
///
/// Built with the `with_*` methods before submission; the pipeline only ever
/// borrows it, so it is immutable once submitted.
///
/// # Examples
///
/// ```
/// use counsel_domain::{DomainKind, Question};
///
/// let question = Question::new("Is a non-compete clause enforceable in California?")
///     .unwrap()
///     .with_jurisdiction("CA")
///     .unwrap();
///
/// assert_eq!(question.jurisdiction(), Some("CA"));
/// assert_eq!(question.domain(), DomainKind::Contract);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    jurisdiction: Option<String>,
    document: Option<DocumentContext>,
    domain: Option<DomainKind>,
}

impl Question {
    /// Create a question from its text
    pub fn new(text: impl Into<String>) -> Result<Self, QuestionError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        Ok(Self {
            id: QuestionId::new(),
            text,
            jurisdiction: None,
            document: None,
            domain: None,
        })
    }

    /// Tag the question with a jurisdiction (e.g. "CA", "England and Wales")
    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Result<Self, QuestionError> {
        let jurisdiction = jurisdiction.into().trim().to_string();
        if jurisdiction.is_empty() {
            return Err(QuestionError::EmptyJurisdiction);
        }
        self.jurisdiction = Some(jurisdiction);
        Ok(self)
    }

    /// Attach the document the question refers to
    pub fn with_document(mut self, document: DocumentContext) -> Self {
        self.document = Some(document);
        self
    }

    /// Pin the legal domain instead of inferring it from the text
    pub fn with_domain(mut self, domain: DomainKind) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Question identifier
    pub fn id(&self) -> QuestionId {
        self.id
    }

    /// Question text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Jurisdiction tag, if any
    pub fn jurisdiction(&self) -> Option<&str> {
        self.jurisdiction.as_deref()
    }

    /// Document context, if any
    pub fn document(&self) -> Option<&DocumentContext> {
        self.document.as_ref()
    }

    /// Legal domain: the pinned one, or the one inferred from the text
    pub fn domain(&self) -> DomainKind {
        self.domain
            .unwrap_or_else(|| DomainKind::infer(&self.text))
    }
}
