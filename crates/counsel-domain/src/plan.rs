//! Reasoning plan - the ordered decomposition of a question into steps

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Position of a step in its plan (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct StepId(u32);

impl StepId {
    /// Create a step id from its 1-based position
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The tool a step needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepKind {
    /// Query the Retrieval Service for supporting passages
    Retrieve,

    /// Ask the Completion Service for reasoning text
    Generate,

    /// Check an intermediate output against the question's constraints
    Verify,
}

impl StepKind {
    /// Get the kind name as used in plans
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Retrieve => "RETRIEVE",
            StepKind::Generate => "GENERATE",
            StepKind::Verify => "VERIFY",
        }
    }

    /// Parse a step kind (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "RETRIEVE" => Some(StepKind::Retrieve),
            "GENERATE" => Some(StepKind::Generate),
            "VERIFY" => Some(StepKind::Verify),
            _ => None,
        }
    }

    /// Whether the step is answered by the Completion Service
    pub fn uses_completion(&self) -> bool {
        !matches!(self, StepKind::Retrieve)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step as declared by the plan, before execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    /// Position in the plan
    pub id: StepId,

    /// Tool the step needs
    pub kind: StepKind,

    /// What the step is meant to establish
    pub description: String,

    /// Retrieval query (RETRIEVE steps only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Earlier steps whose outputs feed this one
    pub depends_on: Vec<StepId>,
}

impl PlannedStep {
    /// Text sent to the Retrieval Service; falls back to the description
    pub fn retrieval_query(&self) -> &str {
        self.query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(&self.description)
    }
}

/// Structural problems with a plan
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// Plan has no steps
    #[error("plan contains no steps")]
    Empty,

    /// Step id does not match its position
    #[error("step at position {position} has id {id}")]
    OutOfSequence {
        /// Expected 1-based position
        position: u32,
        /// Declared id
        id: StepId,
    },

    /// Step has an empty description
    #[error("step {0} has an empty description")]
    EmptyDescription(StepId),

    /// Step depends on itself, a later step, or an unknown step
    #[error("step {step} depends on step {dependency}, which does not precede it")]
    InvalidDependency {
        /// Dependent step
        step: StepId,
        /// Offending dependency
        dependency: StepId,
    },
}

/// Ordered, immutable sequence of steps for one question
///
/// # Examples
///
/// ```
/// use counsel_domain::{PlannedStep, ReasoningPlan, StepId, StepKind};
///
/// let plan = ReasoningPlan::new(vec![
///     PlannedStep {
///         id: StepId::new(1),
///         kind: StepKind::Retrieve,
///         description: "Find the governing rule".to_string(),
///         query: Some("CA non-compete law".to_string()),
///         depends_on: vec![],
///     },
///     PlannedStep {
///         id: StepId::new(2),
///         kind: StepKind::Generate,
///         description: "Apply the rule".to_string(),
///         query: None,
///         depends_on: vec![StepId::new(1)],
///     },
/// ]).unwrap();
///
/// assert_eq!(plan.len(), 2);
/// assert_eq!(plan.synthesis_step_id(), StepId::new(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReasoningPlan {
    steps: Vec<PlannedStep>,
}

impl ReasoningPlan {
    /// Build a plan, checking ids run 1..=n and dependencies point backwards
    pub fn new(steps: Vec<PlannedStep>) -> Result<Self, PlanError> {
        if steps.is_empty() {
            return Err(PlanError::Empty);
        }

        for (idx, step) in steps.iter().enumerate() {
            let position = idx as u32 + 1;
            if step.id.value() != position {
                return Err(PlanError::OutOfSequence { position, id: step.id });
            }
            if step.description.trim().is_empty() {
                return Err(PlanError::EmptyDescription(step.id));
            }
            if let Some(bad) = step
                .depends_on
                .iter()
                .find(|dep| dep.value() == 0 || **dep >= step.id)
            {
                return Err(PlanError::InvalidDependency {
                    step: step.id,
                    dependency: *bad,
                });
            }
        }

        Ok(Self { steps })
    }

    /// Steps in execution order
    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    /// Look up a step by id
    pub fn get(&self, id: StepId) -> Option<&PlannedStep> {
        self.steps.get((id.value() as usize).checked_sub(1)?)
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a constructed plan
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Id reported for the implicit synthesis stage that follows the last step
    pub fn synthesis_step_id(&self) -> StepId {
        StepId::new(self.steps.len() as u32 + 1)
    }

    /// Count of steps of the given kind
    pub fn count(&self, kind: StepKind) -> usize {
        self.steps.iter().filter(|s| s.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn step(id: u32, kind: StepKind, deps: &[u32]) -> PlannedStep {
        PlannedStep {
            id: StepId::new(id),
            kind,
            description: format!("step {}", id),
            query: None,
            depends_on: deps.iter().map(|d| StepId::new(*d)).collect(),
        }
    }

    #[test]
    fn test_empty_plan_rejected() {
        assert_eq!(ReasoningPlan::new(vec![]).unwrap_err(), PlanError::Empty);
    }

    #[test]
    fn test_out_of_sequence_rejected() {
        let result = ReasoningPlan::new(vec![step(2, StepKind::Retrieve, &[])]);
        assert!(matches!(result, Err(PlanError::OutOfSequence { position: 1, .. })));
    }

    #[test]
    fn test_self_dependency_rejected() {
        let result = ReasoningPlan::new(vec![
            step(1, StepKind::Retrieve, &[]),
            step(2, StepKind::Generate, &[2]),
        ]);
        assert!(matches!(result, Err(PlanError::InvalidDependency { .. })));
    }

    #[test]
    fn test_blank_description_rejected() {
        let mut s = step(1, StepKind::Generate, &[]);
        s.description = "  ".to_string();
        assert_eq!(
            ReasoningPlan::new(vec![s]).unwrap_err(),
            PlanError::EmptyDescription(StepId::new(1))
        );
    }

    #[test]
    fn test_get_and_count() {
        let plan = ReasoningPlan::new(vec![
            step(1, StepKind::Retrieve, &[]),
            step(2, StepKind::Generate, &[1]),
            step(3, StepKind::Verify, &[2]),
        ])
        .unwrap();

        assert_eq!(plan.get(StepId::new(2)).unwrap().kind, StepKind::Generate);
        assert!(plan.get(StepId::new(0)).is_none());
        assert!(plan.get(StepId::new(4)).is_none());
        assert_eq!(plan.count(StepKind::Retrieve), 1);
        assert_eq!(plan.synthesis_step_id(), StepId::new(4));
    }

    #[test]
    fn test_retrieval_query_falls_back_to_description() {
        let mut s = step(1, StepKind::Retrieve, &[]);
        assert_eq!(s.retrieval_query(), "step 1");
        s.query = Some("CA non-compete law".to_string());
        assert_eq!(s.retrieval_query(), "CA non-compete law");
    }

    #[test]
    fn test_step_kind_parse() {
        assert_eq!(StepKind::parse("retrieve"), Some(StepKind::Retrieve));
        assert_eq!(StepKind::parse(" Verify "), Some(StepKind::Verify));
        assert_eq!(StepKind::parse("search"), None);
        assert!(StepKind::Verify.uses_completion());
        assert!(!StepKind::Retrieve.uses_completion());
    }

    proptest! {
        #[test]
        fn prop_backward_dependencies_always_accepted(n in 1u32..8, seed in any::<u64>()) {
            let steps: Vec<_> = (1..=n)
                .map(|id| {
                    let deps: Vec<u32> = (1..id).filter(|d| (seed >> (d % 64)) & 1 == 1).collect();
                    step(id, StepKind::Generate, &deps)
                })
                .collect();
            prop_assert!(ReasoningPlan::new(steps).is_ok());
        }

        #[test]
        fn prop_forward_dependency_always_rejected(n in 2u32..8, from in 1u32..8) {
            let from = from.min(n - 1);
            let steps: Vec<_> = (1..=n)
                .map(|id| if id == from { step(id, StepKind::Generate, &[n]) } else { step(id, StepKind::Generate, &[]) })
                .collect();
            let is_invalid_dependency = matches!(
                ReasoningPlan::new(steps),
                Err(PlanError::InvalidDependency { .. })
            );
            prop_assert!(is_invalid_dependency);
        }
    }
}
