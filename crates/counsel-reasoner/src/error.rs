//! Error types for the reasoner

use counsel_domain::StepId;
use thiserror::Error;

/// Errors surfaced by a reasoning run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReasonerError {
    /// The planning call failed or returned an unusable step list
    #[error("Plan generation failed: {0}")]
    PlanGeneration(String),

    /// A step's external call failed after retries
    #[error("Step {step_id} failed after {completed_steps} completed step(s): {reason}")]
    StepExecution {
        /// Failing step; the synthesis stage reports the plan length plus one
        step_id: StepId,
        /// Steps that finished before the failure
        completed_steps: usize,
        /// Underlying failure
        reason: String,
    },
}

impl ReasonerError {
    /// Failing step id, for step execution errors
    pub fn step_id(&self) -> Option<StepId> {
        match self {
            ReasonerError::PlanGeneration(_) => None,
            ReasonerError::StepExecution { step_id, .. } => Some(*step_id),
        }
    }
}

/// Failures inside the self-reflection pass; never surfaced to callers
#[derive(Error, Debug)]
pub(crate) enum ReflectionError {
    #[error("critique call failed: {0}")]
    Critique(String),

    #[error("unusable model output: {0}")]
    Parse(String),

    #[error("revision call failed: {0}")]
    Revision(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_execution_message() {
        let err = ReasonerError::StepExecution {
            step_id: StepId::new(4),
            completed_steps: 3,
            reason: "Request timed out".to_string(),
        };
        assert_eq!(err.step_id(), Some(StepId::new(4)));
        assert_eq!(
            err.to_string(),
            "Step 4 failed after 3 completed step(s): Request timed out"
        );
        assert_eq!(ReasonerError::PlanGeneration("empty".into()).step_id(), None);
    }
}
