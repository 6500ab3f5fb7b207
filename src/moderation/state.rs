// Per-session submission lifecycle.
//
//   Idle ──submit──▶ Analyzing ──result──▶ Safe | Risk
//    ▲                   │                    │
//    └──────error────────┘        next submit (via Idle)
//
// A second submit while Analyzing is rejected rather than queued.

use std::fmt;

use serde::Serialize;

use super::severity::UiState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Analyzing,
    Safe,
    Risk,
}

/// Returned when a submission arrives while another is still being analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisInProgress;

impl fmt::Display for AnalysisInProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("An analysis is already in progress")
    }
}

impl std::error::Error for AnalysisInProgress {}

impl SubmissionPhase {
    /// Enter Analyzing. Finished states reset through Idle first.
    pub fn begin(self) -> Result<Self, AnalysisInProgress> {
        match self {
            SubmissionPhase::Analyzing => Err(AnalysisInProgress),
            SubmissionPhase::Idle | SubmissionPhase::Safe | SubmissionPhase::Risk => {
                Ok(SubmissionPhase::Analyzing)
            }
        }
    }

    /// Settle on the result's display state. Ignored unless Analyzing.
    pub fn complete(self, ui_state: UiState) -> Self {
        match self {
            SubmissionPhase::Analyzing => match ui_state {
                UiState::Safe => SubmissionPhase::Safe,
                UiState::Risk => SubmissionPhase::Risk,
            },
            other => other,
        }
    }

    /// The collaborator failed; go back to Idle so the user can resubmit.
    pub fn fail(self) -> Self {
        SubmissionPhase::Idle
    }

    pub fn is_analyzing(&self) -> bool {
        *self == SubmissionPhase::Analyzing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let phase = SubmissionPhase::default().begin().unwrap();
        assert_eq!(phase, SubmissionPhase::Analyzing);
        assert_eq!(phase.complete(UiState::Risk), SubmissionPhase::Risk);
    }

    #[test]
    fn test_resubmit_after_result() {
        let phase = SubmissionPhase::Safe.begin().unwrap();
        assert_eq!(phase, SubmissionPhase::Analyzing);
    }

    #[test]
    fn test_double_submit_rejected() {
        assert_eq!(SubmissionPhase::Analyzing.begin(), Err(AnalysisInProgress));
    }

    #[test]
    fn test_error_returns_to_idle() {
        let phase = SubmissionPhase::Idle.begin().unwrap().fail();
        assert_eq!(phase, SubmissionPhase::Idle);
    }

    #[test]
    fn test_complete_outside_analyzing_is_noop() {
        assert_eq!(SubmissionPhase::Idle.complete(UiState::Risk), SubmissionPhase::Idle);
    }
}
