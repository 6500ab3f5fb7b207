// Moderation core: the decision policy and the small amount of state that
// surrounds it. Nothing in here does I/O.

pub mod history;
pub mod labels;
pub mod result;
pub mod safety;
pub mod severity;
pub mod state;

pub use labels::{Category, LabelSet};
pub use result::{AnalysisResult, DecisionPayload};
pub use severity::{classify, AlertDecision, SeverityTier, UiState};
