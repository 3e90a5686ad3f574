//! Analysis session state machine
//!
//! - `state`: the session value and its caller-driven operations
//! - `reducer`: applies decoded stream records to a session
//! - `labels`: progress labels for backend operations
//! - `driver`: runs phases end to end against an [`AnalysisService`](crate::client::AnalysisService)

mod driver;
mod labels;
mod reducer;
mod state;

pub use driver::{PhaseOutcome, SessionDriver};
pub use labels::{DefaultStageLabels, StageLabels};
pub use reducer::{Reducer, Transition};
pub use state::{AnalysisSession, Phase, SessionInputs, SessionView, Stage};
