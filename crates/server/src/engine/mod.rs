//! UCI engine adapter: locate the binary, run one search, translate the
//! engine's output into an [`AnalysisReport`].

mod analysis;
mod binary;
mod error;
mod info;
mod report;
mod stockfish;

pub use analysis::{EngineAdapter, SessionState};
pub use binary::ensure_executable;
pub use error::EngineError;
pub use report::AnalysisReport;
