//! One analysis session per request: spawn, search, report, terminate.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use shakmaty::Chess;
use tracing::{debug, error, info};

use super::binary::ensure_executable;
use super::error::EngineError;
use super::report::AnalysisReport;
use super::stockfish::{EngineOptions, SearchLimit, StockfishEngine};
use crate::config::Config;

/// Lifecycle of a single analysis session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ProcessStarting,
    Analyzing,
    ResultReady,
    Terminated,
}

struct Session {
    state: SessionState,
    history: Vec<SessionState>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            history: vec![SessionState::Idle],
        }
    }

    fn advance(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "engine session");
        self.state = next;
        self.history.push(next);
    }
}

/// Stateless launcher; every call to [`EngineAdapter::analyze`] gets its own
/// engine process.
#[derive(Debug, Clone)]
pub struct EngineAdapter {
    path: PathBuf,
    options: EngineOptions,
    time_limit: Duration,
    win_chance_k: f64,
}

impl EngineAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::from_config(&Config {
            stockfish_path: path.into(),
            ..Config::default()
        })
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            path: config.stockfish_path.clone(),
            options: EngineOptions {
                threads: config.engine_threads,
                hash_mb: config.engine_hash_mb,
                handshake_timeout: Some(config.handshake_timeout),
            },
            time_limit: config.time_limit,
            win_chance_k: config.win_chance_k,
        }
    }

    /// Analyse a validated position to `depth`.
    pub async fn analyze(
        &self,
        fen: &str,
        position: &Chess,
        depth: u32,
    ) -> Result<AnalysisReport, EngineError> {
        self.analyze_traced(fen, position, depth).await.0
    }

    /// Like [`analyze`](Self::analyze), also returning the states the session
    /// went through.
    pub async fn analyze_traced(
        &self,
        fen: &str,
        position: &Chess,
        depth: u32,
    ) -> (Result<AnalysisReport, EngineError>, Vec<SessionState>) {
        let mut session = Session::new();
        session.advance(SessionState::ProcessStarting);

        let spawned = match ensure_executable(&self.path).await {
            Ok(()) => StockfishEngine::spawn(&self.path, &self.options).await,
            Err(e) => Err(e),
        };
        let mut engine = match spawned {
            Ok(engine) => engine,
            Err(e) => {
                error!(path = %self.path.display(), "Stockfish failed to start: {e}");
                session.advance(SessionState::Terminated);
                return (Err(e), session.history);
            }
        };

        session.advance(SessionState::Analyzing);
        let limit = SearchLimit {
            depth,
            movetime: self.time_limit,
        };
        // The engine gets the normalized position; the caller's FEN is only echoed.
        let started = Instant::now();
        let result = match engine.analyse(&chess_core::position_fen(position), limit).await {
            Ok(output) => {
                session.advance(SessionState::ResultReady);
                AnalysisReport::build(fen, position, &output, started.elapsed(), self.win_chance_k)
            }
            Err(e) => Err(e),
        };

        // Runs on every path out of the analysis, including parse failures.
        engine.quit().await;
        session.advance(SessionState::Terminated);

        match &result {
            Ok(report) => info!(
                depth = ?report.depth,
                best_move = ?report.best_move,
                time_ms = report.time,
                "analysis complete"
            ),
            Err(e) => error!("Error during Stockfish analysis: {e}"),
        }

        (result, session.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_never_spawns() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = EngineAdapter::new(dir.path().join("missing-stockfish"));
        let pos = chess_core::parse_fen("8/8/8/4k3/8/8/8/4K3 w - - 0 1").unwrap();

        let (result, states) = adapter
            .analyze_traced("8/8/8/4k3/8/8/8/4K3 w - - 0 1", &pos, 12)
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
        assert!(err.to_string().contains("missing-stockfish"));
        assert_eq!(
            states,
            vec![
                SessionState::Idle,
                SessionState::ProcessStarting,
                SessionState::Terminated
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_full_session_with_stub_engine() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stub-engine");
        std::fs::write(
            &path,
            "#!/bin/sh\n\
             while read -r line; do\n\
               case \"$line\" in\n\
                 uci) echo \"id name Stub\"; echo uciok ;;\n\
                 isready) echo readyok ;;\n\
                 go*) echo \"info depth 7 score cp -15 nodes 10 pv e7e5\"; echo \"bestmove e7e5\" ;;\n\
                 quit) exit 0 ;;\n\
               esac\n\
             done\n",
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let pos = chess_core::parse_fen(fen).unwrap();
        let (result, states) = EngineAdapter::new(&path).analyze_traced(fen, &pos, 7).await;

        let report = result.unwrap();
        assert_eq!(report.san.as_deref(), Some("e5"));
        assert_eq!(report.centipawns, Some(-15));
        assert_eq!(
            states,
            vec![
                SessionState::Idle,
                SessionState::ProcessStarting,
                SessionState::Analyzing,
                SessionState::ResultReady,
                SessionState::Terminated
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_engine_dying_mid_search_terminates_session() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crashing-engine");
        std::fs::write(
            &path,
            "#!/bin/sh\n\
             while read -r line; do\n\
               case \"$line\" in\n\
                 uci) echo uciok ;;\n\
                 isready) echo readyok ;;\n\
                 go*) exit 3 ;;\n\
               esac\n\
             done\n",
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let pos = chess_core::parse_fen(fen).unwrap();
        let (result, states) = EngineAdapter::new(&path).analyze_traced(fen, &pos, 5).await;

        assert!(matches!(result, Err(EngineError::Terminated(_))));
        assert_eq!(
            states,
            vec![
                SessionState::Idle,
                SessionState::ProcessStarting,
                SessionState::Analyzing,
                SessionState::Terminated
            ]
        );
    }
}
