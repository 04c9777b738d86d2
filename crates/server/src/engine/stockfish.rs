//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use super::error::EngineError;
use super::info::SearchInfo;

/// How long `quit` waits for a clean exit before killing the process
const QUIT_GRACE: Duration = Duration::from_millis(500);

/// Options applied once after the UCI handshake
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    pub handshake_timeout: Option<Duration>,
}

/// Bounds of a single search: `go depth D movetime T`
#[derive(Debug, Clone, Copy)]
pub struct SearchLimit {
    pub depth: u32,
    pub movetime: Duration,
}

/// Everything the engine reported for one search
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    pub info: SearchInfo,
    /// The `bestmove` token, `None` for `bestmove (none)`
    pub best_move: Option<String>,
}

impl EngineOutput {
    /// First move of the principal variation, falling back to `bestmove`.
    pub fn best_move(&self) -> Option<&str> {
        self.info
            .pv
            .first()
            .map(String::as_str)
            .or(self.best_move.as_deref())
    }

    /// The continuation, `[bestmove]` when no pv was reported.
    pub fn continuation(&self) -> Vec<String> {
        if !self.info.pv.is_empty() {
            return self.info.pv.clone();
        }
        self.best_move.iter().cloned().collect()
    }
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn spawn(path: &Path, options: &EngineOptions) -> Result<Self, EngineError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::Spawn(e.to_string()))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Spawn("stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Spawn("stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
        };

        match options.handshake_timeout {
            Some(limit) => tokio::time::timeout(limit, engine.handshake(options))
                .await
                .map_err(|_| EngineError::Timeout("uci"))??,
            None => engine.handshake(options).await?,
        }

        Ok(engine)
    }

    async fn handshake(&mut self, options: &EngineOptions) -> Result<(), EngineError> {
        self.send("uci").await?;
        self.wait_for("uciok").await?;

        if let Some(threads) = options.threads {
            self.send(&format!("setoption name Threads value {threads}")).await?;
        }
        if let Some(hash) = options.hash_mb {
            self.send(&format!("setoption name Hash value {hash}")).await?;
        }
        self.send("setoption name UCI_AnalyseMode value true").await?;
        self.send("ucinewgame").await?;
        self.send("isready").await?;
        self.wait_for("readyok").await
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| EngineError::Io(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| EngineError::Io(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Read one line, treating end of stream as the process having died
    async fn read_line(&mut self, line: &mut String) -> Result<(), EngineError> {
        line.clear();
        let read = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| EngineError::Io(format!("Failed to read from Stockfish: {e}")))?;
        if read == 0 {
            let status = match tokio::time::timeout(QUIT_GRACE, self.process.wait()).await {
                Ok(Ok(status)) => status.to_string(),
                Ok(Err(e)) => e.to_string(),
                Err(_) => "stdout closed".to_string(),
            };
            return Err(EngineError::Terminated(status));
        }
        Ok(())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), EngineError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();
            debug!(line = trimmed, "SF >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    /// Search `fen` within `limit` and collect the engine's report
    pub async fn analyse(&mut self, fen: &str, limit: SearchLimit) -> Result<EngineOutput, EngineError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!(
            "go depth {} movetime {}",
            limit.depth,
            limit.movetime.as_millis()
        ))
        .await?;

        let mut output = EngineOutput::default();
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();
            debug!(line = trimmed, "SF >");

            if trimmed.starts_with("info") {
                output.info.merge_line(trimmed);
            } else if trimmed.starts_with("bestmove") {
                output.best_move = trimmed
                    .split_whitespace()
                    .nth(1)
                    .filter(|m| *m != "(none)" && *m != "0000")
                    .map(String::from);
                break;
            }
        }

        Ok(output)
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        if tokio::time::timeout(QUIT_GRACE, self.process.wait()).await.is_err() {
            let _ = self.process.kill().await;
        }
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}
