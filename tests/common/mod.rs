use std::path::{Path, PathBuf};

use reqwest::Client;
use server::config::Config;
use tempfile::TempDir;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}

/// A running server plus the temp dir holding its stub engine.
pub struct TestServer {
    pub base_url: String,
    pub engine_path: PathBuf,
    pub dir: TempDir,
}

impl TestServer {
    /// Build a URL for an API endpoint.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Marker file the stub engine touches when it is launched.
    pub fn launch_marker(&self) -> PathBuf {
        self.dir.path().join("launched")
    }

    /// Marker file the stub engine touches when it receives `quit`.
    pub fn quit_marker(&self) -> PathBuf {
        self.dir.path().join("quit")
    }

    /// Last `position` command the stub engine received.
    pub fn position_sent(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("position"))
            .expect("Stub engine never received a position")
            .trim_end()
            .to_string()
    }
}

/// What the stub engine prints in answer to `go`.
pub struct StubReply<'a> {
    /// e.g. `cp 35` or `mate -2`
    pub score: &'a str,
    pub pv: &'a str,
    pub bestmove: &'a str,
}

impl Default for StubReply<'_> {
    fn default() -> Self {
        Self {
            score: "cp 35",
            pv: "e2e4 e7e5 g1f3",
            bestmove: "e2e4",
        }
    }
}

/// Shell script speaking just enough UCI for one search. It echoes the
/// requested depth back as the reported depth, records the `position`
/// command and touches a `quit` marker next to `marker` on shutdown.
pub fn stub_engine_script(marker: &Path, reply: &StubReply) -> String {
    let dir = marker.parent().unwrap_or(Path::new("."));
    format!(
        r#"#!/bin/sh
touch "{marker}"
while read -r line; do
  case "$line" in
    uci) echo "id name StubFish"; echo "uciok" ;;
    isready) echo "readyok" ;;
    position*) echo "$line" > "{dir}/position" ;;
    go*)
      set -- $line
      echo "info string stub engine"
      echo "info depth $3 seldepth 21 multipv 1 score {score} nodes 123456 nps 987654 time 125 pv {pv}"
      echo "bestmove {bestmove}"
      ;;
    quit) touch "{dir}/quit"; exit 0 ;;
  esac
done
"#,
        marker = marker.display(),
        dir = dir.display(),
        score = reply.score,
        pv = reply.pv,
        bestmove = reply.bestmove,
    )
}

/// Stub engine that completes the handshake, then dies on `go`.
pub fn crashing_engine_script(marker: &Path) -> String {
    format!(
        r#"#!/bin/sh
touch "{marker}"
while read -r line; do
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) exit 3 ;;
  esac
done
"#,
        marker = marker.display(),
    )
}

/// Write `script` as the engine binary with the given permission bits.
#[cfg(unix)]
pub fn write_engine(dir: &Path, script: &str, mode: u32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("stockfish");
    std::fs::write(&path, script).expect("Failed to write stub engine");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode))
        .expect("Failed to set stub engine permissions");
    path
}

/// Boot the router on an ephemeral port using `engine_path` as the engine.
pub async fn spawn_server(dir: TempDir, engine_path: PathBuf) -> TestServer {
    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        stockfish_path: engine_path.clone(),
        ..Config::default()
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        server::serve(listener, config, std::future::pending())
            .await
            .expect("Server error");
    });

    TestServer {
        base_url: format!("http://{addr}"),
        engine_path,
        dir,
    }
}

/// Server backed by a stub engine answering with `reply`.
#[cfg(unix)]
pub async fn spawn_with_stub(reply: StubReply<'_>) -> TestServer {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let script = stub_engine_script(&dir.path().join("launched"), &reply);
    let path = write_engine(dir.path(), &script, 0o755);
    spawn_server(dir, path).await
}
