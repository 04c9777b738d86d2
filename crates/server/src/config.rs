use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Path to the UCI engine binary
    pub stockfish_path: PathBuf,
    /// Search depth used when the request does not name one
    pub default_depth: u32,
    /// Requested depths above this are clamped
    pub max_depth: u32,
    /// `movetime` bound sent with every `go`
    pub time_limit: Duration,
    /// Upper bound on the `uci`/`isready` handshake
    pub handshake_timeout: Duration,
    /// Scaling constant of the logistic win-chance heuristic
    pub win_chance_k: f64,
    pub engine_threads: Option<u32>,
    pub engine_hash_mb: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            stockfish_path: PathBuf::from("bin/stockfish"),
            default_depth: 12,
            max_depth: 50,
            time_limit: Duration::from_secs(5),
            handshake_timeout: Duration::from_secs(10),
            win_chance_k: 0.004,
            engine_threads: None,
            engine_hash_mb: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            stockfish_path: env::var("STOCKFISH_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.stockfish_path),
            default_depth: parse_var("DEFAULT_DEPTH").unwrap_or(defaults.default_depth),
            max_depth: parse_var("MAX_DEPTH").unwrap_or(defaults.max_depth),
            time_limit: parse_var::<f64>("ANALYSIS_TIME_LIMIT_SECS")
                .filter(|secs| *secs > 0.0)
                .map(Duration::from_secs_f64)
                .unwrap_or(defaults.time_limit),
            handshake_timeout: parse_var("ENGINE_HANDSHAKE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.handshake_timeout),
            win_chance_k: parse_var("WIN_CHANCE_K").unwrap_or(defaults.win_chance_k),
            engine_threads: parse_var("ENGINE_THREADS"),
            engine_hash_mb: parse_var("ENGINE_HASH_MB"),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
