//! Translating engine output plus board state into the response record.

use std::time::Duration;

use serde::{Serialize, Serializer};
use shakmaty::{Chess, Color, Position};

use super::error::EngineError;
use super::info::Score;
use super::stockfish::EngineOutput;

/// Flat analysis record returned by the eval endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub fen: String,
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    /// Wall time of the search in milliseconds
    pub time: u64,
    pub mate: Option<i32>,
    /// Pawns for the side to move; +/- infinity when a mate was found
    #[serde(serialize_with = "serialize_eval")]
    pub eval: Option<f64>,
    pub centipawns: Option<i32>,
    pub text: String,
    #[serde(rename = "move")]
    pub best_move: Option<String>,
    pub san: Option<String>,
    pub lan: Option<String>,
    pub turn: String,
    pub color: String,
    pub piece: Option<String>,
    pub flags: Option<String>,
    pub is_capture: Option<bool>,
    pub is_castling: Option<bool>,
    pub is_promotion: Option<bool>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub from_numeric: Option<u8>,
    pub to_numeric: Option<u8>,
    pub continuation_arr: Vec<String>,
    pub win_chance: Option<f64>,
    pub task_id: Option<String>,
}

/// JSON has no infinity, so mate sentinels go out as strings.
fn serialize_eval<S: Serializer>(eval: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match eval {
        Some(v) if v.is_infinite() && *v > 0.0 => serializer.serialize_str("Infinity"),
        Some(v) if v.is_infinite() => serializer.serialize_str("-Infinity"),
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_none(),
    }
}

/// Heuristic win chance from White's point of view.
///
/// Logistic curve over the mover-relative centipawn score,
/// `1 / (1 + 10^(-k * cp))`, mirrored when Black is to move. This is an
/// approximation, not a calibrated model; `k` is tunable via config.
pub fn win_chance(cp: i32, turn: Color, k: f64) -> f64 {
    let mover = 1.0 / (1.0 + 10f64.powf(-k * f64::from(cp)));
    match turn {
        Color::White => mover,
        Color::Black => 1.0 - mover,
    }
}

fn color_code(color: Color) -> &'static str {
    match color {
        Color::White => "w",
        Color::Black => "b",
    }
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

impl AnalysisReport {
    /// Build the record for `pos` from one search's output.
    ///
    /// Fails only when the engine's best move is not legal in `pos`.
    pub fn build(
        fen: &str,
        pos: &Chess,
        output: &EngineOutput,
        elapsed: Duration,
        win_chance_k: f64,
    ) -> Result<Self, EngineError> {
        let turn = pos.turn();
        let info = &output.info;
        let depth_label = info
            .depth
            .map(|d| d.to_string())
            .unwrap_or_else(|| "?".to_string());

        let mut report = Self {
            fen: fen.to_string(),
            depth: info.depth,
            seldepth: info.seldepth,
            nodes: info.nodes,
            nps: info.nps,
            time: elapsed.as_millis() as u64,
            mate: None,
            eval: None,
            centipawns: None,
            text: String::new(),
            best_move: None,
            san: None,
            lan: None,
            turn: color_code(turn).to_string(),
            color: color_code(turn).to_string(),
            piece: None,
            flags: None,
            is_capture: None,
            is_castling: None,
            is_promotion: None,
            from: None,
            to: None,
            from_numeric: None,
            to_numeric: None,
            continuation_arr: output.continuation(),
            win_chance: None,
            task_id: None,
        };

        match info.score {
            Some(Score::Mate(m)) => {
                report.mate = Some(m);
                report.eval = Some(if m > 0 { f64::INFINITY } else { f64::NEG_INFINITY });
                report.text = format!("Mate in {}. Depth {depth_label}.", m.abs());
            }
            Some(Score::Cp(cp)) => {
                let pawns = f64::from(cp) / 100.0;
                let status = if cp > 50 {
                    "winning"
                } else if cp < -50 {
                    "losing"
                } else {
                    "equal"
                };
                report.eval = Some(pawns);
                report.centipawns = Some(cp);
                report.win_chance = Some(win_chance(cp, turn, win_chance_k));
                report.text = format!(
                    "Eval: {pawns:.2}. {} is {status}. Depth {depth_label}.",
                    color_name(turn)
                );
            }
            None => {}
        }

        if let Some(uci) = output.best_move() {
            let details = chess_core::describe_uci_move(pos, uci)?;

            let eval_label = match (info.score, report.eval) {
                (Some(Score::Mate(m)), _) => format!("#{m}"),
                (_, Some(e)) => format!("{e:.2}"),
                _ => "N/A".to_string(),
            };
            let rest = report
                .text
                .split_once(". ")
                .map(|(_, rest)| rest.to_string())
                .unwrap_or_else(|| report.text.clone());
            report.text = format!("Best move {}: [{eval_label}]. {rest}", details.san)
                .trim_end()
                .to_string();

            report.best_move = Some(details.uci.clone());
            report.lan = Some(details.uci.clone());
            report.san = Some(details.san.clone());
            report.from = Some(details.from.to_string());
            report.to = Some(details.to.to_string());
            report.from_numeric = Some(details.from_index());
            report.to_numeric = Some(details.to_index());
            report.piece = Some(details.piece().to_string());
            report.is_capture = Some(details.is_capture);
            report.is_castling = Some(details.is_castling);
            report.is_promotion = Some(details.is_promotion);
            report.flags = Some(details.flags);
        }

        Ok(report)
    }
}
