//! Move metadata derived from board state.
//!
//! The flag string follows the chess.js convention:
//! `n` normal, `b` big pawn push, `e` en passant, `c` capture,
//! `p` promotion, `k` kingside castle, `q` queenside castle.

use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, CastlingSide, Chess, Move, Role, Square};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MoveError {
    #[error("invalid UCI move '{0}'")]
    Parse(String),

    #[error("illegal move '{0}' in this position")]
    Illegal(String),
}

/// Everything the service reports about a single move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDetails {
    /// Normalized UCI (king destination for castling, e.g. `e1g1`)
    pub uci: String,
    pub san: String,
    pub from: Square,
    pub to: Square,
    pub role: Role,
    pub is_capture: bool,
    pub is_castling: bool,
    pub is_promotion: bool,
    pub flags: String,
}

impl MoveDetails {
    /// Lowercase piece letter of the moved piece (`p`, `n`, `b`, `r`, `q`, `k`).
    pub fn piece(&self) -> char {
        self.role.char()
    }

    /// Square index 0-63, a1 = 0, h8 = 63.
    pub fn from_index(&self) -> u8 {
        self.from as u8
    }

    pub fn to_index(&self) -> u8 {
        self.to as u8
    }
}

/// Resolve a UCI move string against `pos` and derive its metadata.
pub fn describe_uci_move(pos: &Chess, uci: &str) -> Result<MoveDetails, MoveError> {
    let uci_move = UciMove::from_ascii(uci.trim().as_bytes())
        .map_err(|_| MoveError::Parse(uci.to_string()))?;
    let mv = uci_move
        .to_move(pos)
        .map_err(|_| MoveError::Illegal(uci.to_string()))?;

    // Castling is reported with the king's destination square, not the rook's.
    let normalized = mv.to_uci(CastlingMode::Standard);
    let (from, to) = match &normalized {
        UciMove::Normal { from, to, .. } => (*from, *to),
        _ => return Err(MoveError::Illegal(uci.to_string())),
    };

    Ok(MoveDetails {
        uci: normalized.to_string(),
        san: SanPlus::from_move(pos.clone(), mv).to_string(),
        from,
        to,
        role: mv.role(),
        is_capture: mv.is_capture(),
        is_castling: mv.is_castle(),
        is_promotion: mv.is_promotion(),
        flags: move_flags(&mv),
    })
}

/// chess.js-style flags for a legal move.
///
/// Promotion wins over castling, capture letters are appended after that,
/// and a two-square pawn advance replaces `n` with a leading `b`.
pub fn move_flags(mv: &Move) -> String {
    let mut flags = String::new();

    if mv.is_promotion() {
        flags.push('p');
    } else {
        match mv.castling_side() {
            Some(CastlingSide::KingSide) => flags.push('k'),
            Some(CastlingSide::QueenSide) => flags.push('q'),
            None => {}
        }
    }

    if mv.is_capture() {
        flags.push(if mv.is_en_passant() { 'e' } else { 'c' });
    }

    if flags.is_empty() {
        flags.push('n');
    }

    if is_double_pawn_push(mv) {
        flags = format!("b{}", flags.replace('n', ""));
    }

    flags
}

fn is_double_pawn_push(mv: &Move) -> bool {
    if mv.role() != Role::Pawn {
        return false;
    }
    match mv.from() {
        Some(from) => (mv.to().rank() as i32 - from.rank() as i32).abs() == 2,
        None => false,
    }
}
