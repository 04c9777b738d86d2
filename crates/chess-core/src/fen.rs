//! FEN validation.
//!
//! A FEN is accepted when it parses and describes a position the engine can
//! search: kings present and the side not to move not in check. Stale
//! castling rights and unusable en passant squares are dropped rather than
//! rejected.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode, PositionError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FenError {
    #[error("empty FEN")]
    Empty,

    #[error("{0}")]
    Syntax(#[from] shakmaty::fen::ParseFenError),

    #[error("illegal position: {0}")]
    Position(String),
}

/// Parse and validate a FEN string into a playable position.
pub fn parse_fen(fen: &str) -> Result<Chess, FenError> {
    let fen = fen.trim();
    if fen.is_empty() {
        return Err(FenError::Empty);
    }

    let parsed = Fen::from_ascii(fen.as_bytes())?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .or_else(PositionError::ignore_invalid_castling_rights)
        .or_else(PositionError::ignore_invalid_ep_square)
        .map_err(|e| FenError::Position(e.to_string()))
}

/// Full six-field FEN of a validated position, as sent to the engine.
pub fn position_fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::{Color, Position};

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_parse_start_position() {
        let pos = parse_fen(START_FEN).unwrap();
        assert_eq!(pos.turn(), Color::White);
        assert_eq!(pos.legal_moves().len(), 20);
    }

    #[test]
    fn test_black_to_move() {
        let pos = parse_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
        assert_eq!(pos.turn(), Color::Black);
    }

    #[test]
    fn test_wrong_rank_count_rejected() {
        let err = parse_fen("rnbqkbnr/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert!(err.is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(parse_fen("not a fen"), Err(FenError::Syntax(_))));
        assert!(matches!(parse_fen("   "), Err(FenError::Empty)));
    }

    #[test]
    fn test_stale_castling_rights_dropped() {
        let pos = parse_fen("r3k2r/8/8/8/8/8/8/4K3 w KQkq - 0 1").unwrap();
        assert_eq!(position_fen(&pos), "r3k2r/8/8/8/8/8/8/4K3 w kq - 0 1");
    }

    #[test]
    fn test_unusable_ep_square_dropped() {
        // chess.js writes the ep square after every double push
        let pos = parse_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        assert_eq!(pos.turn(), Color::Black);
        assert_eq!(
            position_fen(&pos),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );

        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e3 0 1").is_ok());
    }

    #[test]
    fn test_partial_fen_is_completed() {
        let pos = parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR").unwrap();
        assert_eq!(position_fen(&pos), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1");
    }

    #[test]
    fn test_side_not_to_move_in_check_rejected() {
        let err = parse_fen("4k3/4R3/8/8/8/8/8/4K3 w - - 0 1").unwrap_err();
        assert!(matches!(err, FenError::Position(_)));
    }

    #[test]
    fn test_missing_king_rejected() {
        let err = parse_fen("8/8/8/8/8/8/8/K7 w - - 0 1").unwrap_err();
        assert!(matches!(err, FenError::Position(_)));
    }
}
