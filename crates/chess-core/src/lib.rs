pub mod fen;
pub mod moves;

pub use fen::{parse_fen, position_fen, FenError};
pub use moves::{describe_uci_move, move_flags, MoveDetails, MoveError};
