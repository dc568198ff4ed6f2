//! Board state and the simplified chess rule engine.
//!
//! The engine owns an 8x8 grid of optional pieces and answers legality and
//! check queries; it knows nothing about networking or rendering. The rule
//! set is an intentional subset of chess: no en passant, castling is
//! recognized without path-through-check or rook-has-moved validation, and
//! self-check prevention for the mover sits behind a config flag that
//! defaults to off.
//!
//! # Example
//! ```
//! use chess_link::game::{Game, GameConfig, Square};
//!
//! let game = Game::standard(GameConfig::default());
//! let pawn = game.piece_at(Square { row: 6, col: 4 }).unwrap();
//! let verdict = game.is_legal_move(pawn, Square { row: 6, col: 4 }, Square { row: 4, col: 4 });
//! assert!(verdict.is_legal());
//! ```

mod error;
mod rules;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use error::SquareError;
pub use state::{BoardObserver, Game};
pub use types::{GameConfig, MoveLegality, MoveRecord, PendingMove, Piece, PieceKind, Square};
