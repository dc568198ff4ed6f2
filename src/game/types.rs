//! Core value types for the rule engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::SquareError;

/// A square on the 8x8 board. Row 0 is the top rank (black's back rank in
/// the standard setup), row 7 the bottom; both axes run 0-7.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square {
    pub row: usize,
    pub col: usize,
}

impl Square {
    /// Create a new square with bounds checking.
    #[must_use]
    pub fn new(row: usize, col: usize) -> Option<Self> {
        if row < 8 && col < 8 {
            Some(Square { row, col })
        } else {
            None
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl TryFrom<(usize, usize)> for Square {
    type Error = SquareError;

    fn try_from((row, col): (usize, usize)) -> Result<Self, Self::Error> {
        if row >= 8 {
            return Err(SquareError::RowOutOfBounds { row });
        }
        if col >= 8 {
            return Err(SquareError::ColOutOfBounds { col });
        }
        Ok(Square { row, col })
    }
}

/// Chess piece kinds. The declaration order doubles as the sort key the
/// captured-piece tray uses for display grouping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// All piece kinds in declaration order.
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceKind::Pawn => "Pawn",
            PieceKind::Knight => "Knight",
            PieceKind::Bishop => "Bishop",
            PieceKind::Rook => "Rook",
            PieceKind::Queen => "Queen",
            PieceKind::King => "King",
        };
        f.write_str(name)
    }
}

/// A piece on the board. Immutable once created; moving a piece replaces the
/// occupant of a square rather than mutating the piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub is_black: bool,
}

impl Piece {
    #[must_use]
    pub const fn new(kind: PieceKind, is_black: bool) -> Self {
        Piece { kind, is_black }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", if self.is_black { "black" } else { "white" }, self.kind)
    }
}

/// One confirmed move as it travels over the wire. A castle expands to two
/// records: the king move followed by its paired rook move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub from: Square,
    pub to: Square,
}

/// Verdict of a legality check. The castle variant carries the paired rook
/// relocation so callers never have to read back transient engine state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveLegality {
    Illegal,
    Legal,
    Castle { rook_from: Square, rook_to: Square },
}

impl MoveLegality {
    #[inline]
    #[must_use]
    pub fn is_legal(self) -> bool {
        !matches!(self, MoveLegality::Illegal)
    }
}

/// Transient per-gesture state: captured when the player picks a piece up,
/// consumed when the gesture ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingMove {
    pub origin: Square,
    pub is_black: bool,
    pub kind: PieceKind,
}

impl PendingMove {
    #[must_use]
    pub const fn new(origin: Square, piece: Piece) -> Self {
        PendingMove {
            origin,
            is_black: piece.is_black,
            kind: piece.kind,
        }
    }
}

/// Rule-engine configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct GameConfig {
    /// Reject otherwise-legal moves that leave the mover's own king in
    /// check. Off by default: with the rule disabled a king can be captured
    /// outright, which is how the game ends.
    pub enforce_self_check_prevention: bool,
}
