//! Per-piece legality rules, castle recognition and check detection.
//!
//! The rule set is a deliberately simplified subset: en passant is not
//! modeled, castling is recognized from the king's move alone (no
//! path-through-check or rook-has-moved validation), and self-check
//! prevention only applies when `GameConfig` enables it.

use super::types::{MoveLegality, Piece, PieceKind, Square};
use super::Game;

impl Game {
    /// Check whether moving `piece` from `from` to `to` is legal under the
    /// simplified rules. A recognized castle reports the paired rook
    /// relocation in the verdict; the caller is expected to expand it into a
    /// second move.
    ///
    /// Squares are a caller precondition: both must be in range.
    #[must_use]
    pub fn is_legal_move(&self, piece: Piece, from: Square, to: Square) -> MoveLegality {
        let verdict = self.piece_rule(piece, from, to);

        if self.config.enforce_self_check_prevention && verdict.is_legal() {
            let mut scratch = self.clone();
            scratch.apply_unchecked(piece, from, to, verdict);
            if scratch.king_in_check(piece.is_black) {
                return MoveLegality::Illegal;
            }
        }

        verdict
    }

    /// Movement legality without the self-check veto. Check detection uses
    /// this directly so enabling the config flag cannot recurse.
    fn piece_rule(&self, piece: Piece, from: Square, to: Square) -> MoveLegality {
        // can't move onto a piece of the same color
        if let Some(occupant) = self.piece_at(to) {
            if occupant.is_black == piece.is_black {
                return MoveLegality::Illegal;
            }
        }

        let rows_moved = from.row.abs_diff(to.row);
        let cols_moved = from.col.abs_diff(to.col);

        match piece.kind {
            PieceKind::Pawn => self.pawn_rule(piece, from, to, rows_moved, cols_moved),

            PieceKind::Knight => {
                if (cols_moved == 2 && rows_moved == 1) || (rows_moved == 2 && cols_moved == 1) {
                    MoveLegality::Legal
                } else {
                    MoveLegality::Illegal
                }
            }

            PieceKind::Bishop => {
                if rows_moved == cols_moved && self.diagonal_clear(from, to) {
                    MoveLegality::Legal
                } else {
                    MoveLegality::Illegal
                }
            }

            PieceKind::Rook => {
                if (from.row == to.row || from.col == to.col) && self.straight_clear(from, to) {
                    MoveLegality::Legal
                } else {
                    MoveLegality::Illegal
                }
            }

            PieceKind::Queen => {
                let diagonal = rows_moved == cols_moved && self.diagonal_clear(from, to);
                let straight = (from.row == to.row || from.col == to.col)
                    && self.straight_clear(from, to);
                if diagonal || straight {
                    MoveLegality::Legal
                } else {
                    MoveLegality::Illegal
                }
            }

            PieceKind::King => {
                if rows_moved < 2 && cols_moved < 2 {
                    return MoveLegality::Legal;
                }
                // crude castle test: king leaves column 4 of rank 0 or 7
                // sideways by two or more columns
                if from.col == 4
                    && cols_moved > 1
                    && rows_moved == 0
                    && (from.row == 0 || from.row == 7)
                {
                    return MoveLegality::Castle {
                        rook_from: Self::current_rook_square_for_castle(to),
                        rook_to: Self::new_rook_square_for_castle(to),
                    };
                }
                MoveLegality::Illegal
            }
        }
    }

    fn pawn_rule(
        &self,
        piece: Piece,
        from: Square,
        to: Square,
        rows_moved: usize,
        cols_moved: usize,
    ) -> MoveLegality {
        // strictly forward; 1 or 2 rows from the home rank, else exactly 1
        let forward_ok = if piece.is_black {
            to.row > from.row && if from.row == 1 { rows_moved < 3 } else { rows_moved == 1 }
        } else {
            to.row < from.row && if from.row == 6 { rows_moved < 3 } else { rows_moved == 1 }
        };
        if !forward_ok {
            return MoveLegality::Illegal;
        }

        // a column change is only legal as a one-column diagonal capture
        if (self.piece_at(to).is_none() && to.col != from.col) || cols_moved > 1 {
            return MoveLegality::Illegal;
        }

        // a two-row advance needs the intermediate and destination rows
        // clear on the source file
        if rows_moved == 2 {
            let mid = Square {
                row: (from.row + to.row) / 2,
                col: from.col,
            };
            let landing = Square {
                row: to.row,
                col: from.col,
            };
            if self.piece_at(mid).is_some() || self.piece_at(landing).is_some() {
                return MoveLegality::Illegal;
            }
        }

        MoveLegality::Legal
    }

    /// Whether every square strictly between `from` and `to` along a shared
    /// row or column is empty.
    fn straight_clear(&self, from: Square, to: Square) -> bool {
        if from.row == to.row {
            let first = from.col.min(to.col) + 1;
            let last = from.col.max(to.col);
            for col in first..last {
                if self.board[to.row][col].is_some() {
                    return false;
                }
            }
        } else {
            let first = from.row.min(to.row) + 1;
            let last = from.row.max(to.row);
            for row in first..last {
                if self.board[row][from.col].is_some() {
                    return false;
                }
            }
        }
        true
    }

    /// Whether every square strictly between `from` and `to` along their
    /// diagonal is empty. Callers guarantee the move is diagonal.
    fn diagonal_clear(&self, from: Square, to: Square) -> bool {
        let (top, bottom) = if from.row < to.row {
            (from, to)
        } else {
            (to, from)
        };
        let step: isize = if bottom.col > top.col { 1 } else { -1 };

        let mut row = top.row + 1;
        let mut col = top.col as isize + step;
        while row < bottom.row {
            if self.board[row][col as usize].is_some() {
                return false;
            }
            row += 1;
            col += step;
        }
        true
    }

    /// Brute-force check detection: scan for the king of `is_black`, then
    /// ask whether any opposing piece has a legal move onto its square. The
    /// board is 64 squares, so the scan is more than fast enough.
    ///
    /// Returns false when no king of that color is on the board (it was just
    /// captured; the game is about to end).
    #[must_use]
    pub fn king_in_check(&self, is_black: bool) -> bool {
        let Some(king_square) = self.find_king(is_black) else {
            return false;
        };

        for row in 0..8 {
            for col in 0..8 {
                let square = Square { row, col };
                if let Some(piece) = self.piece_at(square) {
                    if piece.is_black != is_black
                        && self.piece_rule(piece, square, king_square).is_legal()
                    {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn find_king(&self, is_black: bool) -> Option<Square> {
        for row in 0..8 {
            for col in 0..8 {
                if let Some(piece) = self.board[row][col] {
                    if piece.kind == PieceKind::King && piece.is_black == is_black {
                        return Some(Square { row, col });
                    }
                }
            }
        }
        None
    }

    /// The rook's current square for a castle, derived from the king's
    /// destination: column 1 means the queenside rook on column 0, anything
    /// else the kingside rook on column 7. Color-independent.
    #[must_use]
    pub fn current_rook_square_for_castle(king_dest: Square) -> Square {
        Square {
            row: king_dest.row,
            col: if king_dest.col == 1 { 0 } else { 7 },
        }
    }

    /// The rook's post-castle square for a castle, derived from the king's
    /// destination: column 1 means column 2, anything else column 5.
    #[must_use]
    pub fn new_rook_square_for_castle(king_dest: Square) -> Square {
        Square {
            row: king_dest.row,
            col: if king_dest.col == 1 { 2 } else { 5 },
        }
    }

    /// Apply a move (and a castle's paired rook move) without legality
    /// checks. Used for the scratch-board self-check evaluation.
    fn apply_unchecked(&mut self, piece: Piece, from: Square, to: Square, verdict: MoveLegality) {
        self.clear_square(from);
        self.place_piece(piece, to);

        if let MoveLegality::Castle { rook_from, rook_to } = verdict {
            if let Some(rook) = self.piece_at(rook_from) {
                self.clear_square(rook_from);
                self.place_piece(rook, rook_to);
            }
        }
    }
}
