//! Board storage and initial setup.

use super::types::{GameConfig, Piece, PieceKind, Square};

/// Observer hook for the one-shot setup sequence. The (external) view layer
/// implements this to create a sprite per placed piece.
pub trait BoardObserver {
    fn piece_added(&mut self, piece: Piece, square: Square);
}

impl<F: FnMut(Piece, Square)> BoardObserver for F {
    fn piece_added(&mut self, piece: Piece, square: Square) {
        self(piece, square)
    }
}

/// The rule engine: an 8x8 board of optional pieces plus legality and check
/// queries (see `rules`). Exclusively owned by its caller; no internal
/// locking, single logical thread of control.
#[derive(Clone, Debug)]
pub struct Game {
    // [row][col], row 0 = top rank
    pub(crate) board: [[Option<Piece>; 8]; 8],
    pub(crate) config: GameConfig,
}

impl Game {
    /// Create an engine with an empty board.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        Game {
            board: [[None; 8]; 8],
            config,
        }
    }

    /// Create an engine holding the standard 32-piece starting position,
    /// notifying `observer` once per placed piece.
    #[must_use]
    pub fn with_setup<O: BoardObserver>(config: GameConfig, mut observer: O) -> Self {
        let mut game = Game::new(config);
        game.setup(&mut observer);
        game
    }

    /// Create an engine holding the standard starting position with no
    /// placement observer.
    #[must_use]
    pub fn standard(config: GameConfig) -> Self {
        Self::with_setup(config, |_: Piece, _: Square| {})
    }

    /// Place the standard starting position: back rank R N B Q K B N R with
    /// pawns on the adjacent rank, black on rows 0-1 and white on rows 6-7.
    pub fn setup(&mut self, observer: &mut dyn BoardObserver) {
        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        for (col, kind) in back_rank.iter().enumerate() {
            self.add_piece(Piece::new(*kind, true), Square { row: 0, col }, observer);
            self.add_piece(Piece::new(PieceKind::Pawn, true), Square { row: 1, col }, observer);
            self.add_piece(Piece::new(PieceKind::Pawn, false), Square { row: 6, col }, observer);
            self.add_piece(Piece::new(*kind, false), Square { row: 7, col }, observer);
        }
    }

    fn add_piece(&mut self, piece: Piece, square: Square, observer: &mut dyn BoardObserver) {
        self.place_piece(piece, square);
        observer.piece_added(piece, square);
    }

    /// Unconditionally place `piece` on `square`, replacing any occupant.
    pub fn place_piece(&mut self, piece: Piece, square: Square) {
        self.board[square.row][square.col] = Some(piece);
    }

    /// The piece currently on `square`, if any.
    #[must_use]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square.row][square.col]
    }

    /// Unconditionally empty `square`.
    pub fn clear_square(&mut self, square: Square) {
        self.board[square.row][square.col] = None;
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new(GameConfig::default())
    }
}
