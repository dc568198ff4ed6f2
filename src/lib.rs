pub mod game;
pub mod session;
pub mod sync;

pub use game::{Game, GameConfig, MoveLegality, MoveRecord, Piece, PieceKind, Square};
pub use session::{PeerIdentity, PeerSession, SessionConfig, SessionDelegate};
