//! Benchmarks for the rule engine's brute-force queries.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chess_link::game::{Game, GameConfig, Piece, PieceKind, Square};

fn bench_legality(c: &mut Criterion) {
    let mut group = c.benchmark_group("legality");

    let game = Game::standard(GameConfig::default());
    let pawn = Piece::new(PieceKind::Pawn, false);
    let from = Square { row: 6, col: 4 };
    let to = Square { row: 4, col: 4 };
    group.bench_function("pawn_double_advance", |b| {
        b.iter(|| game.is_legal_move(black_box(pawn), black_box(from), black_box(to)))
    });

    let mut open_board = Game::new(GameConfig::default());
    let queen = Piece::new(PieceKind::Queen, false);
    open_board.place_piece(queen, Square { row: 7, col: 0 });
    group.bench_function("queen_full_diagonal", |b| {
        b.iter(|| {
            open_board.is_legal_move(
                black_box(queen),
                black_box(Square { row: 7, col: 0 }),
                black_box(Square { row: 0, col: 7 }),
            )
        })
    });

    group.finish();
}

fn bench_check_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_scan");

    // full starting position: 16 opposing pieces to test against the king
    let start = Game::standard(GameConfig::default());
    group.bench_function("startpos", |b| b.iter(|| start.king_in_check(black_box(false))));

    // sparse endgame-ish position
    let mut endgame = Game::new(GameConfig::default());
    endgame.place_piece(Piece::new(PieceKind::King, false), Square { row: 7, col: 4 });
    endgame.place_piece(Piece::new(PieceKind::King, true), Square { row: 0, col: 4 });
    endgame.place_piece(Piece::new(PieceKind::Rook, true), Square { row: 3, col: 4 });
    group.bench_function("rook_endgame", |b| b.iter(|| endgame.king_in_check(black_box(false))));

    group.finish();
}

criterion_group!(benches, bench_legality, bench_check_scan);
criterion_main!(benches);
