//! Rule engine unit tests.

use super::*;

fn sq(row: usize, col: usize) -> Square {
    Square { row, col }
}

fn white(kind: PieceKind) -> Piece {
    Piece::new(kind, false)
}

fn black(kind: PieceKind) -> Piece {
    Piece::new(kind, true)
}

fn empty_game() -> Game {
    Game::new(GameConfig::default())
}

mod board_state {
    use super::*;

    #[test]
    fn place_then_lookup_returns_piece() {
        let mut game = empty_game();
        let rook = white(PieceKind::Rook);
        game.place_piece(rook, sq(3, 3));
        assert_eq!(game.piece_at(sq(3, 3)), Some(rook));
    }

    #[test]
    fn clear_empties_square() {
        let mut game = empty_game();
        game.place_piece(black(PieceKind::Queen), sq(0, 3));
        game.clear_square(sq(0, 3));
        assert_eq!(game.piece_at(sq(0, 3)), None);
    }

    #[test]
    fn setup_places_standard_position() {
        let game = Game::standard(GameConfig::default());

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
            assert_eq!(game.piece_at(sq(0, col)), Some(black(*kind)));
            assert_eq!(game.piece_at(sq(1, col)), Some(black(PieceKind::Pawn)));
            assert_eq!(game.piece_at(sq(6, col)), Some(white(PieceKind::Pawn)));
            assert_eq!(game.piece_at(sq(7, col)), Some(white(*kind)));
        }
        for row in 2..6 {
            for col in 0..8 {
                assert_eq!(game.piece_at(sq(row, col)), None, "({row}, {col}) should be empty");
            }
        }
    }

    #[test]
    fn setup_notifies_observer_for_all_32_pieces() {
        let mut placed = Vec::new();
        let _game = Game::with_setup(GameConfig::default(), |piece: Piece, square: Square| {
            placed.push((piece, square));
        });
        assert_eq!(placed.len(), 32);
        assert_eq!(placed.iter().filter(|(p, _)| p.is_black).count(), 16);
    }

    #[test]
    fn square_bounds_checking() {
        assert!(Square::new(7, 7).is_some());
        assert!(Square::new(8, 0).is_none());
        assert!(Square::try_from((0, 9)).is_err());
    }

    #[test]
    fn piece_kind_order_is_display_priority() {
        let mut captured = vec![
            PieceKind::Queen,
            PieceKind::Pawn,
            PieceKind::Rook,
            PieceKind::Pawn,
            PieceKind::Knight,
        ];
        captured.sort();
        assert_eq!(
            captured,
            vec![
                PieceKind::Pawn,
                PieceKind::Pawn,
                PieceKind::Knight,
                PieceKind::Rook,
                PieceKind::Queen,
            ]
        );
    }
}

mod pawn_rules {
    use super::*;

    #[test]
    fn white_pawn_advances_one_or_two_from_home_rank() {
        let mut game = empty_game();
        let pawn = white(PieceKind::Pawn);
        game.place_piece(pawn, sq(6, 4));

        assert!(game.is_legal_move(pawn, sq(6, 4), sq(5, 4)).is_legal());
        assert!(game.is_legal_move(pawn, sq(6, 4), sq(4, 4)).is_legal());
        assert!(!game.is_legal_move(pawn, sq(6, 4), sq(3, 4)).is_legal());
    }

    #[test]
    fn white_pawn_two_row_advance_blocked_by_intermediate() {
        let mut game = empty_game();
        let pawn = white(PieceKind::Pawn);
        game.place_piece(pawn, sq(6, 2));
        game.place_piece(black(PieceKind::Knight), sq(5, 2));

        assert!(!game.is_legal_move(pawn, sq(6, 2), sq(4, 2)).is_legal());
    }

    #[test]
    fn white_pawn_two_row_advance_blocked_by_destination() {
        let mut game = empty_game();
        let pawn = white(PieceKind::Pawn);
        game.place_piece(pawn, sq(6, 2));
        game.place_piece(black(PieceKind::Knight), sq(4, 2));

        assert!(!game.is_legal_move(pawn, sq(6, 2), sq(4, 2)).is_legal());
    }

    #[test]
    fn pawn_moves_only_one_row_off_home_rank() {
        let mut game = empty_game();
        let pawn = white(PieceKind::Pawn);
        game.place_piece(pawn, sq(5, 4));

        assert!(game.is_legal_move(pawn, sq(5, 4), sq(4, 4)).is_legal());
        assert!(!game.is_legal_move(pawn, sq(5, 4), sq(3, 4)).is_legal());
    }

    #[test]
    fn pawn_cannot_move_backward_or_sideways() {
        let mut game = empty_game();
        let pawn = white(PieceKind::Pawn);
        game.place_piece(pawn, sq(5, 4));

        assert!(!game.is_legal_move(pawn, sq(5, 4), sq(6, 4)).is_legal());
        assert!(!game.is_legal_move(pawn, sq(5, 4), sq(5, 5)).is_legal());
    }

    #[test]
    fn pawn_diagonal_requires_enemy_occupant() {
        let mut game = empty_game();
        let pawn = white(PieceKind::Pawn);
        game.place_piece(pawn, sq(6, 4));

        // empty diagonal: illegal
        assert!(!game.is_legal_move(pawn, sq(6, 4), sq(5, 5)).is_legal());

        // enemy on the diagonal: capture allowed
        game.place_piece(black(PieceKind::Bishop), sq(5, 5));
        assert!(game.is_legal_move(pawn, sq(6, 4), sq(5, 5)).is_legal());

        // own piece there: blocked by the occupancy precheck
        game.place_piece(white(PieceKind::Bishop), sq(5, 3));
        assert!(!game.is_legal_move(pawn, sq(6, 4), sq(5, 3)).is_legal());
    }

    #[test]
    fn pawn_cannot_jump_two_columns() {
        let mut game = empty_game();
        let pawn = white(PieceKind::Pawn);
        game.place_piece(pawn, sq(6, 4));
        game.place_piece(black(PieceKind::Rook), sq(5, 6));

        assert!(!game.is_legal_move(pawn, sq(6, 4), sq(5, 6)).is_legal());
    }

    #[test]
    fn black_pawn_moves_toward_higher_rows() {
        let mut game = empty_game();
        let pawn = black(PieceKind::Pawn);
        game.place_piece(pawn, sq(1, 0));

        assert!(game.is_legal_move(pawn, sq(1, 0), sq(2, 0)).is_legal());
        assert!(game.is_legal_move(pawn, sq(1, 0), sq(3, 0)).is_legal());
        assert!(!game.is_legal_move(pawn, sq(1, 0), sq(0, 0)).is_legal());
    }
}

mod piece_rules {
    use super::*;

    #[test]
    fn knight_moves_from_center() {
        let mut game = empty_game();
        let knight = white(PieceKind::Knight);
        game.place_piece(knight, sq(4, 4));

        let legal = [
            (2, 3),
            (2, 5),
            (3, 2),
            (3, 6),
            (5, 2),
            (5, 6),
            (6, 3),
            (6, 5),
        ];
        for (row, col) in legal {
            assert!(
                game.is_legal_move(knight, sq(4, 4), sq(row, col)).is_legal(),
                "knight to ({row}, {col}) should be legal"
            );
        }
        assert!(!game.is_legal_move(knight, sq(4, 4), sq(4, 6)).is_legal());
    }

    #[test]
    fn rook_blocked_then_unblocked() {
        let mut game = empty_game();
        let rook = white(PieceKind::Rook);
        game.place_piece(rook, sq(4, 0));

        assert!(game.is_legal_move(rook, sq(4, 0), sq(4, 7)).is_legal());

        game.place_piece(black(PieceKind::Pawn), sq(4, 3));
        assert!(!game.is_legal_move(rook, sq(4, 0), sq(4, 7)).is_legal());

        game.clear_square(sq(4, 3));
        assert!(game.is_legal_move(rook, sq(4, 0), sq(4, 7)).is_legal());
    }

    #[test]
    fn rook_requires_axis_aligned_move() {
        let mut game = empty_game();
        let rook = white(PieceKind::Rook);
        game.place_piece(rook, sq(4, 0));

        assert!(!game.is_legal_move(rook, sq(4, 0), sq(5, 1)).is_legal());
    }

    #[test]
    fn bishop_blocked_then_unblocked() {
        let mut game = empty_game();
        let bishop = black(PieceKind::Bishop);
        game.place_piece(bishop, sq(0, 0));

        assert!(game.is_legal_move(bishop, sq(0, 0), sq(7, 7)).is_legal());

        game.place_piece(white(PieceKind::Pawn), sq(3, 3));
        assert!(!game.is_legal_move(bishop, sq(0, 0), sq(7, 7)).is_legal());

        game.clear_square(sq(3, 3));
        assert!(game.is_legal_move(bishop, sq(0, 0), sq(7, 7)).is_legal());
    }

    #[test]
    fn bishop_moves_down_left_diagonal() {
        let mut game = empty_game();
        let bishop = white(PieceKind::Bishop);
        game.place_piece(bishop, sq(2, 6));

        assert!(game.is_legal_move(bishop, sq(2, 6), sq(6, 2)).is_legal());

        game.place_piece(black(PieceKind::Pawn), sq(4, 4));
        assert!(!game.is_legal_move(bishop, sq(2, 6), sq(6, 2)).is_legal());
    }

    #[test]
    fn queen_combines_rook_and_bishop() {
        let mut game = empty_game();
        let queen = white(PieceKind::Queen);
        game.place_piece(queen, sq(4, 4));

        assert!(game.is_legal_move(queen, sq(4, 4), sq(4, 0)).is_legal());
        assert!(game.is_legal_move(queen, sq(4, 4), sq(0, 0)).is_legal());
        assert!(!game.is_legal_move(queen, sq(4, 4), sq(6, 5)).is_legal());
    }

    #[test]
    fn cannot_capture_own_piece() {
        let mut game = empty_game();
        let queen = white(PieceKind::Queen);
        game.place_piece(queen, sq(4, 4));
        game.place_piece(white(PieceKind::Pawn), sq(4, 6));

        assert!(!game.is_legal_move(queen, sq(4, 4), sq(4, 6)).is_legal());
    }

    #[test]
    fn king_single_step_any_direction() {
        let mut game = empty_game();
        let king = white(PieceKind::King);
        game.place_piece(king, sq(4, 4));

        assert!(game.is_legal_move(king, sq(4, 4), sq(3, 3)).is_legal());
        assert!(game.is_legal_move(king, sq(4, 4), sq(5, 4)).is_legal());
        assert!(!game.is_legal_move(king, sq(4, 4), sq(4, 6)).is_legal());
    }
}

mod castling {
    use super::*;

    #[test]
    fn white_king_castle_reports_rook_move() {
        let mut game = empty_game();
        let king = white(PieceKind::King);
        game.place_piece(king, sq(7, 4));
        game.place_piece(white(PieceKind::Rook), sq(7, 0));
        game.place_piece(white(PieceKind::Rook), sq(7, 7));

        assert_eq!(
            game.is_legal_move(king, sq(7, 4), sq(7, 1)),
            MoveLegality::Castle {
                rook_from: sq(7, 0),
                rook_to: sq(7, 2),
            }
        );
        assert_eq!(
            game.is_legal_move(king, sq(7, 4), sq(7, 6)),
            MoveLegality::Castle {
                rook_from: sq(7, 7),
                rook_to: sq(7, 5),
            }
        );
    }

    #[test]
    fn black_king_castles_on_rank_zero() {
        let mut game = empty_game();
        let king = black(PieceKind::King);
        game.place_piece(king, sq(0, 4));

        assert!(matches!(
            game.is_legal_move(king, sq(0, 4), sq(0, 6)),
            MoveLegality::Castle { .. }
        ));
    }

    #[test]
    fn castle_not_recognized_off_home_ranks() {
        let mut game = empty_game();
        let king = white(PieceKind::King);
        game.place_piece(king, sq(5, 4));

        assert!(!game.is_legal_move(king, sq(5, 4), sq(5, 1)).is_legal());
    }

    #[test]
    fn rook_square_helpers() {
        assert_eq!(Game::current_rook_square_for_castle(sq(7, 1)), sq(7, 0));
        assert_eq!(Game::new_rook_square_for_castle(sq(7, 1)), sq(7, 2));
        assert_eq!(Game::current_rook_square_for_castle(sq(0, 6)), sq(0, 7));
        assert_eq!(Game::new_rook_square_for_castle(sq(0, 6)), sq(0, 5));
    }
}

mod check_detection {
    use super::*;

    #[test]
    fn rook_on_open_rank_gives_check() {
        let mut game = empty_game();
        game.place_piece(white(PieceKind::King), sq(4, 1));
        game.place_piece(black(PieceKind::Rook), sq(4, 7));

        assert!(game.king_in_check(false));
    }

    #[test]
    fn blocker_breaks_the_check() {
        let mut game = empty_game();
        game.place_piece(white(PieceKind::King), sq(4, 1));
        game.place_piece(black(PieceKind::Rook), sq(4, 7));
        game.place_piece(white(PieceKind::Bishop), sq(4, 5));

        assert!(!game.king_in_check(false));
    }

    #[test]
    fn own_pieces_never_give_check() {
        let mut game = empty_game();
        game.place_piece(black(PieceKind::King), sq(0, 4));
        game.place_piece(black(PieceKind::Queen), sq(4, 4));

        assert!(!game.king_in_check(true));
    }

    #[test]
    fn missing_king_reports_no_check() {
        let game = empty_game();
        assert!(!game.king_in_check(true));
        assert!(!game.king_in_check(false));
    }

    #[test]
    fn self_check_prevention_off_by_default() {
        let mut game = empty_game();
        game.place_piece(white(PieceKind::King), sq(4, 1));
        game.place_piece(black(PieceKind::Rook), sq(4, 7));
        let pinned = white(PieceKind::Rook);
        game.place_piece(pinned, sq(4, 5));

        // moving the pinned rook exposes the king, but the rule is off
        assert!(game.is_legal_move(pinned, sq(4, 5), sq(5, 5)).is_legal());
    }

    #[test]
    fn self_check_prevention_vetoes_pinned_piece_move() {
        let mut game = Game::new(GameConfig {
            enforce_self_check_prevention: true,
        });
        game.place_piece(white(PieceKind::King), sq(4, 1));
        game.place_piece(black(PieceKind::Rook), sq(4, 7));
        let pinned = white(PieceKind::Rook);
        game.place_piece(pinned, sq(4, 5));

        assert!(!game.is_legal_move(pinned, sq(4, 5), sq(5, 5)).is_legal());
        // sliding along the pin stays legal
        assert!(game.is_legal_move(pinned, sq(4, 5), sq(4, 6)).is_legal());
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn square_strategy() -> impl Strategy<Value = Square> {
        (0..8usize, 0..8usize).prop_map(|(row, col)| Square { row, col })
    }

    proptest! {
        /// Property: place followed by lookup returns the piece, clear
        /// empties the square, on any in-range square.
        #[test]
        fn prop_place_clear_round_trip(square in square_strategy(), is_black in any::<bool>()) {
            let mut game = empty_game();
            let piece = Piece::new(PieceKind::Queen, is_black);

            game.place_piece(piece, square);
            prop_assert_eq!(game.piece_at(square), Some(piece));

            game.clear_square(square);
            prop_assert_eq!(game.piece_at(square), None);
        }

        /// Property: on an empty board a knight move is legal exactly when
        /// the deltas are (1,2) or (2,1).
        #[test]
        fn prop_knight_moves_match_delta_rule(from in square_strategy(), to in square_strategy()) {
            let mut game = empty_game();
            let knight = Piece::new(PieceKind::Knight, false);
            game.place_piece(knight, from);

            let dr = from.row.abs_diff(to.row);
            let dc = from.col.abs_diff(to.col);
            let expected = (dr == 1 && dc == 2) || (dr == 2 && dc == 1);
            prop_assert_eq!(game.is_legal_move(knight, from, to).is_legal(), expected);
        }

        /// Property: a blocker strictly between a rook and its destination
        /// on a shared rank makes the move illegal; clearing it restores
        /// legality.
        #[test]
        fn prop_rook_rank_blocking(row in 0..8usize, blocker_col in 1..7usize) {
            let mut game = empty_game();
            let rook = Piece::new(PieceKind::Rook, false);
            let from = Square { row, col: 0 };
            let to = Square { row, col: 7 };
            game.place_piece(rook, from);

            prop_assert!(game.is_legal_move(rook, from, to).is_legal());

            game.place_piece(Piece::new(PieceKind::Pawn, true), Square { row, col: blocker_col });
            prop_assert!(!game.is_legal_move(rook, from, to).is_legal());

            game.clear_square(Square { row, col: blocker_col });
            prop_assert!(game.is_legal_move(rook, from, to).is_legal());
        }
    }
}
