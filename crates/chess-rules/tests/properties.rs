//! Property tests over random legal games.

use chess_core::{decode_uci, encode_uci};
use chess_rules::{
    apply_move, has_any_legal_move, is_king_attacked, legal_moves, BoardState,
};
use proptest::prelude::*;

/// Plays up to `choices.len()` plies, each picking a legal move by index.
/// Stops early when the side to move has no legal move.
fn walk(choices: &[usize]) -> Vec<BoardState> {
    let mut boards = vec![BoardState::startpos()];
    for &choice in choices {
        let Some(board) = boards.last() else { break };
        let moves = legal_moves(board);
        if moves.is_empty() {
            break;
        }
        let (next, _) = apply_move(board, &moves[choice % moves.len()]);
        boards.push(next);
    }
    boards
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn legal_moves_never_leave_own_king_attacked(choices in prop::collection::vec(any::<usize>(), 0..40)) {
        for board in walk(&choices) {
            let mover = board.side_to_move();
            for mv in legal_moves(&board) {
                let (next, _) = apply_move(&board, &mv);
                prop_assert!(!is_king_attacked(&next, mover, None), "{} leaves king attacked", mv);
            }
        }
    }

    #[test]
    fn fen_round_trips_for_reachable_boards(choices in prop::collection::vec(any::<usize>(), 0..60)) {
        for board in walk(&choices) {
            let reparsed = BoardState::from_fen(&board.to_fen()).unwrap();
            prop_assert_eq!(&reparsed, &board);
            prop_assert_eq!(reparsed.castling_rights(), board.castling_rights());
            prop_assert_eq!(reparsed.en_passant(), board.en_passant());
        }
    }

    #[test]
    fn uci_text_round_trips(choices in prop::collection::vec(any::<usize>(), 0..30)) {
        for board in walk(&choices) {
            for mv in legal_moves(&board) {
                prop_assert_eq!(decode_uci(&encode_uci(&mv)), Some((mv.from, mv.to)));
            }
        }
    }

    #[test]
    fn no_legal_move_means_mate_or_stalemate(choices in prop::collection::vec(any::<usize>(), 0..80)) {
        let boards = walk(&choices);
        if let Some(last) = boards.last() {
            let mover = last.side_to_move();
            let stuck = !has_any_legal_move(last, mover);
            prop_assert_eq!(stuck, legal_moves(last).is_empty());
            if stuck {
                let outcome = chess_rules::status(last);
                let in_check = is_king_attacked(last, mover, None);
                prop_assert_eq!(outcome.and_then(|r| r.winner()).is_some(), in_check);
            }
        }
    }
}
