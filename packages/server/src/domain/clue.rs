//! Clue engine.
//!
//! A clue points at the grid cell containing the first pixel of a random
//! unfound region. Cells shrink with every clue and the final clue gives the
//! pixel itself.

use rand::{Rng, seq::SliceRandom};

use super::{
    session::SessionState,
    value_object::{Coordinate, IMAGE_HEIGHT, IMAGE_WIDTH},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clue {
    /// `[top_left, bottom_right]` of the hint cell, or `[anchor]` on the final clue
    pub hint: Vec<Coordinate>,
    pub clues_left: u32,
}

/// Build the clue matching the session's clue counter.
///
/// Call after [`SessionState::handle_clue_request`] granted the request.
/// `None` when every region is already found.
pub fn generate_clue<R: Rng + ?Sized>(state: &SessionState, rng: &mut R) -> Option<Clue> {
    let remaining = state.not_found_differences();
    let (_, region) = remaining.choose(rng)?;
    let anchor = *region.pixels().first()?;
    let clues_left = state.clues_left();
    Some(Clue {
        hint: hint_region(anchor, state.clue_requests(), clues_left),
        clues_left,
    })
}

/// Hint for the `clue_number`-th clue (1-based).
///
/// Clue `k` splits the board into a `2^k x 2^k` grid; with no clue left the
/// anchor itself is returned.
pub fn hint_region(anchor: Coordinate, clue_number: u32, clues_left: u32) -> Vec<Coordinate> {
    if clues_left == 0 {
        return vec![anchor];
    }
    let divisions = 1u32 << clue_number.clamp(1, 6);
    let cell_width = IMAGE_WIDTH / divisions;
    let cell_height = IMAGE_HEIGHT / divisions;
    let column = (anchor.x / cell_width).min(divisions - 1);
    let row = (anchor.y / cell_height).min(divisions - 1);
    let top_left = Coordinate::new(column * cell_width, row * cell_height);
    let bottom_right = Coordinate::new(
        top_left.x + cell_width - 1,
        top_left.y + cell_height - 1,
    );
    vec![top_left, bottom_right]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        difference::{DifferenceRegion, DifferenceSnapshot, DifferenceStore},
        session::{ClassicSession, GameConstants, GameSession, Player},
        value_object::{ClientId, GameId, GuessCoordinate, SessionId},
    };
    use rand::{SeedableRng, rngs::StdRng};

    fn session_with(regions: Vec<Vec<Coordinate>>) -> GameSession {
        let snapshot = DifferenceSnapshot::new(regions.into_iter().map(DifferenceRegion::new).collect());
        let store = DifferenceStore::new(GameId::new("g".to_string()).unwrap(), snapshot).unwrap();
        let player = Player::new(ClientId::new("alice".to_string()).unwrap(), None);
        GameSession::Classic(
            ClassicSession::new(SessionId::new(1), store, vec![player], GameConstants::default())
                .unwrap(),
        )
    }

    #[test]
    fn test_first_clue_is_a_quadrant() {
        // テスト項目: 1 回目のヒントはアンカーを含む四分割セル
        // when (操作):
        let hint = hint_region(Coordinate::new(500, 100), 1, 1);

        // then (期待する結果):
        assert_eq!(hint, vec![Coordinate::new(320, 0), Coordinate::new(639, 239)]);
    }

    #[test]
    fn test_hint_uses_both_axes() {
        // テスト項目: 列は x、行は y から求められる
        let hint = hint_region(Coordinate::new(10, 470), 1, 1);
        assert_eq!(hint, vec![Coordinate::new(0, 240), Coordinate::new(319, 479)]);
    }

    #[test]
    fn test_final_clue_is_the_anchor() {
        // テスト項目: 残りヒント 0 のときはアンカーピクセルそのもの
        let anchor = Coordinate::new(123, 45);
        assert_eq!(hint_region(anchor, 2, 0), vec![anchor]);
    }

    #[test]
    fn test_second_grid_is_finer() {
        // テスト項目: ヒント番号が進むとセルが細かくなる
        let hint = hint_region(Coordinate::new(639, 479), 2, 1);
        assert_eq!(hint, vec![Coordinate::new(480, 360), Coordinate::new(639, 479)]);
    }

    #[test]
    fn test_generate_clue_points_at_unfound_region() {
        // テスト項目: ヒントは未発見の領域の先頭ピクセルを含む
        // given (前提条件): 2 領域のうち 1 つを発見済み
        let mut session = session_with(vec![
            vec![Coordinate::new(5, 5), Coordinate::new(6, 5)],
            vec![Coordinate::new(600, 400)],
        ]);
        if let GameSession::Classic(classic) = &mut session {
            classic
                .try_guess(&GuessCoordinate::new(5, 5), &ClientId::new("alice".to_string()).unwrap())
                .unwrap();
        }
        let mut rng = StdRng::seed_from_u64(1);

        // when (操作):
        assert!(session.handle_clue_request());
        let first = generate_clue(session.state(), &mut rng).unwrap();
        assert!(session.handle_clue_request());
        let second = generate_clue(session.state(), &mut rng).unwrap();

        // then (期待する結果):
        assert_eq!(first.clues_left, 1);
        assert_eq!(first.hint, vec![Coordinate::new(320, 240), Coordinate::new(639, 479)]);
        assert_eq!(second.clues_left, 0);
        assert_eq!(second.hint, vec![Coordinate::new(600, 400)]);
    }

    #[test]
    fn test_generate_clue_none_when_all_found() {
        // テスト項目: 全て発見済みならヒントは生成されない
        let mut session = session_with(vec![vec![Coordinate::new(5, 5)]]);
        let alice = ClientId::new("alice".to_string()).unwrap();
        if let GameSession::Classic(classic) = &mut session {
            classic.try_guess(&GuessCoordinate::new(5, 5), &alice).unwrap();
        }
        session.handle_clue_request();
        assert_eq!(generate_clue(session.state(), &mut StdRng::seed_from_u64(1)), None);
    }
}
