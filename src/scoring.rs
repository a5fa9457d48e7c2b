//! Penalty scoring and the go-out bonus rule.

use crate::Hand;

/// Adjustment for the first player to go out.
pub const GO_OUT_BONUS: i32 = -5;
/// Extra adjustment when that player used no wilds.
pub const NATURAL_GO_OUT_BONUS: i32 = -10;

/// Points left in `hand` once its highest-scoring card is discarded.
pub fn residual_score(hand: &Hand, round: u8) -> u32 {
    let discard = hand.highest_scoring(round).map_or(0, |c| c.score(round));
    hand.score(round) - discard
}

/// Score adjustment for a player who reached zero residual score.
/// Only the first player out earns a bonus; applying it is up to the caller.
pub fn go_out_adjustment(first_out: bool, natural: bool) -> i32 {
    match (first_out, natural) {
        (false, _) => 0,
        (true, false) => GO_OUT_BONUS,
        (true, true) => GO_OUT_BONUS + NATURAL_GO_OUT_BONUS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_residual_score_discards_highest() {
        let hand = Hand::from_string("H8 H9").unwrap();
        assert_eq!(residual_score(&hand, 4), 8);
        let hand = Hand::from_string("H1 H2 H3 H8 H9").unwrap();
        assert_eq!(residual_score(&hand, 4), 14);
    }

    #[test]
    fn test_residual_score_single_or_wild_cards() {
        assert_eq!(residual_score(&Hand::from_string("SK").unwrap(), 3), 0);
        assert_eq!(residual_score(&Hand::from_string("W W").unwrap(), 3), 0);
        assert_eq!(residual_score(&Hand::new(), 3), 0);
        // the round rank scores nothing, so the queen is discarded
        assert_eq!(residual_score(&Hand::from_string("S5 HQ D5 C2").unwrap(), 5), 2);
    }

    #[test]
    fn test_go_out_adjustment() {
        assert_eq!(go_out_adjustment(false, false), 0);
        assert_eq!(go_out_adjustment(false, true), 0);
        assert_eq!(go_out_adjustment(true, false), -5);
        assert_eq!(go_out_adjustment(true, true), -15);
    }
}
