//! The "simple rank" settlement policy.
//!
//! All values are centi-points. A win is worth [`BASE_WIN`] either way; when the pre-match gap exceeds
//! [`UPSET_THRESHOLD`] the swing tilts by [`UPSET_BONUS`] in the underdog's favour (an upset win pays more and
//! costs the favourite less; a favourite's win pays less and costs the underdog more). Score margin adds one
//! centi-point per five points of margin, capped at [`MARGIN_BONUS_CAP`].
//!
//! Clamping to the rating band happens at application time, not here. History entries record exact before/after
//! values, so a reversal restores pre-match ratings regardless of clamping.
use cr_common::Rating;

pub const BASE_WIN: i64 = 10;
pub const UPSET_BONUS: i64 = 5;
pub const UPSET_THRESHOLD: i64 = 50;
pub const MARGIN_BONUS_CAP: i64 = 10;

const MARGIN_STEP: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingSwing {
    pub winner_gain: Rating,
    pub loser_loss: Rating,
}

pub fn settlement_swing(winner: Rating, loser: Rating, margin: i64) -> RatingSwing {
    let mut gain = BASE_WIN;
    let mut loss = BASE_WIN;
    if winner.gap(&loser) > UPSET_THRESHOLD {
        if winner < loser {
            gain += UPSET_BONUS;
            loss -= UPSET_BONUS;
        } else {
            gain -= UPSET_BONUS;
            loss += UPSET_BONUS;
        }
    }
    let margin_bonus = (margin / MARGIN_STEP).min(MARGIN_BONUS_CAP);
    gain += margin_bonus;
    loss += margin_bonus;
    RatingSwing { winner_gain: Rating::from(gain), loser_loss: Rating::from(loss) }
}
