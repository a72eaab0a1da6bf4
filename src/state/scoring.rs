//! Points formula shared by every question variant.
//!
//! A discrete answer is worth `1050 - 5 * elapsed` points, boosted by the
//! player's streak (`(100 + streak)%`) and scaled by a quality factor. The
//! quality factor is exactly `1.0` for choice questions and lies in `[0, 1]`
//! for estimation questions.

use crate::state::player::Player;

/// Points for an instant answer, before streak and quality scaling.
pub const BASE_POINTS: i64 = 1050;
/// Points lost for every second spent before answering.
pub const POINTS_PER_SECOND: i64 = 5;
/// Lowest accepted estimate, relative to the true value.
pub const ESTIMATION_LOWER_BOUND: f64 = 0.4;
/// Highest accepted estimate, relative to the true value.
pub const ESTIMATION_UPPER_BOUND: f64 = 1.8;

/// Compute the points earned by an answer given after `elapsed_seconds`,
/// with `streak` already including this answer.
pub fn points_for_answer(elapsed_seconds: u32, streak: u32, quality: f64) -> u32 {
    let base = BASE_POINTS - POINTS_PER_SECOND * i64::from(elapsed_seconds);
    let streak_factor = (100.0 + f64::from(streak)) / 100.0;
    let boosted = (streak_factor * base as f64).round();
    let scaled = (quality.clamp(0.0, 1.0) * boosted).round();

    if scaled <= 0.0 {
        0
    } else {
        scaled.min(f64::from(u32::MAX)) as u32
    }
}

/// Score one answer for `player` and return the points awarded.
///
/// `None` means the player did not answer (timed out, skipped or answered
/// wrong): the streak is reset and nothing is awarded. Otherwise the streak is
/// extended first so the player benefits from it on this very answer.
pub fn apply_answer(player: &mut Player, elapsed_seconds: Option<u32>, quality: f64) -> u32 {
    let Some(elapsed) = elapsed_seconds else {
        player.reset_streak();
        return 0;
    };

    player.increment_streak();
    let points = points_for_answer(elapsed, player.streak(), quality);
    player.add_points(points);
    points
}

/// Closeness of an estimate to the true value, in `[0, 1]`.
///
/// Guesses outside `[0.4, 1.8]` times the true value are worth nothing; inside
/// the band the factor falls off linearly on both sides of the true value.
pub fn estimation_quality(guess: i64, actual: i64) -> f64 {
    if actual <= 0 {
        return if guess == actual { 1.0 } else { 0.0 };
    }

    let actual = actual as f64;
    let guess = guess as f64;
    if guess < actual * ESTIMATION_LOWER_BOUND || guess > actual * ESTIMATION_UPPER_BOUND {
        return 0.0;
    }

    let ratio = guess / actual;
    if ratio > 1.0 { 2.0 - ratio } else { ratio }
}
