use invitelist_core::Score;

/// Policy constants of the engagement formula:
///
/// `w(e) = R(age) * M(delta)` per qualifying edit, where `R` falls linearly
/// from 1 (now) to `recency_floor` (at the cutoff) and
/// `M = 1 + log10(1 + |delta|)`.
///
/// `score = round(sum(w) * X(edit_count) * scale)` with
/// `X = min(experience_cap, 1 + ln(1 + edit_count) / experience_divisor)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngagementWeights {
    pub recency_floor: f64,
    pub experience_divisor: f64,
    pub experience_cap: f64,
    pub scale: f64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            recency_floor: 0.5,
            experience_divisor: 10.0,
            experience_cap: 2.0,
            scale: 100.0,
        }
    }
}

/// Linear decay from `1.0` at age zero to `floor` at the cutoff.
///
/// Negative ages (clock skew) count as zero; ages past the cutoff clamp to
/// `floor`.
#[must_use]
pub fn recency_factor(age_days: f64, cutoff_days: f64, floor: f64) -> f64 {
    if !age_days.is_finite() || !cutoff_days.is_finite() || cutoff_days <= 0.0 {
        return floor;
    }

    let fraction = (age_days / cutoff_days).clamp(0.0, 1.0);
    (1.0 - floor).mul_add(-fraction, 1.0)
}

/// Size of an edit on a log scale. Always at least `1.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn magnitude_factor(size_delta: i64) -> f64 {
    1.0 + (size_delta.unsigned_abs() as f64 + 1.0).log10()
}

/// Weight of one qualifying edit.
#[must_use]
pub fn edit_weight(
    age_days: f64,
    size_delta: i64,
    cutoff_days: f64,
    weights: &EngagementWeights,
) -> f64 {
    recency_factor(age_days, cutoff_days, weights.recency_floor) * magnitude_factor(size_delta)
}

/// Bonus for experienced accounts, capped at `weights.experience_cap`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn experience_multiplier(edit_count: u64, weights: &EngagementWeights) -> f64 {
    let bonus = (edit_count as f64).ln_1p() / weights.experience_divisor;
    (1.0 + bonus).min(weights.experience_cap)
}

/// Final integer score. Non-decreasing in `contribution`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn final_score(contribution: f64, edit_count: u64, weights: &EngagementWeights) -> Score {
    let raw = contribution * experience_multiplier(edit_count, weights) * weights.scale;
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    if raw >= f64::from(Score::MAX) {
        return Score::MAX;
    }
    raw.round() as Score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx_eq(actual: f64, expected: f64) {
        let tolerance = 1e-10;
        assert!(
            (actual - expected).abs() <= tolerance,
            "actual ({actual}) != expected ({expected})"
        );
    }

    #[test]
    fn recency_decays_linearly_to_floor() {
        assert_approx_eq(recency_factor(0.0, 100.0, 0.5), 1.0);
        assert_approx_eq(recency_factor(50.0, 100.0, 0.5), 0.75);
        assert_approx_eq(recency_factor(100.0, 100.0, 0.5), 0.5);
        assert_approx_eq(recency_factor(250.0, 100.0, 0.5), 0.5);
    }

    #[test]
    fn recency_handles_skew_and_bad_input() {
        assert_approx_eq(recency_factor(-3.0, 100.0, 0.5), 1.0);
        assert_approx_eq(recency_factor(f64::NAN, 100.0, 0.5), 0.5);
        assert_approx_eq(recency_factor(10.0, 0.0, 0.5), 0.5);
    }

    #[test]
    fn magnitude_is_symmetric_and_at_least_one() {
        assert_approx_eq(magnitude_factor(0), 1.0);
        assert_approx_eq(magnitude_factor(9), 2.0);
        assert_approx_eq(magnitude_factor(-9), 2.0);
        assert!(magnitude_factor(i64::MIN) > 1.0);
    }

    #[test]
    fn experience_is_capped() {
        let weights = EngagementWeights::default();
        assert_approx_eq(experience_multiplier(0, &weights), 1.0);
        assert!(experience_multiplier(100, &weights) > 1.0);
        assert_approx_eq(experience_multiplier(u64::MAX, &weights), 2.0);
    }

    #[test]
    fn final_score_rounds_and_saturates() {
        let weights = EngagementWeights::default();
        assert_eq!(final_score(1.0, 0, &weights), 100);
        assert_eq!(final_score(0.0, 500, &weights), 0);
        assert_eq!(final_score(f64::NAN, 0, &weights), 0);
        assert_eq!(final_score(1e300, 0, &weights), Score::MAX);
    }

    #[test]
    fn final_score_is_monotonic_in_contribution() {
        let weights = EngagementWeights::default();
        let mut previous = 0;
        for step in 0..200 {
            let score = final_score(f64::from(step) * 0.37, 42, &weights);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn single_fresh_small_edit_weighs_one() {
        let weights = EngagementWeights::default();
        assert_approx_eq(edit_weight(0.0, 0, 1095.0, &weights), 1.0);
        assert!(edit_weight(0.0, 0, 1095.0, &weights) > edit_weight(700.0, 0, 1095.0, &weights));
    }
}
