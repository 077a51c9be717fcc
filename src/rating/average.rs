use super::error::{AggregatorError, AggregatorResult};
use super::types::{Score, Summary};

pub const MIN_SCORE: Score = 1.0;
pub const MAX_SCORE: Score = 5.0;

pub fn validate_score(score: Score) -> AggregatorResult<Score> {
    if score.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(score)
    } else {
        Err(AggregatorError::InvalidScore(score))
    }
}

/// Folds one new score into a running mean.
///
/// Drift accumulates over many calls if `previous.rating` is itself inexact;
/// recomputation is what corrects it.
pub fn incremental_mean(previous: Summary, score: Score) -> Summary {
    let new_count = previous.review_count + 1;
    let total = previous.rating * previous.review_count as f64 + score;
    Summary::new(total / new_count as f64, new_count)
}

pub fn mean_of<I>(scores: I) -> Summary
where
    I: IntoIterator<Item = Score>,
{
    let (sum, count) = scores
        .into_iter()
        .fold((0.0, 0u64), |(sum, count), score| (sum + score, count + 1));

    from_aggregate(if count == 0 { 0.0 } else { sum / count as f64 }, count)
}

/// Builds a summary from a store-side `(avg, count)` pair
pub fn from_aggregate(mean: f64, count: u64) -> Summary {
    if count == 0 {
        Summary::empty()
    } else {
        Summary::new(mean, count)
    }
}

pub fn has_drifted(cached: Summary, fresh: Summary, tolerance: f64) -> bool {
    cached.review_count != fresh.review_count || (cached.rating - fresh.rating).abs() > tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_validate_score_bounds() {
        assert!(validate_score(1.0).is_ok());
        assert!(validate_score(5.0).is_ok());
        assert!(validate_score(3.5).is_ok());
        assert!(matches!(validate_score(0.0), Err(AggregatorError::InvalidScore(_))));
        assert!(matches!(validate_score(5.1), Err(AggregatorError::InvalidScore(_))));
        assert!(validate_score(f64::NAN).is_err());
        assert!(validate_score(f64::INFINITY).is_err());
    }

    #[test]
    fn test_incremental_mean_from_empty() {
        let summary = incremental_mean(Summary::empty(), 5.0);
        assert_eq!(summary, Summary::new(5.0, 1));

        let summary = incremental_mean(summary, 3.0);
        assert_eq!(summary.review_count, 2);
        assert!((summary.rating - 4.0).abs() < EPSILON);
    }

    #[test]
    fn test_incremental_matches_full_mean() {
        let scores = [1.0, 2.5, 5.0, 4.0, 3.0, 4.5, 1.5, 2.0, 5.0, 3.7];
        let incremental = scores
            .iter()
            .fold(Summary::empty(), |summary, &score| incremental_mean(summary, score));
        let full = mean_of(scores);

        assert_eq!(incremental.review_count, full.review_count);
        assert!((incremental.rating - full.rating).abs() < EPSILON);
    }

    #[test]
    fn test_mean_of_no_scores_is_zero() {
        assert_eq!(mean_of(Vec::<Score>::new()), Summary::empty());
    }

    #[test]
    fn test_mean_of_scores() {
        let summary = mean_of([4.0, 5.0, 3.0]);
        assert_eq!(summary, Summary::new(4.0, 3));
    }

    #[test]
    fn test_drift_detection() {
        let fresh = Summary::new(4.0, 3);
        assert!(!has_drifted(Summary::new(4.0 + 1e-12, 3), fresh, EPSILON));
        assert!(has_drifted(Summary::new(4.1, 3), fresh, EPSILON));
        assert!(has_drifted(Summary::new(4.0, 2), fresh, EPSILON));
    }
}
