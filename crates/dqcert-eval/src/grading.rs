use crate::model::{Grade, HardFailFlags, Metric};

/// Advisory scores below this make a run `CONDITIONAL_PASS`.
pub const CONDITIONAL_THRESHOLD: f64 = 95.0;

/// Decide the grade. Only hard fails and the two advisory scores matter;
/// the reference score never does.
pub fn grade(hard_fails: &HardFailFlags, format_score: f64, value_completeness: f64) -> Grade {
    if hard_fails.any() {
        Grade::Fail
    } else if format_score < CONDITIONAL_THRESHOLD || value_completeness < CONDITIONAL_THRESHOLD {
        Grade::ConditionalPass
    } else {
        Grade::Pass
    }
}

/// Unweighted mean of all metric scores, rounded to two decimals.
pub fn reference_score(metrics: &[Metric]) -> f64 {
    if metrics.is_empty() {
        return 0.0;
    }
    let mean = metrics.iter().map(|metric| metric.score).sum::<f64>() / metrics.len() as f64;
    round2(mean)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MetricKind;

    fn all_flags() -> Vec<HardFailFlags> {
        (0..16u8)
            .map(|bits| HardFailFlags {
                schema: bits & 1 != 0,
                required: bits & 2 != 0,
                primary_key: bits & 4 != 0,
                freshness: bits & 8 != 0,
            })
            .collect()
    }

    #[test]
    fn any_hard_fail_is_fail() {
        for flags in all_flags().into_iter().filter(HardFailFlags::any) {
            for (format, completeness) in [(100.0, 100.0), (10.0, 100.0), (100.0, 0.0)] {
                assert_eq!(grade(&flags, format, completeness), Grade::Fail, "{flags:?}");
            }
        }
    }

    #[test]
    fn advisory_scores_only_downgrade_to_conditional() {
        let clean = HardFailFlags::default();
        assert_eq!(grade(&clean, 100.0, 100.0), Grade::Pass);
        assert_eq!(grade(&clean, 95.0, 95.0), Grade::Pass);
        assert_eq!(grade(&clean, 94.99, 100.0), Grade::ConditionalPass);
        assert_eq!(grade(&clean, 100.0, 50.0), Grade::ConditionalPass);
    }

    #[test]
    fn reference_score_is_rounded_mean() {
        let metrics: Vec<Metric> = MetricKind::ALL
            .iter()
            .zip([100.0, 90.0, 66.666, 70.0, 50.0, 100.0, 100.0])
            .map(|(kind, score)| Metric::new(*kind, score))
            .collect();
        assert_eq!(reference_score(&metrics), 82.38);
    }
}
