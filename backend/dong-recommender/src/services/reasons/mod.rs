/// Reason Generator
///
/// Short justifications for a ranked category, from comparing the row's raw
/// demand / competition / stability features with the median of the same
/// feature across the whole quarter (every dong, every category).
use crate::models::FeatureRow;
use crate::utils::median;

pub const MAX_REASONS: usize = 3;

/// Signals in the order their reasons are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Demand,
    Competition,
    Stability,
}

impl Signal {
    pub const ALL: [Signal; 3] = [Signal::Demand, Signal::Competition, Signal::Stability];

    pub fn feature(self) -> &'static str {
        match self {
            Signal::Demand => "pop_mean",
            Signal::Competition => "store_cnt",
            Signal::Stability => "close_rate",
        }
    }

    /// Demand favours high values; competition and closures favour low ones.
    fn is_favorable(self, value: f64, median: f64) -> bool {
        match self {
            Signal::Demand => value >= median,
            Signal::Competition | Signal::Stability => value <= median,
        }
    }

    fn wording(self, favorable: bool) -> &'static str {
        match (self, favorable) {
            (Signal::Demand, true) => "생활인구 평균이 높은 편(수요 유리)",
            (Signal::Demand, false) => "생활인구 평균이 낮은 편(수요 약함)",
            (Signal::Competition, true) => "동일 업종 점포 수가 상대적으로 적음(경쟁 완화)",
            (Signal::Competition, false) => "동일 업종 점포 수가 많은 편(경쟁 치열)",
            (Signal::Stability, true) => "현재 폐업률이 낮은 편(안정적)",
            (Signal::Stability, false) => "현재 폐업률이 높은 편(리스크 주의)",
        }
    }
}

/// Per-signal medians of one quarter, computed once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterBaseline {
    medians: [Option<f64>; 3],
}

impl QuarterBaseline {
    /// `None` for a signal whose column holds no defined value in the slice.
    pub fn from_slice(quarter_slice: &[&FeatureRow]) -> Self {
        let medians = Signal::ALL.map(|signal| {
            median(
                quarter_slice
                    .iter()
                    .filter_map(|row| row.value(signal.feature())),
            )
        });
        Self { medians }
    }

    pub fn median(&self, signal: Signal) -> Option<f64> {
        self.medians[signal as usize]
    }

    /// Reasons for one row, at most `MAX_REASONS`, in signal order.
    ///
    /// A signal is skipped when the row lacks the feature, the row's value is
    /// missing, or the quarter has no value to compare against.
    pub fn reasons_for(&self, row: &FeatureRow) -> Vec<String> {
        let mut reasons: Vec<String> = Signal::ALL
            .iter()
            .filter_map(|&signal| {
                let value = row.value(signal.feature())?;
                let median = self.median(signal)?;
                Some(signal.wording(signal.is_favorable(value, median)).to_string())
            })
            .collect();

        reasons.truncate(MAX_REASONS);
        reasons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reasons_against(row: &FeatureRow, quarter_slice: &[&FeatureRow]) -> Vec<String> {
        QuarterBaseline::from_slice(quarter_slice).reasons_for(row)
    }

    fn row(category: &str, pop: Option<f64>, stores: Option<f64>, close: Option<f64>) -> FeatureRow {
        FeatureRow::new("11010", "2024Q3", category)
            .with_feature("pop_mean", pop)
            .with_feature("store_cnt", stores)
            .with_feature("close_rate", close)
    }

    #[test]
    fn test_demand_above_median_is_favorable() {
        let quarter = vec![
            row("A", Some(10.0), None, None),
            row("B", Some(20.0), None, None),
            row("C", Some(30.0), None, None),
        ];
        let slice: Vec<&FeatureRow> = quarter.iter().collect();
        let candidate = FeatureRow::new("11010", "2024Q3", "D").with_feature("pop_mean", Some(25.0));

        let reasons = reasons_against(&candidate, &slice);

        assert_eq!(reasons, vec![Signal::Demand.wording(true).to_string()]);
    }

    #[test]
    fn test_all_signals_in_fixed_order() {
        let quarter = vec![
            row("A", Some(10.0), Some(5.0), Some(0.1)),
            row("B", Some(20.0), Some(10.0), Some(0.2)),
            row("C", Some(30.0), Some(15.0), Some(0.3)),
        ];
        let slice: Vec<&FeatureRow> = quarter.iter().collect();
        let baseline = QuarterBaseline::from_slice(&slice);

        let low = baseline.reasons_for(&quarter[0]);
        assert_eq!(
            low,
            vec![
                Signal::Demand.wording(false).to_string(),
                Signal::Competition.wording(true).to_string(),
                Signal::Stability.wording(true).to_string(),
            ]
        );

        let high = baseline.reasons_for(&quarter[2]);
        assert_eq!(
            high,
            vec![
                Signal::Demand.wording(true).to_string(),
                Signal::Competition.wording(false).to_string(),
                Signal::Stability.wording(false).to_string(),
            ]
        );
    }

    #[test]
    fn test_median_ties_are_favorable() {
        let quarter = vec![row("A", Some(10.0), Some(10.0), Some(0.5))];
        let slice: Vec<&FeatureRow> = quarter.iter().collect();

        let reasons = reasons_against(&quarter[0], &slice);

        assert_eq!(
            reasons,
            vec![
                Signal::Demand.wording(true).to_string(),
                Signal::Competition.wording(true).to_string(),
                Signal::Stability.wording(true).to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_values_skip_signal() {
        let quarter = vec![
            row("A", Some(10.0), Some(3.0), Some(0.1)),
            row("B", None, Some(4.0), None),
        ];
        let slice: Vec<&FeatureRow> = quarter.iter().collect();

        let reasons = reasons_against(&quarter[1], &slice);

        assert_eq!(reasons, vec![Signal::Competition.wording(false).to_string()]);
    }

    #[test]
    fn test_absent_column_skips_signal() {
        let quarter = vec![FeatureRow::new("11010", "2024Q3", "A").with_feature("store_cnt", Some(2.0))];
        let slice: Vec<&FeatureRow> = quarter.iter().collect();
        let baseline = QuarterBaseline::from_slice(&slice);

        assert_eq!(baseline.median(Signal::Demand), None);
        assert_eq!(baseline.median(Signal::Competition), Some(2.0));

        // Row carries pop_mean but the quarter has no defined value to compare with
        let candidate = FeatureRow::new("11010", "2024Q3", "B").with_feature("pop_mean", Some(9.0));
        assert!(baseline.reasons_for(&candidate).is_empty());
    }

    #[test]
    fn test_reason_cap() {
        let quarter = vec![row("A", Some(1.0), Some(1.0), Some(1.0))];
        let slice: Vec<&FeatureRow> = quarter.iter().collect();

        let reasons = reasons_against(&quarter[0], &slice);
        assert!(reasons.len() <= MAX_REASONS);
    }
}
