//! Time-bucketed reconstruction of the history chart.
//!
//! Samples are grouped into fixed-width buckets by
//! `floor(timestamp / width) * width` and averaged. Only buckets that hold at
//! least one sample produce a point.

use std::collections::BTreeMap;

use gymwatch_types::{ChartPoint, HistorySample};

/// Running sums for one bucket.
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    samples: u64,
    mystic: u64,
    valor: u64,
    instinct: u64,
    total: u64,
}

impl Accumulator {
    fn add(&mut self, sample: &HistorySample) {
        self.samples = self.samples.saturating_add(1);
        self.mystic = self.mystic.saturating_add(u64::from(sample.mystic));
        self.valor = self.valor.saturating_add(u64::from(sample.valor));
        self.instinct = self.instinct.saturating_add(u64::from(sample.instinct));
        self.total = self
            .total
            .saturating_add(u64::from(sample.effective_total()));
    }

    fn point(&self, bucket_start: i64) -> ChartPoint {
        ChartPoint {
            time: bucket_start.saturating_mul(1_000),
            mystic: rounded_mean(self.mystic, self.samples),
            valor: rounded_mean(self.valor, self.samples),
            instinct: rounded_mean(self.instinct, self.samples),
            total: rounded_mean(self.total, self.samples),
        }
    }
}

/// Start of the bucket `timestamp` falls into.
///
/// Returns `None` for a non-positive width.
pub fn bucket_start(timestamp: i64, width: i64) -> Option<i64> {
    if width <= 0 {
        return None;
    }
    timestamp.checked_div_euclid(width)?.checked_mul(width)
}

/// Mean of `sum` over `count`, rounded half up. Zero when `count` is zero.
pub fn rounded_mean(sum: u64, count: u64) -> u32 {
    let Some(quotient) = sum.checked_div(count) else {
        return 0;
    };
    let remainder = sum.checked_rem(count).unwrap_or(0);
    let round_up = remainder.saturating_mul(2) >= count;
    let mean = if round_up {
        quotient.saturating_add(1)
    } else {
        quotient
    };
    u32::try_from(mean).unwrap_or(u32::MAX)
}

/// Average samples into a sparse, ascending series of chart points.
///
/// Each point's `time` is the bucket start in milliseconds. Totals are read
/// through [`HistorySample::effective_total`] before averaging.
pub fn bucket_samples(samples: &[HistorySample], width: i64) -> Vec<ChartPoint> {
    let mut buckets: BTreeMap<i64, Accumulator> = BTreeMap::new();

    for sample in samples {
        let Some(start) = bucket_start(sample.timestamp, width) else {
            continue;
        };
        buckets.entry(start).or_default().add(sample);
    }

    buckets
        .iter()
        .map(|(start, acc)| acc.point(*start))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp: i64, mystic: u32, valor: u32, instinct: u32, total: u32) -> HistorySample {
        HistorySample {
            timestamp,
            mystic,
            valor,
            instinct,
            total,
        }
    }

    #[test]
    fn three_samples_in_one_bucket_average() {
        let samples = [
            sample(1_200, 1, 1, 1, 10),
            sample(1_300, 2, 2, 2, 20),
            sample(1_499, 3, 3, 3, 30),
        ];
        let points = bucket_samples(&samples, 300);
        assert_eq!(
            points,
            vec![ChartPoint {
                time: 1_200_000,
                mystic: 2,
                valor: 2,
                instinct: 2,
                total: 20,
            }]
        );
    }

    #[test]
    fn empty_buckets_produce_no_points() {
        // Buckets at 0, 300 and 1500 are populated; 600..1200 are not.
        let samples = [
            sample(10, 1, 0, 0, 1),
            sample(310, 1, 0, 0, 1),
            sample(1_510, 1, 0, 0, 1),
        ];
        let points = bucket_samples(&samples, 300);
        assert_eq!(points.len(), 3);
        assert_eq!(
            points.iter().map(|p| p.time).collect::<Vec<_>>(),
            vec![0, 300_000, 1_500_000]
        );
    }

    #[test]
    fn points_are_ascending_regardless_of_input_order() {
        let samples = [sample(7_300, 0, 0, 0, 0), sample(10, 0, 0, 0, 0)];
        let points = bucket_samples(&samples, 3_600);
        assert_eq!(
            points.iter().map(|p| p.time).collect::<Vec<_>>(),
            vec![0, 7_200_000]
        );
    }

    #[test]
    fn averages_round_half_up() {
        let samples = [sample(0, 1, 0, 0, 1), sample(1, 2, 0, 0, 2)];
        let points = bucket_samples(&samples, 300);
        assert_eq!(points.first().map(|p| p.mystic), Some(2));
    }

    #[test]
    fn legacy_totals_are_rederived_before_averaging() {
        // total recorded as 0 in both rows; faction sums are 6 and 8.
        let samples = [sample(0, 2, 2, 2, 0), sample(5, 4, 2, 2, 0)];
        let points = bucket_samples(&samples, 300);
        assert_eq!(points.first().map(|p| p.total), Some(7));
    }

    #[test]
    fn no_samples_no_points() {
        assert!(bucket_samples(&[], 300).is_empty());
    }

    #[test]
    fn bucket_start_floors() {
        assert_eq!(bucket_start(899, 300), Some(600));
        assert_eq!(bucket_start(900, 300), Some(900));
        assert_eq!(bucket_start(-1, 300), Some(-300));
        assert_eq!(bucket_start(5, 0), None);
    }

    #[test]
    fn rounded_mean_edges() {
        assert_eq!(rounded_mean(0, 0), 0);
        assert_eq!(rounded_mean(5, 2), 3);
        assert_eq!(rounded_mean(4, 3), 1);
        assert_eq!(rounded_mean(60, 3), 20);
    }
}
