//! The weighted-or-mean rate aggregation rule.
//!
//! When every row of a group carries both a raw count and an implied
//! population, the group aggregates to (sum counts / sum population) x
//! 100,000, which is unbiased under population drift within the window.
//! Any missing weighting input switches the whole group to the arithmetic
//! mean of per-year rates; the switch is reported, never silent.

use homstat_model::schema::RATE_SCALE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMethod {
    /// (sum counts / sum population) x 100,000.
    Weighted,
    /// Arithmetic mean of per-year rates (weighting inputs incomplete).
    Mean,
}

impl AggregationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregationMethod::Weighted => "weighted",
            AggregationMethod::Mean => "mean",
        }
    }
}

/// Streaming accumulator for one group's rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateAccumulator {
    rows: usize,
    rate_sum: f64,
    rate_rows: usize,
    count_sum: f64,
    population_sum: f64,
    weight_missing: usize,
}

impl RateAccumulator {
    pub fn add(&mut self, rate: Option<f64>, count: Option<f64>, population: Option<f64>) {
        self.rows += 1;
        if let Some(rate) = rate {
            self.rate_sum += rate;
            self.rate_rows += 1;
        }
        match (count, population) {
            (Some(count), Some(population)) if population > 0.0 => {
                self.count_sum += count;
                self.population_sum += population;
            }
            _ => self.weight_missing += 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Combined count and population, when the group is fully weighted.
    pub fn totals(&self) -> Option<(f64, f64)> {
        (self.rows > 0 && self.weight_missing == 0 && self.population_sum > 0.0)
            .then_some((self.count_sum, self.population_sum))
    }

    /// Aggregated rate and the method that produced it. `None` when the
    /// group had no usable rate at all.
    pub fn finish(&self) -> Option<(f64, AggregationMethod)> {
        if let Some((count, population)) = self.totals() {
            return Some((count / population * RATE_SCALE, AggregationMethod::Weighted));
        }
        if self.rate_rows > 0 {
            return Some((self.rate_sum / self.rate_rows as f64, AggregationMethod::Mean));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_when_all_rows_carry_weights() {
        let mut acc = RateAccumulator::default();
        acc.add(Some(1000.0), Some(10.0), Some(1000.0));
        acc.add(Some(500.0), Some(20.0), Some(4000.0));
        let (rate, method) = acc.finish().unwrap();
        assert_eq!(method, AggregationMethod::Weighted);
        assert!((rate - 600.0).abs() < 1e-9);
    }

    #[test]
    fn falls_back_to_mean_when_one_row_lacks_population() {
        let mut acc = RateAccumulator::default();
        acc.add(Some(1000.0), Some(10.0), Some(1000.0));
        acc.add(Some(500.0), Some(20.0), None);
        let (rate, method) = acc.finish().unwrap();
        assert_eq!(method, AggregationMethod::Mean);
        assert!((rate - 750.0).abs() < 1e-9);
    }

    #[test]
    fn empty_group_yields_nothing() {
        let acc = RateAccumulator::default();
        assert!(acc.is_empty());
        assert!(acc.finish().is_none());
    }

    #[test]
    fn zero_population_rows_force_fallback() {
        let mut acc = RateAccumulator::default();
        acc.add(Some(3.0), Some(0.0), Some(0.0));
        let (rate, method) = acc.finish().unwrap();
        assert_eq!(method, AggregationMethod::Mean);
        assert!((rate - 3.0).abs() < 1e-9);
    }
}
