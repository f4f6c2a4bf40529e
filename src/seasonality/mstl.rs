//! MSTL: STL extended to several simultaneous seasonal periods, e.g. the
//! weekly and four-weekly booking cycles.

use super::stl::{Decomposition, Stl};

/// MSTL decomposition for multiple seasonal periods.
#[derive(Debug, Clone)]
pub struct Mstl {
    /// Sorted, deduplicated periods.
    periods: Vec<usize>,
    iterations: usize,
    robust: bool,
}

impl Mstl {
    pub fn new(periods: &[usize]) -> Self {
        let mut periods = periods.to_vec();
        periods.sort_unstable();
        periods.dedup();
        Self {
            periods,
            iterations: 2,
            robust: false,
        }
    }

    pub fn robust(mut self) -> Self {
        self.robust = true;
        self
    }

    pub fn periods(&self) -> &[usize] {
        &self.periods
    }

    fn stl(&self, period: usize) -> Stl {
        if self.robust {
            Stl::new(period).robust(2)
        } else {
            Stl::new(period)
        }
    }

    /// Decompose `series`. Needs two full cycles of the longest period.
    ///
    /// A single period degenerates to plain STL.
    pub fn decompose(&self, series: &[f64]) -> Option<Decomposition> {
        let longest = *self.periods.last()?;
        let n = series.len();
        if n < 2 * longest {
            return None;
        }
        if self.periods.len() == 1 {
            return self.stl(longest).decompose(series);
        }

        let mut seasonal = vec![vec![0.0; n]; self.periods.len()];
        let mut trend = vec![0.0; n];

        for _ in 0..self.iterations {
            // Trend from the series with the current seasonal estimates removed.
            let mut deseasonalized = series.to_vec();
            for component in &seasonal {
                for (d, s) in deseasonalized.iter_mut().zip(component) {
                    *d -= s;
                }
            }
            trend = self.stl(longest).decompose(&deseasonalized)?.trend;

            // Each period in turn, against everything else removed.
            for (idx, &period) in self.periods.iter().enumerate() {
                let adjusted: Vec<f64> = (0..n)
                    .map(|i| {
                        let others: f64 = seasonal
                            .iter()
                            .enumerate()
                            .filter(|(other, _)| *other != idx)
                            .map(|(_, c)| c[i])
                            .sum();
                        series[i] - trend[i] - others
                    })
                    .collect();
                let mut result = self.stl(period).decompose(&adjusted)?;
                seasonal[idx] = result.seasonal.swap_remove(0);
            }
        }

        let remainder = (0..n)
            .map(|i| series[i] - trend[i] - seasonal.iter().map(|c| c[i]).sum::<f64>())
            .collect();

        Some(Decomposition {
            trend,
            periods: self.periods.clone(),
            seasonal,
            remainder,
        })
    }
}
