use crate::error::{DashError, DashResult};

/// Linear mapping from a data domain onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
}

impl LinearScale {
    pub fn new(domain_start: f64, domain_end: f64) -> DashResult<Self> {
        if !domain_start.is_finite() || !domain_end.is_finite() || domain_start == domain_end {
            return Err(DashError::InvalidData(
                "scale domain must be finite and non-zero".to_owned(),
            ));
        }

        Ok(Self {
            domain_start,
            domain_end,
        })
    }

    /// Fits a domain around `values`, widened by `padding` of its span on each side.
    ///
    /// Degenerate inputs (no finite values or a single value) get a unit span.
    pub fn fit(values: impl IntoIterator<Item = f64>, padding: f64) -> DashResult<Self> {
        let (min, max) = values
            .into_iter()
            .filter(|value| value.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if !min.is_finite() {
            return Self::new(-1.0, 1.0);
        }
        if min == max {
            return Self::new(min - 1.0, max + 1.0);
        }
        let pad = (max - min) * padding;
        Self::new(min - pad, max + pad)
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        let (lo, hi) = if self.domain_start <= self.domain_end {
            (self.domain_start, self.domain_end)
        } else {
            (self.domain_end, self.domain_start)
        };
        (lo..=hi).contains(&value)
    }

    /// Maps `value` onto `[range_start, range_end]`. The range may be inverted.
    pub fn to_pixel(self, value: f64, range_start: f64, range_end: f64) -> DashResult<f64> {
        if !value.is_finite() {
            return Err(DashError::InvalidData("value must be finite".to_owned()));
        }

        let span = self.domain_end - self.domain_start;
        let normalized = (value - self.domain_start) / span;
        Ok(range_start + normalized * (range_end - range_start))
    }

    pub fn from_pixel(self, pixel: f64, range_start: f64, range_end: f64) -> DashResult<f64> {
        if !pixel.is_finite() {
            return Err(DashError::InvalidData("pixel must be finite".to_owned()));
        }
        if range_start == range_end {
            return Err(DashError::InvalidData("pixel range must be non-empty".to_owned()));
        }

        let normalized = (pixel - range_start) / (range_end - range_start);
        Ok(self.domain_start + normalized * (self.domain_end - self.domain_start))
    }

    /// Evenly spaced "nice" tick values covering the domain.
    #[must_use]
    pub fn ticks(self, target_count: usize) -> Vec<f64> {
        let (lo, hi) = if self.domain_start <= self.domain_end {
            (self.domain_start, self.domain_end)
        } else {
            (self.domain_end, self.domain_start)
        };
        let raw_step = (hi - lo) / target_count.max(1) as f64;
        let magnitude = 10f64.powf(raw_step.log10().floor());
        let step = [1.0, 2.0, 5.0, 10.0]
            .into_iter()
            .map(|factor| factor * magnitude)
            .find(|candidate| *candidate >= raw_step)
            .unwrap_or(10.0 * magnitude);
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        (first..=last).map(|i| i as f64 * step).collect()
    }
}
