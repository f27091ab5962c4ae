use serde::Serialize;

/// Statistical summary of one metric over a set of samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Aggregate {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    /// Sample standard deviation (divisor N-1)
    pub stddev: f64,
}

impl Aggregate {
    /// Drop the standard deviation for rollups
    pub fn rollup(&self) -> Rollup {
        Rollup {
            mean: self.mean,
            median: self.median,
            min: self.min,
        }
    }
}

/// Mean, median and min summed across lower-granularity rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rollup {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
}

impl Rollup {
    pub fn add(&mut self, other: &Rollup) {
        self.mean += other.mean;
        self.median += other.median;
        self.min += other.min;
    }
}

/// Samples of one metric, kept sorted as they arrive
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    sorted: Vec<f64>,
    sum: f64,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        let index = self.sorted.partition_point(|v| *v <= value);
        self.sorted.insert(index, value);
        self.sum += value;
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Summarize the samples; an empty set summarizes to all zeros
    pub fn summarize(&self) -> Aggregate {
        let n = self.sorted.len();
        if n == 0 {
            return Aggregate::default();
        }

        let mean = self.sum / n as f64;
        let median = if n % 2 == 0 {
            (self.sorted[n / 2 - 1] + self.sorted[n / 2]) / 2.0
        } else {
            self.sorted[n / 2]
        };
        let min = self.sorted[0];

        let stddev = if n > 1 {
            let variance = self
                .sorted
                .iter()
                .map(|v| {
                    let diff = v - mean;
                    diff * diff
                })
                .sum::<f64>()
                / (n - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        Aggregate {
            mean,
            median,
            min,
            stddev,
        }
    }
}

impl FromIterator<f64> for SampleSet {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut set = SampleSet::new();
        for value in iter {
            set.push(value);
        }
        set
    }
}
