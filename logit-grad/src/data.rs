use rand::{distributions::Uniform, Rng};
use serde::{Deserialize, Serialize};

use crate::error::{LogRegErr, Result};

pub const BLUE_LABEL: f32 = 0.0;
pub const RED_LABEL: f32 = 1.0;

/// Half-open interval `[low, high)` a class draws its features from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassRange {
    pub low: f32,
    pub high: f32,
}

impl ClassRange {
    pub fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, x: f32) -> bool {
        self.low <= x && x < self.high
    }

    /// `Uniform::new` panics on an empty or unbounded range, so check first.
    pub fn validate(&self, class: &'static str) -> Result<()> {
        let Self { low, high } = *self;
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(LogRegErr::InvalidRange { class, low, high });
        }
        Ok(())
    }
}

/// Two labeled clusters along a single feature axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    pub blue_x: Vec<f32>,
    pub red_x: Vec<f32>,
}

impl SampleSet {
    /// Draws all blue features, then all red ones, from `rng`.
    pub fn generate<R: Rng>(
        rng: &mut R,
        samples_per_class: usize,
        blue_range: ClassRange,
        red_range: ClassRange,
    ) -> Result<Self> {
        if samples_per_class == 0 {
            return Err(LogRegErr::EmptyDataset);
        }
        blue_range.validate("blue")?;
        red_range.validate("red")?;

        let blue_x = Self::draw(rng, samples_per_class, blue_range);
        let red_x = Self::draw(rng, samples_per_class, red_range);
        Ok(Self { blue_x, red_x })
    }

    fn draw<R: Rng>(rng: &mut R, n: usize, range: ClassRange) -> Vec<f32> {
        let uniform = Uniform::new(range.low, range.high);
        (0..n).map(|_| rng.sample(uniform)).collect()
    }

    /// Blue features followed by red features.
    pub fn features(&self) -> Vec<f32> {
        self.blue_x.iter().chain(self.red_x.iter()).copied().collect()
    }

    /// Labels aligned with `features`.
    pub fn labels(&self) -> Vec<f32> {
        let blue = std::iter::repeat(BLUE_LABEL).take(self.blue_x.len());
        let red = std::iter::repeat(RED_LABEL).take(self.red_x.len());
        blue.chain(red).collect()
    }

    pub fn len(&self) -> usize {
        self.blue_x.len() + self.red_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn default_samples(seed: u64) -> SampleSet {
        let mut rng = StdRng::seed_from_u64(seed);
        SampleSet::generate(
            &mut rng,
            20,
            ClassRange::new(0.0, 7.0),
            ClassRange::new(3.0, 10.0),
        )
        .unwrap()
    }

    #[test]
    fn test_generate_counts_and_ranges() {
        let samples = default_samples(42);
        assert_eq!(20, samples.blue_x.len());
        assert_eq!(20, samples.red_x.len());
        assert_eq!(40, samples.len());
        assert!(samples.blue_x.iter().all(|x| (0.0..7.0).contains(x)));
        assert!(samples.red_x.iter().all(|x| (3.0..10.0).contains(x)));
    }

    #[test]
    fn test_generate_is_deterministic() {
        assert_eq!(default_samples(42), default_samples(42));
        assert_ne!(default_samples(42), default_samples(43));
    }

    #[test]
    fn test_features_and_labels_keep_order() {
        let samples = SampleSet {
            blue_x: vec![1.0, 2.0],
            red_x: vec![8.0, 9.0, 7.5],
        };
        assert_eq!(vec![1.0, 2.0, 8.0, 9.0, 7.5], samples.features());
        assert_eq!(vec![0.0, 0.0, 1.0, 1.0, 1.0], samples.labels());
    }

    #[test]
    fn test_generate_rejects_empty_class() {
        let mut rng = StdRng::seed_from_u64(42);
        let result = SampleSet::generate(
            &mut rng,
            0,
            ClassRange::new(0.0, 7.0),
            ClassRange::new(3.0, 10.0),
        );
        assert!(matches!(result, Err(LogRegErr::EmptyDataset)));
    }

    #[test]
    fn test_generate_rejects_invalid_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let result = SampleSet::generate(
            &mut rng,
            20,
            ClassRange::new(0.0, 7.0),
            ClassRange::new(10.0, 3.0),
        );
        assert!(matches!(
            result,
            Err(LogRegErr::InvalidRange { class: "red", .. })
        ));

        assert!(ClassRange::new(f32::NAN, 1.0).validate("blue").is_err());
        assert!(ClassRange::new(1.0, 1.0).validate("blue").is_err());
    }

    #[test]
    fn test_class_range_contains() {
        let range = ClassRange::new(3.0, 7.0);
        assert!(range.contains(3.0));
        assert!(range.contains(6.99));
        assert!(!range.contains(7.0));
    }
}
