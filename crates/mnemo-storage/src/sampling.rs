use rand::Rng;
use serde::{Deserialize, Serialize};

/// Decides whether a score is worth persisting
///
/// Constructed by the caller and passed in explicitly; there is no shared
/// sampler state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SamplingPolicy {
    /// Keep everything
    #[default]
    Always,
    /// Keep nothing
    Never,
    /// Keep a fraction of writes, `rate` in `[0, 1]`; a NaN rate keeps nothing
    Ratio { rate: f64 },
}

impl SamplingPolicy {
    pub fn ratio(rate: f64) -> Self {
        Self::Ratio {
            rate: rate.clamp(0.0, 1.0),
        }
    }

    pub fn should_sample(&self) -> bool {
        self.should_sample_with(&mut rand::thread_rng())
    }

    pub fn should_sample_with<R: Rng>(&self, rng: &mut R) -> bool {
        match *self {
            Self::Always => true,
            Self::Never => false,
            Self::Ratio { rate } if rate.is_nan() => false,
            Self::Ratio { rate } if rate >= 1.0 => true,
            Self::Ratio { rate } if rate <= 0.0 => false,
            Self::Ratio { rate } => rng.gen_bool(rate),
        }
    }
}
