use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Maximum local height range (blocks) that still counts as buildable, constrained to [0, 64]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct SlopeThreshold(i32);

impl SlopeThreshold {
    const MIN: i32 = 0;
    const MAX: i32 = 64;

    pub fn new(value: i32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl Default for SlopeThreshold {
    fn default() -> Self {
        Self::new(2)
    }
}

impl From<i32> for SlopeThreshold {
    fn from(value: i32) -> Self {
        Self::new(value)
    }
}

impl From<SlopeThreshold> for i32 {
    fn from(value: SlopeThreshold) -> Self {
        value.0
    }
}

/// An exclusion radius in cells, constrained to [1, 64]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct ExclusionRadius(u32);

impl ExclusionRadius {
    const MIN: u32 = 1;
    const MAX: u32 = 64;

    pub fn new(value: u32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for ExclusionRadius {
    fn default() -> Self {
        Self::new(7)
    }
}

impl From<u32> for ExclusionRadius {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<ExclusionRadius> for u32 {
    fn from(value: ExclusionRadius) -> Self {
        value.0
    }
}

/// Retry budget multiplier (trials per requested building), constrained to [1, 100000]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct RetryMultiplier(u32);

impl RetryMultiplier {
    const MIN: u32 = 1;
    const MAX: u32 = 100_000;

    pub fn new(value: u32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Consecutive failed trials allowed for a goal of `goal` buildings
    pub fn budget_for(self, goal: u32) -> u64 {
        goal as u64 * self.0 as u64
    }
}

impl Default for RetryMultiplier {
    fn default() -> Self {
        Self::new(200)
    }
}

impl From<u32> for RetryMultiplier {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<RetryMultiplier> for u32 {
    fn from(value: RetryMultiplier) -> Self {
        value.0
    }
}

/// Minimum draw needed to accept a site, constrained to [0.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct AcceptThreshold(f64);

impl AcceptThreshold {
    const MIN: f64 = 0.0;
    const MAX: f64 = 1.0;

    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for AcceptThreshold {
    fn default() -> Self {
        Self(0.9)
    }
}

impl From<f64> for AcceptThreshold {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<AcceptThreshold> for f64 {
    fn from(value: AcceptThreshold) -> Self {
        value.0
    }
}
