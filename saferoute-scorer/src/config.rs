//! Public configuration for route scoring.
//!
//! Every number the aggregator and classifier use lives here. Two presets
//! capture the historical tunings; [`ScoringConfig::default`] is
//! [`ScoringPreset::SqrtWeighted`].

use saferoute_core::prefilter::{DEFAULT_BUFFER_DEGREES, buffer_covers_threshold};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest possible safety score.
pub const MAX_SAFETY_SCORE: f64 = 100.0;

/// Lowest possible safety score.
pub const MIN_SAFETY_SCORE: f64 = 0.0;

/// Count at which [`CrimeFactor::Log10Count`] switches to its logarithm.
pub const LOG10_COUNT_KNEE: usize = 10;

/// Maps a raw incident weight into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightNormalization {
    /// `sqrt(min(weight, max_observed)) / sqrt(max_observed)`.
    SqrtCapped {
        /// Largest weight expected in the data; heavier incidents saturate.
        max_observed: f64,
    },
    /// `min(weight, cap) / cap`.
    LinearCapped {
        /// Weight at which the normalised value reaches 1.
        cap: f64,
    },
}

impl WeightNormalization {
    /// Normalise `weight` into `[0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use saferoute_scorer::WeightNormalization;
    ///
    /// let linear = WeightNormalization::LinearCapped { cap: 10.0 };
    /// assert_eq!(linear.normalize(5.0), 0.5);
    /// assert_eq!(linear.normalize(245.0), 1.0);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "weight normalisation divides floating-point weights"
    )]
    pub fn normalize(self, weight: f64) -> f64 {
        match self {
            Self::SqrtCapped { max_observed } => {
                weight.min(max_observed).sqrt() / max_observed.sqrt()
            }
            Self::LinearCapped { cap } => weight.min(cap) / cap,
        }
    }

    const fn scale(self) -> (&'static str, f64) {
        match self {
            Self::SqrtCapped { max_observed } => ("weight_normalization.max_observed", max_observed),
            Self::LinearCapped { cap } => ("weight_normalization.cap", cap),
        }
    }
}

/// Diminishing-returns factor applied to the total impact by incident count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CrimeFactor {
    /// `sqrt(count) / divisor`.
    SqrtCount {
        /// Divisor applied after the square root.
        divisor: f64,
    },
    /// `(1 + log10(count)) / divisor` from [`LOG10_COUNT_KNEE`] incidents
    /// upwards, `(count / 10) / divisor` below it.
    Log10Count {
        /// Divisor applied after the logarithm.
        divisor: f64,
    },
}

impl CrimeFactor {
    /// Factor for `count` affecting incidents.
    ///
    /// # Examples
    ///
    /// ```
    /// use saferoute_scorer::CrimeFactor;
    ///
    /// let sqrt = CrimeFactor::SqrtCount { divisor: 5.0 };
    /// assert_eq!(sqrt.factor(25), 1.0);
    /// let log = CrimeFactor::Log10Count { divisor: 10.0 };
    /// assert!((log.factor(100) - 0.3).abs() < 1e-12);
    /// assert!((log.factor(5) - 0.05).abs() < 1e-12);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "crime factor is a floating-point curve over the count"
    )]
    pub fn factor(self, count: usize) -> f64 {
        let n = count_as_f64(count);
        match self {
            Self::SqrtCount { divisor } => n.sqrt() / divisor,
            Self::Log10Count { divisor } if count >= LOG10_COUNT_KNEE => (1.0 + n.log10()) / divisor,
            Self::Log10Count { divisor } => n / 10.0 / divisor,
        }
    }

    const fn divisor(self) -> f64 {
        match self {
            Self::SqrtCount { divisor } | Self::Log10Count { divisor } => divisor,
        }
    }
}

fn count_as_f64(count: usize) -> f64 {
    f64::from(u32::try_from(count).unwrap_or(u32::MAX))
}

/// Score bounds and category cut-offs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Score of a route with no affecting incidents.
    pub base_score: f64,
    /// Lowest score the classifier reports.
    pub floor: f64,
    /// Scores at or above this are `safe`.
    pub safe_threshold: f64,
    /// Scores at or above this (and below `safe_threshold`) are `warning`.
    pub warning_threshold: f64,
    /// Scores at or above this set `is_safe`.
    pub is_safe_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ScoringPreset::SqrtWeighted.config().classifier
    }
}

/// All tunables of the scoring pipeline.
///
/// Deserialises with per-field defaults taken from
/// [`ScoringPreset::SqrtWeighted`], so a partial document overrides only
/// what it names.
///
/// # Examples
///
/// ```
/// use saferoute_scorer::{ScoringConfig, ScoringPreset};
///
/// let config: ScoringConfig =
///     serde_json::from_str(r#"{"proximity_threshold_m": 150.0}"#).unwrap();
/// assert_eq!(config.proximity_threshold_m, 150.0);
/// assert_eq!(config.impact_cap, ScoringPreset::SqrtWeighted.config().impact_cap);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Incidents strictly closer than this many metres affect the route.
    pub proximity_threshold_m: f64,
    /// Bounding-box buffer in degrees used by the prefilter.
    pub buffer_degrees: f64,
    /// Weight normalisation curve.
    pub weight_normalization: WeightNormalization,
    /// Multiplier applied to each incident's impact.
    pub impact_multiplier: f64,
    /// Diminishing-returns factor over the affecting count.
    pub crime_factor: CrimeFactor,
    /// Upper bound on the normalised impact.
    pub impact_cap: f64,
    /// Score bounds and category thresholds.
    pub classifier: ClassifierConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringPreset::SqrtWeighted.config()
    }
}

impl From<ScoringPreset> for ScoringConfig {
    fn from(preset: ScoringPreset) -> Self {
        preset.config()
    }
}

/// Named historical tunings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPreset {
    /// 100 m threshold, square-root weights capped at 4198, multiplier 0.2,
    /// `sqrt(n) / 5`, cap 90, floor 10, cut-offs 70/40.
    #[default]
    SqrtWeighted,
    /// 200 m threshold, linear weights capped at 10, multiplier 1.5,
    /// logarithmic count factor over 10, cap 100, floor 0, cut-offs 80/50
    /// with `is_safe` at 70.
    LinearWeighted,
}

impl ScoringPreset {
    /// Every preset, in declaration order.
    pub const ALL: [Self; 2] = [Self::SqrtWeighted, Self::LinearWeighted];

    /// The configuration this preset stands for.
    #[must_use]
    pub const fn config(self) -> ScoringConfig {
        match self {
            Self::SqrtWeighted => ScoringConfig {
                proximity_threshold_m: 100.0,
                buffer_degrees: DEFAULT_BUFFER_DEGREES,
                weight_normalization: WeightNormalization::SqrtCapped {
                    max_observed: 4198.0,
                },
                impact_multiplier: 0.2,
                crime_factor: CrimeFactor::SqrtCount { divisor: 5.0 },
                impact_cap: 90.0,
                classifier: ClassifierConfig {
                    base_score: MAX_SAFETY_SCORE,
                    floor: 10.0,
                    safe_threshold: 70.0,
                    warning_threshold: 40.0,
                    is_safe_threshold: 70.0,
                },
            },
            Self::LinearWeighted => ScoringConfig {
                proximity_threshold_m: 200.0,
                buffer_degrees: DEFAULT_BUFFER_DEGREES,
                weight_normalization: WeightNormalization::LinearCapped { cap: 10.0 },
                impact_multiplier: 1.5,
                crime_factor: CrimeFactor::Log10Count { divisor: 10.0 },
                impact_cap: 100.0,
                classifier: ClassifierConfig {
                    base_score: MAX_SAFETY_SCORE,
                    floor: MIN_SAFETY_SCORE,
                    safe_threshold: 80.0,
                    warning_threshold: 50.0,
                    is_safe_threshold: 70.0,
                },
            },
        }
    }
}

/// Reasons a [`ScoringConfig`] is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringConfigError {
    /// A parameter that must be finite and strictly positive was not.
    #[error("{field} must be finite and greater than zero, found {value}")]
    NotPositive {
        /// Offending field.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// A parameter that must be finite and non-negative was not.
    #[error("{field} must be finite and non-negative, found {value}")]
    Negative {
        /// Offending field.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// A score bound or threshold fell outside `[0, 100]`.
    #[error("{field} must lie within [0, 100], found {value}")]
    ScoreOutOfRange {
        /// Offending field.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// `warning_threshold` exceeded `safe_threshold`, or `floor` exceeded
    /// `base_score`.
    #[error("{lower} ({lower_value}) must not exceed {upper} ({upper_value})")]
    Unordered {
        /// Field expected to be the smaller.
        lower: &'static str,
        /// Its value.
        lower_value: f64,
        /// Field expected to be the larger.
        upper: &'static str,
        /// Its value.
        upper_value: f64,
    },
    /// The prefilter buffer could exclude incidents inside the threshold from
    /// a segment of non-zero length.
    #[error(
        "buffer of {buffer_degrees} degrees does not cover a {proximity_threshold_m} m threshold at every latitude"
    )]
    BufferTooSmall {
        /// Configured buffer.
        buffer_degrees: f64,
        /// Configured threshold.
        proximity_threshold_m: f64,
    },
}

impl ScoringConfig {
    /// Check every invariant the scoring pipeline relies on.
    ///
    /// # Errors
    /// Returns the first [`ScoringConfigError`] found.
    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        let (scale_field, scale) = self.weight_normalization.scale();
        for (field, value) in [
            ("proximity_threshold_m", self.proximity_threshold_m),
            ("buffer_degrees", self.buffer_degrees),
            (scale_field, scale),
            ("crime_factor.divisor", self.crime_factor.divisor()),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ScoringConfigError::NotPositive { field, value });
            }
        }
        for (field, value) in [
            ("impact_multiplier", self.impact_multiplier),
            ("impact_cap", self.impact_cap),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ScoringConfigError::Negative { field, value });
            }
        }
        self.classifier.validate()?;
        if !buffer_covers_threshold(self.buffer_degrees, self.proximity_threshold_m) {
            return Err(ScoringConfigError::BufferTooSmall {
                buffer_degrees: self.buffer_degrees,
                proximity_threshold_m: self.proximity_threshold_m,
            });
        }
        Ok(())
    }
}

impl ClassifierConfig {
    fn validate(&self) -> Result<(), ScoringConfigError> {
        let score_range = MIN_SAFETY_SCORE..=MAX_SAFETY_SCORE;
        for (field, value) in [
            ("classifier.base_score", self.base_score),
            ("classifier.floor", self.floor),
            ("classifier.safe_threshold", self.safe_threshold),
            ("classifier.warning_threshold", self.warning_threshold),
            ("classifier.is_safe_threshold", self.is_safe_threshold),
        ] {
            if !score_range.contains(&value) {
                return Err(ScoringConfigError::ScoreOutOfRange { field, value });
            }
        }
        for (lower, lower_value, upper, upper_value) in [
            (
                "classifier.floor",
                self.floor,
                "classifier.base_score",
                self.base_score,
            ),
            (
                "classifier.warning_threshold",
                self.warning_threshold,
                "classifier.safe_threshold",
                self.safe_threshold,
            ),
        ] {
            if lower_value > upper_value {
                return Err(ScoringConfigError::Unordered {
                    lower,
                    lower_value,
                    upper,
                    upper_value,
                });
            }
        }
        Ok(())
    }
}
