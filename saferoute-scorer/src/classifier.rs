//! Map a normalised impact onto a bounded safety score and category.

use serde::{Deserialize, Serialize};

use crate::config::{ClassifierConfig, MAX_SAFETY_SCORE, MIN_SAFETY_SCORE};

/// Coarse safety band of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Score at or above the safe threshold.
    Safe,
    /// Score at or above the warning threshold.
    Warning,
    /// Everything below the warning threshold.
    Danger,
}

impl Category {
    /// Lower-case name as it appears in serialised results.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score fields produced by [`classify`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Bounded score in `[0, 100]`.
    pub safety_score: f64,
    /// Band the score falls in.
    pub category: Category,
    /// Whether the score clears `is_safe_threshold`.
    pub is_safe: bool,
}

/// Classify a normalised impact.
///
/// The score is `max(floor, base_score - normalized_impact)` clamped to
/// `[0, 100]`.
///
/// # Examples
///
/// ```
/// use saferoute_scorer::{Category, ClassifierConfig, classify};
///
/// let result = classify(45.0, &ClassifierConfig::default());
/// assert_eq!(result.safety_score, 55.0);
/// assert_eq!(result.category, Category::Warning);
/// assert!(!result.is_safe);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "score subtracts a floating-point impact from the base"
)]
pub fn classify(normalized_impact: f64, config: &ClassifierConfig) -> Classification {
    let safety_score = (config.base_score - normalized_impact)
        .max(config.floor)
        .clamp(MIN_SAFETY_SCORE, MAX_SAFETY_SCORE);
    let category = if safety_score >= config.safe_threshold {
        Category::Safe
    } else if safety_score >= config.warning_threshold {
        Category::Warning
    } else {
        Category::Danger
    };
    Classification {
        safety_score,
        category,
        is_safe: safety_score >= config.is_safe_threshold,
    }
}
