//! Distance-based detail levels with frame-time-adaptive degradation

use std::time::{Duration, Instant};

use crate::config::LodConfig;
use crate::foundation::math::Point3;

/// Detail level assigned to an object, ordered from most to least detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LodLevel {
    /// Full detail
    High,
    /// Reduced detail
    Medium,
    /// Minimal detail
    Low,
    /// Not rendered at all
    Culled,
}

impl LodLevel {
    /// Step this level `steps` places toward [`LodLevel::Culled`].
    pub fn shifted_toward_culled(self, steps: u32) -> Self {
        let mut level = self;
        for _ in 0..steps {
            level = match level {
                Self::High => Self::Medium,
                Self::Medium => Self::Low,
                Self::Low | Self::Culled => Self::Culled,
            };
        }
        level
    }

    /// Whether this level draws at all.
    pub fn renders(self) -> bool {
        self != Self::Culled
    }

    /// Whether this level uses the simplified mesh variant.
    pub fn uses_simplified_mesh(self) -> bool {
        matches!(self, Self::Medium | Self::Low)
    }

    /// Whether detail passes (shadows, per-pixel lighting) are skipped.
    pub fn skips_details(self) -> bool {
        self == Self::Low
    }

    /// Fraction of full quality this level renders at, for texture LOD.
    pub fn quality_multiplier(self) -> f32 {
        match self {
            Self::High => 1.0,
            Self::Medium => 0.75,
            Self::Low => 0.5,
            Self::Culled => 0.0,
        }
    }
}

/// Frame-time-driven quality bias, sampled at most once per second.
///
/// The bias rises while frames run over budget and falls while they run
/// under, and classification shifts levels toward culled by `floor(bias)`
/// steps. The clamp to `[0, 2]` bounds the degradation at two levels no
/// matter how long the overload lasts.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveBias {
    bias: f32,
    last_sample: Option<Instant>,
}

/// Bias added per over-budget sample
const BIAS_STEP_UP: f32 = 0.1;
/// Bias removed per under-budget sample
const BIAS_STEP_DOWN: f32 = 0.05;
const BIAS_MAX: f32 = 2.0;
const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

impl Default for AdaptiveBias {
    fn default() -> Self {
        Self {
            bias: 0.0,
            last_sample: None,
        }
    }
}

impl AdaptiveBias {
    /// Offer a frame-time sample; ignored unless a second has passed
    /// since the last accepted sample.
    pub fn sample(&mut self, frame_ms: f32, target_ms: f32) {
        let now = Instant::now();
        if let Some(last) = self.last_sample {
            if now.duration_since(last) < SAMPLE_INTERVAL {
                return;
            }
        }
        self.last_sample = Some(now);
        self.record_sample(frame_ms, target_ms);
    }

    /// Apply one sample unconditionally, bypassing the rate gate.
    pub fn record_sample(&mut self, frame_ms: f32, target_ms: f32) {
        if frame_ms > target_ms * 1.2 {
            self.bias = (self.bias + BIAS_STEP_UP).min(BIAS_MAX);
        } else if frame_ms < target_ms * 0.8 {
            self.bias = (self.bias - BIAS_STEP_DOWN).max(0.0);
        }
    }

    /// Current bias value in `[0, 2]`.
    pub fn value(&self) -> f32 {
        self.bias
    }

    /// Whole levels of degradation the current bias demands.
    pub fn level_shift(&self) -> u32 {
        self.bias.floor() as u32
    }

    /// Reset the bias to zero.
    pub fn reset(&mut self) {
        self.bias = 0.0;
        self.last_sample = None;
    }
}

/// Assigns detail levels from squared observer distance, degraded under
/// frame-time pressure by an [`AdaptiveBias`].
pub struct LodClassifier {
    config: LodConfig,
    bias: AdaptiveBias,
}

impl LodClassifier {
    /// Create a classifier from validated LOD settings.
    pub fn new(config: LodConfig) -> Self {
        Self {
            config,
            bias: AdaptiveBias::default(),
        }
    }

    /// Classify an object position relative to an observer.
    pub fn classify(&self, object: Point3, observer: Point3) -> LodLevel {
        let distance_squared = (object - observer).norm_squared();
        let cutoff = self.config.low_distance.min(self.config.cull_distance);
        if distance_squared >= cutoff * cutoff {
            return LodLevel::Culled;
        }
        let raw = if distance_squared < self.config.high_distance * self.config.high_distance {
            LodLevel::High
        } else if distance_squared < self.config.medium_distance * self.config.medium_distance {
            LodLevel::Medium
        } else {
            LodLevel::Low
        };
        if self.config.adaptive {
            raw.shifted_toward_culled(self.bias.level_shift())
        } else {
            raw
        }
    }

    /// Feed a frame-time sample to the adaptive bias (rate-gated).
    pub fn observe_frame(&mut self, frame_ms: f32) {
        if self.config.adaptive {
            self.bias.sample(frame_ms, self.config.target_frame_ms);
        }
    }

    /// Apply a frame-time sample without the once-per-second gate.
    pub fn record_frame(&mut self, frame_ms: f32) {
        if self.config.adaptive {
            self.bias.record_sample(frame_ms, self.config.target_frame_ms);
        }
    }

    /// Current adaptive bias value.
    pub fn bias(&self) -> f32 {
        self.bias.value()
    }

    /// Reset the adaptive bias.
    pub fn reset_bias(&mut self) {
        self.bias.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wide_config() -> LodConfig {
        LodConfig {
            high_distance: 32.0,
            medium_distance: 64.0,
            low_distance: 128.0,
            cull_distance: 128.0,
            adaptive: true,
            target_frame_ms: 16.67,
        }
    }

    fn at_distance(d: f32) -> Point3 {
        Point3::new(d, 0.0, 0.0)
    }

    #[test]
    fn test_levels_follow_distance_bands() {
        let classifier = LodClassifier::new(wide_config());
        let origin = Point3::origin();
        assert_eq!(classifier.classify(at_distance(10.0), origin), LodLevel::High);
        assert_eq!(classifier.classify(at_distance(40.0), origin), LodLevel::Medium);
        assert_eq!(classifier.classify(at_distance(100.0), origin), LodLevel::Low);
        assert_eq!(classifier.classify(at_distance(200.0), origin), LodLevel::Culled);
    }

    #[test]
    fn test_low_distance_bounds_the_low_band() {
        let mut config = wide_config();
        config.low_distance = 90.0;
        let classifier = LodClassifier::new(config);
        let origin = Point3::origin();
        assert_eq!(classifier.classify(at_distance(80.0), origin), LodLevel::Low);
        assert_eq!(classifier.classify(at_distance(95.0), origin), LodLevel::Culled);
    }

    #[test]
    fn test_level_never_improves_with_distance() {
        let classifier = LodClassifier::new(wide_config());
        let origin = Point3::origin();
        let mut previous = LodLevel::High;
        for step in 1..150 {
            let level = classifier.classify(at_distance(step as f32), origin);
            assert!(level >= previous, "level improved at distance {step}");
            previous = level;
        }
    }

    #[test]
    fn test_per_level_render_predicates() {
        assert!(LodLevel::High.renders());
        assert!(!LodLevel::Culled.renders());
        assert!(LodLevel::Medium.uses_simplified_mesh());
        assert!(!LodLevel::High.uses_simplified_mesh());
        assert!(LodLevel::Low.skips_details());
        assert!((LodLevel::Medium.quality_multiplier() - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bias_stays_within_bounds() {
        let mut bias = AdaptiveBias::default();
        for _ in 0..100 {
            bias.record_sample(100.0, 16.67);
        }
        assert_relative_eq!(bias.value(), 2.0);
        for _ in 0..100 {
            bias.record_sample(1.0, 16.67);
        }
        assert_relative_eq!(bias.value(), 0.0);
    }

    #[test]
    fn test_bias_ignores_frames_near_target() {
        let mut bias = AdaptiveBias::default();
        bias.record_sample(16.67, 16.67);
        assert_relative_eq!(bias.value(), 0.0);
    }

    #[test]
    fn test_pressure_shifts_levels_toward_culled() {
        let mut classifier = LodClassifier::new(wide_config());
        let origin = Point3::origin();
        assert_eq!(classifier.classify(at_distance(10.0), origin), LodLevel::High);
        // Twelve over-budget samples push the bias past 1.0
        for _ in 0..12 {
            classifier.record_frame(100.0);
        }
        assert_eq!(classifier.classify(at_distance(10.0), origin), LodLevel::Medium);
        assert_eq!(classifier.classify(at_distance(100.0), origin), LodLevel::Culled);
    }

    #[test]
    fn test_adaptive_disabled_ignores_pressure() {
        let mut config = wide_config();
        config.adaptive = false;
        let mut classifier = LodClassifier::new(config);
        for _ in 0..50 {
            classifier.record_frame(100.0);
        }
        assert_eq!(
            classifier.classify(at_distance(10.0), Point3::origin()),
            LodLevel::High
        );
    }

    #[test]
    fn test_sample_rate_gate_accepts_at_most_once_per_second() {
        let mut bias = AdaptiveBias::default();
        bias.sample(100.0, 16.67);
        bias.sample(100.0, 16.67);
        bias.sample(100.0, 16.67);
        assert_relative_eq!(bias.value(), BIAS_STEP_UP);
    }
}
