//! Configuration system
//!
//! All numeric knobs for the culling pipeline live in [`CullingConfig`].
//! Configuration is loaded at startup or reload; when the file is missing
//! or malformed the engine falls back to the hardcoded defaults rather
//! than failing, since a missing config must never hide content.

use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Load configuration, falling back to defaults on any failure
    fn load_or_default(path: &str) -> Self {
        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("failed to load config from {path}: {e}; using defaults");
                Self::default()
            }
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Room discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Hard cap on flood-filled room size in cells; rooms that hit the cap
    /// are flagged unbounded and treated as always potentially visible
    pub max_room_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self { max_room_size: 4096 }
    }
}

/// Level-of-detail distance thresholds and adaptive-bias settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LodConfig {
    /// Distance up to which objects render at full detail
    pub high_distance: f32,
    /// Distance up to which objects render at medium detail
    pub medium_distance: f32,
    /// Distance up to which objects render at low detail
    pub low_distance: f32,
    /// Maximum render distance; beyond it objects are culled (clamped 8-128)
    pub cull_distance: f32,
    /// Whether frame-time pressure may shift levels toward culled
    pub adaptive: bool,
    /// Frame-time budget in milliseconds the adaptive bias steers toward
    pub target_frame_ms: f32,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            high_distance: 32.0,
            medium_distance: 64.0,
            low_distance: 128.0,
            cull_distance: 32.0,
            adaptive: true,
            target_frame_ms: 16.67,
        }
    }
}

/// Cache sizing and freshness settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Ticks a region visibility entry stays fresh
    pub region_ttl_ticks: u64,
    /// Ticks an observer's cached group assignment stays fresh
    pub observer_cooldown_ticks: u64,
    /// Bounded size of the per-coordinate occlusion cache
    pub occlusion_cache_size: usize,
    /// Radius (in cells) within which geometry is never culled
    pub force_visible_radius: f32,
    /// Probe distance for the six-direction enclosure heuristic
    pub probe_radius: i32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            region_ttl_ticks: 60,
            observer_cooldown_ticks: 3,
            occlusion_cache_size: 4096,
            // Historically 16.0; widened after nearby geometry was seen
            // popping out at room boundaries.
            force_visible_radius: 32.0,
            probe_radius: 3,
        }
    }
}

/// Draw-batch grouping settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Minimum population for a batch to be worth submitting as a batch
    pub min_batch_size: usize,
    /// Maximum number of members a single batch will accept
    pub max_batch_size: usize,
    /// Seconds a batch may go untouched before cleanup evicts it
    pub idle_timeout_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            min_batch_size: 4,
            max_batch_size: 1024,
            idle_timeout_secs: 30,
        }
    }
}

/// Top-level configuration for the culling engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CullingConfig {
    /// Master switch for the whole pipeline
    pub enable_culling: bool,
    /// Enable the per-frame frustum tests
    pub enable_frustum_culling: bool,
    /// Enable distance-based LOD classification
    pub enable_lod: bool,
    /// Enable draw-batch aggregation
    pub enable_batching: bool,
    /// Room discovery settings
    pub rooms: RoomConfig,
    /// LOD settings
    pub lod: LodConfig,
    /// Cache settings
    pub cache: CacheConfig,
    /// Batching settings
    pub batching: BatchConfig,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            enable_culling: true,
            enable_frustum_culling: true,
            enable_lod: true,
            enable_batching: true,
            rooms: RoomConfig::default(),
            lod: LodConfig::default(),
            cache: CacheConfig::default(),
            batching: BatchConfig::default(),
        }
    }
}

impl Config for CullingConfig {}

impl CullingConfig {
    /// Clamp every knob into its supported range, returning the result.
    ///
    /// Out-of-range values come from hand-edited config files; clamping
    /// keeps the pipeline stable instead of rejecting the file outright.
    pub fn validated(mut self) -> Self {
        self.rooms.max_room_size = self.rooms.max_room_size.clamp(64, 65_536);
        self.lod.cull_distance = self.lod.cull_distance.clamp(8.0, 128.0);
        self.lod.high_distance = self.lod.high_distance.max(1.0);
        self.lod.medium_distance = self.lod.medium_distance.max(self.lod.high_distance);
        self.lod.low_distance = self.lod.low_distance.max(self.lod.medium_distance);
        self.lod.target_frame_ms = self.lod.target_frame_ms.clamp(1.0, 100.0);
        self.cache.occlusion_cache_size = self.cache.occlusion_cache_size.clamp(64, 65_536);
        self.cache.region_ttl_ticks = self.cache.region_ttl_ticks.max(1);
        self.cache.force_visible_radius = self.cache.force_visible_radius.clamp(4.0, 64.0);
        self.cache.probe_radius = self.cache.probe_radius.clamp(1, 8);
        self.batching.min_batch_size = self.batching.min_batch_size.max(1);
        self.batching.max_batch_size = self
            .batching
            .max_batch_size
            .clamp(self.batching.min_batch_size, 4096);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_constants() {
        let config = CullingConfig::default();
        assert_eq!(config.rooms.max_room_size, 4096);
        assert_eq!(config.cache.region_ttl_ticks, 60);
        assert_eq!(config.cache.observer_cooldown_ticks, 3);
        assert_eq!(config.batching.min_batch_size, 4);
        assert!((config.lod.cull_distance - 32.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validated_clamps_cull_distance() {
        let mut config = CullingConfig::default();
        config.lod.cull_distance = 4000.0;
        assert!((config.validated().lod.cull_distance - 128.0).abs() < f32::EPSILON);

        let mut config = CullingConfig::default();
        config.lod.cull_distance = 1.0;
        assert!((config.validated().lod.cull_distance - 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validated_keeps_thresholds_ordered() {
        let mut config = CullingConfig::default();
        config.lod.high_distance = 100.0;
        config.lod.medium_distance = 50.0;
        let config = config.validated();
        assert!(config.lod.medium_distance >= config.lod.high_distance);
        assert!(config.lod.low_distance >= config.lod.medium_distance);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CullingConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: CullingConfig = toml::from_str(&text).unwrap();
        assert!(parsed.enable_culling);
        assert_eq!(parsed.rooms.max_room_size, config.rooms.max_room_size);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: CullingConfig = toml::from_str("enable_lod = false").unwrap();
        assert!(!parsed.enable_lod);
        assert!(parsed.enable_culling);
        assert_eq!(parsed.rooms.max_room_size, 4096);
    }
}
