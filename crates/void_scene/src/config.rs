//! Scene configuration

use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};

/// Tuning for movement resolution and deferred commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Pull-back applied to every sweep hit, as a fraction of the move or
    /// as a distance, whichever is larger
    pub sweep_pullback_epsilon: f32,

    /// Constant added to the pull-back time
    pub sweep_pullback_bias: f32,

    /// Moves shorter than this are not swept
    pub min_move_distance: f32,

    /// Start-penetrating blocks are ignored when the move direction's dot
    /// with the impact normal exceeds this
    pub initial_overlap_normal_tolerance: f32,

    /// Confirm sweep touches at the end pose instead of issuing a fresh
    /// overlap query after a swept move
    pub fast_overlap_check: bool,

    /// Maximum number of passes when flushing deferred commands
    pub max_command_passes: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            sweep_pullback_epsilon: 1e-3,
            sweep_pullback_bias: 1e-4,
            min_move_distance: 1e-4,
            initial_overlap_normal_tolerance: 0.0,
            fast_overlap_check: true,
            max_command_passes: 8,
        }
    }
}

impl SceneConfig {
    /// Smaller pull-back and a fresh overlap query after every move
    pub fn precise() -> Self {
        Self {
            sweep_pullback_epsilon: 1e-4,
            sweep_pullback_bias: 1e-5,
            min_move_distance: 1e-5,
            fast_overlap_check: false,
            ..Default::default()
        }
    }

    /// Load from a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SceneError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("sweep_pullback_epsilon", self.sweep_pullback_epsilon),
            ("sweep_pullback_bias", self.sweep_pullback_bias),
            ("min_move_distance", self.min_move_distance),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SceneError::InvalidConfig(format!("{name} must be >= 0, got {value}")));
            }
        }
        if !self.initial_overlap_normal_tolerance.is_finite() {
            return Err(SceneError::InvalidConfig(
                "initial_overlap_normal_tolerance must be finite".to_string(),
            ));
        }
        if self.max_command_passes == 0 {
            return Err(SceneError::InvalidConfig(
                "max_command_passes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the fast overlap check
    pub fn with_fast_overlap_check(mut self, enabled: bool) -> Self {
        self.fast_overlap_check = enabled;
        self
    }

    /// Set the maximum number of command flush passes
    pub fn with_max_command_passes(mut self, passes: u32) -> Self {
        self.max_command_passes = passes;
        self
    }

    /// Pull-back time for a move of length `delta_size`
    pub fn pullback_time(&self, delta_size: f32) -> f32 {
        if delta_size <= 0.0 {
            return 0.0;
        }
        let eps = self.sweep_pullback_epsilon;
        eps.max(eps / delta_size) + self.sweep_pullback_bias
    }
}
