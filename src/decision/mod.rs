//! Decision engine: turns a resource sample into a profile choice.
//!
//! Semantics:
//! - Level-B is selected iff the inference score is strictly greater than `DECISION_THRESHOLD`.
//! - Any inference failure, including a non-finite score or one outside `[0, 1]`, selects
//!   Level-A. The failure is logged, never returned.
//! - The engine keeps no per-session state.

pub mod model;

pub use model::{InferenceCapability, LogisticModel, RuleModel};

use crate::config::{ModelConfig, ModelKind};
use crate::errors::{InferenceError, ServiceError};

pub const DECISION_THRESHOLD: f32 = 0.5;

/// Features for one decision. `reserved` is a placeholder slot that is always zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionSample {
    pub resource_metric: f32,
    pub previous_latency_ms: f32,
    pub reserved: f32,
}

impl DecisionSample {
    pub fn new(resource_metric: f32, previous_latency_ms: f32) -> Self {
        Self { resource_metric, previous_latency_ms, reserved: 0.0 }
    }

    pub fn features(&self) -> [f32; 3] {
        [self.resource_metric, self.previous_latency_ms, self.reserved]
    }
}

/// Result of one evaluation, with the score or the swallowed failure for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub use_level_b: bool,
    pub score: Option<f32>,
    pub fallback: Option<InferenceError>,
}

pub struct DecisionEngine {
    capability: Option<Box<dyn InferenceCapability>>,
}

impl DecisionEngine {
    pub fn new(capability: Box<dyn InferenceCapability>) -> Self {
        Self { capability: Some(capability) }
    }

    /// An engine with no model loaded; every decision falls back to Level-A.
    pub fn uninitialized() -> Self {
        Self { capability: None }
    }

    pub fn from_config(cfg: &ModelConfig) -> Result<Self, ServiceError> {
        let engine = match cfg.kind {
            ModelKind::None => Self::uninitialized(),
            ModelKind::Rule => Self::new(Box::new(RuleModel {
                min_free_kb: cfg.min_free_kb,
                max_latency_ms: cfg.max_latency_ms,
            })),
            ModelKind::Logistic => {
                let model = LogisticModel::new(cfg.mean, cfg.scale, cfg.weights, cfg.bias)
                    .map_err(|e| ServiceError::Config(e.to_string()))?;
                Self::new(Box::new(model))
            }
        };
        log::info!("Decision engine ready (model: {:?})", cfg.kind);
        Ok(engine)
    }

    /// `true` selects Level-B, `false` selects Level-A.
    pub fn decide(&self, resource_metric: f32, previous_latency_ms: f32, reserved: f32) -> bool {
        let sample = DecisionSample { resource_metric, previous_latency_ms, reserved };
        self.evaluate(&sample).use_level_b
    }

    pub fn evaluate(&self, sample: &DecisionSample) -> Decision {
        let scored = match self.capability.as_ref() {
            Some(cap) => cap.infer(sample.features()),
            None => Err(InferenceError::Uninitialized),
        };
        let scored = scored.and_then(|v| {
            if v.is_finite() && (0.0..=1.0).contains(&v) {
                Ok(v)
            } else {
                Err(InferenceError::Malformed(format!("score {v} outside [0, 1]")))
            }
        });
        match scored {
            Ok(v) => {
                let use_level_b = v > DECISION_THRESHOLD;
                log::debug!(
                    "Model score {:.2} -> {}",
                    v,
                    if use_level_b { "Level-B" } else { "Level-A" }
                );
                Decision { use_level_b, score: Some(v), fallback: None }
            }
            Err(e) => {
                log::warn!("Inference failed ({e}); defaulting to Level-A");
                Decision { use_level_b: false, score: None, fallback: Some(e) }
            }
        }
    }
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine").field("initialized", &self.capability.is_some()).finish()
    }
}
