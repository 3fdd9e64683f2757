//! Inference capabilities the decision engine can be wired to.
//!
//! The engine only relies on the fixed contract: three `f32` features in, one score in
//! `[0, 1]` out, or a failure.

use crate::errors::InferenceError;

/// Opaque 3-input / 1-output inference capability.
pub trait InferenceCapability: Send + Sync {
    fn infer(&self, features: [f32; 3]) -> Result<f32, InferenceError>;
}

/// Standardize the inputs, apply one dense unit and squash with a sigmoid.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticModel {
    mean: [f32; 3],
    scale: [f32; 3],
    weights: [f32; 3],
    bias: f32,
}

impl LogisticModel {
    pub fn new(
        mean: [f32; 3],
        scale: [f32; 3],
        weights: [f32; 3],
        bias: f32,
    ) -> Result<Self, InferenceError> {
        if let Some(i) = scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(InferenceError::Malformed(format!("scale[{i}] must be finite and non-zero")));
        }
        let params_finite = mean.iter().chain(weights.iter()).all(|v| v.is_finite()) && bias.is_finite();
        if !params_finite {
            return Err(InferenceError::Malformed("non-finite mean/weight/bias".into()));
        }
        Ok(Self { mean, scale, weights, bias })
    }
}

impl InferenceCapability for LogisticModel {
    fn infer(&self, features: [f32; 3]) -> Result<f32, InferenceError> {
        let z = features
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .zip(self.weights.iter())
            .fold(self.bias, |acc, ((x, (m, s)), w)| acc + w * ((x - m) / s));
        let p = 1.0 / (1.0 + (-z).exp());
        if p.is_finite() {
            Ok(p)
        } else {
            Err(InferenceError::Malformed(format!("output not finite for {features:?}")))
        }
    }
}

/// Labelling rule used to build the training set: stronger profile only when memory is
/// plentiful and the previous signature was fast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleModel {
    pub min_free_kb: f32,
    pub max_latency_ms: f32,
}

impl Default for RuleModel {
    fn default() -> Self {
        Self { min_free_kb: 200.0, max_latency_ms: 200.0 }
    }
}

impl InferenceCapability for RuleModel {
    fn infer(&self, features: [f32; 3]) -> Result<f32, InferenceError> {
        let [free_kb, latency_ms, _] = features;
        if !free_kb.is_finite() || !latency_ms.is_finite() {
            return Err(InferenceError::Fault("non-finite feature".into()));
        }
        Ok(if free_kb > self.min_free_kb && latency_ms < self.max_latency_ms { 1.0 } else { 0.0 })
    }
}
