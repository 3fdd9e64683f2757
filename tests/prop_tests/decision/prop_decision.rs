use proptest::prelude::*;
use sleeqc::config::ModelConfig;
use sleeqc::decision::{DecisionEngine, DecisionSample, InferenceCapability, RuleModel};
use sleeqc::errors::InferenceError;

struct Score(f32);

impl InferenceCapability for Score {
    fn infer(&self, _: [f32; 3]) -> Result<f32, InferenceError> {
        Ok(self.0)
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 128,
        .. proptest::test_runner::Config::default()
    })]
    #[test]
    fn prop_level_b_iff_score_above_half(score in 0.0f32..=1.0, mem in any::<f32>(), lat in any::<f32>()) {
        let engine = DecisionEngine::new(Box::new(Score(score)));
        prop_assert_eq!(engine.decide(mem, lat, 0.0), score > 0.5);
    }

    #[test]
    fn prop_decision_is_deterministic(mem in -1.0e6f32..1.0e6, lat in -1.0e6f32..1.0e6) {
        let engine = DecisionEngine::from_config(&ModelConfig::default()).unwrap();
        let a = engine.evaluate(&DecisionSample::new(mem, lat));
        let b = engine.evaluate(&DecisionSample::new(mem, lat));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_logistic_score_stays_in_unit_interval(mem in -1.0e6f32..1.0e6, lat in -1.0e6f32..1.0e6) {
        let engine = DecisionEngine::from_config(&ModelConfig::default()).unwrap();
        if let Some(s) = engine.evaluate(&DecisionSample::new(mem, lat)).score {
            prop_assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn prop_rule_model_matches_labelling_rule(mem in 0.0f32..1000.0, lat in 0.0f32..1000.0) {
        let engine = DecisionEngine::new(Box::new(RuleModel::default()));
        prop_assert_eq!(engine.decide(mem, lat, 0.0), mem > 200.0 && lat < 200.0);
    }
}
