// Score fusion and verdict thresholds. Pure: no I/O.
//
// All weights, thresholds and reputation boosts live in one versioned
// ScoringPolicy so the policy can be swapped without touching collectors.

use std::path::Path;

use serde::{Deserialize, Serialize};

use guardian_common::{
    CommunitySignal, ConfidenceBand, GuardianError, ReputationList, Signal, Strength, Verdict,
};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub platform: f64,
    pub community: f64,
    pub model: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub likely_ai: f64,
    pub unclear: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationPolicy {
    /// Added to the community score when the creator is on the block list.
    pub block_boost: f64,
    /// Added to the community score when the creator is on the warn list.
    pub warn_boost: f64,
    /// Block-list membership lifts the fused score to the likely-AI threshold.
    pub block_list_dominates: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringPolicy {
    pub version: String,
    pub weights: FusionWeights,
    pub standard: Thresholds,
    /// Used when conservative mode is on. Never lower than `standard`.
    pub conservative: Thresholds,
    pub reputation: ReputationPolicy,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::v1()
    }
}

impl ScoringPolicy {
    /// Production weighting: community 0.50, platform 0.30, model 0.20.
    pub fn v1() -> Self {
        Self {
            version: "v1".to_string(),
            weights: FusionWeights {
                platform: 0.30,
                community: 0.50,
                model: 0.20,
            },
            standard: Thresholds {
                likely_ai: 0.70,
                unclear: 0.50,
            },
            conservative: Thresholds {
                likely_ai: 0.75,
                unclear: 0.55,
            },
            reputation: ReputationPolicy {
                block_boost: 0.5,
                warn_boost: 0.2,
                block_list_dominates: true,
            },
        }
    }

    /// Load and validate a policy from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, GuardianError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GuardianError::Policy(format!("cannot read {}: {e}", path.display()))
        })?;
        let policy: Self = serde_json::from_str(&raw).map_err(|e| {
            GuardianError::Policy(format!("cannot parse {}: {e}", path.display()))
        })?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn thresholds(&self, conservative: bool) -> &Thresholds {
        if conservative {
            &self.conservative
        } else {
            &self.standard
        }
    }

    pub fn validate(&self) -> Result<(), GuardianError> {
        let w = &self.weights;
        if [w.platform, w.community, w.model]
            .iter()
            .any(|x| !x.is_finite() || *x < 0.0)
        {
            return Err(GuardianError::Policy(
                "weights must be finite and non-negative".into(),
            ));
        }
        let sum = w.platform + w.community + w.model;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(GuardianError::Policy(format!(
                "weights must sum to 1.0, got {sum}"
            )));
        }

        for (name, t) in [("standard", &self.standard), ("conservative", &self.conservative)] {
            let in_range = |x: f64| (0.0..=1.0).contains(&x);
            if !in_range(t.likely_ai) || !in_range(t.unclear) {
                return Err(GuardianError::Policy(format!(
                    "{name} thresholds must be within [0, 1]"
                )));
            }
            if t.unclear > t.likely_ai {
                return Err(GuardianError::Policy(format!(
                    "{name} unclear threshold exceeds its likely_ai threshold"
                )));
            }
        }

        if self.conservative.likely_ai < self.standard.likely_ai
            || self.conservative.unclear < self.standard.unclear
        {
            return Err(GuardianError::Policy(
                "conservative thresholds must not be lower than standard thresholds".into(),
            ));
        }

        let r = &self.reputation;
        if !r.block_boost.is_finite() || !r.warn_boost.is_finite() {
            return Err(GuardianError::Policy("reputation boosts must be finite".into()));
        }
        Ok(())
    }
}

/// Outcome of fusing three signals under a policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedVerdict {
    pub final_score: f64,
    pub verdict: Verdict,
    pub confidence_band: ConfidenceBand,
    /// The block-list rule raised the score.
    pub reputation_override: bool,
}

#[derive(Debug, Clone)]
pub struct FusionEngine {
    policy: ScoringPolicy,
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self {
            policy: ScoringPolicy::v1(),
        }
    }
}

impl FusionEngine {
    pub fn new(policy: ScoringPolicy) -> Result<Self, GuardianError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    /// Convex combination of the three collector scores, clamped to [0, 1].
    /// Non-finite inputs count as neutral.
    pub fn fuse(&self, platform_score: f64, community_score: f64, model_score: f64) -> f64 {
        let w = &self.policy.weights;
        let fused = w.platform * sanitize(platform_score)
            + w.community * sanitize(community_score)
            + w.model * sanitize(model_score);
        fused.clamp(0.0, 1.0)
    }

    pub fn decide_verdict(
        &self,
        final_score: f64,
        conservative: bool,
    ) -> (Verdict, ConfidenceBand) {
        let t = self.policy.thresholds(conservative);
        if final_score >= t.likely_ai {
            (Verdict::LikelyAi, Strength::High)
        } else if final_score >= t.unclear {
            (Verdict::Unclear, Strength::Medium)
        } else {
            (Verdict::LikelyHuman, Strength::Low)
        }
    }

    /// Fuse collector signals, apply the block-list rule, and decide.
    pub fn fuse_signals(
        &self,
        platform: &Signal,
        community: &CommunitySignal,
        model: &Signal,
        conservative: bool,
    ) -> FusedVerdict {
        let mut final_score = self.fuse(platform.score, community.signal.score, model.score);

        let threshold = self.policy.thresholds(conservative).likely_ai;
        let reputation_override = self.policy.reputation.block_list_dominates
            && community.reputation == Some(ReputationList::Block)
            && final_score < threshold;
        if reputation_override {
            final_score = threshold;
        }

        let (verdict, confidence_band) = self.decide_verdict(final_score, conservative);
        FusedVerdict {
            final_score,
            verdict,
            confidence_band,
            reputation_override,
        }
    }
}

fn sanitize(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        Signal::NEUTRAL_SCORE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn community(score: f64, reputation: Option<ReputationList>) -> CommunitySignal {
        CommunitySignal {
            signal: Signal::new(score, "test", Strength::Low),
            has_votes: false,
            ai_weight: 0.0,
            not_ai_weight: 0.0,
            unsure_weight: 0.0,
            reputation,
        }
    }

    #[test]
    fn v1_weights_sum_to_one_and_validate() {
        let policy = ScoringPolicy::v1();
        assert!(policy.validate().is_ok());
        let w = policy.weights;
        assert!((w.platform + w.community + w.model - 1.0).abs() < 1e-12);
        assert!(w.community > w.platform && w.platform > w.model);
    }

    #[test]
    fn neutral_inputs_fuse_to_half() {
        let engine = FusionEngine::default();
        assert!((engine.fuse(0.5, 0.5, 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn fuse_uses_weights() {
        let engine = FusionEngine::default();
        let score = engine.fuse(1.0, 0.625, 0.0);
        assert!((score - (0.30 + 0.50 * 0.625)).abs() < 1e-12);
    }

    #[test]
    fn fuse_is_clamped_and_tolerates_garbage() {
        let engine = FusionEngine::default();
        assert_eq!(engine.fuse(5.0, 5.0, 5.0), 1.0);
        assert_eq!(engine.fuse(-1.0, -1.0, -1.0), 0.0);
        assert!((engine.fuse(f64::NAN, 0.5, 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn verdict_bands() {
        let engine = FusionEngine::default();
        assert_eq!(engine.decide_verdict(0.70, false), (Verdict::LikelyAi, Strength::High));
        assert_eq!(engine.decide_verdict(0.69, false), (Verdict::Unclear, Strength::Medium));
        assert_eq!(engine.decide_verdict(0.50, false), (Verdict::Unclear, Strength::Medium));
        assert_eq!(engine.decide_verdict(0.49, false), (Verdict::LikelyHuman, Strength::Low));
        assert_eq!(engine.decide_verdict(0.72, true), (Verdict::Unclear, Strength::Medium));
        assert_eq!(engine.decide_verdict(0.52, true), (Verdict::LikelyHuman, Strength::Low));
    }

    #[test]
    fn conservative_mode_never_more_severe() {
        let engine = FusionEngine::default();
        for i in 0..=1000 {
            let score = i as f64 / 1000.0;
            let (lenient, _) = engine.decide_verdict(score, false);
            let (strict, _) = engine.decide_verdict(score, true);
            assert!(
                strict.severity() <= lenient.severity(),
                "score {score}: conservative {strict} is more severe than {lenient}"
            );
        }
    }

    #[test]
    fn block_list_dominates_votes() {
        let engine = FusionEngine::default();
        let fused = engine.fuse_signals(
            &Signal::neutral("p"),
            &community(0.5, Some(ReputationList::Block)),
            &Signal::neutral("m"),
            true,
        );
        assert!(fused.reputation_override);
        assert_eq!(fused.verdict, Verdict::LikelyAi);
        assert!((fused.final_score - 0.75).abs() < 1e-12);
    }

    #[test]
    fn warn_list_does_not_force_verdict() {
        let engine = FusionEngine::default();
        let fused = engine.fuse_signals(
            &Signal::neutral("p"),
            &community(0.7, Some(ReputationList::Warn)),
            &Signal::neutral("m"),
            true,
        );
        assert!(!fused.reputation_override);
        assert!((fused.final_score - 0.6).abs() < 1e-12);
        assert_eq!(fused.verdict, Verdict::Unclear);
    }

    #[test]
    fn block_rule_can_be_disabled() {
        let mut policy = ScoringPolicy::v1();
        policy.reputation.block_list_dominates = false;
        let engine = FusionEngine::new(policy).unwrap();
        let fused = engine.fuse_signals(
            &Signal::neutral("p"),
            &community(0.5, Some(ReputationList::Block)),
            &Signal::neutral("m"),
            false,
        );
        assert!(!fused.reputation_override);
        assert_eq!(fused.verdict, Verdict::Unclear);
    }

    #[test]
    fn invalid_policies_rejected() {
        let mut bad_sum = ScoringPolicy::v1();
        bad_sum.weights.model = 0.5;
        assert!(matches!(bad_sum.validate(), Err(GuardianError::Policy(_))));

        let mut inverted = ScoringPolicy::v1();
        inverted.conservative.likely_ai = 0.6;
        assert!(inverted.validate().is_err());

        let mut unclear_above_ai = ScoringPolicy::v1();
        unclear_above_ai.standard.unclear = 0.9;
        assert!(unclear_above_ai.validate().is_err());

        assert!(FusionEngine::new(bad_sum).is_err());
    }

    #[test]
    fn policy_loads_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        let mut policy = ScoringPolicy::v1();
        policy.version = "v2-model-heavier".into();
        policy.weights = FusionWeights {
            platform: 0.25,
            community: 0.45,
            model: 0.30,
        };
        std::fs::write(&path, serde_json::to_string_pretty(&policy).unwrap()).unwrap();

        let loaded = ScoringPolicy::from_json_file(&path).unwrap();
        assert_eq!(loaded, policy);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(ScoringPolicy::from_json_file(&path).is_err());
    }
}
