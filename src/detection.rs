use serde::{Deserialize, Serialize};

use crate::config::Config;

/// One (label, confidence) pair from the classifier. Confidence is in 0..=1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

/// A classification rounded up to whole percent.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub label: String,
    pub percent: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Results above the display floor, most confident first.
    pub ranked: Vec<RankedResult>,
    pub triggered: bool,
}

#[derive(Debug, Clone)]
pub struct DetectionPolicy {
    pub target_label: String,
    /// Target must score strictly above this to trigger.
    pub trigger_percent: f32,
    /// Results at or below this are dropped as noise.
    pub display_floor_percent: f32,
}

impl DetectionPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            target_label: config.target_label.clone(),
            trigger_percent: config.trigger_percent,
            display_floor_percent: config.display_floor_percent,
        }
    }

    pub fn evaluate(&self, classifications: &[Classification]) -> Evaluation {
        let mut sorted: Vec<&Classification> = classifications.iter().collect();
        sorted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let mut ranked = Vec::new();
        let mut triggered = false;
        for classification in sorted {
            let percent = (classification.confidence * 100.0).ceil();
            if percent > self.display_floor_percent {
                ranked.push(RankedResult {
                    label: classification.label.clone(),
                    percent,
                });
            }
            if classification.label == self.target_label && percent > self.trigger_percent {
                triggered = true;
            }
        }

        Evaluation { ranked, triggered }
    }
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            target_label: "pass".to_string(),
            trigger_percent: 90.0,
            display_floor_percent: 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(label: &str, confidence: f32) -> Classification {
        Classification {
            label: label.to_string(),
            confidence,
        }
    }

    #[test]
    fn ranks_by_confidence_and_drops_noise() {
        let policy = DetectionPolicy::default();
        let eval = policy.evaluate(&[c("all", 0.30), c("noise", 0.04), c("pass", 0.665)]);

        let labels: Vec<&str> = eval.ranked.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["pass", "all"]);
        assert_eq!(eval.ranked[0].percent, 67.0);
        assert!(!eval.triggered);
    }

    #[test]
    fn confidence_is_rounded_up() {
        let policy = DetectionPolicy::default();
        let eval = policy.evaluate(&[c("all", 0.051)]);
        assert_eq!(eval.ranked, vec![RankedResult { label: "all".into(), percent: 6.0 }]);
    }

    #[test]
    fn target_above_threshold_triggers() {
        let policy = DetectionPolicy::default();
        assert!(policy.evaluate(&[c("pass", 0.905)]).triggered);
        assert!(policy.evaluate(&[c("pass", 0.99)]).triggered);
    }

    #[test]
    fn threshold_is_strict() {
        let policy = DetectionPolicy::default();
        assert!(!policy.evaluate(&[c("pass", 0.88)]).triggered);
        assert!(!policy.evaluate(&[c("pass", 0.90)]).triggered);
    }

    #[test]
    fn other_labels_never_trigger() {
        let policy = DetectionPolicy::default();
        assert!(!policy.evaluate(&[c("all", 0.99)]).triggered);
    }

    #[test]
    fn empty_input() {
        let eval = DetectionPolicy::default().evaluate(&[]);
        assert!(eval.ranked.is_empty());
        assert!(!eval.triggered);
    }
}
