use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Paper metadata as delivered by the fetch stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
}

impl TopicRef {
    pub fn display_name(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreSummary {
    pub problem: String,
    pub solution: String,
    pub methodology: String,
    pub experiments: String,
    pub conclusion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskItem {
    pub question: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFinding {
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub name: String,
    pub weight: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetails {
    #[serde(default)]
    pub scores: Vec<DimensionScore>,
    #[serde(default)]
    pub total_score: f64,
}

impl ScoreDetails {
    /// Weighted score rescaled to 0-100. A zero weight sum counts as 1.0.
    pub fn normalized(&self) -> f64 {
        let total_weight: f64 = self.scores.iter().map(|s| s.weight).sum();
        let total_weight = if total_weight == 0.0 { 1.0 } else { total_weight };
        let weighted: f64 = self.scores.iter().map(|s| s.weight * s.value).sum();
        100.0 * weighted / total_weight
    }
}

/// A fully summarized paper, the unit every stage after summarization works on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub paper: PaperRecord,
    pub topic: TopicRef,
    #[serde(default)]
    pub core_summary: CoreSummary,
    #[serde(default)]
    pub task_list: Vec<TaskItem>,
    #[serde(default)]
    pub findings: Vec<TaskFinding>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub brief_summary: String,
    #[serde(default)]
    pub score: ScoreDetails,
    /// Derived report text; re-rendered on demand and never persisted.
    #[serde(default, skip_serializing)]
    pub markdown: String,
}

impl SummaryRecord {
    pub fn id(&self) -> &str {
        &self.paper.id
    }

    pub fn normalized_score(&self) -> f64 {
        self.score.normalized()
    }
}

/// Paper store entry: the summary plus ingestion metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPaper {
    #[serde(flatten)]
    pub summary: SummaryRecord,
    pub batch_id: String,
    pub indexed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub id: String,
    pub generated: DateTime<Utc>,
    pub paper_count: usize,
    #[serde(default)]
    pub topics: std::collections::BTreeSet<String>,
}

/// `archives/<batch-id>/batch.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMeta {
    pub id: String,
    pub generated: DateTime<Utc>,
    pub papers: Vec<String>,
}

/// Denormalized manifest projection of a stored paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub topic: String,
    pub batch_id: String,
    pub title: String,
    pub published: String,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(pairs: &[(f64, f64)]) -> ScoreDetails {
        ScoreDetails {
            scores: pairs
                .iter()
                .enumerate()
                .map(|(idx, (weight, value))| DimensionScore {
                    name: format!("d{idx}"),
                    weight: *weight,
                    value: *value,
                })
                .collect(),
            total_score: 0.0,
        }
    }

    #[test]
    fn normalized_score_is_weighted_mean_scaled_to_100() {
        let score = dims(&[(0.6, 0.5), (0.4, 1.0)]);
        let expected = 100.0 * (0.6 * 0.5 + 0.4 * 1.0) / (0.6 + 0.4);
        assert!((score.normalized() - expected).abs() < 1e-9);
    }

    #[test]
    fn normalized_score_with_zero_weights_does_not_divide_by_zero() {
        let score = dims(&[(0.0, 0.7), (0.0, 0.3)]);
        assert_eq!(score.normalized(), 0.0);
        assert_eq!(dims(&[]).normalized(), 0.0);
    }

    #[test]
    fn topic_display_name_falls_back_to_name() {
        let topic = TopicRef {
            name: "nlp".to_owned(),
            label: " ".to_owned(),
        };
        assert_eq!(topic.display_name(), "nlp");
    }
}
