use crate::formats::SummaryRecord;

/// Keeps summaries whose normalized score reaches `threshold`, in input order.
pub fn select_for_publication(summaries: Vec<SummaryRecord>, threshold: f64) -> Vec<SummaryRecord> {
    let received = summaries.len();
    let selected: Vec<SummaryRecord> = summaries
        .into_iter()
        .filter(|summary| {
            let score = summary.normalized_score();
            let keep = score >= threshold;
            if !keep {
                tracing::debug!(
                    paper_id = %summary.id(),
                    score,
                    threshold,
                    "summary below publication threshold"
                );
            }
            keep
        })
        .collect();

    let dropped = received - selected.len();
    if dropped > 0 {
        tracing::info!(received, dropped, threshold, "filtered summaries by relevance");
    }
    selected
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};

    use super::*;
    use crate::formats::{CoreSummary, DimensionScore, PaperRecord, ScoreDetails, TopicRef};

    fn scored(id: &str, scores: &[(f64, f64)]) -> SummaryRecord {
        let published = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        SummaryRecord {
            paper: PaperRecord {
                id: id.to_owned(),
                title: id.to_owned(),
                abstract_text: String::new(),
                authors: Vec::new(),
                categories: Vec::new(),
                published,
                updated: published,
                url: String::new(),
                pdf_url: None,
                comment: None,
            },
            topic: TopicRef {
                name: "nlp".to_owned(),
                label: String::new(),
            },
            core_summary: CoreSummary::default(),
            task_list: Vec::new(),
            findings: Vec::new(),
            overview: String::new(),
            brief_summary: String::new(),
            score: ScoreDetails {
                scores: scores
                    .iter()
                    .enumerate()
                    .map(|(idx, (weight, value))| DimensionScore {
                        name: format!("d{idx}"),
                        weight: *weight,
                        value: *value,
                    })
                    .collect(),
                total_score: 0.0,
            },
            markdown: String::new(),
        }
    }

    #[test]
    fn weighted_mean_is_scaled_to_hundred() {
        let summary = scored("a", &[(2.0, 0.5), (1.0, 1.0)]);
        assert!((summary.normalized_score() - 66.666_666).abs() < 1e-3);
    }

    #[test]
    fn zero_weights_do_not_divide_by_zero() {
        assert_eq!(scored("a", &[(0.0, 0.9)]).normalized_score(), 0.0);
        assert_eq!(scored("b", &[]).normalized_score(), 0.0);
    }

    #[test]
    fn selection_keeps_order_and_inclusive_threshold() {
        let picked = select_for_publication(
            vec![
                scored("high", &[(1.0, 0.9)]),
                scored("low", &[(1.0, 0.2)]),
                scored("edge", &[(1.0, 0.5)]),
            ],
            50.0,
        );
        let ids: Vec<&str> = picked.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["high", "edge"]);
    }
}
