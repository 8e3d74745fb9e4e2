use anyhow::Context as _;
use chrono::{DateTime, Utc};

use crate::cli::ReportArgs;
use crate::formats::SummaryRecord;
use crate::labels::{Label, Language};
use crate::layout::SiteLayout;
use crate::store::SiteStore;
use crate::venue::VenueExtractor;

/// Markdown report of one summary. Headings are always Chinese.
pub fn render_markdown(summary: &SummaryRecord, venue: &str, generated_at: DateTime<Utc>) -> String {
    let paper = &summary.paper;
    let zh = |label: Label| label.in_language(Language::Zh);

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("# {}", paper.title));
    lines.push(String::new());

    let paragraphs: Vec<&str> = summary
        .brief_summary
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if !paragraphs.is_empty() {
        for paragraph in paragraphs {
            lines.push(format!("> {}", paragraph.replace('\n', " ")));
        }
        lines.push(String::new());
    }

    lines.push(format!("**Topic**: {}", summary.topic.display_name()));
    lines.push(format!("**arXiv**: [{}]({})", paper.id, paper.url));
    lines.push(format!("**Authors**: {}", paper.authors.join(", ")));
    lines.push(format!("**Published**: {}", paper.published.format("%Y-%m-%d")));
    lines.push(format!("**Venue**: {venue}"));
    lines.push(format!("**Score**: {:.1}", summary.normalized_score()));
    lines.push(String::new());

    lines.push(format!("### {}", zh(Label::ScoreBreakdown)));
    for dim in &summary.score.scores {
        lines.push(format!(
            "- **{}**: {:.1}/100 (weight: {:.2})",
            dim.name,
            dim.value * 100.0,
            dim.weight
        ));
    }
    lines.push(String::new());

    let core = &summary.core_summary;
    lines.push(format!("## {}", zh(Label::CoreSummary)));
    lines.push(String::new());
    for (idx, (label, text)) in [
        (Label::Problem, &core.problem),
        (Label::Solution, &core.solution),
        (Label::Methodology, &core.methodology),
        (Label::Experiments, &core.experiments),
        (Label::Conclusion, &core.conclusion),
    ]
    .into_iter()
    .enumerate()
    {
        lines.push(format!("### {}. {}", idx + 1, zh(label)));
        lines.push(text.trim().to_owned());
        lines.push(String::new());
    }

    if !summary.task_list.is_empty() {
        lines.push(format!("## {}", zh(Label::Tasks)));
        for (idx, task) in summary.task_list.iter().enumerate() {
            lines.push(format!("{}. **{}** - {}", idx + 1, task.question, task.reason));
        }
        lines.push(String::new());
    }

    if !summary.findings.is_empty() {
        lines.push(format!("## {}", zh(Label::Findings)));
        for finding in &summary.findings {
            lines.push(format!("### {}", finding.question));
            lines.push(finding.answer.trim().to_owned());
            lines.push(format!("*Confidence: {:.2}*", finding.confidence));
            lines.push(String::new());
        }
    }

    lines.push(format!("## {}", zh(Label::Overview)));
    let overview = summary.overview.trim();
    lines.push(if overview.is_empty() {
        paper.abstract_text.trim().to_owned()
    } else {
        overview.to_owned()
    });
    lines.push(String::new());

    lines.push("## 为什么推荐这篇论文?".to_owned());
    lines.push(recommendation(summary));
    lines.push(String::new());

    lines.push("---".to_owned());
    lines.push(format!(
        "*Generated at {}*",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    lines.join("\n")
}

fn recommendation(summary: &SummaryRecord) -> String {
    let topic = summary.topic.display_name();
    let top = summary
        .score
        .scores
        .iter()
        .max_by(|a, b| (a.value * a.weight).total_cmp(&(b.value * b.weight)));

    let Some(top) = top else {
        return format!(
            "This paper is relevant to your research direction in {topic}, recommended for further reading."
        );
    };

    let mut text = format!(
        "This paper scores high in the **{}** dimension ({:.1}/100), highly aligned with your research interests in {topic}.",
        top.name,
        top.value * 100.0
    );
    if let Some(finding) = summary.findings.iter().find(|f| f.confidence > 0.6) {
        let insight: String = finding.answer.chars().take(200).collect();
        text.push_str(&format!(" {insight}..."));
    }
    text
}

pub fn run(args: ReportArgs) -> anyhow::Result<()> {
    let layout = SiteLayout::new(&args.site);
    let store = SiteStore::load(&layout);
    let stored = store
        .get(&args.id)
        .with_context(|| format!("paper not found in site store: {}", args.id))?;

    let venue = VenueExtractor::new().extract(stored.summary.paper.comment.as_deref());
    println!("{}", render_markdown(&stored.summary, &venue, Utc::now()));
    Ok(())
}
