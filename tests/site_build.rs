use std::fs;

use chrono::{DateTime, TimeZone as _, Utc};
use paperdigest::formats::{BatchMeta, SummaryRecord};
use paperdigest::labels::Language;
use paperdigest::site::SiteBuilder;
use paperdigest::store::SiteStore;

fn summary(id: &str, topic: &str, title: &str) -> anyhow::Result<SummaryRecord> {
    let record = serde_json::json!({
        "paper": {
            "id": id,
            "title": title,
            "abstract": "We study things.\nThen more things.",
            "authors": ["Ada", "Brook", "Chen", "Dana"],
            "categories": ["cs.CL"],
            "published": "2024-09-02T00:00:00Z",
            "updated": "2024-09-03T00:00:00Z",
            "url": format!("https://arxiv.org/abs/{id}"),
            "pdf_url": format!("https://arxiv.org/pdf/{id}"),
            "comment": "Accepted at EMNLP 2024"
        },
        "topic": { "name": topic, "label": "Natural Language" },
        "core_summary": {
            "problem": "Problem text",
            "solution": "Solution text",
            "methodology": "",
            "experiments": "Experiments text",
            "conclusion": "Conclusion text"
        },
        "task_list": [{ "question": "Is it new?", "reason": "Novelty" }],
        "findings": [{ "question": "Is it new?", "answer": "Yes.", "confidence": 0.9 }],
        "overview": "Overview text",
        "brief_summary": "Brief text",
        "score": {
            "scores": [
                { "name": "alignment", "weight": 0.6, "value": 0.9 },
                { "name": "novelty", "weight": 0.4, "value": 0.5 }
            ],
            "total_score": 0.74
        },
        "markdown": "# should not persist"
    });
    Ok(serde_json::from_value(record)?)
}

fn run_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 10, 6, 0, 0).unwrap()
}

fn html_files(dir: &std::path::Path) -> anyhow::Result<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        if entry?.path().extension().is_some_and(|ext| ext == "html") {
            count += 1;
        }
    }
    Ok(count)
}

#[test]
fn rebuild_in_same_week_grows_batch() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let builder = SiteBuilder::new(temp.path(), "https://example.org/digest/", Language::Zh);

    let first = builder.build(
        vec![
            summary("2401.00001", "nlp", "First Paper")?,
            summary("2401.00002", "nlp", "Second Paper")?,
        ],
        run_at(),
    )?;
    assert_eq!(first.batch_id, "2024-W37");
    assert_eq!(first.accepted.len(), 2);
    assert_eq!(first.index, temp.path().join("index.html"));

    let store = SiteStore::load(builder.layout());
    assert_eq!(store.manifest.papers.len(), 2);
    assert_eq!(store.manifest.batches[0].paper_count, 2);
    assert_eq!(html_files(&temp.path().join("topics").join("nlp"))?, 2);

    let later = run_at() + chrono::Duration::hours(5);
    let second = builder.build(
        vec![
            summary("2401.00002", "nlp", "Second Paper")?,
            summary("2401.00003", "nlp", "Third Paper")?,
        ],
        later,
    )?;
    assert_eq!(second.accepted, vec!["2401.00003"]);
    assert_eq!(second.skipped, 1);

    let store = SiteStore::load(builder.layout());
    assert_eq!(store.manifest.papers.len(), 3);
    assert_eq!(store.manifest.batches.len(), 1);
    assert_eq!(store.manifest.batches[0].paper_count, 3);
    assert_eq!(store.manifest.batches[0].generated, later);
    assert_eq!(store.manifest.statistics.total_papers, 3);
    assert_eq!(store.manifest.statistics.total_batches, 1);
    assert_eq!(store.manifest.base_url, "https://example.org/digest");
    assert_eq!(html_files(&temp.path().join("topics").join("nlp"))?, 3);

    let meta: BatchMeta = serde_json::from_str(&fs::read_to_string(
        temp.path().join("archives").join("2024-W37").join("batch.json"),
    )?)?;
    assert_eq!(meta.papers, vec!["2401.00001", "2401.00002", "2401.00003"]);

    let index = fs::read_to_string(temp.path().join("index.html"))?;
    let positions: Vec<usize> = ["First Paper", "Second Paper", "Third Paper"]
        .iter()
        .map(|title| index.find(title).expect("title listed on index"))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(index.contains("href=\"topics/nlp/2401.00003.html\""));
    assert!(index.contains("Ada, Brook, Chen, …"));
    assert!(index.contains("74.0"));
    assert!(index.contains("href=\"archives/index.html\""));

    let batch_page = fs::read_to_string(temp.path().join("archives/2024-W37/index.html"))?;
    assert!(batch_page.contains("href=\"../../topics/nlp/2401.00001.html\""));
    assert!(batch_page.contains("Third Paper"));
    Ok(())
}

#[test]
fn rebuild_with_nothing_new_is_idempotent() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let builder = SiteBuilder::new(temp.path(), "", Language::En);
    let input = vec![summary("2401.00001", "nlp", "Only Paper")?];

    builder.build(input.clone(), run_at())?;
    let page_path = builder.layout().paper_page_path("nlp", "2401.00001");
    let page_before = fs::read_to_string(&page_path)?;

    let outcome = builder.build(input, run_at() + chrono::Duration::days(1))?;
    assert!(outcome.accepted.is_empty());
    assert_eq!(outcome.skipped, 1);
    assert_eq!(fs::read_to_string(&page_path)?, page_before);

    let store = SiteStore::load(builder.layout());
    assert_eq!(store.papers.papers.len(), 1);
    assert_eq!(store.manifest.batches[0].paper_count, 1);
    assert_eq!(
        store.manifest.statistics.total_papers,
        store.papers.papers.len()
    );
    Ok(())
}

#[test]
fn next_week_starts_new_batch_and_index_shows_only_it() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let builder = SiteBuilder::new(temp.path(), "", Language::Zh);
    builder.build(vec![summary("2401.00001", "nlp", "Old Paper")?], run_at())?;
    builder.build(
        vec![summary("2401.00009", "vision", "New Paper")?],
        run_at() + chrono::Duration::days(7),
    )?;

    let store = SiteStore::load(builder.layout());
    let ids: Vec<&str> = store.manifest.batches.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["2024-W38", "2024-W37"]);
    assert_eq!(store.manifest.statistics.total_batches, 2);

    let index = fs::read_to_string(temp.path().join("index.html"))?;
    assert!(index.contains("New Paper"));
    assert!(!index.contains("Old Paper"));

    let listing = fs::read_to_string(temp.path().join("archives/index.html"))?;
    let w38 = listing.find("2024-W38").expect("newest batch listed");
    let w37 = listing.find("2024-W37").expect("older batch listed");
    assert!(w38 < w37);
    Ok(())
}

#[test]
fn markup_in_titles_is_escaped_everywhere() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let builder = SiteBuilder::new(temp.path(), "", Language::Zh);
    builder.build(
        vec![summary("2401.00666", "nlp", "<script>alert('x')</script>")?],
        run_at(),
    )?;

    for page in [
        builder.layout().index_path(),
        builder.layout().paper_page_path("nlp", "2401.00666"),
        builder.layout().batch_index_path("2024-W37"),
    ] {
        let html = fs::read_to_string(&page)?;
        assert!(!html.contains("<script>alert"), "{}", page.display());
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }
    Ok(())
}

#[test]
fn stored_markdown_is_dropped_and_detail_page_is_complete() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let builder = SiteBuilder::new(temp.path(), "", Language::En);
    builder.build(vec![summary("2401.00001", "nlp", "Full Paper")?], run_at())?;

    let store = SiteStore::load(builder.layout());
    let stored = store.get("2401.00001").expect("stored");
    assert!(stored.summary.markdown.is_empty());
    assert_eq!(stored.summary.findings.len(), 1);

    let page = fs::read_to_string(builder.layout().paper_page_path("nlp", "2401.00001"))?;
    for expected in [
        "Problem text",
        "Solution text",
        "Experiments text",
        "Conclusion text",
        "Is it new?",
        "Overview text",
        "Brief text",
        "We study things.<br />\nThen more things.",
        "EMNLP 2024",
        "Ada, Brook, Chen, Dana",
        "2024-09-03",
        "https://arxiv.org/pdf/2401.00001",
        "Natural Language",
        "2024-W37",
    ] {
        assert!(page.contains(expected), "missing {expected}");
    }
    Ok(())
}

#[test]
fn lookalike_ids_keep_separate_pages() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let builder = SiteBuilder::new(temp.path(), "", Language::Zh);
    let outcome = builder.build(
        vec![
            summary("2401.00001", "nlp", "Paper One")?,
            summary("arXiv:2401.00001", "nlp", "Paper Two")?,
            summary("cs/0101001", "nlp", "Paper Three")?,
            summary("cs_0101001", "nlp", "Paper Four")?,
        ],
        run_at(),
    )?;
    assert_eq!(outcome.accepted.len(), 4);
    assert_eq!(html_files(&temp.path().join("topics").join("nlp"))?, 4);

    for (id, title) in [
        ("2401.00001", "Paper One"),
        ("arXiv:2401.00001", "Paper Two"),
        ("cs/0101001", "Paper Three"),
        ("cs_0101001", "Paper Four"),
    ] {
        let page = fs::read_to_string(builder.layout().paper_page_path("nlp", id))?;
        assert!(page.contains(title), "{id}");
    }
    Ok(())
}

#[test]
fn blank_ids_are_skipped_on_every_run() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let builder = SiteBuilder::new(temp.path(), "", Language::Zh);
    for _ in 0..2 {
        let outcome = builder.build(
            vec![summary("", "nlp", "No Id")?, summary("2401.00001", "nlp", "Has Id")?],
            run_at(),
        )?;
        assert!(!outcome.accepted.iter().any(|id| id.trim().is_empty()));
    }

    let store = SiteStore::load(builder.layout());
    assert_eq!(store.papers.papers.len(), 1);
    assert_eq!(store.manifest.batches[0].paper_count, 1);
    assert_eq!(store.manifest.statistics.total_papers, 1);
    assert_eq!(html_files(&temp.path().join("topics").join("nlp"))?, 1);
    Ok(())
}
