use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{BufRead as _, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};

use crate::cli::BuildArgs;
use crate::config::PipelineConfig;
use crate::formats::{BatchMeta, StoredPaper, SummaryRecord};
use crate::labels::Language;
use crate::layout::SiteLayout;
use crate::render::{self, PageContext};
use crate::store::{self, SiteStore};
use crate::venue::VenueExtractor;

#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub index: PathBuf,
    pub batch_id: String,
    pub accepted: Vec<String>,
    pub skipped: usize,
}

/// Incremental builder for one output directory.
#[derive(Debug, Clone)]
pub struct SiteBuilder {
    layout: SiteLayout,
    base_url: String,
    language: Language,
    venues: VenueExtractor,
}

impl SiteBuilder {
    pub fn new(output_dir: impl Into<PathBuf>, base_url: &str, language: Language) -> Self {
        Self {
            layout: SiteLayout::new(output_dir),
            base_url: store::normalize_base_url(base_url),
            language,
            venues: VenueExtractor::new(),
        }
    }

    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    /// Merges `summaries` into the site and rewrites every page that changed.
    pub fn build(
        &self,
        summaries: Vec<SummaryRecord>,
        run_at: DateTime<Utc>,
    ) -> anyhow::Result<BuildOutcome> {
        let layout = &self.layout;
        let mut store = SiteStore::load(layout);

        for dir in [layout.data_dir(), layout.archives_dir(), layout.topics_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("create dir: {}", dir.display()))?;
        }

        // An unset base url keeps whatever the site was last built with.
        let base_url = if self.base_url.is_empty() {
            store.manifest.base_url.clone()
        } else {
            self.base_url.clone()
        };
        store.set_base_url(&base_url);

        let received = summaries.len();
        let merged = store.merge(summaries, run_at);
        tracing::info!(
            batch_id = %merged.batch_id,
            received,
            accepted = merged.accepted.len(),
            skipped = merged.skipped,
            "merged summaries"
        );
        for group in &merged.by_topic {
            tracing::debug!(
                topic = %group.topic,
                papers = group.paper_ids.len(),
                "accepted papers for topic"
            );
        }

        let ctx = PageContext {
            language: self.language,
            base_url: store.manifest.base_url.clone(),
            generated_at: run_at,
        };

        for paper_id in &merged.accepted {
            let Some(stored) = store.get(paper_id) else {
                continue;
            };
            let venue = self.venues.extract(stored.summary.paper.comment.as_deref());
            let html = render::render_paper_page(&ctx, stored, &venue);
            let path = layout.paper_page_path(&stored.summary.topic.name, paper_id);
            write_page(&path, &html)?;
            tracing::debug!(paper_id = %paper_id, path = %path.display(), "wrote paper page");
        }

        let members = self.batch_members(&store, &merged.batch_id, &merged.accepted);

        if !merged.accepted.is_empty() {
            let meta = BatchMeta {
                id: merged.batch_id.clone(),
                generated: run_at,
                papers: members.clone(),
            };
            store::write_json_atomic(&layout.batch_json_path(&merged.batch_id), &meta)
                .with_context(|| format!("write batch metadata: {}", merged.batch_id))?;

            if let Some(batch) = store.manifest.batch(&merged.batch_id) {
                let papers = resolve(&store, &members);
                let groups = render::group_by_topic(&papers);
                let html = render::render_batch_page(&ctx, batch, &groups);
                write_page(&layout.batch_index_path(&merged.batch_id), &html)?;
            }
        }

        let papers = resolve(&store, &members);
        let groups = render::group_by_topic(&papers);
        let index_html = render::render_index_page(
            &ctx,
            &merged.batch_id,
            &groups,
            &store.manifest.statistics,
        );
        write_page(&layout.index_path(), &index_html)?;

        let listing_html = render::render_archive_listing(&ctx, &store.manifest.batches);
        write_page(&layout.archive_listing_path(), &listing_html)?;

        store.save(layout).context("save site store")?;

        tracing::info!(
            total_papers = store.manifest.statistics.total_papers,
            total_batches = store.manifest.statistics.total_batches,
            index = %layout.index_path().display(),
            "site updated"
        );

        Ok(BuildOutcome {
            index: layout.index_path(),
            batch_id: merged.batch_id,
            accepted: merged.accepted,
            skipped: merged.skipped,
        })
    }

    /// Members of a batch: those already recorded, then the newly accepted ones.
    fn batch_members(&self, store: &SiteStore, batch_id: &str, accepted: &[String]) -> Vec<String> {
        let mut members = recorded_members(&self.layout, store, batch_id);
        members.retain(|id| !accepted.contains(id));
        members.extend(accepted.iter().cloned());
        members
    }
}

/// Batch members in `batch.json` order; ingestion order when that file is missing.
pub fn recorded_members(layout: &SiteLayout, store: &SiteStore, batch_id: &str) -> Vec<String> {
    let path = layout.batch_json_path(batch_id);
    let mut members: Vec<String> = match store::read_json_lenient::<BatchMeta>(&path) {
        Some(meta) => meta.papers,
        None => store
            .papers_in_batch(batch_id)
            .into_iter()
            .map(|p| p.summary.paper.id.clone())
            .collect(),
    };
    let mut seen = HashSet::new();
    members.retain(|id| store.contains(id) && seen.insert(id.clone()));
    members
}

fn resolve<'a>(store: &'a SiteStore, ids: &[String]) -> Vec<&'a StoredPaper> {
    ids.iter().filter_map(|id| store.get(id)).collect()
}

fn write_page(path: &Path, html: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir: {}", parent.display()))?;
    }
    std::fs::write(path, html).with_context(|| format!("write page: {}", path.display()))
}

/// One SummaryRecord per non-blank line.
pub fn read_summaries(path: &Path) -> anyhow::Result<Vec<SummaryRecord>> {
    let file = OpenOptions::new()
        .read(true)
        .open(path)
        .with_context(|| format!("open summaries: {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut summaries = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("read summaries jsonl line")?;
        if line.trim().is_empty() {
            continue;
        }
        let summary: SummaryRecord = serde_json::from_str(&line)
            .with_context(|| format!("parse summary record at line {}", idx + 1))?;
        summaries.push(summary);
    }
    Ok(summaries)
}

pub fn run(args: BuildArgs, config: PipelineConfig) -> anyhow::Result<()> {
    let output_dir = args
        .out
        .clone()
        .unwrap_or_else(|| config.site.output_dir.clone());
    let base_url = args
        .base_url
        .clone()
        .unwrap_or_else(|| config.site.base_url.clone());
    let language = Language::from_setting(args.language.as_deref().unwrap_or(&config.site.locale));

    let input = PathBuf::from(&args.input);
    let summaries = read_summaries(&input)?;
    let summaries = crate::score::select_for_publication(summaries, config.relevance.pass_threshold);

    let builder = SiteBuilder::new(output_dir, &base_url, language);
    let outcome = builder.build(summaries, Utc::now()).context("build site")?;

    println!("{}", outcome.index.display());
    Ok(())
}
