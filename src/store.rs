use std::collections::{BTreeMap, BTreeSet};
use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;
use chrono::{DateTime, Datelike as _, Utc};
use serde::{Deserialize, Serialize};

use crate::formats::{BatchRecord, IndexEntry, StoredPaper, SummaryRecord};
use crate::layout::SiteLayout;

pub const MANIFEST_VERSION: &str = "1.0";
pub const STORE_VERSION: &str = "1.0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_papers: usize,
    pub total_batches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub statistics: Statistics,
    /// Newest first.
    #[serde(default)]
    pub batches: Vec<BatchRecord>,
    #[serde(default)]
    pub papers: BTreeMap<String, IndexEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION.to_owned(),
            base_url: String::new(),
            last_updated: None,
            statistics: Statistics::default(),
            batches: Vec::new(),
            papers: BTreeMap::new(),
        }
    }
}

impl Manifest {
    pub fn batch(&self, batch_id: &str) -> Option<&BatchRecord> {
        self.batches.iter().find(|b| b.id == batch_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperStore {
    pub version: String,
    pub papers: BTreeMap<String, StoredPaper>,
}

impl Default for PaperStore {
    fn default() -> Self {
        Self {
            version: STORE_VERSION.to_owned(),
            papers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPaperStore {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    papers: serde_json::Map<String, serde_json::Value>,
}

/// Converts one persisted paper entry back into the typed record.
pub fn stored_paper_from_json(value: serde_json::Value) -> anyhow::Result<StoredPaper> {
    let stored: StoredPaper =
        serde_json::from_value(value).context("deserialize stored paper")?;
    if stored.summary.paper.id.trim().is_empty() {
        anyhow::bail!("stored paper has an empty id");
    }
    Ok(stored)
}

/// `"<ISO year>-W<ISO week>"` for the given instant.
pub fn batch_id_for(run_at: DateTime<Utc>) -> String {
    let week = run_at.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicGroup {
    pub topic: String,
    pub paper_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub batch_id: String,
    /// Accepted ids in the order they were supplied.
    pub accepted: Vec<String>,
    pub skipped: usize,
    /// Accepted ids grouped by topic, groups in first-appearance order.
    pub by_topic: Vec<TopicGroup>,
}

/// Manifest and paper store of one output directory, held in memory for a build.
#[derive(Debug, Clone, Default)]
pub struct SiteStore {
    pub manifest: Manifest,
    pub papers: PaperStore,
}

impl SiteStore {
    /// Loads both documents. Missing or unreadable documents start empty.
    pub fn load(layout: &SiteLayout) -> Self {
        let manifest = match read_json_lenient::<Manifest>(&layout.manifest_path()) {
            Some(manifest) => manifest,
            None => Manifest::default(),
        };
        let papers = load_paper_store(&layout.store_path());

        tracing::debug!(
            papers = papers.papers.len(),
            batches = manifest.batches.len(),
            "loaded site store"
        );
        Self { manifest, papers }
    }

    pub fn contains(&self, paper_id: &str) -> bool {
        self.papers.papers.contains_key(paper_id)
    }

    pub fn get(&self, paper_id: &str) -> Option<&StoredPaper> {
        self.papers.papers.get(paper_id)
    }

    /// Inserts records not seen before and updates batch bookkeeping and statistics.
    pub fn merge(
        &mut self,
        summaries: impl IntoIterator<Item = SummaryRecord>,
        run_at: DateTime<Utc>,
    ) -> MergeOutcome {
        let batch_id = batch_id_for(run_at);
        let mut outcome = MergeOutcome {
            batch_id: batch_id.clone(),
            ..MergeOutcome::default()
        };

        for summary in summaries {
            let paper_id = summary.id().to_owned();
            if paper_id.trim().is_empty() {
                tracing::warn!(title = %summary.paper.title, "summary has a blank paper id; skipping");
                outcome.skipped += 1;
                continue;
            }
            if self.contains(&paper_id) {
                tracing::debug!(paper_id = %paper_id, "paper already published; skipping");
                outcome.skipped += 1;
                continue;
            }

            let topic = summary.topic.name.clone();
            let entry = IndexEntry {
                topic: topic.clone(),
                batch_id: batch_id.clone(),
                title: summary.paper.title.clone(),
                published: summary.paper.published.format("%Y-%m-%d").to_string(),
                score: summary.normalized_score(),
            };
            self.manifest.papers.insert(paper_id.clone(), entry);
            self.papers.papers.insert(
                paper_id.clone(),
                StoredPaper {
                    summary,
                    batch_id: batch_id.clone(),
                    indexed_at: run_at,
                },
            );

            match outcome.by_topic.iter_mut().find(|g| g.topic == topic) {
                Some(group) => group.paper_ids.push(paper_id.clone()),
                None => outcome.by_topic.push(TopicGroup {
                    topic,
                    paper_ids: vec![paper_id.clone()],
                }),
            }
            outcome.accepted.push(paper_id);
        }

        if !outcome.accepted.is_empty() {
            let topics = outcome.by_topic.iter().map(|g| g.topic.clone());
            self.record_batch(&batch_id, outcome.accepted.len(), topics, run_at);
        }
        self.refresh(run_at);

        outcome
    }

    fn record_batch(
        &mut self,
        batch_id: &str,
        added: usize,
        topics: impl Iterator<Item = String>,
        run_at: DateTime<Utc>,
    ) {
        // Linear scan; batch history grows by one entry per week.
        if let Some(batch) = self.manifest.batches.iter_mut().find(|b| b.id == batch_id) {
            batch.paper_count += added;
            batch.topics.extend(topics);
            batch.generated = run_at;
            return;
        }

        self.manifest.batches.insert(
            0,
            BatchRecord {
                id: batch_id.to_owned(),
                generated: run_at,
                paper_count: added,
                topics: topics.collect::<BTreeSet<_>>(),
            },
        );
    }

    fn refresh(&mut self, run_at: DateTime<Utc>) {
        self.manifest.version = MANIFEST_VERSION.to_owned();
        self.papers.version = STORE_VERSION.to_owned();
        self.manifest.statistics = Statistics {
            total_papers: self.papers.papers.len(),
            total_batches: self.manifest.batches.len(),
        };
        self.manifest.last_updated = Some(run_at);
    }

    pub fn set_base_url(&mut self, base_url: &str) {
        self.manifest.base_url = normalize_base_url(base_url);
    }

    /// Stored papers of a batch, oldest ingestion first.
    pub fn papers_in_batch(&self, batch_id: &str) -> Vec<&StoredPaper> {
        let mut papers: Vec<&StoredPaper> = self
            .papers
            .papers
            .values()
            .filter(|p| p.batch_id == batch_id)
            .collect();
        papers.sort_by(|a, b| {
            a.indexed_at
                .cmp(&b.indexed_at)
                .then_with(|| a.summary.paper.id.cmp(&b.summary.paper.id))
        });
        papers
    }

    pub fn save(&self, layout: &SiteLayout) -> anyhow::Result<()> {
        write_json_atomic(&layout.manifest_path(), &self.manifest).context("write manifest")?;
        write_json_atomic(&layout.store_path(), &self.papers).context("write paper store")?;
        Ok(())
    }
}

pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if let Err(err) = url::Url::parse(trimmed) {
        tracing::warn!(base_url = %trimmed, %err, "base url is not an absolute url; keeping as-is");
    }
    trimmed.to_owned()
}

fn load_paper_store(path: &Path) -> PaperStore {
    let Some(raw) = read_json_lenient::<RawPaperStore>(path) else {
        return PaperStore::default();
    };

    let mut store = PaperStore {
        version: raw.version.unwrap_or_else(|| STORE_VERSION.to_owned()),
        papers: BTreeMap::new(),
    };
    for (key, value) in raw.papers {
        match stored_paper_from_json(value) {
            Ok(stored) if stored.summary.paper.id == key => {
                store.papers.insert(key, stored);
            }
            Ok(stored) => {
                tracing::warn!(
                    key = %key,
                    paper_id = %stored.summary.paper.id,
                    "stored paper id does not match its key; skipping entry"
                );
            }
            Err(err) => {
                tracing::warn!(key = %key, err = format!("{err:#}"), "unreadable stored paper; skipping entry");
            }
        }
    }
    store
}

/// Reads a JSON document, treating absence and corruption alike as "nothing stored".
pub(crate) fn read_json_lenient<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no existing document; starting empty");
            return None;
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to read document; starting empty");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to parse document; starting empty");
            None
        }
    }
}

/// Pretty-printed whole-file overwrite through a temp file in the same directory.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", path.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create parent dir: {}", parent.display()))?;

    let mut data = serde_json::to_vec_pretty(value).context("serialize json")?;
    data.push(b'\n');

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in: {}", parent.display()))?;
    tmp.write_all(&data)
        .with_context(|| format!("write temp file for: {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("rename temp file to: {}", path.display()))?;
    Ok(())
}
