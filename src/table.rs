use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Context as _;
use chrono::{DateTime, Utc};

use crate::cli::TableArgs;
use crate::formats::StoredPaper;
use crate::layout::SiteLayout;
use crate::site::recorded_members;
use crate::store::SiteStore;
use crate::venue::VenueExtractor;

const TABLE_HEADER: &str = "| Title | Published Date | Venue/Conference |\n| --- | --- | --- |";

/// One line of the markdown paper table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub title: String,
    pub url: String,
    pub published: String,
    pub venue: String,
}

impl TableRow {
    pub fn from_stored(stored: &StoredPaper, venues: &VenueExtractor) -> Self {
        let paper = &stored.summary.paper;
        Self {
            title: collapse_whitespace(&paper.title),
            url: paper.url.trim().to_owned(),
            published: paper.published.format("%Y-%m-%d").to_string(),
            venue: collapse_whitespace(&venues.extract(paper.comment.as_deref())),
        }
    }

    pub fn to_markdown(&self) -> String {
        let escaped = escape_cell(&self.title);
        let title = if self.url.is_empty() {
            escaped
        } else {
            format!("[{escaped}]({})", self.url)
        };
        format!("| {title} | {} | {} |", self.published, escape_cell(&self.venue))
    }
}

/// Backslash-escapes the characters that end a cell or a link label.
fn escape_cell(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '|' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn unescape_cell(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// First cell of a table row; `\|` does not end it.
fn first_cell(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('|')?;
    let mut escaped = false;
    for (idx, c) in rest.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '|' => return Some(rest[..idx].trim()),
            _ => {}
        }
    }
    None
}

/// Label of a `[label](url)` cell, ending at the last unescaped `](`.
fn link_label(cell: &str) -> Option<&str> {
    let inner = cell.strip_prefix('[')?;
    if !cell.ends_with(')') {
        return None;
    }
    let mut end = None;
    let mut escaped = false;
    for (idx, c) in inner.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ']' if inner[idx + 1..].starts_with('(') => end = Some(idx),
            _ => {}
        }
    }
    end.map(|end| &inner[..end])
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Titles already present in a table, linked or plain.
pub fn existing_titles(content: &str) -> HashSet<String> {
    let mut titles = HashSet::new();
    for line in content.lines() {
        if !line.starts_with("| ") || line.starts_with("| Title") || line.starts_with("| ---") {
            continue;
        }
        let Some(cell) = first_cell(line) else {
            continue;
        };
        titles.insert(unescape_cell(link_label(cell).unwrap_or(cell)));
    }
    titles
}

/// Adds rows with unseen titles right below the header, newest first.
/// Returns the new content and how many rows were added.
pub fn merge_rows(existing: &str, rows: &[TableRow], now: DateTime<Utc>) -> (String, usize) {
    let mut seen = existing_titles(existing);
    let new_rows: Vec<String> = rows
        .iter()
        .filter(|row| seen.insert(row.title.clone()))
        .map(TableRow::to_markdown)
        .collect();

    if new_rows.is_empty() {
        return (existing.to_owned(), 0);
    }
    let added = new_rows.len();

    if existing.contains("| Title |") {
        let mut lines: Vec<String> = Vec::new();
        let mut inserted = false;
        for line in existing.split('\n') {
            lines.push(line.to_owned());
            if !inserted && line.starts_with("| ---") {
                lines.extend(new_rows.iter().cloned());
                inserted = true;
            }
        }
        if !inserted {
            lines.extend(new_rows);
        }
        return (lines.join("\n"), added);
    }

    let mut lines = vec![
        "# Paper Updates".to_owned(),
        String::new(),
        format!("*Last updated: {}*", now.format("%Y-%m-%d %H:%M UTC")),
        String::new(),
        TABLE_HEADER.to_owned(),
    ];
    lines.extend(new_rows);
    if !existing.trim().is_empty() {
        lines.push(String::new());
        lines.push("---".to_owned());
        lines.push(String::new());
        lines.push(existing.to_owned());
    }
    (lines.join("\n"), added)
}

pub fn run(args: TableArgs) -> anyhow::Result<()> {
    let layout = SiteLayout::new(&args.site);
    let site = SiteStore::load(&layout);

    let batch_id = match args.batch {
        Some(batch_id) => batch_id,
        None => site
            .manifest
            .batches
            .first()
            .map(|b| b.id.clone())
            .context("site has no batches yet")?,
    };

    let ids = recorded_members(&layout, &site, &batch_id);

    let venues = VenueExtractor::new();
    let rows: Vec<TableRow> = ids
        .iter()
        .filter_map(|id| site.get(id))
        .map(|stored| TableRow::from_stored(stored, &venues))
        .collect();

    let path = PathBuf::from(&args.file);
    let existing = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => {
            return Err(err).with_context(|| format!("read table: {}", path.display()));
        }
    };

    let (content, added) = merge_rows(&existing, &rows, Utc::now());
    if added == 0 {
        tracing::info!(batch_id = %batch_id, "no new papers to add to the table");
    } else {
        std::fs::write(&path, content)
            .with_context(|| format!("write table: {}", path.display()))?;
        tracing::info!(batch_id = %batch_id, added, path = %path.display(), "updated paper table");
    }
    println!("{added}");
    Ok(())
}
