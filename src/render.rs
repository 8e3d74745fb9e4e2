use chrono::{DateTime, Utc};

use crate::formats::{BatchRecord, StoredPaper};
use crate::labels::{Label, Language};
use crate::layout::paper_href;
use crate::store::Statistics;

const MAX_LISTED_AUTHORS: usize = 3;

/// Site-wide values shared by every page of one build.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub language: Language,
    pub base_url: String,
    pub generated_at: DateTime<Utc>,
}

/// Papers of one topic, in listing order.
#[derive(Debug, Clone)]
pub struct TopicListing<'a> {
    pub topic: String,
    pub display_name: String,
    pub papers: Vec<&'a StoredPaper>,
}

/// Groups papers by topic name; groups and members keep first-appearance order.
pub fn group_by_topic<'a>(papers: &[&'a StoredPaper]) -> Vec<TopicListing<'a>> {
    let mut groups: Vec<TopicListing<'a>> = Vec::new();
    for &paper in papers {
        let topic = &paper.summary.topic;
        match groups.iter_mut().find(|g| g.topic == topic.name) {
            Some(group) => group.papers.push(paper),
            None => groups.push(TopicListing {
                topic: topic.name.clone(),
                display_name: topic.display_name().to_owned(),
                papers: vec![paper],
            }),
        }
    }
    groups
}

pub fn render_paper_page(ctx: &PageContext, stored: &StoredPaper, venue: &str) -> String {
    let summary = &stored.summary;
    let paper = &summary.paper;
    let root = "../../";

    let mut main = String::new();

    if !summary.brief_summary.trim().is_empty() {
        main.push_str("<section class=\"brief\">\n");
        main.push_str(&format!("<h2>{}</h2>\n", bi(Label::BriefSummary)));
        main.push_str(&format!("<p>{}</p>\n", text_to_html(&summary.brief_summary)));
        main.push_str("</section>\n");
    }

    let core = &summary.core_summary;
    main.push_str("<section class=\"core\">\n");
    main.push_str(&format!("<h2>{}</h2>\n", bi(Label::CoreSummary)));
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
        main.push_str(&format!("<h3>{}. {}</h3>\n", idx + 1, bi(label)));
        main.push_str(&format!("<p>{}</p>\n", text_or_empty(text)));
    }
    main.push_str("</section>\n");

    if !summary.task_list.is_empty() {
        main.push_str("<section class=\"tasks\">\n");
        main.push_str(&format!("<h2>{}</h2>\n<ol>\n", bi(Label::Tasks)));
        for task in &summary.task_list {
            main.push_str(&format!(
                "<li><strong>{}</strong>",
                text_to_html(&task.question)
            ));
            if !task.reason.trim().is_empty() {
                main.push_str(&format!(" &mdash; {}", text_to_html(&task.reason)));
            }
            main.push_str("</li>\n");
        }
        main.push_str("</ol>\n</section>\n");
    }

    if !summary.findings.is_empty() {
        main.push_str("<section class=\"findings\">\n");
        main.push_str(&format!("<h2>{}</h2>\n", bi(Label::Findings)));
        for finding in &summary.findings {
            main.push_str("<div class=\"finding\">\n");
            main.push_str(&format!("<h3>{}</h3>\n", text_to_html(&finding.question)));
            main.push_str(&format!("<p>{}</p>\n", text_or_empty(&finding.answer)));
            main.push_str(&format!(
                "<p class=\"confidence\">{}: {:.2}</p>\n",
                bi(Label::Confidence),
                finding.confidence
            ));
            main.push_str("</div>\n");
        }
        main.push_str("</section>\n");
    }

    main.push_str("<section class=\"overview\">\n");
    main.push_str(&format!("<h2>{}</h2>\n", bi(Label::Overview)));
    main.push_str(&format!("<p>{}</p>\n", text_or_empty(&summary.overview)));
    main.push_str("</section>\n");

    main.push_str("<section class=\"abstract\">\n");
    main.push_str(&format!("<h2>{}</h2>\n", bi(Label::Abstract)));
    main.push_str(&format!("<p>{}</p>\n", text_or_empty(&paper.abstract_text)));
    main.push_str("</section>\n");

    let mut aside = String::new();
    aside.push_str("<dl>\n");
    push_meta(
        &mut aside,
        Label::Topic,
        &html_escape(summary.topic.display_name()),
    );
    push_meta(&mut aside, Label::Batch, &html_escape(&stored.batch_id));
    push_meta(
        &mut aside,
        Label::Score,
        &format!("{:.1}", summary.normalized_score()),
    );
    push_meta(&mut aside, Label::Authors, &joined_or_empty(&paper.authors));
    push_meta(
        &mut aside,
        Label::Categories,
        &joined_or_empty(&paper.categories),
    );
    push_meta(
        &mut aside,
        Label::Published,
        &paper.published.format("%Y-%m-%d").to_string(),
    );
    push_meta(
        &mut aside,
        Label::Updated,
        &paper.updated.format("%Y-%m-%d").to_string(),
    );
    push_meta(&mut aside, Label::Venue, &html_escape(venue));

    let mut links = format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">arXiv</a>",
        html_escape(&paper.url)
    );
    if let Some(pdf_url) = paper.pdf_url.as_deref().filter(|u| !u.trim().is_empty()) {
        links.push_str(&format!(
            " | <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">PDF</a>",
            html_escape(pdf_url)
        ));
    }
    push_meta(&mut aside, Label::Links, &links);
    aside.push_str("</dl>\n");

    if !summary.score.scores.is_empty() {
        aside.push_str(&format!(
            "<h3>{}</h3>\n<ul class=\"scores\">\n",
            bi(Label::ScoreBreakdown)
        ));
        for dim in &summary.score.scores {
            aside.push_str(&format!(
                "<li>{}: {:.1}/100 ({} {:.2})</li>\n",
                html_escape(&dim.name),
                dim.value * 100.0,
                bi(Label::Weight),
                dim.weight
            ));
        }
        aside.push_str("</ul>\n");
    }

    let mut body = String::new();
    body.push_str(&format!(
        "<h1 class=\"paper-title\">{}</h1>\n",
        html_escape(&paper.title)
    ));
    body.push_str("<div class=\"paper-layout\">\n<main>\n");
    body.push_str(&main);
    body.push_str("</main>\n<aside class=\"sidebar\">\n");
    body.push_str(&aside);
    body.push_str("</aside>\n</div>\n");
    body.push_str(&format!(
        "<p class=\"back-link\"><a href=\"{root}index.html\">{}</a></p>\n",
        bi(Label::BackToIndex)
    ));

    let canonical = paper_href(&summary.topic.name, &paper.id);
    wrap_page(ctx, &paper.title, root, Some(&canonical), &body)
}

pub fn render_index_page(
    ctx: &PageContext,
    batch_id: &str,
    groups: &[TopicListing<'_>],
    statistics: &Statistics,
) -> String {
    let root = "";
    let mut body = String::new();
    body.push_str(&format!(
        "<h1>{}</h1>\n<p class=\"batch-id\">{} {}</p>\n",
        bi(Label::CurrentBatch),
        bi(Label::Batch),
        html_escape(batch_id)
    ));
    body.push_str("<ul class=\"stats\">\n");
    body.push_str(&format!(
        "<li>{}: {}</li>\n",
        bi(Label::TotalPapers),
        statistics.total_papers
    ));
    body.push_str(&format!(
        "<li>{}: {}</li>\n",
        bi(Label::TotalBatches),
        statistics.total_batches
    ));
    body.push_str(&format!(
        "<li>{}: {}</li>\n",
        bi(Label::LastUpdated),
        ctx.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    body.push_str("</ul>\n");
    body.push_str(&render_listing(groups, root));
    body.push_str(&format!(
        "<p class=\"archive-link\"><a href=\"archives/index.html\">{}</a></p>\n",
        bi(Label::BrowseArchive)
    ));

    let title = Label::SiteTitle.in_language(ctx.language);
    wrap_page(ctx, title, root, Some("index.html"), &body)
}

pub fn render_batch_page(
    ctx: &PageContext,
    batch: &BatchRecord,
    groups: &[TopicListing<'_>],
) -> String {
    let root = "../../";
    let mut body = String::new();
    body.push_str(&format!(
        "<h1>{} {}</h1>\n",
        bi(Label::Batch),
        html_escape(&batch.id)
    ));
    body.push_str(&format!(
        "<p class=\"batch-meta\">{}: {} &middot; {}: {}</p>\n",
        bi(Label::PaperCount),
        batch.paper_count,
        bi(Label::Generated),
        batch.generated.format("%Y-%m-%d %H:%M UTC")
    ));
    body.push_str(&render_listing(groups, root));
    body.push_str(&format!(
        "<p class=\"archive-link\"><a href=\"../index.html\">{}</a></p>\n",
        bi(Label::BackToArchive)
    ));

    let title = format!("{} {}", Label::Batch.in_language(ctx.language), batch.id);
    let canonical = format!("archives/{}/index.html", batch.id);
    wrap_page(ctx, &title, root, Some(&canonical), &body)
}

pub fn render_archive_listing(ctx: &PageContext, batches: &[BatchRecord]) -> String {
    let root = "../";
    let mut body = String::new();
    body.push_str(&format!("<h1>{}</h1>\n", bi(Label::ArchiveListing)));

    if batches.is_empty() {
        body.push_str(&format!("<p class=\"empty\">{}</p>\n", bi(Label::NoBatches)));
    } else {
        body.push_str("<table class=\"batches\">\n<thead><tr>");
        for label in [
            Label::Batch,
            Label::PaperCount,
            Label::Generated,
            Label::Topics,
        ] {
            body.push_str(&format!("<th>{}</th>", bi(label)));
        }
        body.push_str("</tr></thead>\n<tbody>\n");
        for batch in batches {
            let topics = batch
                .topics
                .iter()
                .map(|t| html_escape(t))
                .collect::<Vec<_>>()
                .join(", ");
            body.push_str(&format!(
                "<tr><td><a href=\"{id}/index.html\">{id}</a></td><td>{count}</td><td>{date}</td><td>{topics}</td></tr>\n",
                id = html_escape(&batch.id),
                count = batch.paper_count,
                date = batch.generated.format("%Y-%m-%d"),
            ));
        }
        body.push_str("</tbody>\n</table>\n");
    }

    let title = Label::Archive.in_language(ctx.language);
    wrap_page(ctx, title, root, Some("archives/index.html"), &body)
}

fn render_listing(groups: &[TopicListing<'_>], root: &str) -> String {
    if groups.is_empty() {
        return format!("<p class=\"empty\">{}</p>\n", bi(Label::NoPapers));
    }

    let mut out = String::new();
    for group in groups {
        out.push_str(&format!(
            "<section class=\"topic\" id=\"topic-{}\">\n<h2>{}</h2>\n<ul class=\"papers\">\n",
            html_escape(&group.topic),
            html_escape(&group.display_name)
        ));
        for stored in &group.papers {
            let summary = &stored.summary;
            let paper = &summary.paper;
            out.push_str(&format!(
                "<li class=\"paper\"><a href=\"{root}{href}\">{title}</a>\
                 <div class=\"meta\"><span class=\"score\">{score_label}: {score:.1}</span>\
                 <span class=\"authors\">{authors}</span>\
                 <span class=\"published\">{published_label}: {published}</span></div></li>\n",
                href = html_escape(&paper_href(&summary.topic.name, &paper.id)),
                title = html_escape(&paper.title),
                score_label = bi(Label::Score),
                score = summary.normalized_score(),
                authors = html_escape(&format_authors(&paper.authors)),
                published_label = bi(Label::Published),
                published = paper.published.format("%Y-%m-%d"),
            ));
        }
        out.push_str("</ul>\n</section>\n");
    }
    out
}

fn wrap_page(
    ctx: &PageContext,
    title: &str,
    root: &str,
    canonical_path: Option<&str>,
    body: &str,
) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n");
    out.push_str(&format!(
        "<html lang=\"{}\" data-lang=\"{}\">\n",
        ctx.language.html_lang(),
        ctx.language.code()
    ));
    out.push_str("<head>\n");
    out.push_str("<meta charset=\"utf-8\" />\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n");
    out.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    if let Some(path) = canonical_path.filter(|_| !ctx.base_url.is_empty()) {
        out.push_str(&format!(
            "<link rel=\"canonical\" href=\"{}/{}\" />\n",
            html_escape(&ctx.base_url),
            html_escape(path)
        ));
    }
    out.push_str("<style>\n");
    out.push_str(STYLE_CSS);
    out.push_str("</style>\n");
    out.push_str("</head>\n");
    out.push_str("<body>\n");

    out.push_str("<header class=\"site-header\">\n");
    out.push_str(&format!(
        "<a class=\"site-title\" href=\"{root}index.html\">{}</a>\n",
        bi(Label::SiteTitle)
    ));
    out.push_str(&format!(
        "<nav><a href=\"{root}index.html\">{}</a> <a href=\"{root}archives/index.html\">{}</a> \
         <button type=\"button\" id=\"lang-toggle\">{}</button></nav>\n",
        bi(Label::CurrentBatch),
        bi(Label::Archive),
        bi(Label::LanguageToggle)
    ));
    out.push_str("</header>\n");

    out.push_str(body);
    if !body.ends_with('\n') {
        out.push('\n');
    }

    let site_url = if ctx.base_url.is_empty() {
        bi(Label::NotConfigured)
    } else {
        html_escape(&ctx.base_url)
    };
    out.push_str(&format!(
        "<footer>\n<p>{}: {}</p>\n<p>{}: {}</p>\n</footer>\n",
        bi(Label::Generated),
        ctx.generated_at.format("%Y-%m-%d %H:%M UTC"),
        bi(Label::SiteUrl),
        site_url
    ));
    out.push_str(TOGGLE_SCRIPT);
    out.push_str("</body>\n");
    out.push_str("</html>\n");
    out
}

fn push_meta(out: &mut String, label: Label, value_html: &str) {
    out.push_str(&format!("<dt>{}</dt><dd>{}</dd>\n", bi(label), value_html));
}

/// Both language variants of a label; the stylesheet hides the inactive one.
fn bi(label: Label) -> String {
    let text = label.text();
    format!(
        "<span class=\"lang-zh\">{}</span><span class=\"lang-en\">{}</span>",
        html_escape(text.zh),
        html_escape(text.en)
    )
}

pub fn format_authors(authors: &[String]) -> String {
    let mut out = authors
        .iter()
        .take(MAX_LISTED_AUTHORS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if authors.len() > MAX_LISTED_AUTHORS {
        out.push_str(", …");
    }
    out
}

fn joined_or_empty(items: &[String]) -> String {
    if items.is_empty() {
        return bi(Label::Empty);
    }
    html_escape(&items.join(", "))
}

fn text_or_empty(text: &str) -> String {
    if text.trim().is_empty() {
        return bi(Label::Empty);
    }
    text_to_html(text)
}

/// Escapes free text and turns line breaks into `<br />`.
pub fn text_to_html(text: &str) -> String {
    html_escape(text.trim())
        .replace("\r\n", "\n")
        .replace('\n', "<br />\n")
}

pub fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const STYLE_CSS: &str = r##"body { font-family: -apple-system, BlinkMacSystemFont, "PingFang SC", sans-serif; margin: 0 auto; max-width: 1080px; padding: 1.5rem 2rem; background: #f8f9fa; color: #212529; line-height: 1.6; }
html[data-lang="zh"] .lang-en, html[data-lang="en"] .lang-zh { display: none; }
a { color: #0b5ed7; text-decoration: none; }
a:hover { text-decoration: underline; }
.site-header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 1.5rem; flex-wrap: wrap; gap: 0.75rem; }
.site-title { font-size: 1.25rem; font-weight: 600; color: #212529; }
.site-header nav { display: flex; gap: 1rem; align-items: center; }
#lang-toggle { border: 1px solid #ced4da; background: #fff; border-radius: 6px; padding: 0.2rem 0.6rem; cursor: pointer; }
.stats { display: flex; gap: 1.5rem; list-style: none; padding: 0; color: #495057; flex-wrap: wrap; }
.topic, .paper-layout main section, .sidebar { background: #fff; padding: 1.25rem 1.5rem; border-radius: 12px; box-shadow: 0 8px 16px rgba(0,0,0,0.05); margin-bottom: 1.25rem; }
.papers { list-style: none; padding: 0; margin: 0; }
.paper { padding: 0.6rem 0; border-bottom: 1px solid #e9ecef; }
.paper:last-child { border-bottom: none; }
.meta { font-size: 0.9rem; color: #495057; display: flex; flex-wrap: wrap; gap: 0.75rem; }
.paper-layout { display: grid; grid-template-columns: minmax(0, 3fr) minmax(220px, 1fr); gap: 1.25rem; align-items: start; }
.sidebar dt { font-weight: 600; margin-top: 0.5rem; }
.sidebar dd { margin: 0; color: #495057; }
.confidence { font-size: 0.85rem; color: #6c757d; }
.batches { width: 100%; border-collapse: collapse; background: #fff; }
.batches th, .batches td { text-align: left; padding: 0.5rem 0.75rem; border-bottom: 1px solid #e9ecef; }
footer { margin-top: 2rem; font-size: 0.85rem; color: #6c757d; }
@media (max-width: 760px) { .paper-layout { grid-template-columns: 1fr; } }
"##;

const TOGGLE_SCRIPT: &str = r##"<script>
(function () {
  var root = document.documentElement;
  try {
    var saved = window.localStorage.getItem("paperdigest-lang");
    if (saved === "zh" || saved === "en") { root.setAttribute("data-lang", saved); }
  } catch (e) {}
  var button = document.getElementById("lang-toggle");
  if (!button) { return; }
  button.addEventListener("click", function () {
    var next = root.getAttribute("data-lang") === "en" ? "zh" : "en";
    root.setAttribute("data-lang", next);
    try { window.localStorage.setItem("paperdigest-lang", next); } catch (e) {}
  });
})();
</script>
"##;
