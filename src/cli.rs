use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Build(BuildArgs),
    Report(ReportArgs),
    Table(TableArgs),
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Summaries to publish (one JSON record per line).
    #[arg(long)]
    pub input: String,

    /// Pipeline config (YAML). Defaults apply when omitted.
    #[arg(long)]
    pub config: Option<String>,

    /// Site output directory (overrides `site.output_dir`).
    #[arg(long)]
    pub out: Option<String>,

    /// Public URL the site is served from (overrides `site.base_url`).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Default page language, `zh` or `en` (overrides `site.locale`).
    #[arg(long)]
    pub language: Option<String>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Site output directory.
    #[arg(long)]
    pub site: String,

    /// Paper identifier (e.g. `2401.00001`).
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct TableArgs {
    /// Site output directory.
    #[arg(long)]
    pub site: String,

    /// Markdown file holding the paper table.
    #[arg(long)]
    pub file: String,

    /// Batch to add (defaults to the newest batch).
    #[arg(long)]
    pub batch: Option<String>,
}
