use std::path::Path;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    let cli = paperdigest::cli::Cli::parse();

    match cli.command {
        paperdigest::cli::Command::Build(args) => {
            let config =
                paperdigest::config::PipelineConfig::load_optional(args.config.as_deref().map(Path::new))
                    .context("load config")?;
            paperdigest::logging::init(&config.runtime.console_level).context("init logging")?;
            tracing::debug!(?args, "parsed cli");
            paperdigest::site::run(args, config).context("build")?;
        }
        paperdigest::cli::Command::Report(args) => {
            paperdigest::logging::init(paperdigest::logging::DEFAULT_LEVEL)
                .context("init logging")?;
            paperdigest::report::run(args).context("report")?;
        }
        paperdigest::cli::Command::Table(args) => {
            paperdigest::logging::init(paperdigest::logging::DEFAULT_LEVEL)
                .context("init logging")?;
            paperdigest::table::run(args).context("table")?;
        }
    }

    Ok(())
}
