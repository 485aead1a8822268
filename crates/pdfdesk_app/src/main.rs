mod cli;
mod platform;
mod settings;

use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use pdfdesk_core::{CompressionLevel, OptionChange, SplitMode, Tool};
use pdfdesk_logging::desk_error;
use platform::app::{run_one_shot, run_shell, OneShot};
use settings::Settings;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            desk_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.apply_env(|key| std::env::var(key).ok());
    settings.apply_overrides(cli.api_url, cli.output_dir);
    platform::logging::initialize(settings.log_destination, settings.level_filter());

    let one_shot = match cli.command {
        Some(Commands::Compress(args)) => OneShot {
            tool: Tool::Compress,
            options: vec![OptionChange::CompressionLevel(CompressionLevel::new(
                args.level,
            )?)],
            files: vec![args.file],
        },
        Some(Commands::Merge(args)) => OneShot {
            tool: Tool::Merge,
            options: Vec::new(),
            files: args.files,
        },
        Some(Commands::Split(args)) => {
            let options = match args.pages {
                Some(pages) => vec![
                    OptionChange::SplitMode(SplitMode::Range),
                    OptionChange::PageRange(pages),
                ],
                None => vec![OptionChange::SplitMode(SplitMode::All)],
            };
            OneShot {
                tool: Tool::Split,
                options,
                files: vec![args.file],
            }
        }
        Some(Commands::Shell) => {
            run_shell(&settings)?;
            return Ok(true);
        }
        None => {
            Cli::command().print_long_help()?;
            return Ok(true);
        }
    };

    run_one_shot(&settings, one_shot)
}
