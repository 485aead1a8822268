use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pdfdesk")]
#[command(about = "Compress, merge and split PDF files through a PDF processing service", long_about = None)]
pub struct Cli {
    /// Settings file (RON); defaults to ./pdfdesk.ron when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base address of the processing service
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory results are saved into
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compress one PDF and save the result
    Compress(CompressArgs),
    /// Merge PDFs in the given order and save the result
    Merge(MergeArgs),
    /// Split one PDF into a ZIP of documents and save it
    Split(SplitArgs),
    /// Interactive session with add/remove/submit/save commands
    Shell,
}

#[derive(Debug, Args)]
pub struct CompressArgs {
    pub file: PathBuf,
    /// 1 Light, 2 Medium, 3 High, 4 Maximum
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub level: u8,
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SplitArgs {
    pub file: PathBuf,
    /// Pages to extract, e.g. 1,3,5-9; all pages when omitted
    #[arg(long)]
    pub pages: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "pdfdesk",
            "split",
            "book.pdf",
            "--pages",
            "1-3",
            "--api-url",
            "http://svc:9000",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://svc:9000"));
        match cli.command {
            Some(Commands::Split(args)) => {
                assert_eq!(args.file, PathBuf::from("book.pdf"));
                assert_eq!(args.pages.as_deref(), Some("1-3"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn level_outside_range_is_rejected() {
        assert!(Cli::try_parse_from(["pdfdesk", "compress", "a.pdf", "--level", "5"]).is_err());
    }

    #[test]
    fn merge_needs_at_least_one_path() {
        assert!(Cli::try_parse_from(["pdfdesk", "merge"]).is_err());
        assert!(Cli::try_parse_from(["pdfdesk", "merge", "a.pdf"]).is_ok());
    }
}
