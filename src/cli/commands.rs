use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Template-driven extraction of service infrastructure from config files
#[derive(Parser, Debug)]
#[command(
    name = "stackmap",
    about = "Template-driven extraction of service infrastructure from config files",
    version,
    long_about = "stackmap compiles extraction templates and replays them against service \
                  configuration documents, producing records of the queues, databases and \
                  caches each service uses."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Compile a template and report problems",
        long_about = "Compiles an extraction template without running it. Exits non-zero \
                      if any leaf fails to compile.\n\n\
                      Examples:\n  \
                      stackmap check --template templates/service.yaml"
    )]
    Check(CheckArgs),

    #[command(
        about = "Extract records from documents",
        long_about = "Runs a template against each document and prints the extracted record. \
                      A document that fails is reported and the rest still run.\n\n\
                      Examples:\n  \
                      stackmap extract --template templates/service.yaml values.yaml\n  \
                      stackmap extract -t kafka.yaml --format json a.yaml b.yaml"
    )]
    Extract(ExtractArgs),

    #[command(
        about = "Run every configured source against a repository checkout",
        long_about = "Loads a sources file and, for each source, extracts the first of its \
                      candidate paths that succeeds under ROOT.\n\n\
                      Examples:\n  \
                      stackmap scan --sources sources.yaml ./checkout"
    )]
    Scan(ScanArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    #[arg(short = 't', long, value_name = "FILE", help = "Template file")]
    pub template: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(short = 't', long, value_name = "FILE", help = "Template file")]
    pub template: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "yaml",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(value_name = "DOCUMENT", required = true, help = "Documents to extract")]
    pub documents: Vec<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    #[arg(
        short = 's',
        long,
        value_name = "FILE",
        help = "Sources file (defaults to $STACKMAP_SOURCES)"
    )]
    pub sources: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "yaml",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        value_name = "ROOT",
        help = "Repository checkout (defaults to current directory)"
    )]
    pub root: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Yaml,
    Json,
}
