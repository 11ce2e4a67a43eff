use stackmap::cli::{handle_check, handle_extract, handle_scan, CliArgs, Commands};
use stackmap::config::StackmapConfig;
use stackmap::fs::RealFileSystem;
use stackmap::util::logging::{init_logging, level_or_info, LoggingConfig};
use stackmap::VERSION;

use clap::Parser;
use std::io::{self, Write};
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    let config = StackmapConfig::default();
    init_logging_from_args(&args, &config);

    debug!("stackmap v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    let fs = RealFileSystem::new();
    let mut out = io::stdout().lock();

    let mut exit_code = match &args.command {
        Commands::Check(check_args) => handle_check(check_args, &fs, &mut out),
        Commands::Extract(extract_args) => {
            handle_extract(extract_args, config.max_document_size, &fs, &mut out)
        }
        Commands::Scan(scan_args) => handle_scan(scan_args, &config, &fs, &mut out),
    };

    if out.flush().is_err() {
        exit_code = 1;
    }
    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs, config: &StackmapConfig) {
    let level = if let Some(level_str) = &args.log_level {
        level_or_info(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        level_or_info(&config.log_level)
    };

    init_logging(LoggingConfig {
        level,
        ..LoggingConfig::from_env()
    });
}
