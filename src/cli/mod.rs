pub mod commands;
pub mod handlers;

pub use commands::{CheckArgs, CliArgs, Commands, ExtractArgs, OutputFormatArg, ScanArgs};
pub use handlers::{handle_check, handle_extract, handle_scan};
