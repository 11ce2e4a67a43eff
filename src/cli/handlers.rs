use super::commands::{CheckArgs, ExtractArgs, OutputFormatArg, ScanArgs};
use crate::config::{SourcesConfig, StackmapConfig};
use crate::extract::{Engine, Record};
use crate::fs::FileSystem;
use crate::source::YamlSource;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Serialize)]
pub struct DocumentReport {
    pub path: String,
    pub record: Record,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub weight: i64,
    pub path: String,
    pub record: Record,
}

pub fn handle_check(args: &CheckArgs, fs: &dyn FileSystem, out: &mut dyn Write) -> i32 {
    match load_engine(fs, &args.template) {
        Ok(engine) => {
            let leaves = engine.tree().leaves();
            let max_weight = leaves.iter().map(|s| s.weight()).max().unwrap_or(0);
            let written = writeln!(
                out,
                "{}: {} leaves compiled (max weight {})",
                args.template.display(),
                leaves.len(),
                max_weight
            );
            if written.is_err() {
                return 1;
            }
            0
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

pub fn handle_extract(
    args: &ExtractArgs,
    max_document_size: usize,
    fs: &dyn FileSystem,
    out: &mut dyn Write,
) -> i32 {
    let engine = match load_engine(fs, &args.template) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return 2;
        }
    };

    let mut reports = Vec::new();
    let mut failed = 0;
    for path in &args.documents {
        match extract_document(&engine, fs, path, max_document_size) {
            Ok(record) => {
                info!(path = %path.display(), "extracted document");
                reports.push(DocumentReport {
                    path: path.display().to_string(),
                    warnings: record.warnings().to_vec(),
                    record,
                });
            }
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{:#}", e), "document failed");
                eprintln!("Error: {}: {:#}", path.display(), e);
                failed += 1;
            }
        }
    }

    if let Err(e) = render(&reports, args.format).and_then(|text| write_out(out, &text)) {
        eprintln!("Error: {:#}", e);
        return 1;
    }

    if failed > 0 {
        1
    } else {
        0
    }
}

pub fn handle_scan(
    args: &ScanArgs,
    settings: &StackmapConfig,
    fs: &dyn FileSystem,
    out: &mut dyn Write,
) -> i32 {
    let loaded = match &args.sources {
        Some(path) => SourcesConfig::load(fs, path).map(Some),
        None => settings.load_sources(fs),
    };
    let config = match loaded {
        Ok(Some(config)) => config,
        Ok(None) => {
            eprintln!("Error: no sources file, pass --sources or set STACKMAP_SOURCES");
            return 2;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return 2;
        }
    };
    let root = args.root.clone().unwrap_or_else(|| PathBuf::from("."));

    let mut reports = Vec::new();
    let mut failed = 0;
    for source_config in &config.sources {
        let source = match YamlSource::from_config(source_config, fs) {
            Ok(source) => source.with_max_document_size(settings.max_document_size),
            Err(e) => {
                error!(source = %source_config.name, error = %e, "source failed to load");
                eprintln!("Error: {}", e);
                failed += 1;
                continue;
            }
        };

        match source.extract_configured(source_config, fs, &root) {
            Some(extraction) => reports.push(SourceReport {
                source: source.name().to_string(),
                weight: source.weight(),
                path: extraction.path.display().to_string(),
                record: extraction.record,
            }),
            None => info!(source = %source.name(), "no candidate document extracted"),
        }
    }

    if let Err(e) = render(&reports, args.format).and_then(|text| write_out(out, &text)) {
        eprintln!("Error: {:#}", e);
        return 1;
    }

    if failed > 0 {
        1
    } else {
        0
    }
}

fn load_engine(fs: &dyn FileSystem, path: &Path) -> Result<Engine> {
    let template = fs.read(path)?;
    Engine::new(&template).with_context(|| format!("Template {} is invalid", path.display()))
}

fn extract_document(
    engine: &Engine,
    fs: &dyn FileSystem,
    path: &Path,
    max_document_size: usize,
) -> Result<Record> {
    let size = fs.metadata(path)?.len();
    if size > max_document_size as u64 {
        bail!(
            "document is {} bytes, larger than the {} byte limit",
            size,
            max_document_size
        );
    }

    let bytes = fs.read(path)?;
    Ok(engine.extract(&bytes)?)
}

pub fn render<T: Serialize>(value: &T, format: OutputFormatArg) -> Result<String> {
    match format {
        OutputFormatArg::Yaml => serde_yaml::to_string(value).context("Failed to render YAML"),
        OutputFormatArg::Json => {
            let mut text =
                serde_json::to_string_pretty(value).context("Failed to render JSON")?;
            text.push('\n');
            Ok(text)
        }
    }
}

fn write_out(out: &mut dyn Write, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .context("Failed to write output")
}
