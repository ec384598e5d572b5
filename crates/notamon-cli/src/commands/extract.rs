//! Extract command - one-off extraction and classification of matching notes.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use glob::glob;

use notamon_core::models::note::ClassifiedRecord;
use notamon_core::pdf::PdfFileSource;
use notamon_core::{classify_all, dedupe_by_id, ExtractionPipeline, COLUMNS};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON array of classified records
    Json,
    /// CSV with the history columns
    Csv,
}

pub async fn run(args: ExtractArgs) -> anyhow::Result<()> {
    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching PDF files found for pattern: {}", args.input);
    }

    let batch = ExtractionPipeline::new().extract_from_documents(&PdfFileSource, &files);
    let classified = classify_all(dedupe_by_id(batch.records));

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&classified)?,
        OutputFormat::Csv => format_csv(&classified)?,
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Wrote {} operations to {}",
            style("✓").green(),
            classified.len(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(())
}

fn format_csv(records: &[ClassifiedRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(COLUMNS)?;
    for record in records {
        wtr.write_record(record.to_row())?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}
