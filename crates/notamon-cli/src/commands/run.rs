//! Run command - the full batch over the configured input directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use notamon_core::models::config::NotamonConfig;
use notamon_core::pdf::{list_pdfs, PdfFileSource};
use notamon_core::pipeline::{document_name, BatchExtraction, DocumentExtraction};
use notamon_core::{classify_all, dedupe_by_id, ExtractionPipeline};

use super::store::{merge, HistoryStore};

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Extract and classify without writing the history
    #[arg(long)]
    dry_run: bool,

    /// Number of documents extracted concurrently (overrides the config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,
}

/// Counts reported at the end of a run.
#[derive(Debug, Default)]
struct RunSummary {
    documents: usize,
    failed_documents: usize,
    operations: usize,
    distinct: usize,
    merged: usize,
    alerts: usize,
}

pub async fn run(args: RunArgs, config_path: &Path) -> anyhow::Result<()> {
    let start = Instant::now();

    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Run 'notamon config init' first.",
            config_path.display()
        );
    }
    let mut config = NotamonConfig::from_file(config_path)?;
    if let Some(jobs) = args.jobs {
        config.processing.jobs = jobs;
    }
    config.validate()?;

    let files = list_pdfs(&config.paths.pdf_input_dir).with_context(|| {
        format!("cannot list {}", config.paths.pdf_input_dir.display())
    })?;

    println!(
        "{} Found {} notes in {}",
        style("ℹ").blue(),
        files.len(),
        config.paths.pdf_input_dir.display()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} notes")?
            .progress_chars("=>-"),
    );

    let batch = if config.processing.jobs > 1 {
        extract_parallel(files, config.processing.jobs, &pb).await?
    } else {
        extract_sequential(&files, &pb)
    };
    pb.finish_and_clear();

    let mut summary = RunSummary {
        documents: batch.documents,
        failed_documents: batch.failed_documents,
        operations: batch.records.len(),
        ..RunSummary::default()
    };

    let classified = classify_all(dedupe_by_id(batch.records));
    summary.distinct = classified.len();
    summary.alerts = classified.iter().filter(|c| c.flags.alert).count();

    if args.dry_run {
        info!("dry run, history left untouched");
    } else {
        let store = HistoryStore::new(
            &config.paths.history_path,
            config.processing.backup_before_save,
        )
        .with_excel(config.excel.clone());
        let history = store.load()?;
        let rows = classified.iter().map(|c| c.to_row()).collect();
        let (merged, added) = merge(history, rows);
        store.save(&merged)?;
        summary.merged = added;
    }

    print_summary(&summary, args.dry_run, &config.paths.history_path);
    debug!("run finished in {:?}", start.elapsed());

    Ok(())
}

fn extract_sequential(files: &[PathBuf], pb: &ProgressBar) -> BatchExtraction {
    let pipeline = ExtractionPipeline::new();
    files
        .iter()
        .map(|path| {
            let extraction = pipeline.extract_path(&PdfFileSource, path);
            pb.inc(1);
            extraction
        })
        .collect()
}

/// Per-document extraction on blocking tasks, merged in document order.
async fn extract_parallel(
    files: Vec<PathBuf>,
    jobs: usize,
    pb: &ProgressBar,
) -> anyhow::Result<BatchExtraction> {
    let permits = Arc::new(Semaphore::new(jobs));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let permit = permits.clone().acquire_owned().await?;
        let pb = pb.clone();
        let name = document_name(&path);
        let handle = tokio::task::spawn_blocking(move || -> Option<DocumentExtraction> {
            let extraction = ExtractionPipeline::new().extract_path(&PdfFileSource, &path);
            pb.inc(1);
            drop(permit);
            extraction
        });
        handles.push((name, handle));
    }

    Ok(join_in_order(handles).await)
}

/// Await the tasks in submission order. A task that panicked counts as an
/// unreadable document.
async fn join_in_order(
    handles: Vec<(String, JoinHandle<Option<DocumentExtraction>>)>,
) -> BatchExtraction {
    let mut batch = BatchExtraction::default();
    for (name, handle) in handles {
        match handle.await {
            Ok(extraction) => batch.push(extraction),
            Err(e) => {
                warn!("{}: skipped, extraction panicked: {}", name, e);
                batch.push(None);
            }
        }
    }
    batch
}

fn print_summary(summary: &RunSummary, dry_run: bool, history_path: &Path) {
    println!();
    println!(
        "{} Processed {} notes ({} unreadable)",
        style("✓").green(),
        summary.documents,
        summary.failed_documents
    );
    println!(
        "   {} operations extracted, {} distinct",
        summary.operations, summary.distinct
    );

    if dry_run {
        println!("   {}", style("dry run: history not written").yellow());
    } else {
        println!(
            "   {} new rows merged into {}",
            style(summary.merged).green(),
            history_path.display()
        );
    }

    if summary.alerts > 0 {
        println!("   {} alerts", style(summary.alerts).red());
    } else {
        println!("   0 alerts");
    }
}
