//! Highlights claim and evidence passages for a file of contradiction items.
//!
//! Usage:
//!   highlight_items items.json --output data/highlighted.jsonl
//!   highlight_items items.json --config wikifix.ini --report reports/ --limit 100

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, LevelFilter};

use wikifix::{
    WikifixConfig,
    Result,
    pipeline::{batch::run_batch_until, HighlightRecord, ItemRecord, ItemResult, Pipeline, WorkItem},
    storage::{CachedSource, DocumentSource, FsPageStore},
    utils::{RunReport, FAILED_LOG},
};

#[derive(Parser)]
#[command(name = "highlight_items")]
#[command(about = "Highlight claim and evidence passages in cached pages")]
struct Args {
    /// JSON array of items with claim and evidence fields
    input: PathBuf,

    /// INI configuration file (defaults to wikifix.ini if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSONL output file
    #[arg(long)]
    output: Option<PathBuf>,

    /// CSV report file, or a directory for a timestamped report
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log of items with no highlighted side
    #[arg(long)]
    failed_log: Option<PathBuf>,

    /// Only process the first N items
    #[arg(long)]
    limit: Option<usize>,

    /// Worker threads (0 = one per CPU)
    #[arg(long)]
    threads: Option<usize>,

    /// Root of the saved site mirror
    #[arg(long)]
    saved_site: Option<PathBuf>,

    /// Write items where neither side was highlighted
    #[arg(long)]
    keep_failed: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let mut config = WikifixConfig::load(args.config.as_deref())?;
    config.files.input_file = Some(args.input.clone());
    if let Some(output) = args.output {
        config.files.output_file = output;
    }
    if args.report.is_some() {
        config.files.report_file = args.report;
    }
    if args.failed_log.is_some() {
        config.files.failed_log = args.failed_log;
    }
    if let Some(saved_site) = args.saved_site {
        config.files.saved_site_dir = saved_site;
    }
    if let Some(threads) = args.threads {
        config.processor.threads = threads;
    }
    if args.keep_failed {
        config.processor.skip_failed_items = false;
    }

    init_logging(config.processor.get_log_level());
    config.validate()?;
    info!("Starting highlight run at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

    let records: Vec<ItemRecord> = serde_json::from_reader(BufReader::new(File::open(&args.input)?))?;
    let mut items: Vec<WorkItem> = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| WorkItem::from_record(index, record))
        .collect();
    if let Some(limit) = args.limit {
        items.truncate(limit);
    }
    info!("Loaded {} items from {:?}", items.len(), args.input);

    if let Some(path) = &config.files.failed_log {
        FAILED_LOG.init(path)?;
    }
    let mut report = match &config.files.report_file {
        Some(path) => Some(RunReport::create(path)?),
        None => None,
    };
    let mut output = BufWriter::new(File::create(&config.files.output_file)?);

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        warn!("Interrupt received, finishing running items");
        handler_flag.store(true, Ordering::SeqCst);
    })?;

    let progress = if config.processor.show_progress {
        let pb = ProgressBar::new(items.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} Items: [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | ETA: {eta} | {msg}")
        {
            pb.set_style(style);
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let source = CachedSource::new(
        FsPageStore::new(&config.files.saved_site_dir),
        config.processor.cache_capacity,
    );
    let pipeline = Pipeline::new(source, &config);
    let skip_failed = config.processor.skip_failed_items;
    let mut written = 0usize;

    let stats = run_batch_until(&pipeline, items, &config.processor, &stop, |result| {
        progress.inc(1);
        let ItemResult { item, outcome, .. } = result;

        if let Some(report) = report.as_mut() {
            report.record(&item, &outcome)?;
        }

        if !outcome.is_success() {
            FAILED_LOG.log_item(&item, &outcome)?;
            if skip_failed {
                return Ok(());
            }
        }

        let line = HighlightRecord {
            record: item.record.unwrap_or_default(),
            claim_success: outcome.claim.is_highlighted(),
            evidence_success: outcome.evidence.is_highlighted(),
            claim_tier: outcome.claim.tier(),
            evidence_tier: outcome.evidence.tier(),
            claim_highlighted_html: outcome.claim.into_markup(),
            evidence_highlighted_html: outcome.evidence.into_markup(),
        };
        serde_json::to_writer(&mut output, &line)?;
        output.write_all(b"\n")?;
        written += 1;
        progress.set_message(format!("{} written", written));
        Ok(())
    })?;

    progress.finish_with_message(format!("{} written", written));
    output.flush()?;
    if let Some(report) = report {
        let path = report.finish()?;
        info!("Report written to {:?}", path);
    }

    if let Some(metrics) = pipeline.source().metrics() {
        info!(
            "Page reads: {} ({} bytes), cache hits: {}, missing pages: {}",
            metrics.reads, metrics.bytes_read, metrics.cache_hits, metrics.not_found
        );
    }
    info!("Batch statistics: {}", serde_json::to_string(&stats)?);

    println!(
        "Processed {} items: {} successful, {} failed, {} skipped ({:.1}% success)",
        stats.processed,
        stats.successful,
        stats.failed,
        stats.skipped,
        stats.success_rate() * 100.0
    );
    for (tier, count) in &stats.by_tier {
        println!("  {:<10} {}", tier.as_str(), count);
    }
    println!("Wrote {} records to {:?}", written, config.files.output_file);

    Ok(())
}

fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .init();
}
