//! Highlights one passage in one cached page.
//!
//! Usage:
//!   highlight_page Apollo_11 "landed on July 20, 1969" --output apollo.html
//!   highlight_page https://en.wikipedia.org/wiki/Moon "The Moon is" --context "..."

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use wikifix::{
    WikifixConfig,
    Error,
    Result,
    pipeline::{Pipeline, SideInput, SideOutcome},
    storage::FsPageStore,
    types::TargetPassage,
    utils::page_key_from_url,
};

#[derive(Parser)]
#[command(name = "highlight_page")]
#[command(about = "Highlight a passage in a single cached page")]
struct Args {
    /// Page key, or a full article URL
    page: String,

    /// Passage to highlight
    target: String,

    /// Surrounding text used when the passage itself cannot be placed
    #[arg(long)]
    context: Option<String>,

    /// INI configuration file (defaults to wikifix.ini if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root of the saved site mirror
    #[arg(long)]
    saved_site: Option<PathBuf>,

    /// Write the highlighted page here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<bool> {
    let args = Args::parse();

    let mut config = WikifixConfig::load(args.config.as_deref())?;
    if let Some(saved_site) = args.saved_site {
        config.files.saved_site_dir = saved_site;
    }
    if let Some(output) = &args.output {
        config.files.output_file = output.clone();
    }

    env_logger::Builder::new()
        .filter(None, config.processor.get_log_level())
        .init();
    config.validate()?;

    let page_key = if args.page.starts_with("http://") || args.page.starts_with("https://") {
        page_key_from_url(&args.page)
            .ok_or_else(|| Error::config(format!("Not an article URL: {}", args.page)))?
    } else {
        args.page.clone()
    };

    let target = match args.context {
        Some(context) => TargetPassage::with_context(args.target, context),
        None => TargetPassage::new(args.target),
    };

    let pipeline = Pipeline::new(FsPageStore::new(&config.files.saved_site_dir), &config);
    let outcome = pipeline.highlight_side(&SideInput::new(page_key.clone(), target));

    let document = match outcome {
        SideOutcome::Highlighted(document) => document,
        other => {
            eprintln!("{}: {}", page_key, other.label());
            if let Some(tier) = other.tier() {
                eprintln!("best candidate tier: {}", tier);
            }
            return Ok(false);
        }
    };

    info!("Highlighted {} at tier {} as #{}", page_key, document.tier, document.element_id);
    match &args.output {
        Some(path) => {
            fs::write(path, &document.markup)?;
            eprintln!("{}: {} -> {:?}", page_key, document.tier, path);
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(document.markup.as_bytes())?;
            lock.flush()?;
        }
    }
    Ok(true)
}
