//! midi-library - generate a static website for a MIDI file collection

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use midi_library::config::{BuildConfig, MetadataSource, OutputPaths, SyncPolicy};
use midi_library::core::registry::{convert_pdf_sources, read_text_sources};
use midi_library::core::render::{build_id, Renderer, TemplateRenderer};
use midi_library::plugins::WikipediaClient;
use midi_library::utils::filesystem::{require_dir, scan_media_files};
use midi_library::{ArtifactSync, CatalogBuilder, EnrichmentCache, MetadataExtractor, NameRegistry};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SyncArg {
    Incremental,
    FullRebuild,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MetadataArg {
    Filename,
    EmbeddedFirst,
}

/// Static site generator for a MIDI file library
#[derive(Parser, Debug)]
#[command(name = "midi-library")]
#[command(version)]
#[command(about = "Static site generator for a MIDI file library")]
struct Args {
    /// Directory containing the media files
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Directory containing index.html, composer.html, performer.html, file.html and static/
    #[arg(short, long)]
    template_dir: PathBuf,

    /// Directory the site is written to
    #[arg(short, long)]
    output_dir: PathBuf,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output synchronization policy (overrides the settings file)
    #[arg(long, value_enum)]
    sync: Option<SyncArg>,

    /// Metadata source (overrides the settings file)
    #[arg(long, value_enum)]
    metadata: Option<MetadataArg>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // initialize logging with filters to suppress noisy dependency output
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::new(format!(
        "{},lofty=warn,reqwest=warn,hyper=warn",
        log_level
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let mut config = BuildConfig::load(args.config.as_deref())?;
    if let Some(sync) = args.sync {
        config.sync_policy = match sync {
            SyncArg::Incremental => SyncPolicy::Incremental,
            SyncArg::FullRebuild => SyncPolicy::FullRebuild,
        };
    }
    if let Some(metadata) = args.metadata {
        config.metadata_source = match metadata {
            MetadataArg::Filename => MetadataSource::Filename,
            MetadataArg::EmbeddedFirst => MetadataSource::EmbeddedFirst,
        };
    }
    if args.no_progress {
        config.show_progress = false;
    }

    let input_dir = require_dir("input", &args.input_dir)?;
    let template_dir = require_dir("template", &args.template_dir)?;
    let output_dir = absolute(&args.output_dir)?;

    info!("Input: {}", input_dir.display());
    info!("Templates: {}", template_dir.display());
    info!("Output: {} ({:?})", output_dir.display(), config.sync_policy);

    let paths = OutputPaths::new(&output_dir, &config.extension());
    let sync = ArtifactSync::new(config.sync_policy, paths.clone());
    sync.prepare(&[("input", input_dir.as_path()), ("template", template_dir.as_path())])?;
    sync.copy_static_assets(&template_dir)?;

    let registry = load_registry(&config, &input_dir);
    info!("Name registry: {} entries", registry.len());

    let client = WikipediaClient::from_config(&config).context("Failed to build Wikipedia client")?;
    let cache = EnrichmentCache::load(config.cache_path(&input_dir), Arc::new(client));

    let files = scan_media_files(&input_dir, &config.extension(), Some(&output_dir));
    info!("Found {} .{} files", files.len(), config.extension());

    let mut builder = CatalogBuilder::new(
        &registry,
        &cache,
        MetadataExtractor::new(config.metadata_source),
        &sync,
    )
    .with_progress(config.show_progress);
    let catalog = builder.build(&files).await.context("Catalog build failed")?;
    info!("Enrichment lookups this run: {}", cache.fetch_count());

    let renderer = TemplateRenderer::new(&template_dir, build_id());
    renderer.render(&catalog, &paths)?;

    Ok(())
}

/// Persisted registry overlaid with names freshly extracted from the sources
fn load_registry(config: &BuildConfig, input_dir: &Path) -> NameRegistry {
    let persisted = NameRegistry::load_csv_or_empty(&config.registry_path(input_dir));

    let mut sources = read_text_sources(&config.registry_source_paths(input_dir));
    if config.scan_pdfs {
        sources.extend(convert_pdf_sources(input_dir, &config.pdftotext_command));
    }

    let fresh = NameRegistry::extract(sources.iter().map(String::as_str));
    persisted.merged_with(fresh)
}

/// Absolute form of a path that may not exist yet
fn absolute(path: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}
