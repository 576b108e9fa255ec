use anyhow::{Context, Result};
use clap::Parser;
use concept_mapper::canvas::{Canvas, MemoryCanvas};
use concept_mapper::config::{LayoutConfig, Settings};
use concept_mapper::layout::ForceLayout;
use concept_mapper::mapper::ConceptMapper;
use concept_mapper::source::JsonSource;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Concept graph JSON ({"entities": [...], "relationships": [...]})
    input: PathBuf,

    /// Output .canvas file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settings JSON file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Also try the secondary layout algorithms
    #[arg(short, long)]
    multiple: bool,

    /// Apply the n-th kept layout instead of the first
    #[arg(long, default_value_t = 0)]
    pick: usize,

    /// Grid step for node alignment, 0 disables snapping
    #[arg(long)]
    grid_spacing: Option<f64>,

    /// Seed for the randomized layouts
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let payload = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let mut settings = match &args.settings {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str::<Settings>(&raw)
                .with_context(|| format!("Invalid settings in {}", path.display()))?
        }
        None => Settings::default(),
    };
    settings.multiple_layout_algorithms |= args.multiple;

    let mut config = LayoutConfig::default();
    if let Some(spacing) = args.grid_spacing {
        config.grid_spacing = spacing;
    }

    let document = args
        .output
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdout.canvas".to_string());

    let mut mapper = ConceptMapper::with_config(
        MemoryCanvas::new(document),
        ForceLayout::new(args.seed),
        JsonSource::new(payload),
        settings,
        config,
    );
    mapper
        .generate("", "")
        .context("Concept map generation failed")?;

    for candidate in mapper.candidates() {
        eprintln!(
            "{}: score={} nodes={} nodes-edges={} edges={}",
            candidate.algorithm,
            candidate.metrics.weighted_score,
            candidate.metrics.node_overlaps,
            candidate.metrics.edge_node_overlaps,
            candidate.metrics.edge_edge_overlaps,
        );
    }
    for _ in 0..args.pick {
        mapper.rotate_layout()?;
    }

    let json = serde_json::to_string_pretty(&mapper.canvas().get_data())?;
    match &args.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", json),
    }

    Ok(())
}
