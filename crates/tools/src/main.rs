use std::env;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use layers::LodLevel;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tools::{basemap_rows, classify_rows, load_config, preview_lod, read_style, summarize_pois};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect styles, detail levels and POI data for the castle map")]
struct Args {
    /// JSON file with view configuration overrides (default: $CASTLEMAP_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the detail-control role of every layer in a style
    Classify {
        /// Style JSON file
        style: PathBuf,
    },

    /// Show which layers a detail level shows and hides
    Lod {
        /// Style JSON file
        style: PathBuf,

        /// low, medium, high or 0..=2
        #[arg(long, default_value = "high")]
        level: String,
    },

    /// Parse a GeoJSON POI file with the configured filter
    Pois {
        /// GeoJSON FeatureCollection
        data: PathBuf,
    },

    /// List the basemap catalogue with resolved style URLs
    Basemaps {
        /// MapTiler key (default: $MAPTILER_KEY)
        #[arg(long)]
        maptiler_key: Option<String>,

        /// Jawg access token (default: $JAWG_TOKEN)
        #[arg(long)]
        jawg_token: Option<String>,
    },

    /// Print the effective view configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    let json = args.json;

    match args.command {
        Command::Classify { style } => {
            let doc = read_style(&style)?;
            let rows = classify_rows(&doc);
            info!(style = %doc.name, layers = rows.len(), "classified");
            if json {
                return print_json(&rows);
            }
            let width = rows.iter().map(|r| r.id.len()).max().unwrap_or(0);
            for row in rows {
                println!("{:<width$}  {}", row.id, row.role);
            }
        }
        Command::Lod { style, level } => {
            let level = LodLevel::parse(&level)
                .ok_or_else(|| format!("unknown detail level `{level}` (use low, medium, high or 0..=2)"))?;
            let doc = read_style(&style)?;
            let preview = preview_lod(&doc, level)?;
            if json {
                return print_json(&preview);
            }
            println!(
                "level {}: {} shown, {} hidden, {} unchanged",
                preview.level, preview.shown, preview.hidden, preview.unchanged
            );
            let width = preview.layers.iter().map(|l| l.id.len()).max().unwrap_or(0);
            for layer in preview.layers {
                let marker = if layer.before == layer.after { " " } else { "*" };
                println!("{marker} {:<width$}  {:>7} -> {}", layer.id, layer.before, layer.after);
            }
        }
        Command::Pois { data } => {
            let config = load_config(args.config.as_deref())?;
            let text = fs::read_to_string(&data).map_err(|e| format!("read {data:?}: {e}"))?;
            let summary = summarize_pois(&text, &config)?;
            if json {
                return print_json(&summary);
            }
            println!(
                "{} features: {} kept, {} filtered out, {} without point geometry",
                summary.total_features, summary.kept, summary.filtered_out, summary.skipped_geometry
            );
            for poi in summary.pois {
                println!("{:>9.5} {:>10.5}  {}", poi.lat, poi.lon, poi.title);
            }
        }
        Command::Basemaps {
            maptiler_key,
            jawg_token,
        } => {
            let maptiler_key = maptiler_key
                .or_else(|| env::var("MAPTILER_KEY").ok())
                .unwrap_or_default();
            let jawg_token = jawg_token
                .or_else(|| env::var("JAWG_TOKEN").ok())
                .unwrap_or_default();
            let rows = basemap_rows(&maptiler_key, &jawg_token);
            if json {
                return print_json(&rows);
            }
            for row in rows {
                let extras = match (row.extrusion, row.rotation) {
                    (true, true) => "3d+rotate",
                    (true, false) => "3d",
                    (false, true) => "rotate",
                    (false, false) => "-",
                };
                println!("{:<20} {:<10} {}", row.name, extras, row.style_url);
            }
        }
        Command::Config => {
            let config = load_config(args.config.as_deref())?;
            print_json(&config)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}
