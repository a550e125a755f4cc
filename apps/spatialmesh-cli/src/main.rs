mod scan;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use glam::Vec3;
use serde::Serialize;
use spatialmesh_common::{SectorKey, Transform};
use spatialmesh_render::DebugSurfaces;
use spatialmesh_stream::{ImportConfig, ImportStats, ScriptedSource, SpatialMesh, TickOutcome};
use spatialmesh_tools::{SectorInspector, SectorMapSummary};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spatialmesh-cli", about = "CLI tool for spatialmesh operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Import a synthetic scan through the frame-budgeted pipeline
    Import {
        /// Import configuration file (YAML, or JSON with a .json extension)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Sphere radius in metres
        #[arg(short, long, default_value = "2.5")]
        radius: f32,
        /// Longitudinal segments of the sphere
        #[arg(short, long, default_value = "64")]
        segments: u32,
        /// Sphere centre as x,y,z
        #[arg(long, value_delimiter = ',', default_value = "0,1.5,0", allow_hyphen_values = true)]
        center: Vec<f32>,
        /// Simulated host frame length in milliseconds
        #[arg(long, default_value = "16")]
        frame_ms: u64,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show which sectors a single triangle is bucketed into
    Bucket {
        /// Nine coordinates: x1,y1,z1,x2,y2,z2,x3,y3,z3
        #[arg(value_delimiter = ',', allow_hyphen_values = true, required = true)]
        coords: Vec<f32>,
    },
}

#[derive(Serialize)]
struct ImportReport {
    frames: u64,
    summary: SectorMapSummary,
    stats: Option<ImportStats>,
}

/// Upper bound on simulated frames so a misconfigured run cannot spin forever.
const MAX_FRAMES: u64 = 1_000_000;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("spatialmesh-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", spatialmesh_common::crate_info());
            println!("render: {}", spatialmesh_render::crate_info());
            println!("stream: {}", spatialmesh_stream::crate_info());
            println!("tools: {}", spatialmesh_tools::crate_info());
        }
        Commands::Import {
            config,
            radius,
            segments,
            center,
            frame_ms,
            json,
        } => {
            let config = match config {
                Some(path) => ImportConfig::load(&path)?,
                None => ImportConfig::default(),
            };
            if config.import_period().is_none() {
                anyhow::bail!("periodic import is disabled (import_period_seconds <= 0)");
            }
            let &[x, y, z] = center.as_slice() else {
                anyhow::bail!("--center takes exactly three values, got {}", center.len());
            };
            let center = Vec3::new(x, y, z);
            let buffer = scan::synthetic_sphere(center, radius, segments);
            tracing::info!(
                vertices = buffer.vertices.len(),
                triangles = buffer.triangle_count(),
                "synthetic scan ready"
            );

            let start = Instant::now();
            let mut mesh = SpatialMesh::starting_at(config, Transform::default(), start);
            let mut source = ScriptedSource::with_buffer(buffer);
            let mut surfaces = DebugSurfaces::new();

            let frame = Duration::from_millis(frame_ms.max(1));
            let mut now = start;
            let mut frames = 0;
            loop {
                frames += 1;
                now += frame;
                let outcome = mesh.tick(now, &mut source, &mut surfaces);
                tracing::debug!(frame = frames, ?outcome, "tick");
                if outcome == TickOutcome::Finished {
                    break;
                }
                if frames >= MAX_FRAMES {
                    anyhow::bail!("import did not finish within {MAX_FRAMES} frames");
                }
            }

            let report = ImportReport {
                frames,
                summary: SectorInspector::summary(mesh.sectors()),
                stats: mesh.importer().last_stats().cloned(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Import finished after {} simulated frames", report.frames);
                println!("{}", report.summary);
                if let Some(stats) = &report.stats {
                    println!(
                        "Run: triangles={} insertions={} dropped={} slices={} avg_slice={:?} max_slice={:?}",
                        stats.triangles,
                        stats.sector_insertions,
                        stats.dropped_triangles,
                        stats.slices,
                        stats.slice_average,
                        stats.slice_max
                    );
                }
                print!("{}", surfaces.render_text());
            }
        }
        Commands::Bucket { coords } => {
            if coords.len() != 9 {
                anyhow::bail!("expected nine coordinates, got {}", coords.len());
            }
            let p = |i: usize| Vec3::new(coords[i], coords[i + 1], coords[i + 2]);
            let triangle = [p(0), p(3), p(6)];
            for (i, v) in triangle.iter().enumerate() {
                println!(
                    "v{i} ({:.2}, {:.2}, {:.2}) -> sector {}",
                    v.x,
                    v.y,
                    v.z,
                    SectorKey::from_point(*v)
                );
            }

            let mut sectors = spatialmesh_stream::SectorMap::new();
            let outcome = sectors.bucket_triangle(triangle);
            println!("Copied into {} sector(s):", outcome.inserted);
            for info in SectorInspector::list_sectors(&sectors) {
                println!("  {info}");
            }
        }
    }

    Ok(())
}
