//! vox-export - voxport export tool
//!
//! Converts occupancy grids (.npy/.npz) and point clouds (.ply) to raw
//! little-endian binary payloads with JSON descriptors (.bin + .json)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

// Use modules from library
use vox_export::{ConvertOptions, convert_occupancy, convert_point_cloud, inspect, manifest};

#[derive(Parser)]
#[command(name = "vox-export")]
#[command(about = "voxport export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build everything declared in a manifest file
    Build {
        /// Path to voxport.toml manifest
        #[arg(default_value = "voxport.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without building
    Check {
        /// Path to voxport.toml manifest
        #[arg(default_value = "voxport.toml")]
        manifest: PathBuf,
    },

    /// Convert a single occupancy grid
    Occupancy {
        /// Input .npz archive or .npy array
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        outdir: PathBuf,

        /// Output base name (default: input file stem)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Convert a single PLY point cloud
    Pointcloud {
        /// Input .ply file
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        outdir: PathBuf,

        /// Output base name (default: input file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Keep source x/y instead of swapping them
        #[arg(long)]
        no_xy_swap: bool,
    },

    /// Print parsed header facts of an NPY, NPZ or PLY file
    Inspect {
        /// Input file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { manifest, output } => {
            tracing::info!("Building from {:?}", manifest);
            let config = manifest::Manifest::load(&manifest)?;
            let results = manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete! {} conversions", results.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::Manifest::load(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Occupancy {
            input,
            outdir,
            name,
        } => {
            let name = output_name(&input, name)?;
            tracing::info!("Converting {:?} -> {:?}", input, outdir.join(&name));
            convert_occupancy(&input, &outdir, &name, &ConvertOptions::default())
                .with_context(|| format!("Failed to convert occupancy grid {:?}", input))?;
            tracing::info!("Done!");
        }

        Commands::Pointcloud {
            input,
            outdir,
            name,
            no_xy_swap,
        } => {
            let name = output_name(&input, name)?;
            let options = ConvertOptions {
                xy_swap: !no_xy_swap,
                ..Default::default()
            };
            tracing::info!("Converting {:?} -> {:?}", input, outdir.join(&name));
            convert_point_cloud(&input, &outdir, &name, &options)
                .with_context(|| format!("Failed to convert point cloud {:?}", input))?;
            tracing::info!("Done!");
        }

        Commands::Inspect { input } => {
            let report = inspect::inspect(&input)
                .with_context(|| format!("Failed to inspect {:?}", input))?;
            print!("{report}");
        }
    }

    Ok(())
}

/// Explicit `--name`, or the input file stem
///
/// The name is joined onto the output directory, so it must stay a bare file
/// stem.
fn output_name(input: &Path, name: Option<String>) -> Result<String> {
    match name {
        Some(name) if name.trim().is_empty() => anyhow::bail!("--name must not be empty"),
        Some(name) if name.contains(['/', '\\']) => {
            anyhow::bail!("Output name '{}' must not contain path separators", name)
        }
        Some(name) => Ok(name),
        None => input
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .with_context(|| format!("Cannot derive an output name from {:?}", input)),
    }
}
