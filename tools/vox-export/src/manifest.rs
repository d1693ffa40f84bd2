//! Manifest parsing and build orchestration
//!
//! Parses voxport.toml and runs every conversion it declares.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::options::{ConvertOptions, MAX_PLY_BATCH_RECORDS, MAX_TENSOR_CHUNK_BYTES};
use crate::{ConversionResult, convert_occupancy, convert_point_cloud};

/// Root manifest structure
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub settings: ConvertOptions,
    #[serde(default)]
    pub occupancy: Vec<OccupancyEntry>,
    #[serde(default)]
    pub pointclouds: Vec<PointCloudEntry>,

    /// Directory relative paths are resolved against (the manifest's own)
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

/// An NPY or NPZ occupancy grid to convert
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OccupancyEntry {
    pub name: String,
    pub path: PathBuf,
}

/// A PLY point cloud to convert
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointCloudEntry {
    pub name: String,
    pub path: PathBuf,
    /// Overrides `settings.xy_swap` for this cloud
    #[serde(default)]
    pub xy_swap: Option<bool>,
}

/// One resolved conversion
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Occupancy {
        name: String,
        input: PathBuf,
    },
    PointCloud {
        name: String,
        input: PathBuf,
        xy_swap: bool,
    },
}

impl Job {
    pub fn name(&self) -> &str {
        match self {
            Job::Occupancy { name, .. } | Job::PointCloud { name, .. } => name,
        }
    }

    pub fn input(&self) -> &Path {
        match self {
            Job::Occupancy { input, .. } | Job::PointCloud { input, .. } => input,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Job::Occupancy { .. } => "occupancy",
            Job::PointCloud { .. } => "point cloud",
        }
    }
}

impl Manifest {
    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        let mut manifest = Self::parse(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))?;
        manifest.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(manifest)
    }

    /// Parse manifest from string; paths stay relative to the current directory
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid voxport.toml")
    }

    /// Output directory, honoring an override from the command line
    pub fn output_dir(&self, output_override: Option<&Path>) -> PathBuf {
        match output_override {
            Some(dir) => dir.to_path_buf(),
            None => self.base_dir.join(&self.output.dir),
        }
    }

    /// Every declared conversion, occupancy grids first
    pub fn jobs(&self) -> Vec<Job> {
        let occupancy = self.occupancy.iter().map(|e| Job::Occupancy {
            name: e.name.clone(),
            input: self.base_dir.join(&e.path),
        });
        let pointclouds = self.pointclouds.iter().map(|e| Job::PointCloud {
            name: e.name.clone(),
            input: self.base_dir.join(&e.path),
            xy_swap: e.xy_swap.unwrap_or(self.settings.xy_swap),
        });
        occupancy.chain(pointclouds).collect()
    }
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    let settings = &manifest.settings;
    if !(1..=MAX_TENSOR_CHUNK_BYTES).contains(&settings.tensor_chunk_bytes) {
        anyhow::bail!(
            "settings.tensor_chunk_bytes must be between 1 and {}, got {}",
            MAX_TENSOR_CHUNK_BYTES,
            settings.tensor_chunk_bytes
        );
    }
    if !(1..=MAX_PLY_BATCH_RECORDS).contains(&settings.ply_batch_records) {
        anyhow::bail!(
            "settings.ply_batch_records must be between 1 and {}, got {}",
            MAX_PLY_BATCH_RECORDS,
            settings.ply_batch_records
        );
    }

    // All outputs share one directory, so names must not collide
    let mut names = HashSet::new();
    for job in manifest.jobs() {
        let name = job.name();
        if name.trim().is_empty() {
            anyhow::bail!("{} entry for {:?} has an empty name", job.kind(), job.input());
        }
        if name.contains(['/', '\\']) {
            anyhow::bail!("Output name '{}' must not contain path separators", name);
        }
        if !names.insert(name.to_string()) {
            anyhow::bail!("Duplicate output name '{}'", name);
        }
        if !job.input().exists() {
            anyhow::bail!(
                "{} '{}' source not found: {:?}",
                job.kind(),
                name,
                job.input()
            );
        }
    }
    Ok(())
}

/// Build all conversions from a manifest
///
/// Jobs run in parallel; each one owns a disjoint set of input and output
/// files. The first failure is returned once running jobs finish.
pub fn build_all(
    manifest: &Manifest,
    output_override: Option<&Path>,
) -> Result<Vec<ConversionResult>> {
    validate(manifest)?;

    let output_dir = manifest.output_dir(output_override);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let jobs = manifest.jobs();
    if jobs.is_empty() {
        tracing::warn!("Manifest declares no conversions");
    }

    jobs.par_iter()
        .map(|job| run_job(job, &output_dir, &manifest.settings))
        .collect()
}

fn run_job(job: &Job, output_dir: &Path, settings: &ConvertOptions) -> Result<ConversionResult> {
    tracing::info!(
        "Converting {}: {} -> {:?}",
        job.kind(),
        job.name(),
        output_dir
    );
    let result = match job {
        Job::Occupancy { name, input } => convert_occupancy(input, output_dir, name, settings),
        Job::PointCloud {
            name,
            input,
            xy_swap,
        } => {
            let options = ConvertOptions {
                xy_swap: *xy_swap,
                ..*settings
            };
            convert_point_cloud(input, output_dir, name, &options)
        }
    };
    result.with_context(|| format!("Failed to convert {} '{}'", job.kind(), job.name()))
}
