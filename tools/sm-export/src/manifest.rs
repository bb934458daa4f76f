//! sm-extract.toml manifest parsing and batch runner
//!
//! A manifest names the ROM, an output directory and any number of enemy or
//! generic extraction jobs. Jobs are independent and run in parallel.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use hashbrown::HashSet;
use rayon::prelude::*;
use serde::Deserialize;
use sm_common::{ExtractionResult, LoRom};
use sm_lz::DecodeOptions;

use crate::export::{ExportKind, write_exports};
use crate::extract::{GenericParams, TableRange, Tables, extract_enemy, extract_generic};

/// Default manifest file name
pub const MANIFEST_FILE: &str = "sm-extract.toml";

#[derive(Debug, Deserialize)]
pub struct Manifest {
    /// ROM image, relative to the manifest
    pub rom: PathBuf,
    /// Output directory, relative to the manifest
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub decompress: DecompressSection,
    #[serde(default)]
    pub enemy: Vec<EnemyJob>,
    #[serde(default)]
    pub generic: Vec<GenericJob>,
}

fn default_output() -> PathBuf {
    PathBuf::from("out")
}

fn default_exports() -> Vec<ExportKind> {
    vec![ExportKind::Json]
}

fn default_palette_count() -> usize {
    1
}

/// Decompressor settings shared by all jobs
#[derive(Debug, Default, Deserialize)]
pub struct DecompressSection {
    /// Output ceiling in bytes; 0 removes the ceiling
    pub max_output: Option<usize>,
}

impl DecompressSection {
    pub fn options(&self) -> DecodeOptions {
        match self.max_output {
            None => DecodeOptions::default(),
            Some(0) => DecodeOptions::unbounded(),
            Some(limit) => DecodeOptions::with_max_output(limit),
        }
    }
}

/// Enemy located through its header
#[derive(Debug, Deserialize)]
pub struct EnemyJob {
    pub name: String,
    /// Offset of the header in bank $A0
    pub id: u16,
    pub spritemaps: TableRange,
    pub hitboxes: Option<TableRange>,
    pub ext_spritemaps: Option<TableRange>,
    #[serde(default = "default_exports")]
    pub exports: Vec<ExportKind>,
}

/// Sprite set with every address given explicitly
#[derive(Debug, Deserialize)]
pub struct GenericJob {
    pub name: String,
    pub gfx: u32,
    #[serde(default)]
    pub gfx_size: usize,
    #[serde(default)]
    pub gfx_offset: u16,
    #[serde(default)]
    pub compressed: bool,
    pub palette: u32,
    #[serde(default = "default_palette_count")]
    pub palette_count: usize,
    #[serde(default)]
    pub palette_offset: u8,
    pub spritemaps: TableRange,
    pub hitboxes: Option<TableRange>,
    pub ext_spritemaps: Option<TableRange>,
    #[serde(default = "default_exports")]
    pub exports: Vec<ExportKind>,
}

/// One job of either kind, borrowed from the manifest
#[derive(Debug, Clone, Copy)]
pub enum Job<'a> {
    Enemy(&'a EnemyJob),
    Generic(&'a GenericJob),
}

impl Job<'_> {
    pub fn name(&self) -> &str {
        match self {
            Job::Enemy(job) => &job.name,
            Job::Generic(job) => &job.name,
        }
    }

    pub fn exports(&self) -> &[ExportKind] {
        match self {
            Job::Enemy(job) => &job.exports,
            Job::Generic(job) => &job.exports,
        }
    }

    fn tables(&self) -> Tables {
        let (spritemaps, hitboxes, ext_spritemaps) = match self {
            Job::Enemy(job) => (job.spritemaps, job.hitboxes, job.ext_spritemaps),
            Job::Generic(job) => (job.spritemaps, job.hitboxes, job.ext_spritemaps),
        };
        Tables {
            spritemaps,
            hitboxes,
            ext_spritemaps,
        }
    }

    /// Run the extraction against a loaded ROM
    pub fn extract(&self, rom: &LoRom, decode: DecodeOptions) -> Result<ExtractionResult> {
        let project = match self {
            Job::Enemy(job) => extract_enemy(rom, job.id, self.tables(), &job.name)?,
            Job::Generic(job) => extract_generic(
                rom,
                &GenericParams {
                    name: job.name.clone(),
                    gfx: job.gfx,
                    gfx_size: job.gfx_size,
                    gfx_offset: job.gfx_offset,
                    compressed: job.compressed,
                    palette: job.palette,
                    palette_count: job.palette_count,
                    palette_offset: job.palette_offset,
                    tables: self.tables(),
                    decode,
                },
            )?,
        };
        Ok(project)
    }
}

impl Manifest {
    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid manifest: {}", path.display()))
    }

    /// Parse and validate a manifest
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(content).context("Failed to parse sm-extract.toml")?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn jobs(&self) -> Vec<Job<'_>> {
        self.enemy
            .iter()
            .map(Job::Enemy)
            .chain(self.generic.iter().map(Job::Generic))
            .collect()
    }

    /// Check what can be checked without the ROM
    pub fn validate(&self) -> Result<()> {
        let jobs = self.jobs();
        let mut names = HashSet::new();
        for job in &jobs {
            let name = job.name();
            if name.is_empty() {
                bail!("Job names must not be empty");
            }
            if name.contains(['/', '\\']) {
                bail!("Job name '{}' must not contain path separators", name);
            }
            if !names.insert(name) {
                bail!("Duplicate job name '{}'", name);
            }
            if job.exports().is_empty() {
                bail!("Job '{}' has no exports", name);
            }

            let tables = job.tables();
            for range in [Some(tables.spritemaps), tables.hitboxes, tables.ext_spritemaps]
                .into_iter()
                .flatten()
            {
                check_range(name, range)?;
            }

            if let Job::Generic(generic) = job {
                if generic.palette_count == 0 {
                    bail!("Job '{}': palette_count must be at least 1", name);
                }
                if !generic.compressed && generic.gfx_size == 0 {
                    bail!("Job '{}': uncompressed graphics need a gfx_size", name);
                }
                check_address(name, "gfx", generic.gfx)?;
                check_address(name, "palette", generic.palette)?;
            }
        }
        Ok(())
    }
}

fn check_address(job: &str, field: &str, address: u32) -> Result<()> {
    if address > 0xFF_FFFF {
        bail!("Job '{}': {} ${:X} is not a 24-bit address", job, field, address);
    }
    Ok(())
}

fn check_range(job: &str, range: TableRange) -> Result<()> {
    check_address(job, "table start", range.start)?;
    if let Some(end) = range.end {
        check_address(job, "table end", end)?;
        if end < range.start {
            bail!(
                "Job '{}': table end ${:06X} is before its start ${:06X}",
                job,
                end,
                range.start
            );
        }
    }
    Ok(())
}

/// Run every job of a manifest
///
/// Paths in the manifest are relative to `base_dir`. `output_override`
/// replaces the manifest's output directory. Returns the number of jobs run.
pub fn build_all(manifest: &Manifest, base_dir: &Path, output_override: Option<&Path>) -> Result<usize> {
    let rom_path = base_dir.join(&manifest.rom);
    let rom = LoRom::open(&rom_path)
        .with_context(|| format!("Failed to open ROM: {}", rom_path.display()))?;
    if rom.had_header() {
        tracing::info!("Stripped copier header from {}", rom_path.display());
    }

    let output = match output_override {
        Some(dir) => dir.to_path_buf(),
        None => base_dir.join(&manifest.output),
    };
    let decode = manifest.decompress.options();
    let jobs = manifest.jobs();

    tracing::info!("Running {} jobs into {}", jobs.len(), output.display());

    jobs.par_iter()
        .map(|job| {
            let project = job
                .extract(&rom, decode)
                .with_context(|| format!("Extraction '{}' failed", job.name()))?;
            write_exports(&project, &output, job.exports())
                .with_context(|| format!("Export of '{}' failed", job.name()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(jobs.len())
}
