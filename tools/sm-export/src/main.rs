//! sm-export - Super Metroid sprite extraction tool
//!
//! Pulls tiles, palettes, spritemaps, hitboxes and extended spritemaps out of
//! a LoROM image and writes them as project JSON, assembly or PNG.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sm_common::{LoRom, Project, RomAccessor};
use sm_lz::DecodeOptions;

use sm_export::manifest::DecompressSection;
use sm_export::{
    ExportKind, GenericParams, MANIFEST_FILE, Manifest, TableRange, Tables, asm, build_all,
    extract_enemy, extract_generic, parse_address, parse_range, parse_word, render,
    write_exports,
};

#[derive(Parser)]
#[command(name = "sm-export")]
#[command(about = "Super Metroid sprite extraction tool")]
#[command(version)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the table chains of a sprite set start
#[derive(clap::Args)]
struct TableArgs {
    /// Spritemap table range (start[:end])
    #[arg(long, value_parser = parse_range)]
    spritemaps: TableRange,

    /// Extended hitbox table range
    #[arg(long, value_parser = parse_range)]
    hitboxes: Option<TableRange>,

    /// Extended spritemap table range
    #[arg(long, value_parser = parse_range)]
    ext_spritemaps: Option<TableRange>,
}

impl TableArgs {
    fn tables(&self) -> Tables {
        Tables {
            spritemaps: self.spritemaps,
            hitboxes: self.hitboxes,
            ext_spritemaps: self.ext_spritemaps,
        }
    }
}

/// Output of a single extraction
#[derive(clap::Args)]
struct OutputArgs {
    /// Output directory
    #[arg(short, long, default_value = "out")]
    output: PathBuf,

    /// Formats to write
    #[arg(short, long, value_enum, value_delimiter = ',', default_value = "json")]
    export: Vec<ExportKind>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every job of a manifest
    Build {
        /// Path to sm-extract.toml manifest
        #[arg(default_value = MANIFEST_FILE)]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without extracting
    Check {
        /// Path to sm-extract.toml manifest
        #[arg(default_value = MANIFEST_FILE)]
        manifest: PathBuf,
    },

    /// Extract an enemy through its header in bank $A0
    Enemy {
        /// ROM image
        #[arg(long)]
        rom: PathBuf,

        /// Enemy id (header offset in bank $A0)
        #[arg(long, value_parser = parse_word)]
        id: u16,

        #[command(flatten)]
        tables: TableArgs,

        /// Project name, prefix of every record name
        #[arg(long)]
        name: String,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Extract a sprite set from explicit addresses
    Generic {
        /// ROM image
        #[arg(long)]
        rom: PathBuf,

        /// Tile data address
        #[arg(long, value_parser = parse_address)]
        gfx: u32,

        /// Number of 8x8 tiles (uncompressed graphics)
        #[arg(long, default_value_t = 0)]
        gfx_size: usize,

        /// Tile number the sheet is loaded at
        #[arg(long, value_parser = parse_word, default_value = "0")]
        gfx_offset: u16,

        /// Tile data is SM-LZ compressed
        #[arg(long)]
        compressed: bool,

        /// Palette address
        #[arg(long, value_parser = parse_address)]
        palette: u32,

        /// Number of 16-color palette rows
        #[arg(long, default_value_t = 1)]
        palette_count: usize,

        /// Palette row the palette is loaded into
        #[arg(long, default_value_t = 0)]
        palette_offset: u8,

        /// Decompression ceiling in bytes (0 = none)
        #[arg(long)]
        max_output: Option<usize>,

        #[command(flatten)]
        tables: TableArgs,

        /// Project name, prefix of every record name
        #[arg(long)]
        name: String,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Decompress an SM-LZ stream to a file
    Decompress {
        /// ROM image
        #[arg(long)]
        rom: PathBuf,

        /// Stream address
        #[arg(long, value_parser = parse_address)]
        address: u32,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Decompression ceiling in bytes (0 = none)
        #[arg(long)]
        max_output: Option<usize>,
    },

    /// Write .asm, .gfx and .pal for a project
    Asm {
        /// Project JSON
        project: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Write one PNG per spritemap of a project
    Png {
        /// Project JSON
        project: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Write a project's tile sheet as PNG
    Sheet {
        /// Project JSON
        project: PathBuf,

        /// Output PNG
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace a project's tiles and palette with an indexed PNG
    ImportTiles {
        /// Project JSON
        project: PathBuf,

        /// Indexed PNG tile sheet
        png: PathBuf,

        /// Output project (default: overwrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn decode_options(max_output: Option<usize>) -> DecodeOptions {
    DecompressSection { max_output }.options()
}

fn open_rom(path: &Path) -> Result<LoRom> {
    let rom = LoRom::open(path).with_context(|| format!("Failed to open ROM: {}", path.display()))?;
    if rom.had_header() {
        tracing::info!("Stripped copier header from {}", path.display());
    }
    Ok(rom)
}

fn load_project(path: &Path) -> Result<Project> {
    Project::load(path).with_context(|| format!("Failed to load project: {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    match cli.command {
        Commands::Build { manifest, output } => {
            tracing::info!("Building from {:?}", manifest);
            let config = Manifest::load(&manifest)?;
            let base_dir = manifest.parent().unwrap_or(Path::new("."));
            let count = build_all(&config, base_dir, output.as_deref())?;
            tracing::info!("Build complete! ({} jobs)", count);
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = Manifest::load(&manifest)?;
            tracing::info!("Manifest is valid! ({} jobs)", config.jobs().len());
        }

        Commands::Enemy {
            rom,
            id,
            tables,
            name,
            out,
        } => {
            let rom = open_rom(&rom)?;
            let project = extract_enemy(&rom, id, tables.tables(), &name)
                .with_context(|| format!("Failed to extract enemy ${:04X}", id))?;
            write_exports(&project, &out.output, &out.export)?;
            tracing::info!("Done!");
        }

        Commands::Generic {
            rom,
            gfx,
            gfx_size,
            gfx_offset,
            compressed,
            palette,
            palette_count,
            palette_offset,
            max_output,
            tables,
            name,
            out,
        } => {
            if palette_count == 0 {
                anyhow::bail!("--palette-count must be at least 1");
            }
            if !compressed && gfx_size == 0 {
                anyhow::bail!("Uncompressed graphics need --gfx-size");
            }
            let rom = open_rom(&rom)?;
            let params = GenericParams {
                name,
                gfx,
                gfx_size,
                gfx_offset,
                compressed,
                palette,
                palette_count,
                palette_offset,
                tables: tables.tables(),
                decode: decode_options(max_output),
            };
            let project = extract_generic(&rom, &params)
                .with_context(|| format!("Failed to extract {}", params.name))?;
            write_exports(&project, &out.output, &out.export)?;
            tracing::info!("Done!");
        }

        Commands::Decompress {
            rom,
            address,
            output,
            max_output,
        } => {
            let rom = open_rom(&rom)?;
            let stream = rom
                .tail(address)
                .with_context(|| format!("No compressed data at ${:06X}", address))?;
            let decoded = sm_lz::decompress_with(stream, &decode_options(max_output))
                .with_context(|| format!("Failed to decompress ${:06X}", address))?;
            std::fs::write(&output, &decoded.data)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            tracing::info!(
                "Decompressed ${:06X}: {} -> {} bytes into {:?}",
                address,
                decoded.consumed,
                decoded.data.len(),
                output
            );
        }

        Commands::Asm { project, output } => {
            let project = load_project(&project)?;
            asm::export_asm(&project, &output)?;
        }

        Commands::Png { project, output } => {
            let project = load_project(&project)?;
            render::export_png(&project, &output)?;
        }

        Commands::Sheet { project, output } => {
            let output = output.unwrap_or_else(|| project.with_extension("png"));
            let project = load_project(&project)?;
            render::export_tile_sheet(&project, &output)?;
        }

        Commands::ImportTiles {
            project: path,
            png,
            output,
        } => {
            let mut project = load_project(&path)?;
            render::import_tiles(&mut project, &png)?;
            let output = output.unwrap_or(path);
            project
                .save(&output)
                .with_context(|| format!("Failed to save {}", output.display()))?;
            tracing::info!("Saved {}", output.display());
        }
    }

    Ok(())
}
