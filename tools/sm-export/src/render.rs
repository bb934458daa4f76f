//! Sprite rendering and tile sheet exchange
//!
//! Spritemaps are composed onto a sparse canvas around their origin and
//! written as indexed PNGs using the sprite palette as the game loads it.

use std::path::Path;

use anyhow::{Context, Result};
use sm_common::gfx::palette::pad_to_rows;
use sm_common::gfx::{
    COLORS_PER_ROW, Canvas, Placement, RasterImage, compose, display_palette, encode_image,
    sheet_image,
};
use sm_common::{ExtendedSpritemap, Project, Reference, Spritemap};

use crate::indexed_png::{read_png, write_indexed_png};

/// Tiles per row in exported tile sheets
pub const SHEET_TILES_PER_ROW: usize = 16;

fn placements(project: &Project, spritemap: &Spritemap, dx: i32, dy: i32) -> Vec<Placement> {
    spritemap
        .entries
        .iter()
        .map(|entry| entry.placement(project.gfx_offset, dx, dy))
        .collect()
}

pub fn render_spritemap(project: &Project, spritemap: &Spritemap) -> Canvas {
    let mut canvas = Canvas::new();
    compose(
        &mut canvas,
        &placements(project, spritemap, 0, 0),
        &project.gfx,
        None,
    );
    canvas
}

/// Compose every linked spritemap, shifted by its link offset
///
/// Links are flattened into one placement list so that overlap follows the
/// same rule as within a single spritemap. Links whose spritemap is not part
/// of the project are skipped.
pub fn render_ext_spritemap(project: &Project, ext: &ExtendedSpritemap) -> Canvas {
    let mut all = Vec::new();
    for link in &ext.links {
        let spritemap = match &link.spritemap {
            Reference::Name(name) => project.spritemap(name),
            Reference::Raw(_) => None,
        };
        match spritemap {
            Some(spritemap) => all.extend(placements(
                project,
                spritemap,
                i32::from(link.x),
                i32::from(link.y),
            )),
            None => tracing::warn!(
                "{}: skipping link to unknown spritemap {}",
                ext.name,
                link.spritemap
            ),
        }
    }

    let mut canvas = Canvas::new();
    compose(&mut canvas, &all, &project.gfx, None);
    canvas
}

/// Cut the canvas to an origin-centred image, `None` if nothing was drawn
pub fn canvas_image(canvas: &Canvas, palette: Vec<u32>) -> Option<RasterImage> {
    let (half_width, half_height) = canvas.bounding_box();
    if canvas.is_empty() || half_width == 0 || half_height == 0 {
        return None;
    }
    let (w, h) = (half_width as i32, half_height as i32);
    let pixels = canvas.crop(-w, -h, w, h);
    Some(RasterImage::indexed(
        half_width * 2,
        half_height * 2,
        pixels,
        palette,
    ))
}

/// Write one PNG per spritemap and extended spritemap into `dir`
///
/// Returns the number of images written; records that draw nothing are
/// skipped.
pub fn export_png(project: &Project, dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let palette = display_palette(&project.palette, project.palette_offset);

    let canvases = project
        .spritemaps
        .iter()
        .map(|s| (s.name.as_str(), render_spritemap(project, s)))
        .chain(
            project
                .ext_spritemaps
                .iter()
                .map(|e| (e.name.as_str(), render_ext_spritemap(project, e))),
        );

    let mut written = 0;
    for (name, canvas) in canvases {
        let Some(image) = canvas_image(&canvas, palette.clone()) else {
            tracing::warn!("{}: nothing to draw, no image written", name);
            continue;
        };
        let path = dir.join(format!("{}.png", name));
        write_indexed_png(&path, &image)?;
        tracing::debug!("Wrote {} ({}x{})", path.display(), image.width, image.height);
        written += 1;
    }

    tracing::info!("Wrote {} images to {}", written, dir.display());
    Ok(written)
}

/// Palette attached to tile sheets: the project palette in whole rows, with
/// entry 0 of each row transparent but keeping its color
fn sheet_palette(project: &Project) -> Vec<u32> {
    let mut palette = project.palette.clone();
    pad_to_rows(&mut palette);
    for row in palette.chunks_exact_mut(COLORS_PER_ROW) {
        row[0] &= 0x00FF_FFFF;
    }
    palette
}

/// Write the whole tile sheet as an indexed PNG
pub fn export_tile_sheet(project: &Project, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let image = sheet_image(&project.gfx, SHEET_TILES_PER_ROW, sheet_palette(project));
    write_indexed_png(path, &image)?;
    tracing::info!(
        "Wrote {} tiles to {}",
        project.tile_count(),
        path.display()
    );
    Ok(())
}

/// Replace the project's tiles and palette with those of an indexed PNG
///
/// Palette alpha is dropped; the palette is padded to whole rows.
pub fn import_tiles(project: &mut Project, png_path: &Path) -> Result<()> {
    let image = read_png(png_path)?;
    let gfx = encode_image(&image)
        .with_context(|| format!("Cannot import tiles from {}", png_path.display()))?;

    let mut palette: Vec<u32> = image
        .palette()
        .unwrap_or_default()
        .iter()
        .map(|&color| color | 0xFF00_0000)
        .collect();
    pad_to_rows(&mut palette);

    tracing::info!(
        "Imported {} tiles and {} colors from {}",
        gfx.len() / sm_common::gfx::TILE_BYTES,
        palette.len(),
        png_path.display()
    );
    project.gfx = gfx;
    project.palette = palette;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sm_common::gfx::{PixelData, TileError, indexed_to_planar};
    use sm_common::{SpriteTileEntry, SpritemapLink};

    use crate::indexed_png::encode_indexed_png;

    /// Tile `i` filled with color `i + 1`, sheet loaded at tile $100, palette row 2
    fn project() -> Project {
        let gfx = (0..4u8)
            .flat_map(|i| indexed_to_planar(&[[i + 1; 8]; 8]))
            .collect();
        let palette = (0..16).map(|i| 0xFF00_0000 | i).collect();
        let mut project = Project::new("Test", gfx, palette, 0x100, 2);
        project.spritemaps.push(Spritemap {
            name: "TestSpritemap_0_A08000".to_string(),
            entries: vec![SpriteTileEntry {
                x: -8,
                y: -8,
                tile: 0x101,
                palette: 2,
                ..Default::default()
            }],
        });
        project.spritemaps.push(Spritemap {
            name: "TestSpritemap_1_A08007".to_string(),
            entries: vec![SpriteTileEntry {
                x: 0,
                y: 0,
                // Below the sheet, draws nothing
                tile: 0x20,
                ..Default::default()
            }],
        });
        project
    }

    #[test]
    fn test_render_spritemap_uses_sheet_relative_tiles() {
        let project = project();
        let canvas = render_spritemap(&project, &project.spritemaps[0]);
        assert_eq!(canvas.len(), 64);
        // Tile $101 is sheet tile 1 (color 2), palette row 2
        assert_eq!(canvas.get(-8, -8), Some(2 * 16 + 2));
        assert_eq!(canvas.get(-1, -1), Some(34));
        assert_eq!(canvas.get(0, 0), None);
    }

    #[test]
    fn test_canvas_image_is_centred() {
        let project = project();
        let canvas = render_spritemap(&project, &project.spritemaps[0]);
        let image = canvas_image(&canvas, vec![0; 128]).unwrap();
        assert_eq!((image.width, image.height), (16, 16));
        assert_eq!(image.index_at(0, 0), Some(34));
        assert_eq!(image.index_at(7, 7), Some(34));
        assert_eq!(image.index_at(8, 8), Some(0));

        assert!(canvas_image(&Canvas::new(), Vec::new()).is_none());
    }

    #[test]
    fn test_ext_spritemap_shifts_links_and_skips_unresolved() {
        let mut project = project();
        let ext = ExtendedSpritemap {
            name: "TestExtSpritemap_0_A0A000".to_string(),
            links: vec![
                SpritemapLink {
                    x: 8,
                    y: 8,
                    spritemap: Reference::Name("TestSpritemap_0_A08000".to_string()),
                    hitbox: Reference::Raw(0x9000),
                },
                SpritemapLink {
                    x: 0,
                    y: 0,
                    spritemap: Reference::Raw(0x8123),
                    hitbox: Reference::Raw(0x9000),
                },
            ],
        };
        project.ext_spritemaps.push(ext.clone());

        let canvas = render_ext_spritemap(&project, &ext);
        assert_eq!(canvas.len(), 64);
        assert_eq!(canvas.get(0, 0), Some(34));
        assert_eq!(canvas.get(-1, -1), None);
    }

    #[test]
    fn test_export_png_skips_empty_canvases() {
        let dir = tempfile::tempdir().unwrap();
        let project = project();
        let written = export_png(&project, dir.path()).unwrap();
        assert_eq!(written, 1);

        let image = read_png(&dir.path().join("TestSpritemap_0_A08000.png")).unwrap();
        assert_eq!((image.width, image.height), (16, 16));
        let palette = image.palette().unwrap();
        assert_eq!(palette.len(), 128);
        // Project palette loaded at row 2, entry 0 transparent
        assert_eq!(palette[32], 0);
        assert_eq!(palette[34], 0xFF00_0002);
        assert_eq!(palette[16], 0);
        assert_eq!(palette[17], 0xFF00_0000);
        assert!(!dir.path().join("TestSpritemap_1_A08007.png").exists());
    }

    #[test]
    fn test_tile_sheet_export_then_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.png");
        let original = project();
        export_tile_sheet(&original, &path).unwrap();

        let image = read_png(&path).unwrap();
        assert_eq!((image.width, image.height), (128, 8));
        assert_eq!(image.index_at(0, 0), Some(1));
        assert_eq!(image.index_at(24, 0), Some(4));
        assert_eq!(image.palette().unwrap()[0], 0x0000_0000);

        let mut imported = original.clone();
        imported.gfx.clear();
        imported.palette.clear();
        import_tiles(&mut imported, &path).unwrap();
        // The sheet is padded to a full row of 16 tiles
        assert_eq!(&imported.gfx[..original.gfx.len()], &original.gfx[..]);
        assert_eq!(imported.tile_count(), 16);
        assert_eq!(imported.palette, original.palette);
    }

    #[test]
    fn test_import_rejects_direct_color() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.png");
        {
            let file = std::fs::File::create(&path).unwrap();
            let mut encoder = png::Encoder::new(file, 8, 8);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0u8; 8 * 8 * 4]).unwrap();
        }

        let mut project = project();
        let before = project.clone();
        let err = import_tiles(&mut project, &path).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TileError>(),
            Some(&TileError::FormatMismatch { found: "RGBA" })
        );
        assert_eq!(project, before);
    }

    #[test]
    fn test_import_pads_palette() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.png");
        let image = RasterImage {
            width: 8,
            height: 8,
            data: PixelData::Indexed {
                pixels: vec![1; 64],
                palette: vec![0x0011_2233, 0x8044_5566],
            },
        };
        std::fs::write(&path, encode_indexed_png(&image).unwrap()).unwrap();

        let mut project = project();
        import_tiles(&mut project, &path).unwrap();
        assert_eq!(project.tile_count(), 1);
        assert_eq!(project.palette.len(), 16);
        assert_eq!(project.palette[0], 0xFF11_2233);
        assert_eq!(project.palette[1], 0xFF44_5566);
        assert_eq!(project.palette[2], 0xFF00_0000);
    }
}
