//! Indexed PNG reading and writing
//!
//! Palettes are `0xAARRGGBB`; on disk the color goes to PLTE and the alpha
//! to tRNS.

use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use sm_common::gfx::{PixelData, RasterImage};

/// PNG palettes hold at most 256 entries
const MAX_PALETTE: usize = 256;

fn write_indexed<W: Write>(writer: W, image: &RasterImage) -> Result<()> {
    let PixelData::Indexed { pixels, palette } = &image.data else {
        bail!("Expected an indexed image, got {}", image.format_name());
    };
    if pixels.len() != image.width as usize * image.height as usize {
        bail!(
            "Image is {}x{} but holds {} pixels",
            image.width,
            image.height,
            pixels.len()
        );
    }

    let palette = &palette[..palette.len().min(MAX_PALETTE)];
    let plte: Vec<u8> = palette
        .iter()
        .flat_map(|&color| [(color >> 16) as u8, (color >> 8) as u8, color as u8])
        .collect();
    let trns: Vec<u8> = palette.iter().map(|&color| (color >> 24) as u8).collect();

    let mut encoder = png::Encoder::new(writer, image.width, image.height);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);
    if !plte.is_empty() {
        encoder.set_palette(plte);
        encoder.set_trns(trns);
    }

    let mut writer = encoder
        .write_header()
        .context("Failed to write PNG header")?;
    writer
        .write_image_data(pixels)
        .context("Failed to write PNG image data")?;
    writer.finish().context("Failed to finish PNG")?;
    Ok(())
}

/// Encode an indexed image as an 8-bit paletted PNG
pub fn encode_indexed_png(image: &RasterImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    write_indexed(&mut bytes, image)?;
    Ok(bytes)
}

pub fn write_indexed_png(path: &Path, image: &RasterImage) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_indexed(BufWriter::new(file), image)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Decode a PNG without color conversion
///
/// Paletted images come back as [`PixelData::Indexed`] with one byte per
/// pixel whatever the bit depth; anything else is [`PixelData::Direct`] with
/// the raw samples.
pub fn decode_png(bytes: &[u8]) -> Result<RasterImage> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info().context("Failed to read PNG header")?;

    let mut buf = vec![0u8; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buf)
        .context("Failed to decode PNG image data")?;
    let buf = &buf[..frame.buffer_size()];
    let (width, height) = (frame.width, frame.height);

    let data = match frame.color_type {
        png::ColorType::Indexed => {
            let info = reader.info();
            let plte = info.palette.as_deref().unwrap_or_default();
            let trns = info.trns.as_deref().unwrap_or_default();
            let palette = plte
                .chunks_exact(3)
                .enumerate()
                .map(|(i, rgb)| {
                    let alpha = trns.get(i).copied().unwrap_or(0xFF);
                    u32::from_be_bytes([alpha, rgb[0], rgb[1], rgb[2]])
                })
                .collect();
            let pixels = unpack_indices(buf, width, height, frame.line_size, frame.bit_depth as u8);
            PixelData::Indexed { pixels, palette }
        }
        color_type => PixelData::Direct {
            channels: color_type.samples() as u8,
            samples: buf.to_vec(),
        },
    };

    Ok(RasterImage {
        width,
        height,
        data,
    })
}

pub fn read_png(path: &Path) -> Result<RasterImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    decode_png(&bytes).with_context(|| format!("Failed to decode {}", path.display()))
}

/// Expand packed 1/2/4/8-bit rows to one index per byte
fn unpack_indices(buf: &[u8], width: u32, height: u32, line_size: usize, depth: u8) -> Vec<u8> {
    let width = width as usize;
    if depth == 8 {
        return buf
            .chunks(line_size)
            .take(height as usize)
            .flat_map(|line| line[..width.min(line.len())].iter().copied())
            .collect();
    }

    let per_byte = usize::from(8 / depth);
    let mask = (1u8 << depth) - 1;
    let mut pixels = Vec::with_capacity(width * height as usize);
    for line in buf.chunks(line_size).take(height as usize) {
        for x in 0..width {
            let byte = line.get(x / per_byte).copied().unwrap_or(0);
            let shift = 8 - depth as usize * (x % per_byte + 1);
            pixels.push((byte >> shift) & mask);
        }
    }
    pixels
}
