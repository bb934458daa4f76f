//! In-memory raster images exchanged with the PNG layer

/// Pixel storage of a [`RasterImage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelData {
    /// One palette index per pixel, palette as `0xAARRGGBB`
    Indexed { pixels: Vec<u8>, palette: Vec<u32> },
    /// Direct color, `channels` samples per pixel (1 = gray, 2 = gray+alpha,
    /// 3 = RGB, 4 = RGBA)
    Direct { channels: u8, samples: Vec<u8> },
}

/// A decoded image, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub data: PixelData,
}

impl RasterImage {
    pub fn indexed(width: u32, height: u32, pixels: Vec<u8>, palette: Vec<u32>) -> Self {
        Self {
            width,
            height,
            data: PixelData::Indexed { pixels, palette },
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self.data, PixelData::Indexed { .. })
    }

    /// Palette index at `(x, y)`; `None` for direct color or outside the image
    pub fn index_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        match &self.data {
            PixelData::Indexed { pixels, .. } => {
                pixels.get(y as usize * self.width as usize + x as usize).copied()
            }
            PixelData::Direct { .. } => None,
        }
    }

    pub fn palette(&self) -> Option<&[u32]> {
        match &self.data {
            PixelData::Indexed { palette, .. } => Some(palette),
            PixelData::Direct { .. } => None,
        }
    }

    /// Short description of the pixel format, for error messages
    pub fn format_name(&self) -> &'static str {
        match self.data {
            PixelData::Indexed { .. } => "indexed",
            PixelData::Direct { channels: 1, .. } => "grayscale",
            PixelData::Direct { channels: 2, .. } => "grayscale with alpha",
            PixelData::Direct { channels: 3, .. } => "RGB",
            PixelData::Direct { .. } => "RGBA",
        }
    }
}
