//! Project files: everything one extraction produced, as JSON
//!
//! The tile sheet is stored base64 encoded; colors are `0xAARRGGBB` integers.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::{ExtendedHitbox, ExtendedSpritemap, Spritemap};

/// Value of the `game` field for Super Metroid projects
pub const GAME_TAG: &str = "sm";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Failed to access project file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported game '{0}' (expected '{GAME_TAG}')")]
    UnsupportedGame(String),
}

/// The output of one extraction pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub game: String,
    pub name: String,
    /// Raw 4bpp tile sheet
    #[serde(serialize_with = "to_base64", deserialize_with = "from_base64")]
    pub gfx: Vec<u8>,
    /// `0xAARRGGBB`, 16 colors per row
    pub palette: Vec<u32>,
    /// Tile number of the first tile in `gfx`
    pub gfx_offset: u16,
    /// Palette row that `palette` is loaded into
    pub palette_offset: u8,
    pub spritemaps: Vec<Spritemap>,
    #[serde(default)]
    pub ext_hitboxes: Vec<ExtendedHitbox>,
    #[serde(default)]
    pub ext_spritemaps: Vec<ExtendedSpritemap>,
}

/// Name used by the extractor API
pub type ExtractionResult = Project;

impl Project {
    /// Empty project around a tile sheet and palette
    pub fn new(
        name: impl Into<String>,
        gfx: Vec<u8>,
        palette: Vec<u32>,
        gfx_offset: u16,
        palette_offset: u8,
    ) -> Self {
        Self {
            game: GAME_TAG.to_string(),
            name: name.into(),
            gfx,
            palette,
            gfx_offset,
            palette_offset,
            spritemaps: Vec::new(),
            ext_hitboxes: Vec::new(),
            ext_spritemaps: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        let project: Self = serde_json::from_str(json)?;
        if project.game != GAME_TAG {
            return Err(ProjectError::UnsupportedGame(project.game));
        }
        Ok(project)
    }

    /// Pretty JSON with one-space indentation
    pub fn to_json(&self) -> Result<String, ProjectError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only ever writes UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn spritemap(&self, name: &str) -> Option<&Spritemap> {
        self.spritemaps.iter().find(|s| s.name == name)
    }

    /// Number of complete 8x8 tiles in the sheet
    pub fn tile_count(&self) -> usize {
        self.gfx.len() / crate::gfx::TILE_BYTES
    }
}

fn to_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

fn from_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    use serde::de::Error as _;
    let text = String::deserialize(deserializer)?;
    STANDARD.decode(text.as_bytes()).map_err(D::Error::custom)
}
