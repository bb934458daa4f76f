//! Output formats of an extraction job

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use sm_common::Project;

use crate::asm::export_asm;
use crate::render::{export_png, export_tile_sheet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// `<name>.json` project file
    Json,
    /// `<name>.asm` with `.gfx` and `.pal`
    Asm,
    /// One PNG per spritemap under `<name>/`
    Png,
    /// `<name>_tiles.png` tile sheet
    Sheet,
}

/// Write every requested format of `project` into `dir`
pub fn write_exports(project: &Project, dir: &Path, kinds: &[ExportKind]) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    for kind in kinds {
        match kind {
            ExportKind::Json => {
                let path = dir.join(format!("{}.json", project.name));
                project
                    .save(&path)
                    .with_context(|| format!("Failed to save {}", path.display()))?;
                tracing::info!("Saved {}", path.display());
            }
            ExportKind::Asm => export_asm(project, dir)?,
            ExportKind::Png => {
                export_png(project, &dir.join(&project.name))?;
            }
            ExportKind::Sheet => {
                export_tile_sheet(project, &dir.join(format!("{}_tiles.png", project.name)))?
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        #[derive(Deserialize)]
        struct Job {
            exports: Vec<ExportKind>,
        }
        let job: Job = toml::from_str(r#"exports = ["json", "asm", "png", "sheet"]"#).unwrap();
        assert_eq!(
            job.exports,
            vec![
                ExportKind::Json,
                ExportKind::Asm,
                ExportKind::Png,
                ExportKind::Sheet
            ]
        );
        assert!(toml::from_str::<Job>(r#"exports = ["gif"]"#).is_err());
    }

    #[test]
    fn test_write_exports() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::new("Foo", vec![0; 32], vec![0xFF00_0000; 16], 0, 0);
        write_exports(
            &project,
            dir.path(),
            &[ExportKind::Json, ExportKind::Asm, ExportKind::Png, ExportKind::Sheet],
        )
        .unwrap();

        let saved = Project::load(dir.path().join("Foo.json")).unwrap();
        assert_eq!(saved, project);
        assert!(dir.path().join("Foo.asm").exists());
        assert!(dir.path().join("Foo.gfx").exists());
        assert!(dir.path().join("Foo.pal").exists());
        assert!(dir.path().join("Foo").is_dir());
        assert!(dir.path().join("Foo_tiles.png").exists());
    }
}
