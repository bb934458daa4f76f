//! Assembly export
//!
//! Produces `<name>.asm` with one labelled `dw`/`db` block per record, plus
//! the raw tile sheet (`<name>.gfx`) and palette (`<name>.pal`) it includes.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use sm_common::gfx::encode_palette;
use sm_common::{ExtendedHitbox, ExtendedSpritemap, Project, Spritemap};

/// Render the `.asm` text of a project
pub fn render_asm(project: &Project) -> String {
    let name = &project.name;
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = write!(
        out,
        "{name}Gfx:\nincbin \"{name}.gfx\"\n\n{name}Pal:\nincbin \"{name}.pal\"\n"
    );

    for spritemap in &project.spritemaps {
        write_spritemap(&mut out, spritemap);
    }
    for hitbox in &project.ext_hitboxes {
        write_hitbox(&mut out, hitbox);
    }
    for ext in &project.ext_spritemaps {
        write_ext_spritemap(&mut out, ext);
    }

    out
}

fn write_label(out: &mut String, label: &str, count: usize) {
    let _ = write!(out, "\n{}:\ndw ${:04X}", label, count);
}

fn write_spritemap(out: &mut String, spritemap: &Spritemap) {
    write_label(out, &spritemap.name, spritemap.entries.len());
    if !spritemap.entries.is_empty() {
        let entries: Vec<String> = spritemap
            .entries
            .iter()
            .map(|entry| {
                entry
                    .to_bytes()
                    .iter()
                    .map(|byte| format!("${:02X}", byte))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect();
        let _ = write!(out, " : db {}", entries.join(", "));
    }
    out.push('\n');
}

fn write_hitbox(out: &mut String, hitbox: &ExtendedHitbox) {
    write_label(out, &hitbox.name, hitbox.boxes.len());
    for b in &hitbox.boxes {
        let _ = write!(
            out,
            ", {},{},{},{},${:04X},${:04X}",
            b.left, b.top, b.right, b.bottom, b.touch, b.shot
        );
    }
    out.push('\n');
}

fn write_ext_spritemap(out: &mut String, ext: &ExtendedSpritemap) {
    write_label(out, &ext.name, ext.links.len());
    for link in &ext.links {
        let _ = write!(
            out,
            ", {},{},{},{}",
            link.x, link.y, link.spritemap, link.hitbox
        );
    }
    out.push('\n');
}

/// Write `<name>.asm`, `<name>.gfx` and `<name>.pal` into `dir`
pub fn export_asm(project: &Project, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let asm_path = dir.join(format!("{}.asm", project.name));
    std::fs::write(&asm_path, render_asm(project))
        .with_context(|| format!("Failed to write {}", asm_path.display()))?;

    let gfx_path = dir.join(format!("{}.gfx", project.name));
    std::fs::write(&gfx_path, &project.gfx)
        .with_context(|| format!("Failed to write {}", gfx_path.display()))?;

    let pal_path = dir.join(format!("{}.pal", project.name));
    std::fs::write(&pal_path, encode_palette(&project.palette))
        .with_context(|| format!("Failed to write {}", pal_path.display()))?;

    tracing::info!(
        "Wrote {} ({} bytes of tiles, {} colors)",
        asm_path.display(),
        project.gfx.len(),
        project.palette.len()
    );
    Ok(())
}
