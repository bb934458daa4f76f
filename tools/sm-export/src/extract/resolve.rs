//! Cross-reference resolution between extracted tables
//!
//! Extended spritemap links hold bank-relative pointers. A pointer is
//! combined with the bank of the range the target table chain was walked
//! from and looked up among the tables that were actually extracted.

use hashbrown::HashMap;
use sm_common::{ExtendedHitbox, ExtendedSpritemap, Reference, Spritemap};

use super::{Located, TableRange};

/// Outcome of a resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub resolved: usize,
    pub unresolved: usize,
}

/// Replace raw link pointers with record names where a record exists
///
/// A hitbox reached through a link whose spritemap also resolved is tagged
/// with that spritemap's name; when several links reach the same hitbox the
/// last one wins. Pointers with no matching record stay raw.
pub fn resolve_references(
    spritemaps: &[Located<Spritemap>],
    spritemap_range: TableRange,
    hitboxes: &mut [Located<ExtendedHitbox>],
    hitbox_range: Option<TableRange>,
    ext_spritemaps: &mut [Located<ExtendedSpritemap>],
) -> ResolveStats {
    let spritemap_names: HashMap<u32, &str> = spritemaps
        .iter()
        .map(|s| (s.address, s.record.name.as_str()))
        .collect();
    let hitbox_index: HashMap<u32, usize> = hitboxes
        .iter()
        .enumerate()
        .map(|(i, h)| (h.address, i))
        .collect();

    let mut stats = ResolveStats::default();

    for ext in ext_spritemaps.iter_mut() {
        for link in ext.record.links.iter_mut() {
            if let Reference::Raw(pointer) = link.spritemap {
                let address = spritemap_range.bank() + u32::from(pointer);
                if let Some(&name) = spritemap_names.get(&address) {
                    link.spritemap = Reference::Name(name.to_string());
                }
            }

            if let Reference::Raw(pointer) = link.hitbox {
                let target = hitbox_range
                    .map(|range| range.bank() + u32::from(pointer))
                    .and_then(|address| hitbox_index.get(&address).copied());
                if let Some(index) = target {
                    let hitbox = &mut hitboxes[index].record;
                    link.hitbox = Reference::Name(hitbox.name.clone());
                    if let Some(name) = link.spritemap.name() {
                        hitbox.spritemap = Some(name.to_string());
                    }
                }
            }

            for reference in [&link.spritemap, &link.hitbox] {
                if reference.is_resolved() {
                    stats.resolved += 1;
                } else {
                    stats.unresolved += 1;
                    tracing::debug!("{}: unresolved reference {}", ext.record.name, reference);
                }
            }
        }
    }

    stats
}
