//! Folding a flat reference stream into package and version hierarchies.

use std::collections::{HashMap, HashSet};

use crate::model::{PackageSummary, RecipeEntry, Variant, VersionGroup};
use crate::reference::{ReferenceKey, ReferenceRecord};

/// Group references by package name.
///
/// The first sighting of a name seeds `latest_version`; a later reference
/// replaces it only when its version compares greater as a string, which makes
/// the pick the string maximum (`"9.0"` beats `"10.0"`). `created` comes from
/// the first sighting. `total_versions` counts the distinct references sharing
/// the name. The result is sorted case-insensitively by name.
pub fn summarize_packages<'a, I>(references: I) -> Vec<PackageSummary>
where
    I: IntoIterator<Item = &'a ReferenceRecord>,
{
    let mut summaries: Vec<PackageSummary> = Vec::new();
    let mut by_name: HashMap<&'a str, usize> = HashMap::new();
    let mut seen: HashSet<ReferenceKey<'a>> = HashSet::new();

    for reference in references {
        if !seen.insert(reference.key()) {
            continue;
        }
        match by_name.get(reference.name.as_str()) {
            Some(&index) => {
                let summary = &mut summaries[index];
                summary.total_versions += 1;
                if reference.version > summary.latest_version {
                    summary.latest_version = reference.version.clone();
                }
            }
            None => {
                by_name.insert(&reference.name, summaries.len());
                summaries.push(PackageSummary {
                    name: reference.name.clone(),
                    latest_version: reference.version.clone(),
                    total_versions: 1,
                    created_at: reference.created_at,
                });
            }
        }
    }

    summaries.sort_by_cached_key(|summary| summary.name.to_lowercase());
    summaries
}

/// Case-insensitive substring match of a package name against a search query.
/// An empty query matches every name.
pub fn matches_query(name: &str, query: &str) -> bool {
    query.is_empty() || name.to_lowercase().contains(&query.to_lowercase())
}

/// Group the references named exactly `name` by version.
///
/// Each reference contributes the variant for its `(user, channel)`, whether
/// it lists binaries or only the recipe. Variants sharing a `(user, channel)`
/// collapse into the first one seen. Versions are
/// sorted descending by string.
pub fn group_versions(name: &str, entries: &[RecipeEntry]) -> Vec<VersionGroup> {
    let mut order: Vec<&str> = Vec::new();
    let mut variants: HashMap<&str, Vec<Variant>> = HashMap::new();
    let mut seen: HashSet<(&str, Option<&str>, Option<&str>)> = HashSet::new();

    for entry in entries.iter().filter(|entry| entry.reference.name == name) {
        let reference = &entry.reference;
        let version = reference.version.as_str();
        let slot = variants.entry(version).or_insert_with(|| {
            order.push(version);
            Vec::new()
        });

        // Binaries and the recipe-only stand-in of a reference share its
        // (user, channel), so each reference adds at most one variant.
        let key = (version, reference.user.as_deref(), reference.channel.as_deref());
        if seen.insert(key) {
            slot.push(Variant::of(reference));
        }
    }

    let mut groups: Vec<VersionGroup> = order
        .into_iter()
        .filter_map(|version| {
            variants.remove(version).map(|variants| VersionGroup {
                version: version.to_owned(),
                total_variants: variants.len(),
                variants,
            })
        })
        .collect();
    groups.sort_by(|a, b| b.version.cmp(&a.version));
    groups
}
