//! Joining listed binaries with their separately fetched configurations.

use std::collections::HashSet;

use crate::model::{BinaryRecord, ConfigurationMap, RecipeEntry};

/// Build the binary records of one reference.
///
/// Every listed package id appears exactly once, in listing order. A package
/// id without a configuration keeps empty settings, options and requires. A
/// reference listing no binaries yields a single recipe-only record.
pub fn join_binaries(entry: &RecipeEntry, configurations: &ConfigurationMap) -> Vec<BinaryRecord> {
    let reference = &entry.reference;
    if entry.packages.is_empty() {
        return vec![BinaryRecord::recipe_only(reference)];
    }

    let mut seen = HashSet::new();
    entry
        .packages
        .iter()
        .filter(|package| seen.insert(package.package_id.as_str()))
        .map(|package| {
            let configuration = configurations
                .get(&package.package_id)
                .cloned()
                .unwrap_or_default();
            BinaryRecord {
                package_id: package.package_id.clone(),
                user: reference.user.clone(),
                channel: reference.channel.clone(),
                revision: package.revision.clone(),
                recipe_revision: reference.revision.clone(),
                settings: configuration.settings,
                options: configuration.options,
                requires: configuration.requires,
                created_at: package.created_at.or(reference.created_at),
                path: reference.binary_path(&package.package_id),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BinaryConfiguration, RECIPE_ONLY_PACKAGE_ID, Settings};
    use crate::reference::ReferenceRecord;

    fn linux() -> BinaryConfiguration {
        BinaryConfiguration {
            settings: Settings::from([("os".to_owned(), "Linux".to_owned())]),
            options: Settings::from([("shared".to_owned(), "True".to_owned())]),
            requires: vec!["zlib/1.3".to_owned()],
        }
    }

    #[test]
    fn configured_binary_carries_its_metadata() {
        let entry = RecipeEntry::new(ReferenceRecord::new("foo", "1.0").with_revision("r1"))
            .with_packages(["p1"]);
        let configurations = ConfigurationMap::from([("p1".to_owned(), linux())]);

        let binaries = join_binaries(&entry, &configurations);
        assert_eq!(binaries.len(), 1);
        assert_eq!(binaries[0].setting("os"), Some("Linux"));
        assert_eq!(binaries[0].options["shared"], "True");
        assert_eq!(binaries[0].requires, ["zlib/1.3"]);
        assert_eq!(binaries[0].recipe_revision.as_deref(), Some("r1"));
        assert_eq!(binaries[0].path, "foo/1.0:p1");
    }

    #[test]
    fn unmatched_binary_is_kept_with_empty_metadata() {
        let entry = RecipeEntry::new(ReferenceRecord::new("foo", "1.0")).with_packages(["p1", "p2"]);
        let configurations = ConfigurationMap::from([("p1".to_owned(), linux())]);

        let binaries = join_binaries(&entry, &configurations);
        assert_eq!(binaries.len(), 2);
        let orphan = &binaries[1];
        assert_eq!(orphan.package_id, "p2");
        assert!(orphan.settings.is_empty());
        assert!(orphan.options.is_empty());
        assert!(orphan.requires.is_empty());
    }

    #[test]
    fn empty_configuration_map_degrades_every_binary() {
        let entry = RecipeEntry::new(ReferenceRecord::new("foo", "1.0")).with_packages(["p1", "p2"]);
        let binaries = join_binaries(&entry, &ConfigurationMap::new());
        assert_eq!(binaries.len(), 2);
        assert!(binaries.iter().all(|b| b.settings.is_empty()));
    }

    #[test]
    fn duplicate_package_ids_are_emitted_once() {
        let entry = RecipeEntry::new(ReferenceRecord::new("foo", "1.0")).with_packages(["p1", "p1"]);
        assert_eq!(join_binaries(&entry, &ConfigurationMap::new()).len(), 1);
    }

    #[test]
    fn recipe_without_binaries_yields_placeholder() {
        let entry = RecipeEntry::new(
            ReferenceRecord::new("foo", "1.0")
                .with_user_channel(Some("acme".into()), Some("stable".into())),
        );
        let binaries = join_binaries(&entry, &ConfigurationMap::new());
        assert_eq!(binaries.len(), 1);
        assert_eq!(binaries[0].package_id, RECIPE_ONLY_PACKAGE_ID);
        assert_eq!(binaries[0].path, "foo/1.0@acme/stable");
        assert_eq!(binaries[0].revision, None);
    }
}
