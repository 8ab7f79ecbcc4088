//! Filter discovery and application.
//!
//! Discovery collects the distinct values of each filterable setting across a
//! binary set. Application narrows a binary set by exact string equality on
//! the supplied predicates; a binary lacking a targeted setting never matches.
//!
//! Revision, user and channel are filtered earlier, on references, by
//! [`ReferenceFilter`].

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::model::{BinaryRecord, RECIPE_ONLY_PACKAGE_ID, RecipeEntry, Settings};

/// Setting keys read by the filter engine.
pub mod keys {
    pub const OS: &str = "os";
    pub const ARCH: &str = "arch";
    pub const COMPILER: &str = "compiler";
    pub const COMPILER_VERSION: &str = "compiler.version";
    pub const BUILD_TYPE: &str = "build_type";
}

/// The values available for each filter dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub os: BTreeSet<String>,
    pub arch: BTreeSet<String>,
    pub compiler: BTreeSet<String>,
    pub build_type: BTreeSet<String>,
    /// Versions seen for each compiler.
    pub compiler_versions: BTreeMap<String, BTreeSet<String>>,
}

impl FilterOptions {
    pub fn discover<'a, I>(binaries: I) -> Self
    where
        I: IntoIterator<Item = &'a BinaryRecord>,
    {
        let mut options = Self::default();
        for binary in binaries {
            options.observe(&binary.settings);
        }
        options
    }

    /// Fold one binary's settings in. Absent and empty values are ignored.
    pub fn observe(&mut self, settings: &Settings) {
        let value = |key: &str| settings.get(key).filter(|v| !v.is_empty()).cloned();

        if let Some(os) = value(keys::OS) {
            self.os.insert(os);
        }
        if let Some(arch) = value(keys::ARCH) {
            self.arch.insert(arch);
        }
        if let Some(build_type) = value(keys::BUILD_TYPE) {
            self.build_type.insert(build_type);
        }
        if let Some(compiler) = value(keys::COMPILER) {
            if let Some(version) = value(keys::COMPILER_VERSION) {
                self.compiler_versions
                    .entry(compiler.clone())
                    .or_default()
                    .insert(version);
            }
            self.compiler.insert(compiler);
        }
    }
}

/// Requested setting predicates. Unset and empty predicates impose nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BinaryFilter {
    pub os: Option<String>,
    pub arch: Option<String>,
    pub compiler: Option<String>,
    pub compiler_version: Option<String>,
    pub build_type: Option<String>,
}

impl BinaryFilter {
    fn predicates(&self) -> [(&'static str, Option<&str>); 5] {
        fn supplied(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.is_empty())
        }
        [
            (keys::OS, supplied(&self.os)),
            (keys::ARCH, supplied(&self.arch)),
            (keys::COMPILER, supplied(&self.compiler)),
            (keys::COMPILER_VERSION, supplied(&self.compiler_version)),
            (keys::BUILD_TYPE, supplied(&self.build_type)),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.predicates().iter().all(|(_, wanted)| wanted.is_none())
    }

    pub fn matches(&self, binary: &BinaryRecord) -> bool {
        self.predicates().into_iter().all(|(key, wanted)| match wanted {
            Some(wanted) => binary.setting(key) == Some(wanted),
            None => true,
        })
    }

    /// Keep the binaries matching every predicate. Recipe-only rows stand
    /// for the recipe itself and are always kept.
    pub fn apply(&self, binaries: Vec<BinaryRecord>) -> Vec<BinaryRecord> {
        if self.is_empty() {
            return binaries;
        }
        binaries
            .into_iter()
            .filter(|b| b.package_id == RECIPE_ONLY_PACKAGE_ID || self.matches(b))
            .collect()
    }
}

/// Reference-level predicates applied before binaries are expanded.
///
/// `user` and `channel` are tri-state: `None` imposes nothing, `Some("")`
/// keeps only references without a value, `Some(v)` requires equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceFilter {
    pub revision: Option<String>,
    pub user: Option<String>,
    pub channel: Option<String>,
}

impl ReferenceFilter {
    pub fn matches(&self, entry: &RecipeEntry) -> bool {
        let reference = &entry.reference;
        if let Some(revision) = self.revision.as_deref() {
            if reference.revision.as_deref() != Some(revision) {
                return false;
            }
        }
        tri_state(self.user.as_deref(), reference.user.as_deref())
            && tri_state(self.channel.as_deref(), reference.channel.as_deref())
    }

    pub fn retain(&self, entries: Vec<RecipeEntry>) -> Vec<RecipeEntry> {
        entries.into_iter().filter(|e| self.matches(e)).collect()
    }
}

fn tri_state(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some("") => actual.is_none_or(str::is_empty),
        Some(wanted) => actual == Some(wanted),
    }
}
