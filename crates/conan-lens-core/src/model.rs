//! Entities shared by the grouping, join and filter stages.
//!
//! Everything here is a read-only projection of the registry state at request
//! time; nothing is kept once a response has been assembled.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::reference::ReferenceRecord;

/// Free-form `key -> value` map used for settings and options.
///
/// Keys are never interpreted beyond the handful the filter engine reads, so
/// new setting names pass through untouched.
pub type Settings = BTreeMap<String, String>;

/// Package id of the placeholder row emitted for a recipe without binaries.
pub const RECIPE_ONLY_PACKAGE_ID: &str = "recipe-only";

/// One binary identifier listed by the registry under a reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRef {
    pub package_id: String,
    /// Package revision, when the registry reports it.
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default)]
    pub created_at: Option<f64>,
}

impl PackageRef {
    pub fn new(package_id: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            revision: None,
            created_at: None,
        }
    }
}

/// An enumerated reference together with the binaries listed under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeEntry {
    pub reference: ReferenceRecord,
    #[serde(default)]
    pub packages: Vec<PackageRef>,
}

impl RecipeEntry {
    pub fn new(reference: ReferenceRecord) -> Self {
        Self {
            reference,
            packages: Vec::new(),
        }
    }

    pub fn with_packages<I, S>(mut self, package_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages
            .extend(package_ids.into_iter().map(PackageRef::new));
        self
    }
}

/// Settings, options and requirements of one binary, fetched separately from
/// the reference listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryConfiguration {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub options: Settings,
    #[serde(default)]
    pub requires: Vec<String>,
}

/// `package_id -> configuration` for a single reference.
pub type ConfigurationMap = HashMap<String, BinaryConfiguration>;

/// A binary joined with its configuration and reference context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BinaryRecord {
    pub package_id: String,
    pub user: Option<String>,
    pub channel: Option<String>,
    /// Package revision.
    pub revision: Option<String>,
    pub recipe_revision: Option<String>,
    pub settings: Settings,
    pub options: Settings,
    pub requires: Vec<String>,
    #[serde(rename = "created")]
    pub created_at: Option<f64>,
    pub path: String,
}

impl BinaryRecord {
    /// Placeholder for a reference that has no built binaries.
    pub fn recipe_only(reference: &ReferenceRecord) -> Self {
        Self {
            package_id: RECIPE_ONLY_PACKAGE_ID.to_owned(),
            user: reference.user.clone(),
            channel: reference.channel.clone(),
            revision: None,
            recipe_revision: reference.revision.clone(),
            settings: Settings::new(),
            options: Settings::new(),
            requires: Vec::new(),
            created_at: reference.created_at,
            path: reference.path(),
        }
    }

    /// A setting value, treating an empty string as absent.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// One entry of the package list: everything known about a package name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PackageSummary {
    pub name: String,
    pub latest_version: String,
    pub total_versions: usize,
    #[serde(rename = "created")]
    pub created_at: Option<f64>,
}

/// A distinct `(user, channel)` under one package version.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Variant {
    pub user: Option<String>,
    pub channel: Option<String>,
    pub path: String,
    #[serde(rename = "created")]
    pub created_at: Option<f64>,
}

impl Variant {
    pub fn of(reference: &ReferenceRecord) -> Self {
        Self {
            user: reference.user.clone(),
            channel: reference.channel.clone(),
            path: reference.path(),
            created_at: reference.created_at,
        }
    }
}

/// All variants of one `(name, version)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VersionGroup {
    pub version: String,
    pub variants: Vec<Variant>,
    pub total_variants: usize,
}
