//! Response shapes handed to the transport layer.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::filter::{BinaryFilter, FilterOptions, ReferenceFilter};
use crate::model::{BinaryRecord, PackageSummary, Settings, VersionGroup};
use crate::paginate::Page;
use crate::revision::RevisionInfo;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PackagesListResponse {
    pub packages: Vec<PackageSummary>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

impl From<Page<PackageSummary>> for PackagesListResponse {
    fn from(page: Page<PackageSummary>) -> Self {
        Self {
            packages: page.items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PackageVersionsResponse {
    pub package_name: String,
    pub versions: Vec<VersionGroup>,
    pub total_versions: usize,
}

impl PackageVersionsResponse {
    pub fn new(package_name: impl Into<String>, versions: Vec<VersionGroup>) -> Self {
        Self {
            package_name: package_name.into(),
            total_versions: versions.len(),
            versions,
        }
    }
}

/// Every predicate of a binaries request with the value it was served with.
/// `recipe_revision` is the resolved target when resolution happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AppliedFilters {
    pub recipe_revision: Option<String>,
    pub user: Option<String>,
    pub channel: Option<String>,
    pub os: Option<String>,
    pub arch: Option<String>,
    pub compiler: Option<String>,
    pub compiler_version: Option<String>,
    pub build_type: Option<String>,
}

impl AppliedFilters {
    pub fn new(references: &ReferenceFilter, binaries: &BinaryFilter) -> Self {
        Self {
            recipe_revision: references.revision.clone(),
            user: references.user.clone(),
            channel: references.channel.clone(),
            os: binaries.os.clone(),
            arch: binaries.arch.clone(),
            compiler: binaries.compiler.clone(),
            compiler_version: binaries.compiler_version.clone(),
            build_type: binaries.build_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PackageBinariesResponse {
    pub package_name: String,
    pub version: String,
    pub binaries: Vec<BinaryRecord>,
    pub revision_info: RevisionInfo,
    pub total_binaries: usize,
    pub filtered_by: AppliedFilters,
}

impl PackageBinariesResponse {
    pub fn new(
        package_name: impl Into<String>,
        version: impl Into<String>,
        binaries: Vec<BinaryRecord>,
        revision_info: RevisionInfo,
        filtered_by: AppliedFilters,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            version: version.into(),
            total_binaries: binaries.len(),
            binaries,
            revision_info,
            filtered_by,
        }
    }

    /// The answer for a version nothing matched.
    pub fn empty(
        package_name: impl Into<String>,
        version: impl Into<String>,
        filtered_by: AppliedFilters,
    ) -> Self {
        Self::new(
            package_name,
            version,
            Vec::new(),
            RevisionInfo::default(),
            filtered_by,
        )
    }
}

/// Sorted values per filter dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FilterDimensions {
    pub os: Vec<String>,
    pub arch: Vec<String>,
    pub compiler: Vec<String>,
    pub build_type: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PackageFilterOptionsResponse {
    pub package_name: String,
    pub version: String,
    pub filter_options: FilterDimensions,
    pub compiler_versions: BTreeMap<String, Vec<String>>,
}

impl PackageFilterOptionsResponse {
    pub fn new(
        package_name: impl Into<String>,
        version: impl Into<String>,
        options: FilterOptions,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            version: version.into(),
            filter_options: FilterDimensions {
                os: options.os.into_iter().collect(),
                arch: options.arch.into_iter().collect(),
                compiler: options.compiler.into_iter().collect(),
                build_type: options.build_type.into_iter().collect(),
            },
            compiler_versions: options
                .compiler_versions
                .into_iter()
                .map(|(compiler, versions)| (compiler, versions.into_iter().collect()))
                .collect(),
        }
    }
}

/// Configuration of a single binary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PackageDetail {
    pub name: String,
    pub version: String,
    pub user: Option<String>,
    pub channel: Option<String>,
    pub package_id: String,
    pub recipe_revision: Option<String>,
    pub settings: Settings,
    pub options: Settings,
    pub requires: Vec<String>,
    pub created: Option<f64>,
    pub path: String,
}

impl PackageDetail {
    pub fn new(name: impl Into<String>, version: impl Into<String>, binary: BinaryRecord) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            user: binary.user,
            channel: binary.channel,
            package_id: binary.package_id,
            recipe_revision: binary.recipe_revision,
            settings: binary.settings,
            options: binary.options,
            requires: binary.requires,
            created: binary.created_at,
            path: binary.path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paginate::Pagination;
    use serde_json::json;

    #[test]
    fn filtered_by_lists_every_predicate_even_when_unset() {
        let references = ReferenceFilter {
            revision: Some("r2".into()),
            ..Default::default()
        };
        let binaries = BinaryFilter {
            os: Some("Linux".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(AppliedFilters::new(&references, &binaries)).unwrap();
        assert_eq!(
            value,
            json!({
                "recipe_revision": "r2",
                "user": null,
                "channel": null,
                "os": "Linux",
                "arch": null,
                "compiler": null,
                "compiler_version": null,
                "build_type": null,
            })
        );
    }

    #[test]
    fn package_list_carries_pre_slice_total() {
        let summaries: Vec<PackageSummary> = (0..10)
            .map(|i| PackageSummary {
                name: format!("pkg{i}"),
                latest_version: "1.0".into(),
                total_versions: 1,
                created_at: None,
            })
            .collect();
        let response: PackagesListResponse =
            Pagination::new(5, 20).unwrap().paginate(&summaries).into();
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value, json!({ "packages": [], "total": 10, "page": 5, "per_page": 20 }));
    }

    #[test]
    fn filter_options_serialize_as_sorted_lists() {
        let mut options = FilterOptions::default();
        options.observe(&Settings::from([
            ("os".to_owned(), "Windows".to_owned()),
            ("compiler".to_owned(), "msvc".to_owned()),
            ("compiler.version".to_owned(), "193".to_owned()),
        ]));
        options.observe(&Settings::from([("os".to_owned(), "Linux".to_owned())]));

        let value = serde_json::to_value(PackageFilterOptionsResponse::new("foo", "1.0", options)).unwrap();
        assert_eq!(value["filter_options"]["os"], json!(["Linux", "Windows"]));
        assert_eq!(value["filter_options"]["arch"], json!([]));
        assert_eq!(value["compiler_versions"], json!({ "msvc": ["193"] }));
    }
}
