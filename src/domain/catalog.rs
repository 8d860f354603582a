//! Catalog Resources
//!
//! The reorderable catalog lists and the parent scope each one is ordered within.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A catalog list whose entries carry a `sortOrder` within a parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogResource {
    /// Products within a subcategory
    Product,
    /// Download categories within a product
    DownloadCategory,
    /// Sub-brand categories within a brand
    SubBrandCategory,
    /// Shareable assets within a brand
    ShareableAsset,
}

impl CatalogResource {
    pub const ALL: [CatalogResource; 4] = [
        CatalogResource::Product,
        CatalogResource::DownloadCategory,
        CatalogResource::SubBrandCategory,
        CatalogResource::ShareableAsset,
    ];

    /// REST collection path segment
    pub fn path(&self) -> &'static str {
        match self {
            CatalogResource::Product => "products",
            CatalogResource::DownloadCategory => "download-categories",
            CatalogResource::SubBrandCategory => "sub-brand-categories",
            CatalogResource::ShareableAsset => "shareable-assets",
        }
    }

    /// What the parent id refers to
    pub fn parent_label(&self) -> &'static str {
        match self {
            CatalogResource::Product => "subcategory",
            CatalogResource::DownloadCategory => "product",
            CatalogResource::SubBrandCategory | CatalogResource::ShareableAsset => "brand",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.path() == path)
    }
}

/// Resequencing domain: one resource list under one parent.
///
/// Positions are unique only within a scope. Screens pass this in explicitly
/// instead of reading a shared "selected entity".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeContext {
    pub resource: CatalogResource,
    pub parent_id: String,
}

impl ScopeContext {
    pub fn new(resource: CatalogResource, parent_id: impl Into<String>) -> Self {
        Self {
            resource,
            parent_id: parent_id.into(),
        }
    }

    pub fn products_in(subcategory_id: impl Into<String>) -> Self {
        Self::new(CatalogResource::Product, subcategory_id)
    }

    pub fn download_categories_of(product_id: impl Into<String>) -> Self {
        Self::new(CatalogResource::DownloadCategory, product_id)
    }

    pub fn sub_brand_categories_of(brand_id: impl Into<String>) -> Self {
        Self::new(CatalogResource::SubBrandCategory, brand_id)
    }

    pub fn shareable_assets_of(brand_id: impl Into<String>) -> Self {
        Self::new(CatalogResource::ShareableAsset, brand_id)
    }
}

impl fmt::Display for ScopeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource.path(), self.parent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_round_trip() {
        for resource in CatalogResource::ALL {
            assert_eq!(CatalogResource::from_path(resource.path()), Some(resource));
        }
        assert_eq!(CatalogResource::from_path("brands"), None);
    }

    #[test]
    fn test_scope_display() {
        let scope = ScopeContext::download_categories_of("p-7");
        assert_eq!(scope.to_string(), "download-categories:p-7");
        assert_eq!(scope.resource.parent_label(), "product");
    }

    #[test]
    fn test_scope_serializes_camel_case() {
        let scope = ScopeContext::products_in("sub-1");
        let json = serde_json::to_value(&scope).unwrap();
        assert_eq!(json, serde_json::json!({"resource": "product", "parentId": "sub-1"}));
    }
}
