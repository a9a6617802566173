//! Model catalog backing the viewer's model selector
//!
//! The catalog is built from configuration at startup. Scene-graph work
//! (loading the asset, swapping the subtree, placing the panel) happens in
//! the rendering layer; this side only decides which model is selectable and
//! whether its asset file is actually present.

use crate::config::{ModelItem, ModelsConfig};
use std::path::{Path, PathBuf};

/// A selectable model resolved from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    pub id: String,
    pub label: String,
    pub asset: String,
    pub panel_anchor: Option<String>,
}

impl From<&ModelItem> for ModelEntry {
    fn from(item: &ModelItem) -> Self {
        Self {
            id: item.id.clone(),
            label: item.label.clone(),
            asset: item.asset.clone(),
            panel_anchor: item.panel_anchor.clone(),
        }
    }
}

/// The set of models the viewer can switch between
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    assets_dir: PathBuf,
    entries: Vec<ModelEntry>,
}

impl ModelCatalog {
    /// Build the catalog from the models section of the configuration
    pub fn from_config(config: &ModelsConfig) -> Self {
        Self {
            assets_dir: PathBuf::from(&config.assets_dir),
            entries: config.items.iter().map(ModelEntry::from).collect(),
        }
    }

    /// Look up a model by id
    pub fn get(&self, id: &str) -> Option<&ModelEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// All selectable models, in configuration order
    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    /// Path the entry's asset resolves to
    pub fn asset_path(&self, entry: &ModelEntry) -> PathBuf {
        self.assets_dir.join(&entry.asset)
    }

    /// Whether the entry's asset file exists on disk
    pub fn asset_available(&self, entry: &ModelEntry) -> bool {
        self.asset_path(entry).is_file()
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelsConfig;

    #[test]
    fn lookup_by_id() {
        let catalog = ModelCatalog::from_config(&ModelsConfig::default());
        assert!(catalog.get("turbine").is_some());
        assert!(catalog.get("flux-capacitor").is_none());
        assert_eq!(catalog.entries().len(), 2);
    }

    #[test]
    fn asset_paths_resolve_under_assets_dir() {
        let catalog = ModelCatalog::from_config(&ModelsConfig::default());
        let entry = catalog.get("turbine").unwrap().clone();
        assert!(catalog.asset_path(&entry).ends_with("turbine.glb"));
    }
}
