//! Template lookup by id

use attendfill_templates::{BuiltinTemplate, TemplateError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Failure to fetch a template
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unknown template: {0:?}")]
    NotFound(String),

    #[error("Invalid template id: {0:?}")]
    InvalidId(String),

    #[error("Failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Build(#[from] TemplateError),
}

/// Source of template workbooks
pub trait TemplateCatalog {
    /// Raw `.xlsx` bytes for a template id
    fn fetch(&self, id: &str) -> Result<Vec<u8>, CatalogError>;

    /// Ids this catalog can serve, where it can enumerate them
    fn ids(&self) -> Vec<String> {
        Vec::new()
    }
}

/// The templates generated by `attendfill-templates`
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinCatalog;

impl TemplateCatalog for BuiltinCatalog {
    fn fetch(&self, id: &str) -> Result<Vec<u8>, CatalogError> {
        let template = BuiltinTemplate::from_id(id).ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        debug!(id = template.id(), "building built-in template");
        Ok(template.build()?)
    }

    fn ids(&self) -> Vec<String> {
        BuiltinTemplate::ALL.iter().map(|t| t.id().to_string()).collect()
    }
}

/// `<root>/<id>.xlsx`
#[derive(Clone, Debug)]
pub struct DirectoryCatalog {
    root: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, CatalogError> {
        let id = id.trim();
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !id.starts_with('.');
        if !valid {
            return Err(CatalogError::InvalidId(id.to_string()));
        }
        let file = if id.to_ascii_lowercase().ends_with(".xlsx") {
            id.to_string()
        } else {
            format!("{id}.xlsx")
        };
        Ok(self.root.join(file))
    }
}

impl TemplateCatalog for DirectoryCatalog {
    fn fetch(&self, id: &str) -> Result<Vec<u8>, CatalogError> {
        let path = self.path_for(id)?;
        debug!(path = %path.display(), "reading template");
        std::fs::read(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => CatalogError::NotFound(id.to_string()),
            _ => CatalogError::Io { path, source },
        })
    }

    fn ids(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut ids: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().into_owned();
                name.strip_suffix(".xlsx").map(str::to_string)
            })
            .collect();
        ids.sort();
        ids
    }
}

/// Directory templates first, then the built-in ones
#[derive(Clone, Debug)]
pub struct LayeredCatalog {
    directory: Option<DirectoryCatalog>,
}

impl LayeredCatalog {
    pub fn new(directory: Option<DirectoryCatalog>) -> Self {
        Self { directory }
    }
}

impl TemplateCatalog for LayeredCatalog {
    fn fetch(&self, id: &str) -> Result<Vec<u8>, CatalogError> {
        if let Some(directory) = &self.directory {
            match directory.fetch(id) {
                Err(CatalogError::NotFound(_)) => {}
                other => return other,
            }
        }
        BuiltinCatalog.fetch(id)
    }

    fn ids(&self) -> Vec<String> {
        let mut ids = self.directory.as_ref().map(|d| d.ids()).unwrap_or_default();
        for id in BuiltinCatalog.ids() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}
