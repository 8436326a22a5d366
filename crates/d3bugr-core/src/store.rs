//! Descriptor store
//!
//! Loaded once at startup from a directory of JSON files and never mutated
//! afterwards. The file stem is the document name; `meta.json` holds the
//! gateway-wide [`MetaDocument`], every other file a [`ServiceDescriptor`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::descriptor::{MetaDocument, ServiceDescriptor};
use crate::error::DescriptorError;

/// Document name reserved for the gateway-wide meta document
pub const META_DOCUMENT: &str = "meta";

/// Immutable set of loaded descriptor documents
#[derive(Debug, Clone, Default)]
pub struct DescriptorStore {
    meta: Option<MetaDocument>,
    /// Service documents keyed by document name (file stem)
    documents: BTreeMap<String, ServiceDescriptor>,
}

impl DescriptorStore {
    /// Build a store from already-parsed documents
    pub fn from_documents(
        meta: Option<MetaDocument>,
        documents: impl IntoIterator<Item = (String, ServiceDescriptor)>,
    ) -> Self {
        Self {
            meta,
            documents: documents.into_iter().collect(),
        }
    }

    /// Load every `*.json` file in `dir` (non-recursive).
    ///
    /// Files are read in name order. Any unreadable or unparsable file
    /// aborts the load.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, DescriptorError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| DescriptorError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| DescriptorError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut store = Self::default();
        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
            else {
                continue;
            };
            let content = std::fs::read_to_string(&path).map_err(|source| DescriptorError::Io {
                path: path.clone(),
                source,
            })?;

            if name == META_DOCUMENT {
                store.meta = Some(parse(&path, &content)?);
            } else {
                let doc: ServiceDescriptor = parse(&path, &content)?;
                debug!(document = %name, service = ?doc.service, "Loaded descriptor");
                store.documents.insert(name, doc);
            }
        }

        info!(
            dir = %dir.display(),
            documents = store.documents.len(),
            meta = store.meta.is_some(),
            "Descriptor store loaded"
        );
        Ok(store)
    }

    /// Gateway-wide meta document, if one was loaded
    pub fn meta(&self) -> Option<&MetaDocument> {
        self.meta.as_ref()
    }

    /// All service documents keyed by document name
    pub fn documents(&self) -> &BTreeMap<String, ServiceDescriptor> {
        &self.documents
    }

    /// Documents that declare a service name, in document-name order
    pub fn services(&self) -> impl Iterator<Item = (&str, &ServiceDescriptor)> {
        self.documents
            .values()
            .filter_map(|doc| doc.service.as_deref().map(|name| (name, doc)))
    }

    /// Find the descriptor declaring `service`
    pub fn find_service(&self, service: &str) -> Option<&ServiceDescriptor> {
        self.services()
            .find(|(name, _)| *name == service)
            .map(|(_, doc)| doc)
    }

    /// Number of loaded service documents (meta excluded)
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn parse<T: serde::de::DeserializeOwned>(path: &Path, content: &str) -> Result<T, DescriptorError> {
    serde_json::from_str(content).map_err(|source| DescriptorError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
