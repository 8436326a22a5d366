//! Service registry - immutable service name to base address mapping

use std::collections::BTreeMap;

use tracing::{debug, info};
use url::Url;

use crate::error::DescriptorError;
use crate::store::DescriptorStore;

/// Name → base address lookup used to resolve forwarding targets.
///
/// Built once from the descriptor store and never mutated. Addresses are
/// stored without a trailing `/`.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: BTreeMap<String, String>,
}

impl ServiceRegistry {
    /// Build the registry from every descriptor that declares both a
    /// service name and an address. Descriptors missing either are skipped.
    pub fn from_store(store: &DescriptorStore) -> Result<Self, DescriptorError> {
        let entries = store.documents().iter().filter_map(|(doc_name, doc)| {
            let entry = doc.routing_entry();
            if entry.is_none() {
                debug!(document = %doc_name, "Descriptor has no routing entry, documentation only");
            }
            entry
        });
        let registry = Self::from_entries(entries)?;
        info!(services = registry.len(), "Service registry built");
        Ok(registry)
    }

    /// Build the registry from explicit (name, address) pairs
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, DescriptorError> {
        let mut services = BTreeMap::new();
        for (name, url) in entries {
            let address = validate_address(name, url)?;
            if services.insert(name.to_string(), address).is_some() {
                return Err(DescriptorError::DuplicateService(name.to_string()));
            }
        }
        Ok(Self { services })
    }

    /// Resolve a service name to its base address
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.services.get(name).map(String::as_str)
    }

    /// All registered service names, sorted
    pub fn names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    /// Iterate (name, address) pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.services
            .iter()
            .map(|(name, url)| (name.as_str(), url.as_str()))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Accept absolute http(s) URLs with a host and no path, query or fragment.
fn validate_address(service: &str, raw: &str) -> Result<String, DescriptorError> {
    let invalid = |reason: &str| DescriptorError::InvalidAddress {
        service: service.to_string(),
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(invalid("empty address"));
    }

    let parsed = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if parsed.path() != "/" || parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("address must not carry a path, query or fragment"));
    }

    Ok(trimmed.to_string())
}
