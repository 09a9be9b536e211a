use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::StorageBackend;
use crate::error::{Result, StorageError};
use crate::router::CompositeStorage;
use crate::schema::StorageDomain;

/// Assembles a [`CompositeStorage`] from one backend per domain
///
/// Domains without an explicit backend fall back to `default_backend`.
/// `build` fails if any domain ends up with no backend at all.
pub struct CompositeStorageBuilder {
    default_backend: Option<Arc<dyn StorageBackend>>,
    domains: HashMap<StorageDomain, Arc<dyn StorageBackend>>,
}

impl CompositeStorageBuilder {
    pub fn new() -> Self {
        Self {
            default_backend: None,
            domains: HashMap::new(),
        }
    }

    pub fn default_backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.default_backend = Some(backend);
        self
    }

    pub fn domain(mut self, domain: StorageDomain, backend: Arc<dyn StorageBackend>) -> Self {
        self.domains.insert(domain, backend);
        self
    }

    pub fn traces(self, backend: Arc<dyn StorageBackend>) -> Self {
        self.domain(StorageDomain::Traces, backend)
    }

    pub fn conversations(self, backend: Arc<dyn StorageBackend>) -> Self {
        self.domain(StorageDomain::Conversations, backend)
    }

    pub fn workflows(self, backend: Arc<dyn StorageBackend>) -> Self {
        self.domain(StorageDomain::Workflows, backend)
    }

    pub fn scores(self, backend: Arc<dyn StorageBackend>) -> Self {
        self.domain(StorageDomain::Scores, backend)
    }

    pub fn build(self) -> Result<CompositeStorage> {
        let mut routes = HashMap::new();

        for domain in StorageDomain::ALL {
            let backend = self
                .domains
                .get(&domain)
                .or(self.default_backend.as_ref())
                .ok_or_else(|| StorageError::Unrouted(domain.to_string()))?;

            tracing::debug!(domain = %domain, backend = backend.name(), "Routing storage domain");
            for &table in domain.tables() {
                routes.insert(table, Arc::clone(backend));
            }
        }

        Ok(CompositeStorage::new(routes))
    }
}

impl Default for CompositeStorageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
