//! The process-wide directory of signature algorithm providers.
//!
//! Explicitly constructed at application start and handed to consumers as a
//! [`RegistryRef`]; there is no hidden global. The registry also caches the
//! last bulk parameter refresh so late-registered providers and diagnostic
//! endpoints can read the records back.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::{
    error::NotFound,
    provider::{CurveInfo, Provider},
    source::{AlgorithmRecord, SourceData},
    ProviderError,
};

pub type RegistryRef = Arc<AlgorithmRegistry>;

#[derive(Default)]
struct Inner {
    providers: BTreeMap<String, Arc<Provider>>,
    default_algorithm: Option<String>,
    source_data: SourceData,
}

/// Directory of registered algorithm providers plus the default-algorithm
/// marker.
///
/// All mutation happens under one lock; provider curve maps have their own
/// snapshot discipline, so a bulk refresh never blocks in-flight sign or
/// verify calls.
#[derive(Default)]
pub struct AlgorithmRegistry {
    inner: RwLock<Inner>,
}

impl std::fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("AlgorithmRegistry")
            .field("providers", &inner.providers.keys().collect::<Vec<_>>())
            .field("default_algorithm", &inner.default_algorithm)
            .finish()
    }
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a provider under a name. The first registration becomes the
    /// default algorithm; re-registering a name replaces the provider.
    pub fn register(&self, name: impl Into<String>, provider: Provider) -> Arc<Provider> {
        let name = name.into();
        let provider = Arc::new(provider);
        let mut inner = self.inner.write();
        if inner.providers.insert(name.clone(), provider.clone()).is_some() {
            warn!(algorithm = %name, "algorithm already registered, replacing");
        }
        info!(algorithm = %name, "registered algorithm provider");
        if inner.default_algorithm.is_none() {
            info!(algorithm = %name, "set default algorithm");
            inner.default_algorithm = Some(name);
        }
        provider
    }

    /// [`register`](Self::register) under the provider's own algorithm name.
    pub fn register_provider(&self, provider: Provider) -> Arc<Provider> {
        let name = provider.algorithm_name();
        self.register(name, provider)
    }

    /// Remove a provider. If it was the default, any remaining provider
    /// takes over (or the default becomes unset).
    pub fn unregister(&self, name: &str) -> Result<(), NotFound> {
        let mut inner = self.inner.write();
        if inner.providers.remove(name).is_none() {
            return Err(NotFound { name: name.to_owned() });
        }
        if inner.default_algorithm.as_deref() == Some(name) {
            inner.default_algorithm = inner.providers.keys().next().cloned();
            info!(
                algorithm = %name,
                new_default = ?inner.default_algorithm,
                "unregistered the default algorithm"
            );
        }
        info!(algorithm = %name, "unregistered algorithm provider");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<Provider>, NotFound> {
        self.inner
            .read()
            .providers
            .get(name)
            .cloned()
            .ok_or_else(|| NotFound { name: name.to_owned() })
    }

    pub fn default_algorithm(&self) -> Option<Arc<Provider>> {
        let inner = self.inner.read();
        let name = inner.default_algorithm.as_ref()?;
        inner.providers.get(name).cloned()
    }

    pub fn default_algorithm_name(&self) -> Option<String> {
        self.inner.read().default_algorithm.clone()
    }

    pub fn set_default(&self, name: &str) -> Result<(), NotFound> {
        let mut inner = self.inner.write();
        if !inner.providers.contains_key(name) {
            return Err(NotFound { name: name.to_owned() });
        }
        info!(algorithm = %name, "set default algorithm");
        inner.default_algorithm = Some(name.to_owned());
        Ok(())
    }

    pub fn algorithm_names(&self) -> Vec<String> {
        self.inner.read().providers.keys().cloned().collect()
    }

    pub fn providers(&self) -> BTreeMap<String, Arc<Provider>> {
        self.inner.read().providers.clone()
    }

    /// Bulk parameter refresh: cache the records and re-configure every
    /// registered provider that has a matching record.
    ///
    /// Each provider's swap is atomic; a broken record aborts the refresh
    /// (providers already refreshed keep the new generation, the failing
    /// one keeps its previous map).
    pub fn set_source_data(&self, data: SourceData) -> Result<(), ProviderError> {
        let affected: Vec<(String, Arc<Provider>, AlgorithmRecord)> = {
            let mut inner = self.inner.write();
            info!(algorithms = data.len(), "loaded algorithm records from the parameter source");
            inner.source_data = data;
            inner
                .providers
                .iter()
                .filter_map(|(name, provider)| {
                    inner
                        .source_data
                        .get(name)
                        .map(|record| (name.clone(), provider.clone(), record.clone()))
                })
                .collect()
        };
        // configure outside the registry lock; providers have their own
        for (name, provider, record) in affected {
            info!(algorithm = %name, "refreshing provider from stored records");
            provider.configure(&record)?;
        }
        Ok(())
    }

    pub fn source_data(&self) -> SourceData {
        self.inner.read().source_data.clone()
    }

    pub fn algorithm_data(&self, name: &str) -> Option<AlgorithmRecord> {
        self.inner.read().source_data.get(name).cloned()
    }

    pub fn curve_data(&self, algorithm: &str, curve: &str) -> Option<crate::source::CurveRecord> {
        self.inner
            .read()
            .source_data
            .get(algorithm)
            .and_then(|record| record.curves.get(curve).cloned())
    }

    /// Linear scan for the first provider that supports the curve; returns
    /// it together with that curve's metadata.
    pub fn find_algorithm_for_curve(&self, curve_name: &str) -> Option<(Arc<Provider>, CurveInfo)> {
        let providers = self.providers();
        providers.into_values().find_map(|provider| {
            provider
                .curve_info(curve_name)
                .map(|info| (provider.clone(), info))
        })
    }
}
