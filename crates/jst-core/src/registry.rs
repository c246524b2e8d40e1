//! Provider registry
//!
//! The registry is an ordered list of providers built at call time from the
//! default set plus caller-supplied extensions. Registration order is the
//! automatic execution order and the order in which collection references
//! expand.
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use crate::options::ProviderRef;
use crate::provider::Provider;
use crate::providers::default_providers;
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Ordered, immutable-once-built set of providers
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults first, then `extra` in the order given
    ///
    /// Fails if two providers share a name.
    pub fn build<D, E>(defaults: D, extra: E) -> Result<Self>
    where
        D: IntoIterator<Item = Arc<dyn Provider>>,
        E: IntoIterator<Item = Arc<dyn Provider>>,
    {
        let mut registry = Self::new();
        for provider in defaults.into_iter().chain(extra) {
            registry.register(provider)?;
        }
        Ok(registry)
    }

    /// The built-in default provider set
    pub fn with_defaults() -> Self {
        Self {
            providers: default_providers(),
        }
    }

    /// The default set supplemented with caller providers
    pub fn with_extra<E>(extra: E) -> Result<Self>
    where
        E: IntoIterator<Item = Arc<dyn Provider>>,
    {
        Self::build(default_providers(), extra)
    }

    /// Append a provider after everything registered so far
    pub fn register(&mut self, provider: Arc<dyn Provider>) -> Result<()> {
        if self.find(provider.name()).is_some() {
            return Err(Error::configuration(format!(
                "Provider '{}' is already registered",
                provider.name()
            )));
        }
        self.providers.push(provider);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers.iter()
    }

    pub fn as_slice(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn find(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    /// Every provider tagged with `collection`, in registry order
    pub fn collection(&self, collection: &str) -> Vec<Arc<dyn Provider>> {
        select(&self.providers, &ProviderRef::Collection(collection.to_string()))
    }

    /// Expand one reference against the registry
    ///
    /// An unknown name or an empty collection yields nothing.
    pub fn resolve(&self, reference: &ProviderRef) -> Vec<Arc<dyn Provider>> {
        select(&self.providers, reference)
    }
}

/// Expand a reference against an arbitrary provider pool
pub(crate) fn select(pool: &[Arc<dyn Provider>], reference: &ProviderRef) -> Vec<Arc<dyn Provider>> {
    match reference {
        ProviderRef::Named(name) => pool
            .iter()
            .find(|p| p.name() == name)
            .cloned()
            .into_iter()
            .collect(),
        ProviderRef::Collection(tag) => pool
            .iter()
            .filter(|p| p.collection() == Some(tag.as_str()))
            .cloned()
            .collect(),
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
