//! Pipeline planning
//!
//! Decides which providers a field runs and in what order. In decreasing
//! precedence a field's pipeline comes from:
//!
//! 1. a conversion directive naming exactly one provider, which must exist;
//! 2. an explicit `pipeline` reference list, concatenated in declared order;
//! 3. `start` / `end` segments cut out of the registry order;
//! 4. the full registry, unmodified.
//!
//! Plans are recomputed for every field of every call and never cached.
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use crate::context::ExecutionContext;
use crate::options::{ProviderRef, TranslationOptions};
use crate::provider::Provider;
use crate::registry::{select, ProviderRegistry};
use crate::schema::Conversion;
use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;

/// Concrete ordered list of providers for one field
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    providers: Vec<Arc<dyn Provider>>,
}

impl Pipeline {
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Self {
        Self { providers }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers.iter()
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

    /// Keep the providers whose predicate holds for the starting value
    pub fn runnable(&self, value: Option<&Value>, ctx: &ExecutionContext<'_>) -> Pipeline {
        Pipeline::new(
            self.providers
                .iter()
                .filter(|p| p.should_run(value, ctx))
                .cloned()
                .collect(),
        )
    }
}

/// Plan the provider list for one field
pub fn plan_pipeline(
    field: &str,
    options: &TranslationOptions,
    conversion: Option<&Conversion>,
    registry: &ProviderRegistry,
) -> Result<Pipeline> {
    if let Some(conversion) = conversion {
        let provider = registry
            .find(&conversion.provider)
            .ok_or_else(|| Error::ProviderNotRegistered {
                field: field.to_string(),
                provider: conversion.provider.clone(),
            })?;
        return Ok(Pipeline::new(vec![provider.clone()]));
    }

    if let Some(pipeline) = options.pipeline.as_deref().filter(|refs| !refs.is_empty()) {
        warn_unresolved(field, pipeline, registry);
        let providers = pipeline
            .iter()
            .flat_map(|reference| registry.resolve(reference))
            .collect();
        return Ok(Pipeline::new(providers));
    }

    if options.start.is_some() || options.end.is_some() {
        return Ok(segment(field, options, registry));
    }

    Ok(Pipeline::new(registry.as_slice().to_vec()))
}

/// start ++ (registry - start - end) ++ end
fn segment(field: &str, options: &TranslationOptions, registry: &ProviderRegistry) -> Pipeline {
    let start_refs = options.start.as_deref().unwrap_or_default();
    let end_refs = options.end.as_deref().unwrap_or_default();
    warn_unresolved(field, start_refs, registry);
    warn_unresolved(field, end_refs, registry);

    let start = expand_unique(start_refs, registry.as_slice());
    let pool = without(registry.as_slice(), &start);
    let end = expand_unique(end_refs, &pool);
    let middle = without(&pool, &end);

    Pipeline::new(start.into_iter().chain(middle).chain(end).collect())
}

fn expand_unique(refs: &[ProviderRef], pool: &[Arc<dyn Provider>]) -> Vec<Arc<dyn Provider>> {
    let mut expanded: Vec<Arc<dyn Provider>> = Vec::new();
    for provider in refs.iter().flat_map(|reference| select(pool, reference)) {
        if !expanded.iter().any(|p| p.name() == provider.name()) {
            expanded.push(provider);
        }
    }
    expanded
}

fn without(pool: &[Arc<dyn Provider>], removed: &[Arc<dyn Provider>]) -> Vec<Arc<dyn Provider>> {
    pool.iter()
        .filter(|p| !removed.iter().any(|r| r.name() == p.name()))
        .cloned()
        .collect()
}

fn warn_unresolved(field: &str, refs: &[ProviderRef], registry: &ProviderRegistry) {
    for reference in refs {
        if registry.resolve(reference).is_empty() {
            tracing::warn!(field, reference = %reference, "provider reference matched nothing");
        }
    }
}
