//! Shared test support utilities for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use jst_core::{ExecutionContext, FieldSpec, Provider, ProviderDescriptor, TypecastPlacement};
use serde_json::Value;
use std::sync::{Arc, Mutex, Once};

static TRACING: Once = Once::new();

/// Route engine events to the test harness output
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Provider that appends a marker to string values and records each call
pub struct MarkerProvider {
    descriptor: ProviderDescriptor,
    marker: String,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MarkerProvider {
    pub fn new(name: &str, collection: Option<&str>, marker: &str) -> Self {
        let mut descriptor = ProviderDescriptor::new(name);
        if let Some(collection) = collection {
            descriptor = descriptor.in_collection(collection);
        }
        Self {
            descriptor,
            marker: marker.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn typecast(mut self, placement: TypecastPlacement) -> Self {
        self.descriptor = self.descriptor.with_typecast(placement);
        self
    }

    /// Share a call log between several providers
    pub fn recording_into(mut self, calls: Arc<Mutex<Vec<String>>>) -> Self {
        self.calls = calls;
        self
    }

    pub fn arc(self) -> Arc<dyn Provider> {
        Arc::new(self)
    }
}

#[async_trait]
impl Provider for MarkerProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn should_run(&self, _value: Option<&Value>, _ctx: &ExecutionContext<'_>) -> bool {
        true
    }

    async fn get_value(
        &self,
        value: Option<Value>,
        _field: &FieldSpec,
        ctx: &ExecutionContext<'_>,
    ) -> anyhow::Result<Option<Value>> {
        self.calls
            .lock()
            .map_err(|_| anyhow::anyhow!("call log poisoned"))?
            .push(format!("{}:{}", self.descriptor.name, ctx.target_key));
        Ok(match value {
            Some(Value::String(s)) => Some(Value::String(format!("{}{}", s, self.marker))),
            other => other,
        })
    }
}

/// Provider whose value step always fails
pub struct FailingProvider {
    descriptor: ProviderDescriptor,
}

impl FailingProvider {
    pub fn new(name: &str) -> Self {
        Self {
            descriptor: ProviderDescriptor::new(name),
        }
    }
}

#[async_trait]
impl Provider for FailingProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn should_run(&self, value: Option<&Value>, _ctx: &ExecutionContext<'_>) -> bool {
        value.is_some()
    }

    async fn get_value(
        &self,
        _value: Option<Value>,
        _field: &FieldSpec,
        _ctx: &ExecutionContext<'_>,
    ) -> anyhow::Result<Option<Value>> {
        anyhow::bail!("upstream unavailable")
    }
}
