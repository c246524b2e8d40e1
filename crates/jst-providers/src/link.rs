//! Record linking
//!
//! [`RecordLink`] replaces a field's value with the id of a matching record in
//! an external store, optionally creating the record from another known
//! schema when the lookup misses. Stores plug in through the [`RecordStore`]
//! trait; [`MemoryRecordStore`] keeps everything in process.
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use jst_core::coerce::number_string;
use jst_core::{translate_object_with, ExecutionContext, FieldSpec, Provider, ProviderDescriptor, TypecastPlacement};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

tokio::task_local! {
    /// Schema ids whose records are being created by the enclosing translations
    static CREATING: Vec<String>;
}

/// Collection tag of [`RecordLink`]
pub const LINK_COLLECTION: &str = "Link";

/// Default option block read by [`RecordLink`]
pub const LINK_BLOCK: &str = "link";

/// Placeholder replaced by the current value inside a query template
pub const VALUE_PLACEHOLDER: &str = "$val";

/// Asynchronous access to an external collection of records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// First record of `collection` matching `query`, if any
    async fn find_one(&self, collection: &str, query: &Value) -> StoreResult<Option<Value>>;

    /// Store a record and return it as stored, including any generated id
    async fn insert(&self, collection: &str, record: Value) -> StoreResult<Value>;
}

/// Options of one link lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkOptions {
    /// Collection or table searched
    pub collection: String,

    /// Query template; `$val` is replaced by the current value
    pub query: Value,

    /// Record property yielded as the link id
    pub id_field: String,

    /// `$id` of the schema used to create a missing record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_if_not_exists: Option<String>,

    /// Yield `[id]` or `[]` instead of the bare id
    #[serde(default)]
    pub wrap: bool,
}

/// Links a value to the id of a record in a [`RecordStore`]
///
/// Disables built-in coercion for the fields it runs on: the id keeps the
/// type the store gives it.
pub struct RecordLink {
    descriptor: ProviderDescriptor,
    block: String,
    store: Arc<dyn RecordStore>,
}

impl RecordLink {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            descriptor: ProviderDescriptor::new("RecordLink")
                .in_collection(LINK_COLLECTION)
                .with_typecast(TypecastPlacement::Off),
            block: LINK_BLOCK.to_string(),
            store,
        }
    }

    /// Register under another name, e.g. to serve existing conversion directives
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.descriptor.name = name.into();
        self
    }

    /// Read options from another block than `link`
    pub fn with_block(mut self, block: impl Into<String>) -> Self {
        self.block = block.into();
        self
    }

    /// Options from the field's block, or from a conversion directive naming this provider
    pub fn link_options(&self, ctx: &ExecutionContext<'_>) -> anyhow::Result<Option<LinkOptions>> {
        if ctx.options.raw_block(&self.block).is_some() {
            return Ok(ctx.options.block(&self.block)?);
        }
        match ctx.conversion {
            Some(conversion) if conversion.provider == self.descriptor.name => Ok(Some(
                serde_json::from_value(Value::Object(conversion.settings.clone()))?,
            )),
            _ => Ok(None),
        }
    }

    /// Whether the field asks for a link, without validating the options
    fn is_configured(&self, ctx: &ExecutionContext<'_>) -> bool {
        ctx.options.raw_block(&self.block).is_some()
            || ctx
                .conversion
                .is_some_and(|conversion| conversion.provider == self.descriptor.name)
    }

    async fn lookup(&self, options: &LinkOptions, query: &Value) -> anyhow::Result<Option<Value>> {
        match self.store.find_one(&options.collection, query).await {
            Ok(found) => Ok(found.and_then(|record| id_of(&record, &options.id_field))),
            Err(err) if err.is_not_found() => {
                debug!(collection = %options.collection, "link target not found, treating as a miss");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn create(
        &self,
        options: &LinkOptions,
        schema_id: &str,
        ctx: &ExecutionContext<'_>,
    ) -> anyhow::Result<Option<Value>> {
        let Some(schema) = ctx.schema(schema_id) else {
            warn!(field = ctx.target_key, schema = schema_id, "createIfNotExists names an unknown schema");
            return Ok(None);
        };

        let mut creating = CREATING.try_with(Vec::clone).unwrap_or_default();
        if creating.iter().any(|id| id == schema_id) {
            warn!(
                field = ctx.target_key,
                schema = schema_id,
                chain = ?creating,
                "createIfNotExists cycles back to a schema already being created, treating as a miss"
            );
            return Ok(None);
        }
        creating.push(schema_id.to_string());

        let record = CREATING
            .scope(
                creating,
                translate_object_with(ctx.source_object, schema, ctx.registry, ctx.schemas, ctx.method_options),
            )
            .await?;
        let stored = self.store.insert(&options.collection, record).await?;
        debug!(collection = %options.collection, schema = schema_id, "created linked record");

        Ok(id_of(&stored, &options.id_field))
    }
}

#[async_trait]
impl Provider for RecordLink {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn should_run(&self, value: Option<&Value>, ctx: &ExecutionContext<'_>) -> bool {
        let present = match value {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        present && self.is_configured(ctx)
    }

    async fn get_value(
        &self,
        value: Option<Value>,
        _field: &FieldSpec,
        ctx: &ExecutionContext<'_>,
    ) -> anyhow::Result<Option<Value>> {
        let Some(options) = self.link_options(ctx)? else {
            return Ok(value);
        };
        let Some(current) = value else {
            return Ok(wrap(None, options.wrap));
        };

        let query = substitute(&options.query, &current);
        let mut id = self.lookup(&options, &query).await?;

        if id.is_none() {
            if let Some(schema_id) = options.create_if_not_exists.as_deref() {
                id = self.create(&options, schema_id, ctx).await?;
            }
        }

        Ok(wrap(id, options.wrap))
    }
}

fn id_of(record: &Value, id_field: &str) -> Option<Value> {
    record.get(id_field).filter(|id| !id.is_null()).cloned()
}

fn wrap(id: Option<Value>, wrap: bool) -> Option<Value> {
    if wrap {
        Some(Value::Array(id.into_iter().collect()))
    } else {
        id
    }
}

/// Replace `$val` in a query template
///
/// A string that is exactly the placeholder takes the value itself, keeping
/// its type; a longer string gets the value's text spliced in.
pub fn substitute(template: &Value, value: &Value) -> Value {
    match template {
        Value::String(s) if s == VALUE_PLACEHOLDER => value.clone(),
        Value::String(s) if s.contains(VALUE_PLACEHOLDER) => {
            Value::String(s.replace(VALUE_PLACEHOLDER, &value_text(value)))
        }
        Value::Array(items) => Value::Array(items.iter().map(|item| substitute(item, value)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), substitute(item, value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_string(n),
        other => other.to_string(),
    }
}

/// In-process [`RecordStore`] keyed by collection name
///
/// Queries match records whose top-level properties equal every query entry.
/// Inserted records without an id get a sequential string id.
#[derive(Clone)]
pub struct MemoryRecordStore {
    collections: Arc<RwLock<HashMap<String, Vec<Value>>>>,
    id_field: String,
    next_id: Arc<AtomicU64>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            id_field: "_id".to_string(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Property holding generated ids
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    /// Create an empty collection so lookups miss instead of failing
    pub async fn create_collection(&self, collection: &str) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default();
    }

    /// Seed a collection with records
    pub async fn seed<I>(&self, collection: &str, records: I)
    where
        I: IntoIterator<Item = Value>,
    {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .extend(records);
    }

    /// Snapshot of a collection's records
    pub async fn records(&self, collection: &str) -> Vec<Value> {
        self.collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_query(record: &Value, query: &Map<String, Value>) -> bool {
    query.iter().all(|(key, expected)| record.get(key) == Some(expected))
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_one(&self, collection: &str, query: &Value) -> StoreResult<Option<Value>> {
        let Value::Object(query) = query else {
            return Err(StoreError::InvalidQuery(format!("expected an object, got {}", query)));
        };

        let collections = self.collections.read().await;
        let records = collections
            .get(collection)
            .ok_or_else(|| StoreError::NotFound(collection.to_string()))?;

        Ok(records.iter().find(|record| matches_query(record, query)).cloned())
    }

    async fn insert(&self, collection: &str, record: Value) -> StoreResult<Value> {
        let Value::Object(mut fields) = record else {
            return Err(StoreError::InvalidRecord("records must be objects".to_string()));
        };
        if !fields.contains_key(&self.id_field) {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            fields.insert(self.id_field.clone(), Value::String(format!("{}-{}", collection, id)));
        }

        let stored = Value::Object(fields);
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(stored.clone());

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_substitute_keeps_value_type() {
        let template = json!({"email": "$val", "label": "user:$val", "tags": ["$val"], "limit": 1});
        assert_eq!(
            substitute(&template, &json!(42)),
            json!({"email": 42, "label": "user:42", "tags": [42], "limit": 1})
        );
    }

    #[test]
    fn test_link_options_deserialize() {
        let options: LinkOptions = serde_json::from_value(json!({
            "collection": "users",
            "query": {"email": "$val"},
            "idField": "_id",
            "createIfNotExists": "user"
        }))
        .unwrap();
        assert_eq!(options.id_field, "_id");
        assert_eq!(options.create_if_not_exists.as_deref(), Some("user"));
        assert!(!options.wrap);
    }

    #[tokio::test]
    async fn test_memory_store_lookup() {
        let store = MemoryRecordStore::new();
        store
            .seed("users", [json!({"_id": "u1", "email": "a@x.io"}), json!({"_id": "u2", "email": "b@x.io"})])
            .await;

        let found = store.find_one("users", &json!({"email": "b@x.io"})).await.unwrap();
        assert_eq!(found, Some(json!({"_id": "u2", "email": "b@x.io"})));
        assert_eq!(store.find_one("users", &json!({"email": "c@x.io"})).await.unwrap(), None);

        let err = store.find_one("teams", &json!({})).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.find_one("users", &json!("email")).await.is_err());
    }

    #[tokio::test]
    async fn test_memory_store_generates_ids() {
        let store = MemoryRecordStore::new().with_id_field("id");
        let first = store.insert("teams", json!({"name": "core"})).await.unwrap();
        let second = store.insert("teams", json!({"name": "infra", "id": "fixed"})).await.unwrap();

        assert_eq!(first["id"], json!("teams-1"));
        assert_eq!(second["id"], json!("fixed"));
        assert_eq!(store.records("teams").await.len(), 2);
        assert!(store.insert("teams", json!([1])).await.is_err());
    }
}
