//! Integration tests for record linking through the translation engine


use async_trait::async_trait;
use jst_core::{Error, TargetSchema, Translator};
use jst_providers::{MemoryRecordStore, RecordLink, RecordStore, StoreError, StoreResult};
use serde_json::{json, Value};
use std::sync::Arc;
use test_support::init_tracing;

async fn seeded_store() -> MemoryRecordStore {
    let store = MemoryRecordStore::new();
    store
        .seed(
            "users",
            [
                json!({"_id": "u1", "email": "ada@example.com"}),
                json!({"_id": "u2", "email": "grace@example.com"}),
            ],
        )
        .await;
    store
}

fn translator(store: MemoryRecordStore, schemas: Vec<TargetSchema>) -> Translator {
    Translator::builder()
        .provider(Arc::new(RecordLink::new(Arc::new(store))))
        .schemas(schemas)
        .build()
        .unwrap()
}

fn order_schema(link: Value) -> TargetSchema {
    TargetSchema::from_value(json!({
        "$id": "order",
        "properties": {
            "number": {"type": "string", "from": "number"},
            "owner": {"type": "string", "translation": {"from": "email", "link": link}}
        }
    }))
    .unwrap()
}

fn user_schema() -> TargetSchema {
    TargetSchema::from_value(json!({
        "$id": "user",
        "properties": {
            "email": {"type": "string", "from": "email"},
            "name": {"type": "string", "from": "customer.name"}
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_link_resolves_existing_record() {
    let translator = translator(seeded_store().await, Vec::new());
    let schema = order_schema(json!({"collection": "users", "query": {"email": "$val"}, "idField": "_id"}));

    let output = translator
        .translate_object(&json!({"number": 1001, "email": "grace@example.com"}), &schema)
        .await
        .unwrap();

    assert_eq!(output, json!({"number": "1001", "owner": "u2"}));
}

#[tokio::test]
async fn test_link_miss_is_omitted() {
    let translator = translator(seeded_store().await, Vec::new());
    let schema = order_schema(json!({"collection": "users", "query": {"email": "$val"}, "idField": "_id"}));

    let output = translator
        .translate_object(&json!({"number": "7", "email": "nobody@example.com"}), &schema)
        .await
        .unwrap();

    assert_eq!(output, json!({"number": "7"}));
}

#[tokio::test]
async fn test_missing_collection_is_a_miss() {
    let translator = translator(MemoryRecordStore::new(), Vec::new());
    let schema = order_schema(json!({
        "collection": "accounts",
        "query": {"email": "$val"},
        "idField": "_id",
        "wrap": true
    }));

    let output = translator
        .translate_object(&json!({"number": "7", "email": "ada@example.com"}), &schema)
        .await
        .unwrap();

    assert_eq!(output, json!({"number": "7", "owner": []}));
}

#[tokio::test]
async fn test_wrapped_hit() {
    let translator = translator(seeded_store().await, Vec::new());
    let schema = order_schema(json!({
        "collection": "users",
        "query": {"email": "$val"},
        "idField": "_id",
        "wrap": true
    }));

    let output = translator
        .translate_object(&json!({"number": "7", "email": "ada@example.com"}), &schema)
        .await
        .unwrap();

    assert_eq!(output["owner"], json!(["u1"]));
}

#[tokio::test]
async fn test_miss_creates_record_from_known_schema() {
    init_tracing();
    let store = seeded_store().await;
    let translator = translator(store.clone(), vec![user_schema()]);
    let schema = order_schema(json!({
        "collection": "users",
        "query": {"email": "$val"},
        "idField": "_id",
        "createIfNotExists": "user"
    }));
    let source = json!({"number": "9", "email": "linus@example.com", "customer": {"name": "Linus"}});

    let output = translator.translate_object(&source, &schema).await.unwrap();

    assert_eq!(output, json!({"number": "9", "owner": "users-1"}));
    let users = store.records("users").await;
    assert_eq!(users.len(), 3);
    assert_eq!(
        users[2],
        json!({"email": "linus@example.com", "name": "Linus", "_id": "users-1"})
    );
}

#[tokio::test]
async fn test_unknown_create_schema_is_a_miss() {
    let store = seeded_store().await;
    let translator = translator(store.clone(), Vec::new());
    let schema = order_schema(json!({
        "collection": "users",
        "query": {"email": "$val"},
        "idField": "_id",
        "createIfNotExists": "user"
    }));

    let output = translator
        .translate_object(&json!({"number": "9", "email": "linus@example.com"}), &schema)
        .await
        .unwrap();

    assert_eq!(output, json!({"number": "9"}));
    assert_eq!(store.records("users").await.len(), 2);
}

#[tokio::test]
async fn test_conversion_directive_selects_link() {
    let store = Arc::new(seeded_store().await);
    let translator = Translator::builder()
        .provider(Arc::new(RecordLink::new(store).with_name("AirtableLink")))
        .build()
        .unwrap();
    let schema = TargetSchema::from_value(json!({
        "properties": {
            "owner": {
                "type": "array",
                "translation": {
                    "from": "email",
                    "conversion": {
                        "provider": "AirtableLink",
                        "collection": "users",
                        "query": {"email": "$val"},
                        "idField": "_id",
                        "wrap": true
                    }
                }
            }
        }
    }))
    .unwrap();

    let output = translator
        .translate_object(&json!({"email": "ada@example.com"}), &schema)
        .await
        .unwrap();

    assert_eq!(output, json!({"owner": ["u1"]}));
}

#[tokio::test]
async fn test_link_rejects_field_typecast() {
    let translator = translator(seeded_store().await, Vec::new());
    let schema = TargetSchema::from_value(json!({
        "properties": {
            "owner": {
                "type": "string",
                "translation": {
                    "from": "email",
                    "typecast": "both",
                    "link": {"collection": "users", "query": {"email": "$val"}, "idField": "_id"}
                }
            }
        }
    }))
    .unwrap();

    let err = translator
        .translate_object(&json!({"email": "ada@example.com"}), &schema)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::TypecastConflict { ref field, .. } if field == "owner"));
}

struct UnavailableStore;

#[async_trait]
impl RecordStore for UnavailableStore {
    async fn find_one(&self, _collection: &str, _query: &Value) -> StoreResult<Option<Value>> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn insert(&self, _collection: &str, _record: Value) -> StoreResult<Value> {
        Err(StoreError::Backend("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let translator = Translator::builder()
        .provider(Arc::new(RecordLink::new(Arc::new(UnavailableStore))))
        .build()
        .unwrap();
    let schema = order_schema(json!({"collection": "users", "query": {"email": "$val"}, "idField": "_id"}));

    let err = translator
        .translate_object(&json!({"number": "1", "email": "ada@example.com"}), &schema)
        .await
        .unwrap_err();

    match err {
        Error::Provider { provider, field, source } => {
            assert_eq!(provider, "RecordLink");
            assert_eq!(field, "owner");
            assert!(source.to_string().contains("connection refused"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_malformed_link_block_fails_translation() {
    let translator = translator(seeded_store().await, Vec::new());
    let schema = order_schema(json!({"collection": "users", "query": {"email": "$val"}, "idField": 5}));

    let err = translator
        .translate_object(&json!({"number": "1", "email": "ada@example.com"}), &schema)
        .await
        .unwrap_err();

    match err {
        Error::Provider { provider, field, source } => {
            assert_eq!(provider, "RecordLink");
            assert_eq!(field, "owner");
            let cause = source.downcast_ref::<Error>().expect("configuration error");
            assert!(cause.is_configuration());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_self_referential_create_stops_at_cycle() {
    init_tracing();
    let store = MemoryRecordStore::new();
    store.create_collection("users").await;
    let employee = TargetSchema::from_value(json!({
        "$id": "employee",
        "properties": {
            "email": {"type": "string", "from": "email"},
            "manager": {
                "type": "string",
                "translation": {
                    "from": "email",
                    "link": {
                        "collection": "users",
                        "query": {"email": "$val"},
                        "idField": "_id",
                        "createIfNotExists": "employee"
                    }
                }
            }
        }
    }))
    .unwrap();
    let translator = translator(store.clone(), vec![employee.clone()]);

    let output = translator
        .translate_object(&json!({"email": "ada@example.com"}), &employee)
        .await
        .unwrap();

    assert_eq!(output, json!({"email": "ada@example.com", "manager": "users-1"}));
    assert_eq!(
        store.records("users").await,
        vec![json!({"email": "ada@example.com", "_id": "users-1"})]
    );
}

#[tokio::test]
async fn test_custom_option_block() {
    let store = Arc::new(seeded_store().await);
    let translator = Translator::builder()
        .provider(Arc::new(RecordLink::new(store).with_name("CustomerLink").with_block("customer")))
        .build()
        .unwrap();
    let schema = TargetSchema::from_value(json!({
        "properties": {
            "owner": {
                "type": "string",
                "translation": {
                    "from": "email",
                    "customer": {"collection": "users", "query": {"email": "$val"}, "idField": "_id"}
                }
            },
            "ignored": {
                "type": "string",
                "translation": {
                    "from": "email",
                    "link": {"collection": "users", "query": {"email": "$val"}, "idField": "_id"}
                }
            }
        }
    }))
    .unwrap();

    let output = translator
        .translate_object(&json!({"email": "grace@example.com"}), &schema)
        .await
        .unwrap();

    assert_eq!(output, json!({"owner": "u2", "ignored": "grace@example.com"}));
}
