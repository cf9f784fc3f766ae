//! Schema bootstrap
//!
//! Creates the destination index and applies the bundled mapping at most once
//! per process. The existence check, index creation and mapping step all run
//! under one process-wide lock.

use once_cell::sync::{Lazy, OnceCell};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::client::{CreateIndexOutcome, ElasticBackend};
use super::document::DOCUMENT_FIELDS;
use super::TYPE_NAME;
use crate::error::SchemaError;

/// Mapping resource shipped with the crate
pub const MAPPING_RESOURCE: &str = include_str!("../../resources/elastic-mapping.json");

static BOOTSTRAP_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

static BUNDLED_MAPPING: OnceCell<Mapping> = OnceCell::new();

/// What a bootstrap call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOutcome {
    /// Index and mapping were created by this call
    Created,
    /// The index already existed; nothing was changed
    AlreadyExists,
}

/// A type mapping document
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    type_name: String,
    body: Value,
}

impl Mapping {
    /// Parse a mapping document and check it covers exactly the document fields.
    pub fn parse(json: &str, type_name: &str) -> Result<Self, SchemaError> {
        let body: Value =
            serde_json::from_str(json).map_err(|e| SchemaError::InvalidMapping(e.to_string()))?;

        let properties = body
            .get(type_name)
            .and_then(|t| t.get("properties"))
            .and_then(Value::as_object)
            .ok_or_else(|| {
                SchemaError::InvalidMapping(format!(
                    "expected an object at '{}.properties'",
                    type_name
                ))
            })?;

        let missing: Vec<String> = DOCUMENT_FIELDS
            .iter()
            .filter(|f| !properties.contains_key(**f))
            .map(|f| f.to_string())
            .collect();
        let unexpected: Vec<String> = properties
            .keys()
            .filter(|k| !DOCUMENT_FIELDS.contains(&k.as_str()))
            .cloned()
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(SchemaError::MappingDrift {
                missing,
                unexpected,
            });
        }

        Ok(Self {
            type_name: type_name.to_string(),
            body,
        })
    }

    /// The bundled mapping, parsed once.
    pub fn bundled() -> Result<&'static Mapping, SchemaError> {
        BUNDLED_MAPPING.get_or_try_init(|| Self::parse(MAPPING_RESOURCE, TYPE_NAME))
    }

    /// Document type this mapping describes
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Raw mapping body as sent to the backend
    pub fn body(&self) -> &Value {
        &self.body
    }
}

/// Make sure `index` exists with the bundled mapping for `type_name`.
///
/// Idempotent: an existing index is left untouched, whoever created it.
/// If the index is created but the mapping is rejected, the call fails and
/// the writer must not start.
pub async fn ensure_schema(
    backend: &dyn ElasticBackend,
    index: &str,
    type_name: &str,
) -> Result<SchemaOutcome, SchemaError> {
    let mapping = Mapping::bundled()?;

    let _guard = BOOTSTRAP_LOCK.lock().await;

    if backend.index_exists(index).await? {
        debug!(index = %index, "Index already exists, skipping bootstrap");
        return Ok(SchemaOutcome::AlreadyExists);
    }

    if backend.create_index(index).await? == CreateIndexOutcome::AlreadyExists {
        info!(index = %index, "Index was created concurrently, skipping mapping");
        return Ok(SchemaOutcome::AlreadyExists);
    }

    backend
        .put_mapping(index, type_name, mapping.body())
        .await
        .map_err(|source| SchemaError::MappingRejected {
            index: index.to_string(),
            source,
        })?;

    info!(index = %index, type_name = %type_name, "Created mapping for index");
    Ok(SchemaOutcome::Created)
}
