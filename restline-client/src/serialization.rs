//! Entity serialization collaborators.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, Result};

/// Declared type of a request or response entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityType {
    name: &'static str,
}

impl EntityType {
    /// Type descriptor for `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Serialized request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebEntity {
    /// Encoded content.
    pub content: String,
    /// MIME type of the content.
    pub content_type: String,
    /// Content encoding, if any.
    pub content_encoding: Option<String>,
}

impl WebEntity {
    /// Create an entity without a content encoding.
    pub fn new(content: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: content_type.into(),
            content_encoding: None,
        }
    }
}

/// Encodes request entities.
pub trait Serializer: Send + Sync {
    /// Encode `entity`, optionally using its declared type.
    fn serialize(&self, entity: &Value, entity_type: Option<&EntityType>) -> Result<WebEntity>;
}

/// Decodes response bodies.
pub trait Deserializer: Send + Sync {
    /// Decode `content` as `entity_type`.
    fn deserialize(&self, content: &str, entity_type: &EntityType) -> Result<Value>;
}

/// Decode `content` through `deserializer` into a concrete type.
pub fn deserialize_as<T: DeserializeOwned>(
    deserializer: &dyn Deserializer,
    content: &str,
) -> Result<T> {
    let value = deserializer.deserialize(content, &EntityType::of::<T>())?;
    serde_json::from_value(value).map_err(|e| ClientError::Deserialization(e.to_string()))
}

/// Serialize `entity`, dropping the result if its content is blank.
pub(crate) fn serialize_entity(
    serializer: &dyn Serializer,
    entity: &Value,
    entity_type: Option<&EntityType>,
) -> Result<Option<WebEntity>> {
    let entity = serializer.serialize(entity, entity_type)?;
    Ok((!entity.content.trim().is_empty()).then_some(entity))
}

/// JSON serializer and deserializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    /// Content type of encoded entities.
    pub const CONTENT_TYPE: &'static str = "application/json";
}

impl Serializer for JsonSerializer {
    fn serialize(&self, entity: &Value, _entity_type: Option<&EntityType>) -> Result<WebEntity> {
        let content =
            serde_json::to_string(entity).map_err(|e| ClientError::Serialization(e.to_string()))?;
        Ok(WebEntity::new(content, Self::CONTENT_TYPE))
    }
}

impl Deserializer for JsonSerializer {
    fn deserialize(&self, content: &str, entity_type: &EntityType) -> Result<Value> {
        serde_json::from_str(content).map_err(|e| {
            ClientError::Deserialization(format!("{}: {}", entity_type.name(), e))
        })
    }
}
