//! Flat identity profile.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::types::Entity;

/// `{face_id, username, tags}` merged with the entity's metadata.
///
/// Metadata keys override the base fields on collision.
pub fn identity_profile(entity: &Entity) -> Map<String, Value> {
    let mut profile = Map::new();
    profile.insert("face_id".to_string(), Value::String(entity.id.clone()));
    profile.insert(
        "username".to_string(),
        entity.username.clone().map_or(Value::Null, Value::String),
    );
    profile.insert(
        "tags".to_string(),
        Value::Array(entity.labels.iter().cloned().map(Value::String).collect()),
    );
    for (key, value) in &entity.metadata {
        profile.insert(key.clone(), value.clone());
    }
    profile
}

/// Profile of `id`, or an empty map for an unknown identity.
pub fn lookup_profile(id: &str, identities: &HashMap<String, Entity>) -> Map<String, Value> {
    identities.get(id).map(identity_profile).unwrap_or_default()
}
