//! Entity dispatch at request time.

use crate::config::ValueKind;
use crate::data::{Data, Entity};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// An entity representation as received by `_entities`.
pub type Map = serde_json::Map<String, Value>;

/// The `_service` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub sdl: String,
}

/// A resolved entity lookup: which resolver to call with which key.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityCall {
    pub type_name: String,
    pub resolver_name: String,
    pub key: Value,
}

#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum DispatchError {
    #[error("__typename must be an existing string")]
    #[diagnostic(code(sdlgen::federation::typename))]
    MissingTypename,

    #[error("unknown type: {0}")]
    #[diagnostic(code(sdlgen::federation::unknown_type))]
    UnknownEntityType(String),

    #[error("key field {type_name}.{field} is missing or not a {expected}")]
    #[diagnostic(code(sdlgen::federation::invalid_key))]
    EntityTypeMismatch {
        type_name: String,
        field: String,
        expected: ValueKind,
    },

    #[error("federated introspection disabled")]
    #[diagnostic(code(sdlgen::federation::introspection_disabled))]
    IntrospectionDisabled,
}

/// Routes `_entities` representations to entity resolvers and answers
/// `_service`.
#[derive(Debug, Clone)]
pub struct FederationRuntime {
    sdl: String,
    entities: Vec<Entity>,
    introspection: bool,
}

impl FederationRuntime {
    #[must_use]
    pub fn new(data: &Data) -> Self {
        Self::from_parts(data.sdl.clone(), data.entities.clone())
    }

    pub fn from_parts(sdl: impl Into<String>, entities: Vec<Entity>) -> Self {
        Self {
            sdl: sdl.into(),
            entities,
            introspection: true,
        }
    }

    #[must_use]
    pub fn with_introspection(mut self, enabled: bool) -> Self {
        self.introspection = enabled;
        self
    }

    pub fn resolve_service(&self) -> Result<Service, DispatchError> {
        if !self.introspection {
            return Err(DispatchError::IntrospectionDisabled);
        }
        Ok(Service {
            sdl: self.sdl.clone(),
        })
    }

    /// Picks the resolver for one representation.
    pub fn dispatch(&self, representation: &Map) -> Result<EntityCall, DispatchError> {
        let type_name = representation
            .get("__typename")
            .and_then(Value::as_str)
            .ok_or(DispatchError::MissingTypename)?;
        let entity = self
            .entities
            .iter()
            .find(|e| e.name == type_name)
            .ok_or_else(|| DispatchError::UnknownEntityType(type_name.to_string()))?;

        let (expected, path) = entity
            .field_type
            .as_ref()
            .map_or((ValueKind::Other, ""), |t| (t.kind, t.path.as_str()));
        let key = representation
            .get(&entity.field_name)
            .filter(|value| accepts(value, expected, path))
            .ok_or_else(|| DispatchError::EntityTypeMismatch {
                type_name: entity.name.clone(),
                field: entity.field_name.clone(),
                expected,
            })?;

        Ok(EntityCall {
            type_name: entity.name.clone(),
            resolver_name: entity.resolver_name.clone(),
            key: key.clone(),
        })
    }

    /// Dispatches every representation in order. The first failure aborts.
    pub fn dispatch_all(&self, representations: &[Map]) -> Result<Vec<EntityCall>, DispatchError> {
        representations.iter().map(|rep| self.dispatch(rep)).collect()
    }
}

/// Accepts exactly the values the generated key conversion accepts.
fn accepts(value: &Value, kind: ValueKind, path: &str) -> bool {
    match kind {
        ValueKind::String => value.is_string(),
        ValueKind::Int => value.as_i64().is_some_and(|v| int_fits(v, path)),
        ValueKind::Float => value.is_number(),
        ValueKind::Boolean => value.is_boolean(),
        ValueKind::Other => !value.is_null(),
    }
}

/// Whether `{path}::try_from(v)` succeeds.
fn int_fits(v: i64, path: &str) -> bool {
    match path {
        "i8" => i8::try_from(v).is_ok(),
        "i16" => i16::try_from(v).is_ok(),
        "i32" => i32::try_from(v).is_ok(),
        "isize" => isize::try_from(v).is_ok(),
        "u8" => u8::try_from(v).is_ok(),
        "u16" => u16::try_from(v).is_ok(),
        "u32" => u32::try_from(v).is_ok(),
        "usize" => usize::try_from(v).is_ok(),
        "u64" | "u128" => u64::try_from(v).is_ok(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetType;
    use serde_json::json;

    fn runtime() -> FederationRuntime {
        let mut product = Entity::new("Product", "upc", "String!");
        product.field_type = Some(TargetType::new("String"));
        let mut review = Entity::new("Review", "id", "Int!");
        review.field_type = Some(TargetType::new("i32"));
        FederationRuntime::from_parts("type Product { upc: String! }\n", vec![product, review])
    }

    fn rep(value: Value) -> Map {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_dispatch() {
        let call = runtime()
            .dispatch(&rep(json!({ "__typename": "Product", "upc": "1" })))
            .unwrap();
        assert_eq!(
            call,
            EntityCall {
                type_name: "Product".into(),
                resolver_name: "findProductByUpc".into(),
                key: json!("1"),
            }
        );
    }

    #[test]
    fn test_dispatch_errors() {
        let runtime = runtime();
        assert_eq!(
            runtime.dispatch(&rep(json!({ "upc": "1" }))),
            Err(DispatchError::MissingTypename)
        );
        assert_eq!(
            runtime.dispatch(&rep(json!({ "__typename": 7 }))),
            Err(DispatchError::MissingTypename)
        );

        let err = runtime
            .dispatch(&rep(json!({ "__typename": "Shipping", "id": 1 })))
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown type: Shipping");

        let err = runtime
            .dispatch(&rep(json!({ "__typename": "Review", "id": "1" })))
            .unwrap_err();
        assert_eq!(err.to_string(), "key field Review.id is missing or not a int");
    }

    #[test]
    fn test_int_keys_respect_the_bound_width() {
        let runtime = runtime();
        let err = runtime
            .dispatch(&rep(json!({ "__typename": "Review", "id": 1_u64 << 40 })))
            .unwrap_err();
        assert!(matches!(err, DispatchError::EntityTypeMismatch { .. }));
        let call = runtime
            .dispatch(&rep(json!({ "__typename": "Review", "id": i32::MAX })))
            .unwrap();
        assert_eq!(call.key, json!(i32::MAX));

        let mut counter = Entity::new("Counter", "n", "Int!");
        counter.field_type = Some(TargetType::new("u16"));
        let runtime = FederationRuntime::from_parts("", vec![counter]);
        assert!(runtime
            .dispatch(&rep(json!({ "__typename": "Counter", "n": -1 })))
            .is_err());
        assert!(runtime
            .dispatch(&rep(json!({ "__typename": "Counter", "n": 65_535 })))
            .is_ok());

        let mut big = Entity::new("Big", "n", "Int!");
        big.field_type = Some(TargetType::new("i64"));
        let runtime = FederationRuntime::from_parts("", vec![big]);
        assert!(runtime
            .dispatch(&rep(json!({ "__typename": "Big", "n": u64::MAX })))
            .is_err());
    }

    #[test]
    fn test_dispatch_all_stops_at_first_failure() {
        let runtime = runtime();
        let calls = runtime
            .dispatch_all(&[
                rep(json!({ "__typename": "Review", "id": 2 })),
                rep(json!({ "__typename": "Product", "upc": "a" })),
            ])
            .unwrap();
        let resolvers: Vec<&str> = calls.iter().map(|c| c.resolver_name.as_str()).collect();
        assert_eq!(resolvers, ["findReviewById", "findProductByUpc"]);

        let err = runtime
            .dispatch_all(&[
                rep(json!({ "__typename": "Review", "id": 2 })),
                rep(json!({ "__typename": "Nope" })),
            ])
            .unwrap_err();
        assert_eq!(err, DispatchError::UnknownEntityType("Nope".into()));
    }

    #[test]
    fn test_resolve_service() {
        let runtime = runtime();
        assert_eq!(
            runtime.resolve_service().unwrap().sdl,
            "type Product { upc: String! }\n"
        );
        assert_eq!(
            runtime.with_introspection(false).resolve_service(),
            Err(DispatchError::IntrospectionDisabled)
        );
    }
}
