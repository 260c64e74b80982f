//! API contract loaded from an OpenAPI 3 document.
//!
//! The service is contract-first: routes are registered from the operations
//! declared here, and incoming requests are validated against the declared
//! parameter and body schemas before any handler runs.
//!
//! Only the subset of OpenAPI the service relies on is understood: path and
//! query parameters, JSON request bodies, `$ref` into `components/schemas`,
//! `allOf` composition of objects, and the `type`, `format`, `required`,
//! `minLength`, `maxLength`, `minimum` and `maximum` keywords. Everything
//! else in the document (descriptions, responses, servers) is ignored.
//!
//! # Example
//!
//! ```
//! use inventory_core::inventory_contract;
//! use http::Method;
//!
//! let contract = inventory_contract().unwrap();
//! let op = contract.get_operation("findItemById").unwrap();
//! assert_eq!(op.method(), &Method::GET);
//! assert_eq!(op.path(), "/items/{id}");
//! ```

use std::collections::HashMap;

use http::Method;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// The OpenAPI document describing the inventory service.
pub const INVENTORY_OPENAPI: &str = include_str!("../contract/inventory-openapi.json");

/// Maximum `$ref`/`allOf` nesting followed while resolving a schema.
const MAX_SCHEMA_DEPTH: usize = 32;

/// Loads the embedded inventory contract.
///
/// # Errors
///
/// Returns a [`ContractError`] if the embedded document is invalid.
pub fn inventory_contract() -> Result<Contract, ContractError> {
    Contract::from_openapi_json(INVENTORY_OPENAPI)
}

/// Errors raised while loading a contract document.
#[derive(Error, Debug)]
pub enum ContractError {
    /// The document is not valid JSON or does not have the OpenAPI shape.
    #[error("failed to parse OpenAPI document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A `$ref` points at a schema that is not defined.
    #[error("unresolved schema reference: {reference}")]
    UnknownSchema {
        /// The reference as written in the document.
        reference: String,
    },

    /// A schema uses a construct the loader does not support.
    #[error("unsupported schema at {location}: {reason}")]
    UnsupportedSchema {
        /// Where the schema was found.
        location: String,
        /// What is unsupported.
        reason: String,
    },

    /// Two operations share the same `operationId`.
    #[error("duplicate operationId: {operation_id}")]
    DuplicateOperation {
        /// The repeated operation id.
        operation_id: String,
    },

    /// A parameter declaration is invalid.
    #[error("invalid parameter '{name}' in {operation_id}: {reason}")]
    InvalidParameter {
        /// The operation declaring the parameter.
        operation_id: String,
        /// The parameter name.
        name: String,
        /// Why it is invalid.
        reason: String,
    },
}

/// A loaded API contract.
#[derive(Debug, Clone)]
pub struct Contract {
    title: String,
    version: String,
    operations: Vec<Operation>,
    operation_index: HashMap<String, usize>,
}

impl Contract {
    /// Parses and resolves an OpenAPI 3 document in JSON form.
    ///
    /// # Errors
    ///
    /// Returns a [`ContractError`] if the document cannot be parsed, a
    /// reference does not resolve, an operation id is repeated, or a
    /// parameter is malformed.
    pub fn from_openapi_json(document: &str) -> Result<Self, ContractError> {
        let raw: RawDocument = serde_json::from_str(document)?;
        let resolver = Resolver {
            schemas: &raw.components.schemas,
        };

        let mut operations = Vec::new();
        let mut operation_index = HashMap::new();

        for (path, item) in &raw.paths {
            for (method, raw_op) in item.operations() {
                let operation = resolver.operation(path, method, &item.parameters, raw_op)?;

                if operation_index
                    .insert(operation.operation_id.clone(), operations.len())
                    .is_some()
                {
                    return Err(ContractError::DuplicateOperation {
                        operation_id: operation.operation_id,
                    });
                }
                operations.push(operation);
            }
        }

        tracing::debug!(
            title = %raw.info.title,
            operations = operations.len(),
            "contract loaded"
        );

        Ok(Self {
            title: raw.info.title,
            version: raw.info.version,
            operations,
            operation_index,
        })
    }

    /// Returns the API title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the API version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns all operations in document order.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Looks up an operation by its id.
    #[must_use]
    pub fn get_operation(&self, operation_id: &str) -> Option<&Operation> {
        self.operation_index
            .get(operation_id)
            .map(|&idx| &self.operations[idx])
    }
}

/// A single operation declared by the contract.
#[derive(Debug, Clone)]
pub struct Operation {
    operation_id: String,
    method: Method,
    path: String,
    parameters: Vec<Parameter>,
    request_body: Option<RequestBody>,
}

impl Operation {
    /// Returns the operation id.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path template (e.g. `/items/{id}`).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the declared parameters, path-level ones included.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Returns the declared parameters in `location`.
    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }

    /// Returns the JSON request body declaration, if any.
    #[must_use]
    pub fn request_body(&self) -> Option<&RequestBody> {
        self.request_body.as_ref()
    }
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    /// A `{name}` segment of the path.
    Path,
    /// A query string key.
    Query,
}

/// A declared path or query parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Where the parameter is carried.
    pub location: ParameterLocation,
    /// Whether the parameter must be present.
    pub required: bool,
    /// Schema of the parameter value.
    pub schema: Schema,
}

/// A declared JSON request body.
#[derive(Debug, Clone)]
pub struct RequestBody {
    /// Whether a body must be sent.
    pub required: bool,
    /// Schema of the body.
    pub schema: Schema,
}

/// A resolved JSON schema.
///
/// References and `allOf` compositions are flattened at load time.
///
/// # Example
///
/// ```
/// use inventory_core::Schema;
/// use indexmap::IndexMap;
///
/// let mut properties = IndexMap::new();
/// properties.insert("name".to_string(), Schema::string().min_length(1));
/// let schema = Schema::object(properties, vec!["name".to_string()]);
///
/// assert!(schema.validate(&serde_json::json!({"name": "Spot"})).is_ok());
/// assert!(schema.validate(&serde_json::json!({"name": ""})).is_err());
/// assert!(schema.validate(&serde_json::json!({})).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// String value.
    String {
        /// Minimum length in characters.
        min_length: Option<usize>,
        /// Maximum length in characters.
        max_length: Option<usize>,
    },
    /// Integer value.
    Integer {
        /// `int32` or `int64`, if declared.
        format: Option<String>,
        /// Inclusive lower bound.
        minimum: Option<i64>,
        /// Inclusive upper bound.
        maximum: Option<i64>,
    },
    /// Floating point value.
    Number {
        /// Inclusive lower bound.
        minimum: Option<f64>,
        /// Inclusive upper bound.
        maximum: Option<f64>,
    },
    /// Boolean value.
    Boolean,
    /// Array of values.
    Array {
        /// Schema of each element.
        items: Box<Schema>,
    },
    /// Object with named properties.
    Object {
        /// Property schemas in declaration order.
        properties: IndexMap<String, Schema>,
        /// Names of properties that must be present.
        required: Vec<String>,
    },
    /// Accepts any value.
    Any,
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Location of the offending value (e.g. `$.name`, `query.limit`).
    pub path: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl Schema {
    /// Creates an unconstrained string schema.
    #[must_use]
    pub const fn string() -> Self {
        Self::String {
            min_length: None,
            max_length: None,
        }
    }

    /// Creates an unconstrained integer schema.
    #[must_use]
    pub const fn integer() -> Self {
        Self::Integer {
            format: None,
            minimum: None,
            maximum: None,
        }
    }

    /// Creates an array schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self::Array {
            items: Box::new(items),
        }
    }

    /// Creates an object schema.
    #[must_use]
    pub fn object(properties: IndexMap<String, Schema>, required: Vec<String>) -> Self {
        Self::Object {
            properties,
            required,
        }
    }

    /// Sets the minimum length of a string schema.
    #[must_use]
    pub fn min_length(self, len: usize) -> Self {
        match self {
            Self::String { max_length, .. } => Self::String {
                min_length: Some(len),
                max_length,
            },
            other => other,
        }
    }

    /// Sets the minimum value of an integer schema.
    #[must_use]
    pub fn minimum(self, min: i64) -> Self {
        match self {
            Self::Integer {
                format, maximum, ..
            } => Self::Integer {
                format,
                minimum: Some(min),
                maximum,
            },
            other => other,
        }
    }

    /// Validates a JSON value against this schema.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.validate_at_path(value, "$")
    }

    /// Converts a raw path or query string into a JSON value of this
    /// schema's type, then validates it.
    ///
    /// # Errors
    ///
    /// Returns an error naming `path` if the text does not parse as the
    /// declared type or violates a constraint.
    pub fn parse_param(&self, raw: &str, path: &str) -> Result<Value, ValidationError> {
        let value = match self {
            Self::Integer { .. } => raw
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| ValidationError::new(path, format!("expected integer, got '{raw}'")))?,
            Self::Number { .. } => raw
                .parse::<f64>()
                .ok()
                .and_then(|n| serde_json::Number::from_f64(n).map(Value::Number))
                .ok_or_else(|| ValidationError::new(path, format!("expected number, got '{raw}'")))?,
            Self::Boolean => match raw {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => {
                    return Err(ValidationError::new(
                        path,
                        format!("expected boolean, got '{raw}'"),
                    ))
                }
            },
            Self::String { .. } | Self::Any => Value::String(raw.to_string()),
            Self::Array { .. } | Self::Object { .. } => {
                return Err(ValidationError::new(
                    path,
                    "structured parameters are not supported",
                ))
            }
        };

        self.validate_at_path(&value, path)?;
        Ok(value)
    }

    fn validate_at_path(&self, value: &Value, path: &str) -> Result<(), ValidationError> {
        match self {
            Self::String {
                min_length,
                max_length,
            } => {
                let s = value.as_str().ok_or_else(|| {
                    ValidationError::new(path, format!("expected string, got {}", type_name(value)))
                })?;
                let len = s.chars().count();

                if let Some(min) = min_length {
                    if len < *min {
                        return Err(ValidationError::new(
                            path,
                            format!("string length {len} is less than minimum {min}"),
                        ));
                    }
                }
                if let Some(max) = max_length {
                    if len > *max {
                        return Err(ValidationError::new(
                            path,
                            format!("string length {len} is greater than maximum {max}"),
                        ));
                    }
                }
                Ok(())
            }

            Self::Integer {
                format,
                minimum,
                maximum,
            } => {
                let n = value.as_i64().ok_or_else(|| {
                    ValidationError::new(path, format!("expected integer, got {}", type_name(value)))
                })?;

                if format.as_deref() == Some("int32") && i32::try_from(n).is_err() {
                    return Err(ValidationError::new(
                        path,
                        format!("value {n} does not fit in int32"),
                    ));
                }
                if let Some(min) = minimum {
                    if n < *min {
                        return Err(ValidationError::new(
                            path,
                            format!("value {n} is less than minimum {min}"),
                        ));
                    }
                }
                if let Some(max) = maximum {
                    if n > *max {
                        return Err(ValidationError::new(
                            path,
                            format!("value {n} is greater than maximum {max}"),
                        ));
                    }
                }
                Ok(())
            }

            Self::Number { minimum, maximum } => {
                let n = value.as_f64().ok_or_else(|| {
                    ValidationError::new(path, format!("expected number, got {}", type_name(value)))
                })?;

                if minimum.is_some_and(|min| n < min) || maximum.is_some_and(|max| n > max) {
                    return Err(ValidationError::new(path, format!("value {n} is out of range")));
                }
                Ok(())
            }

            Self::Boolean => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(ValidationError::new(
                        path,
                        format!("expected boolean, got {}", type_name(value)),
                    ))
                }
            }

            Self::Array { items } => {
                let arr = value.as_array().ok_or_else(|| {
                    ValidationError::new(path, format!("expected array, got {}", type_name(value)))
                })?;
                for (i, item) in arr.iter().enumerate() {
                    items.validate_at_path(item, &format!("{path}[{i}]"))?;
                }
                Ok(())
            }

            Self::Object {
                properties,
                required,
            } => {
                let obj = value.as_object().ok_or_else(|| {
                    ValidationError::new(path, format!("expected object, got {}", type_name(value)))
                })?;

                for name in required {
                    if obj.get(name).map_or(true, Value::is_null) {
                        return Err(ValidationError::new(
                            format!("{path}.{name}"),
                            "required property is missing",
                        ));
                    }
                }

                for (name, field) in obj {
                    // Absent and null optional properties are equivalent.
                    if field.is_null() {
                        continue;
                    }
                    if let Some(schema) = properties.get(name) {
                        schema.validate_at_path(field, &format!("{path}.{name}"))?;
                    }
                }
                Ok(())
            }

            Self::Any => Ok(()),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Raw document shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawDocument {
    info: RawInfo,
    #[serde(default)]
    paths: IndexMap<String, RawPathItem>,
    #[serde(default)]
    components: RawComponents,
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    title: String,
    version: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawComponents {
    #[serde(default)]
    schemas: IndexMap<String, RawSchema>,
}

#[derive(Debug, Deserialize)]
struct RawPathItem {
    #[serde(default)]
    parameters: Vec<RawParameter>,
    get: Option<RawOperation>,
    post: Option<RawOperation>,
    put: Option<RawOperation>,
    patch: Option<RawOperation>,
    delete: Option<RawOperation>,
}

impl RawPathItem {
    fn operations(&self) -> impl Iterator<Item = (Method, &RawOperation)> {
        [
            (Method::GET, self.get.as_ref()),
            (Method::POST, self.post.as_ref()),
            (Method::PUT, self.put.as_ref()),
            (Method::PATCH, self.patch.as_ref()),
            (Method::DELETE, self.delete.as_ref()),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.map(|op| (method, op)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOperation {
    operation_id: String,
    #[serde(default)]
    parameters: Vec<RawParameter>,
    request_body: Option<RawRequestBody>,
}

#[derive(Debug, Deserialize)]
struct RawParameter {
    name: String,
    #[serde(rename = "in")]
    location: String,
    #[serde(default)]
    required: bool,
    schema: Option<RawSchema>,
}

#[derive(Debug, Deserialize)]
struct RawRequestBody {
    #[serde(default)]
    required: bool,
    #[serde(default)]
    content: IndexMap<String, RawMediaType>,
}

#[derive(Debug, Deserialize)]
struct RawMediaType {
    schema: Option<RawSchema>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchema {
    #[serde(rename = "$ref")]
    reference: Option<String>,
    #[serde(rename = "type")]
    schema_type: Option<String>,
    format: Option<String>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    items: Option<Box<RawSchema>>,
    #[serde(default)]
    properties: IndexMap<String, RawSchema>,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    all_of: Vec<RawSchema>,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

struct Resolver<'a> {
    schemas: &'a IndexMap<String, RawSchema>,
}

impl Resolver<'_> {
    fn operation(
        &self,
        path: &str,
        method: Method,
        shared_params: &[RawParameter],
        raw: &RawOperation,
    ) -> Result<Operation, ContractError> {
        let mut parameters: Vec<Parameter> = Vec::new();

        // Operation-level parameters override path-level ones of the same name.
        for raw_param in shared_params.iter().chain(&raw.parameters) {
            let param = self.parameter(&raw.operation_id, raw_param)?;
            parameters.retain(|p| !(p.name == param.name && p.location == param.location));
            parameters.push(param);
        }

        let request_body = match &raw.request_body {
            Some(body) => self.request_body(&raw.operation_id, body)?,
            None => None,
        };

        Ok(Operation {
            operation_id: raw.operation_id.clone(),
            method,
            path: path.to_string(),
            parameters,
            request_body,
        })
    }

    fn parameter(&self, operation_id: &str, raw: &RawParameter) -> Result<Parameter, ContractError> {
        let invalid = |reason: &str| ContractError::InvalidParameter {
            operation_id: operation_id.to_string(),
            name: raw.name.clone(),
            reason: reason.to_string(),
        };

        let location = match raw.location.as_str() {
            "path" => ParameterLocation::Path,
            "query" => ParameterLocation::Query,
            other => return Err(invalid(&format!("unsupported location '{other}'"))),
        };

        if location == ParameterLocation::Path && !raw.required {
            return Err(invalid("path parameters must be required"));
        }

        let schema = match &raw.schema {
            Some(schema) => self.schema(schema, &format!("{operation_id}.{}", raw.name), 0)?,
            None => Schema::Any,
        };

        Ok(Parameter {
            name: raw.name.clone(),
            location,
            required: raw.required,
            schema,
        })
    }

    fn request_body(
        &self,
        operation_id: &str,
        raw: &RawRequestBody,
    ) -> Result<Option<RequestBody>, ContractError> {
        let Some(media) = raw
            .content
            .iter()
            .find(|(content_type, _)| is_json_media_type(content_type))
            .map(|(_, media)| media)
        else {
            return Ok(None);
        };

        let schema = match &media.schema {
            Some(schema) => self.schema(schema, &format!("{operation_id}.requestBody"), 0)?,
            None => Schema::Any,
        };

        Ok(Some(RequestBody {
            required: raw.required,
            schema,
        }))
    }

    fn schema(&self, raw: &RawSchema, location: &str, depth: usize) -> Result<Schema, ContractError> {
        if depth > MAX_SCHEMA_DEPTH {
            return Err(ContractError::UnsupportedSchema {
                location: location.to_string(),
                reason: "schema nesting is too deep or recursive".to_string(),
            });
        }

        if let Some(reference) = &raw.reference {
            let target = reference
                .strip_prefix("#/components/schemas/")
                .and_then(|name| self.schemas.get(name))
                .ok_or_else(|| ContractError::UnknownSchema {
                    reference: reference.clone(),
                })?;
            return self.schema(target, reference, depth + 1);
        }

        if !raw.all_of.is_empty() {
            return self.all_of(raw, location, depth);
        }

        let schema = match raw.schema_type.as_deref() {
            Some("string") => Schema::String {
                min_length: raw.min_length,
                max_length: raw.max_length,
            },
            #[allow(clippy::cast_possible_truncation)]
            Some("integer") => Schema::Integer {
                format: raw.format.clone(),
                minimum: raw.minimum.map(|n| n as i64),
                maximum: raw.maximum.map(|n| n as i64),
            },
            Some("number") => Schema::Number {
                minimum: raw.minimum,
                maximum: raw.maximum,
            },
            Some("boolean") => Schema::Boolean,
            Some("array") => {
                let items = match &raw.items {
                    Some(items) => self.schema(items, &format!("{location}[]"), depth + 1)?,
                    None => Schema::Any,
                };
                Schema::array(items)
            }
            Some("object") => self.object(raw, location, depth)?,
            None if !raw.properties.is_empty() || !raw.required.is_empty() => {
                self.object(raw, location, depth)?
            }
            None => Schema::Any,
            Some(other) => {
                return Err(ContractError::UnsupportedSchema {
                    location: location.to_string(),
                    reason: format!("unknown type '{other}'"),
                })
            }
        };

        Ok(schema)
    }

    fn object(&self, raw: &RawSchema, location: &str, depth: usize) -> Result<Schema, ContractError> {
        let mut properties = IndexMap::new();
        for (name, prop) in &raw.properties {
            let schema = self.schema(prop, &format!("{location}.{name}"), depth + 1)?;
            properties.insert(name.clone(), schema);
        }
        Ok(Schema::object(properties, raw.required.clone()))
    }

    fn all_of(&self, raw: &RawSchema, location: &str, depth: usize) -> Result<Schema, ContractError> {
        let mut properties = IndexMap::new();
        let mut required: Vec<String> = Vec::new();

        for part in &raw.all_of {
            match self.schema(part, location, depth + 1)? {
                Schema::Object {
                    properties: props,
                    required: req,
                } => {
                    properties.extend(props);
                    for name in req {
                        if !required.contains(&name) {
                            required.push(name);
                        }
                    }
                }
                Schema::Any => {}
                _ => {
                    return Err(ContractError::UnsupportedSchema {
                        location: location.to_string(),
                        reason: "allOf members must be objects".to_string(),
                    })
                }
            }
        }

        // Sibling keywords next to allOf behave like one more member.
        for (name, prop) in &raw.properties {
            let schema = self.schema(prop, &format!("{location}.{name}"), depth + 1)?;
            properties.insert(name.clone(), schema);
        }
        for name in &raw.required {
            if !required.contains(name) {
                required.push(name.clone());
            }
        }

        Ok(Schema::object(properties, required))
    }
}

/// Returns `true` for `application/json` and `+json` media types.
#[must_use]
pub fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contract() -> Contract {
        inventory_contract().unwrap()
    }

    #[test]
    fn test_inventory_contract_operations() {
        let contract = contract();
        assert_eq!(contract.title(), "Inventory Item Store");
        assert_eq!(contract.version(), "1.0.0");

        let ids: Vec<&str> = contract
            .operations()
            .iter()
            .map(Operation::operation_id)
            .collect();
        assert_eq!(
            ids,
            vec!["findItems", "addItem", "findItemById", "updateItem", "deleteItem"]
        );
    }

    #[test]
    fn test_path_level_parameters_are_inherited() {
        let contract = contract();
        for op_id in ["findItemById", "updateItem", "deleteItem"] {
            let op = contract.get_operation(op_id).unwrap();
            let params: Vec<_> = op.parameters_in(ParameterLocation::Path).collect();
            assert_eq!(params.len(), 1, "{op_id}");
            assert_eq!(params[0].name, "id");
            assert!(matches!(params[0].schema, Schema::Integer { .. }));
        }
    }

    #[test]
    fn test_find_items_query_parameters() {
        let contract = contract();
        let op = contract.get_operation("findItems").unwrap();
        let query: Vec<_> = op.parameters_in(ParameterLocation::Query).collect();

        assert_eq!(query.len(), 2);
        assert_eq!(query[0].name, "tags");
        assert_eq!(query[0].schema, Schema::array(Schema::string()));
        assert_eq!(query[1].name, "limit");
        assert!(!query[1].required);
    }

    #[test]
    fn test_new_item_body_schema_resolved() {
        let contract = contract();
        let body = contract
            .get_operation("addItem")
            .unwrap()
            .request_body()
            .unwrap();

        assert!(body.required);
        assert!(body.schema.validate(&json!({"name": "Spot", "tag": "dog"})).is_ok());
        assert!(body.schema.validate(&json!({"name": "Spot"})).is_ok());

        let err = body.schema.validate(&json!({"tag": "dog"})).unwrap_err();
        assert_eq!(err.path, "$.name");

        let err = body.schema.validate(&json!({"name": 5})).unwrap_err();
        assert!(err.message.contains("expected string"));

        assert!(body.schema.validate(&json!({"name": ""})).is_err());
        assert!(body.schema.validate(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_all_of_merges_objects() {
        let doc = json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/things": {
                    "post": {
                        "operationId": "addThing",
                        "requestBody": {
                            "required": true,
                            "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Item"}}}
                        }
                    }
                }
            },
            "components": {"schemas": {
                "Base": {"type": "object", "required": ["name"], "properties": {"name": {"type": "string"}}},
                "Item": {"allOf": [
                    {"$ref": "#/components/schemas/Base"},
                    {"type": "object", "required": ["id"], "properties": {"id": {"type": "integer"}}}
                ]}
            }}
        });
        let contract = Contract::from_openapi_json(&doc.to_string()).unwrap();
        let schema = &contract
            .get_operation("addThing")
            .unwrap()
            .request_body()
            .unwrap()
            .schema;

        assert!(schema.validate(&json!({"id": 1, "name": "x"})).is_ok());
        assert!(schema.validate(&json!({"name": "x"})).is_err());
        assert!(schema.validate(&json!({"id": 1})).is_err());
    }

    #[test]
    fn test_unknown_reference_is_error() {
        let doc = json!({
            "info": {"title": "t", "version": "1"},
            "paths": {"/x": {"post": {
                "operationId": "x",
                "requestBody": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Missing"}}}}
            }}}
        });
        let err = Contract::from_openapi_json(&doc.to_string()).unwrap_err();
        assert!(matches!(err, ContractError::UnknownSchema { .. }));
    }

    #[test]
    fn test_recursive_reference_is_error() {
        let doc = json!({
            "info": {"title": "t", "version": "1"},
            "paths": {"/x": {"post": {
                "operationId": "x",
                "requestBody": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Loop"}}}}
            }}},
            "components": {"schemas": {"Loop": {"$ref": "#/components/schemas/Loop"}}}
        });
        let err = Contract::from_openapi_json(&doc.to_string()).unwrap_err();
        assert!(matches!(err, ContractError::UnsupportedSchema { .. }));
    }

    #[test]
    fn test_duplicate_operation_id_is_error() {
        let doc = json!({
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/a": {"get": {"operationId": "same"}},
                "/b": {"get": {"operationId": "same"}}
            }
        });
        let err = Contract::from_openapi_json(&doc.to_string()).unwrap_err();
        assert!(matches!(err, ContractError::DuplicateOperation { .. }));
    }

    #[test]
    fn test_optional_path_parameter_is_error() {
        let doc = json!({
            "info": {"title": "t", "version": "1"},
            "paths": {"/a/{id}": {"get": {
                "operationId": "getA",
                "parameters": [{"name": "id", "in": "path", "schema": {"type": "string"}}]
            }}}
        });
        let err = Contract::from_openapi_json(&doc.to_string()).unwrap_err();
        assert!(matches!(err, ContractError::InvalidParameter { .. }));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(
            Contract::from_openapi_json("{not json"),
            Err(ContractError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_param_integer() {
        let schema = Schema::integer();
        assert_eq!(schema.parse_param("42", "path.id").unwrap(), json!(42));

        let err = schema.parse_param("abc", "path.id").unwrap_err();
        assert_eq!(err.path, "path.id");
    }

    #[test]
    fn test_parse_param_int32_bounds() {
        let schema = Schema::Integer {
            format: Some("int32".to_string()),
            minimum: Some(0),
            maximum: None,
        };
        assert!(schema.parse_param("10", "query.limit").is_ok());
        assert!(schema.parse_param("-1", "query.limit").is_err());
        assert!(schema.parse_param("4294967296", "query.limit").is_err());
    }

    #[test]
    fn test_parse_param_boolean_and_string() {
        assert_eq!(Schema::Boolean.parse_param("true", "q").unwrap(), json!(true));
        assert!(Schema::Boolean.parse_param("yes", "q").is_err());
        assert_eq!(Schema::string().parse_param("x", "q").unwrap(), json!("x"));
    }

    #[test]
    fn test_null_optional_property_is_ignored() {
        let contract = contract();
        let schema = &contract
            .get_operation("updateItem")
            .unwrap()
            .request_body()
            .unwrap()
            .schema;
        assert!(schema.validate(&json!({"name": "x", "tag": null})).is_ok());
        assert!(schema.validate(&json!({"name": null})).is_err());
    }

    #[test]
    fn test_is_json_media_type() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("application/json; charset=utf-8"));
        assert!(is_json_media_type("application/problem+json"));
        assert!(!is_json_media_type("text/plain"));
    }
}
