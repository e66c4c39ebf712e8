//! In-memory model of the OpenAPI subset relevant for compatibility checks.
//!
//! Every type is a plain value tree: schemas reached through a `$ref` are
//! copied into each place that uses them, so equality is always structural.
//! Optional list fields keep the difference between "absent" (`None`) and
//! "explicitly empty" (`Some(vec![])`), which the comparator relies on.

use indexmap::IndexMap;
use serde_yaml::Value;

use crate::types::{Method, ParameterLocation};

/// Default OpenAPI version used when building documents programmatically.
pub const DEFAULT_OPENAPI_VERSION: &str = "3.0.2";

/// Root document object.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenApi {
    pub version: String,
    pub components: Option<Components>,
    pub paths: Vec<Path>,
}

impl OpenApi {
    /// Create an empty document with the default version.
    pub fn new() -> Self {
        Self {
            version: DEFAULT_OPENAPI_VERSION.to_string(),
            components: None,
            paths: Vec::new(),
        }
    }

    /// Look up a path item by its path template.
    pub fn path(&self, path: &str) -> Option<&Path> {
        self.paths.iter().find(|p| p.path == path)
    }
}

impl Default for OpenApi {
    fn default() -> Self {
        Self::new()
    }
}

/// Reusable component definitions, already dereferenced.
///
/// Only consulted while reading; the comparator checks referenced
/// definitions where they are used.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Components {
    pub schemas: Option<IndexMap<String, Schema>>,
    pub headers: Option<IndexMap<String, Header>>,
}

/// Operations available on a single path.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub path: String,
    pub operations: Vec<Operation>,
}

impl Path {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            operations: Vec::new(),
        }
    }

    pub fn operation(&self, method: Method) -> Option<&Operation> {
        self.operations.iter().find(|o| o.method == method)
    }
}

/// A single API operation on a path.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub method: Method,
    pub responses: Vec<Response>,
    pub request_body: Option<RequestBody>,
    /// `None` when the operation declares no `parameters` key at all.
    pub parameters: Option<Vec<Parameter>>,
    pub deprecated: bool,
}

impl Operation {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            responses: Vec::new(),
            request_body: None,
            parameters: None,
            deprecated: false,
        }
    }

    pub fn response(&self, code: &str) -> Option<&Response> {
        self.responses.iter().find(|r| r.code == code)
    }
}

/// A single operation parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub deprecated: bool,
    pub description: Option<String>,
    pub schema: Schema,
}

/// Request body of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    pub content: Vec<MediaType>,
    pub required: bool,
}

/// A single response of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code or `default`.
    pub code: String,
    pub content: Option<Vec<MediaType>>,
    pub description: String,
    pub headers: Option<Vec<Header>>,
}

impl Response {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            content: None,
            description: description.into(),
            headers: None,
        }
    }
}

/// A response header.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub name: String,
    pub required: bool,
    pub deprecated: bool,
    pub schema: Schema,
}

/// Payload description for one content type.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaType {
    pub content_type: String,
    pub schema: Option<Schema>,
}

/// Subset of the Schema Object needed for compatibility checks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub title: Option<String>,
    pub schema_type: Option<String>,
    pub deprecated: bool,
    pub nullable: bool,
    pub format: Option<String>,
    /// Raw default value as it appeared in the document.
    pub default: Option<Value>,
    pub unique_items: Option<bool>,
    /// Names of required properties.
    pub required: Option<Vec<String>>,
    pub properties: Option<Vec<Property>>,
    pub additional_properties: Option<Box<Schema>>,
    pub items: Option<Box<Schema>>,
    pub enum_values: Option<Vec<String>>,
}

impl Schema {
    /// Shorthand for a schema with only `type` set.
    pub fn of_type(schema_type: impl Into<String>) -> Self {
        Self {
            schema_type: Some(schema_type.into()),
            ..Self::default()
        }
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .as_ref()
            .and_then(|props| props.iter().find(|p| p.name == name))
    }
}

/// Named entry of a schema's `properties`.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub schema: Schema,
}

impl Property {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}
