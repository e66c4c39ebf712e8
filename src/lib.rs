//! OpenAPI compatibility checker
//!
//! Checks that a hand-written OpenAPI 3.0 document stays compatible with the
//! document generated from the real API (the source).
//!
//! Both documents are read into a reference-free model: every
//! `#/components/schemas/...` and `#/components/headers/...` reference is
//! resolved and inlined. The two models are then compared structurally and
//! each divergence is reported as a human-readable violation.
//!
//! # Example
//!
//! ```
//! use openapi_compat::{compare, read};
//!
//! let source = read(r#"
//! openapi: 3.0.2
//! paths:
//!   /pets:
//!     get:
//!       responses:
//!         '200':
//!           description: A list of pets
//!           content:
//!             application/json:
//!               schema: { $ref: '#/components/schemas/Pet' }
//! components:
//!   schemas:
//!     Pet: { type: object, required: [id] }
//! "#).unwrap();
//!
//! let doc = read(r#"
//! openapi: 3.0.2
//! paths:
//!   /pets:
//!     get:
//!       responses:
//!         '200':
//!           description: Pets
//!           content:
//!             application/json:
//!               schema: { type: object }
//! "#).unwrap();
//!
//! let violations = compare(&doc, &source);
//! assert_eq!(violations, vec![
//!     "In path /pets: In operation get: In responses: In response 200: \
//!      In content application/json: In schema: Doc is missing required properties: [id]",
//! ]);
//! ```
//!
//! # What is compared
//!
//! | Element | Matched by | Notes |
//! |---------|------------|-------|
//! | path | template | |
//! | operation | HTTP method | `deprecated` |
//! | parameter | name | `in`, `required`, `deprecated`, schema; description ignored |
//! | response | status code | doc description must be non-empty |
//! | content | media type | |
//! | header | name | `required`, `deprecated`, schema |
//! | property | name | |
//!
//! Enum values and required property names compare as sets. Schema titles
//! are ignored.

mod compare;
mod error;
mod loader;
mod model;
mod node;
mod reader;
mod resolver;
mod types;
mod writer;

pub use compare::compare;
pub use error::{ReadError, WriteError};
pub use loader::{is_url, load_document, load_document_auto, load_document_str};
pub use model::{
    Components, Header, MediaType, OpenApi, Operation, Parameter, Path, Property, RequestBody,
    Response, Schema, DEFAULT_OPENAPI_VERSION,
};
pub use reader::{read, read_value, OpenApiReader};
pub use resolver::{parse_ref, ComponentResolver};
pub use types::{Method, ParameterLocation, HEADER_REF_PREFIX, HTTP_METHODS, SCHEMA_REF_PREFIX};
pub use writer::{to_string, to_value};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
