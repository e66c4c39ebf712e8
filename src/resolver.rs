//! Component reference resolution.
//!
//! Builds `components.schemas` and `components.headers` into model values,
//! replacing every `$ref` with a copy of its target. Entries may reference
//! entries defined later in the document, so resolution runs in passes until
//! every entry is built or a pass makes no progress.

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use tracing::{debug, trace};

use crate::error::ReadError;
use crate::model::{Components, Header, Property, Schema};
use crate::node::{
    as_mapping, bool_or, child_path, entries, get, opt_bool, opt_mapping, opt_string,
    opt_string_list, req_node,
};
use crate::types::{HEADER_REF_PREFIX, SCHEMA_REF_PREFIX};

/// Resolves `$ref` pointers into component schemas and headers.
///
/// Holds the components resolved so far. Use a fresh resolver for every
/// document; [`crate::read`] creates one per call.
#[derive(Debug, Default)]
pub struct ComponentResolver {
    schemas: IndexMap<String, Schema>,
    headers: IndexMap<String, Header>,
}

impl ComponentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the `components` node of a document.
    ///
    /// Schemas are resolved before headers, since headers may reference
    /// schemas but not the other way round.
    ///
    /// # Errors
    ///
    /// Returns `ReadError::UnresolvedReferences` if some entries can never be
    /// built (cyclic references or references to missing names), or any other
    /// `ReadError` for malformed nodes.
    pub fn resolve(&mut self, components: &Value, path: &str) -> Result<Components, ReadError> {
        let components = as_mapping(components, path)?;

        let schemas = match opt_mapping(components, "schemas", path)? {
            Some(raw) => Some(self.resolve_schemas(raw, &child_path(path, "schemas"))?),
            None => None,
        };

        let headers = match opt_mapping(components, "headers", path)? {
            Some(raw) => Some(self.resolve_headers(raw, &child_path(path, "headers"))?),
            None => None,
        };

        Ok(Components { schemas, headers })
    }

    /// A resolved component schema by name.
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// A resolved component header by name.
    pub fn header(&self, name: &str) -> Option<&Header> {
        self.headers.get(name)
    }

    fn resolve_schemas(&mut self, raw: &Mapping, path: &str) -> Result<IndexMap<String, Schema>, ReadError> {
        let raw = entries(raw, path)?;

        resolve_fixed_point("schemas", &raw, |name, node| {
            let schema = self.read_schema(node, &child_path(path, name))?;
            self.schemas.insert(name.to_string(), schema);
            Ok(())
        })?;

        Ok(in_document_order(&raw, &self.schemas))
    }

    fn resolve_headers(&mut self, raw: &Mapping, path: &str) -> Result<IndexMap<String, Header>, ReadError> {
        let raw = entries(raw, path)?;

        resolve_fixed_point("headers", &raw, |name, node| {
            let header = self.read_header(name, node, &child_path(path, name))?;
            self.headers.insert(name.to_string(), header);
            Ok(())
        })?;

        Ok(in_document_order(&raw, &self.headers))
    }

    /// Build a schema node, dereferencing `$ref` against resolved components.
    ///
    /// # Errors
    ///
    /// Returns `ReadError::UnknownReference` when a `$ref` names a schema
    /// that is not resolved (yet), `ReadError::InvalidReference` for refs
    /// that don't point into `#/components/schemas/`.
    pub fn read_schema(&self, node: &Value, path: &str) -> Result<Schema, ReadError> {
        let map = as_mapping(node, path)?;

        if let Some(reference) = opt_string(map, "$ref", path)? {
            let name = parse_ref(&reference, SCHEMA_REF_PREFIX)?;
            return self
                .schemas
                .get(&name)
                .cloned()
                .ok_or(ReadError::UnknownReference { reference });
        }

        let properties = match opt_mapping(map, "properties", path)? {
            Some(props) => Some(self.read_properties(props, &child_path(path, "properties"))?),
            None => None,
        };

        // `true` allows anything, `false` is treated as not declared.
        let additional_properties = match get(map, "additionalProperties") {
            None | Some(Value::Bool(false)) => None,
            Some(Value::Bool(true)) => Some(Box::default()),
            Some(node) => Some(Box::new(
                self.read_schema(node, &child_path(path, "additionalProperties"))?,
            )),
        };

        let items = match get(map, "items") {
            Some(node) => Some(Box::new(self.read_schema(node, &child_path(path, "items"))?)),
            None => None,
        };

        Ok(Schema {
            title: opt_string(map, "title", path)?,
            schema_type: opt_string(map, "type", path)?,
            deprecated: bool_or(map, "deprecated", false, path)?,
            nullable: bool_or(map, "nullable", false, path)?,
            format: opt_string(map, "format", path)?,
            default: get(map, "default").cloned(),
            unique_items: opt_bool(map, "uniqueItems", path)?,
            required: opt_string_list(map, "required", path)?,
            properties,
            additional_properties,
            items,
            enum_values: opt_string_list(map, "enum", path)?,
        })
    }

    /// Build a header node, dereferencing `$ref` against resolved components.
    ///
    /// A referenced header takes `name`, not the component's key.
    pub fn read_header(&self, name: &str, node: &Value, path: &str) -> Result<Header, ReadError> {
        let map = as_mapping(node, path)?;

        if let Some(reference) = opt_string(map, "$ref", path)? {
            let target = parse_ref(&reference, HEADER_REF_PREFIX)?;
            let header = self
                .headers
                .get(&target)
                .ok_or(ReadError::UnknownReference { reference })?;
            return Ok(Header {
                name: name.to_string(),
                ..header.clone()
            });
        }

        let schema = req_node(map, "schema", path)?;

        Ok(Header {
            name: name.to_string(),
            required: bool_or(map, "required", false, path)?,
            deprecated: bool_or(map, "deprecated", false, path)?,
            schema: self.read_schema(schema, &child_path(path, "schema"))?,
        })
    }

    fn read_properties(&self, props: &Mapping, path: &str) -> Result<Vec<Property>, ReadError> {
        entries(props, path)?
            .into_iter()
            .map(|(name, node)| {
                let schema = self.read_schema(node, &child_path(path, &name))?;
                Ok(Property { name, schema })
            })
            .collect()
    }
}

/// Extract the component name from a local `$ref`.
///
/// Only `<prefix><name>` is accepted; `~1` and `~0` are unescaped as in
/// JSON Pointer.
///
/// # Errors
///
/// Returns `ReadError::InvalidReference` for any other shape.
pub fn parse_ref(reference: &str, prefix: &str) -> Result<String, ReadError> {
    match reference.strip_prefix(prefix) {
        Some(name) if !name.is_empty() && !name.contains('/') => {
            Ok(name.replace("~1", "/").replace("~0", "~"))
        }
        _ => Err(ReadError::InvalidReference {
            reference: reference.to_string(),
        }),
    }
}

/// Retry entries until all are built or a pass makes no progress.
///
/// `resolve_entry` failing with `ReadError::UnknownReference` defers the
/// entry to the next pass; any other error aborts immediately.
fn resolve_fixed_point(
    component: &'static str,
    raw: &[(String, &Value)],
    mut resolve_entry: impl FnMut(&str, &Value) -> Result<(), ReadError>,
) -> Result<(), ReadError> {
    let mut unresolved: Vec<&(String, &Value)> = raw.iter().collect();
    let mut passes = 0;

    while !unresolved.is_empty() {
        passes += 1;
        let before = unresolved.len();
        let mut last_failed = None;
        let mut deferred = Vec::new();

        for entry in unresolved {
            match resolve_entry(&entry.0, entry.1) {
                Ok(()) => {}
                Err(ReadError::UnknownReference { reference }) => {
                    last_failed = Some(reference);
                    deferred.push(entry);
                }
                Err(e) => return Err(e),
            }
        }

        trace!(component, pass = passes, remaining = deferred.len(), "resolution pass");

        if deferred.len() >= before {
            return Err(ReadError::UnresolvedReferences {
                component,
                names: deferred.iter().map(|(name, _)| name.clone()).collect(),
                reference: last_failed,
            });
        }
        unresolved = deferred;
    }

    debug!(component, count = raw.len(), passes, "resolved components");
    Ok(())
}

fn in_document_order<T: Clone>(raw: &[(String, &Value)], resolved: &IndexMap<String, T>) -> IndexMap<String, T> {
    raw.iter()
        .filter_map(|(name, _)| resolved.get(name).map(|v| (name.clone(), v.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn resolve(yaml: &str) -> Result<(ComponentResolver, Components), ReadError> {
        let mut resolver = ComponentResolver::new();
        let resolved = resolver.resolve(&components(yaml), "/components")?;
        Ok((resolver, resolved))
    }

    // === $ref Parsing Tests ===

    #[test]
    fn parse_ref_extracts_name() {
        assert_eq!(
            parse_ref("#/components/schemas/Pet", SCHEMA_REF_PREFIX).unwrap(),
            "Pet"
        );
        assert_eq!(
            parse_ref("#/components/headers/X-Rate", HEADER_REF_PREFIX).unwrap(),
            "X-Rate"
        );
    }

    #[test]
    fn parse_ref_unescapes_pointer() {
        assert_eq!(
            parse_ref("#/components/schemas/a~1b~0c", SCHEMA_REF_PREFIX).unwrap(),
            "a/b~c"
        );
    }

    #[test]
    fn parse_ref_rejects_other_shapes() {
        for reference in [
            "#/definitions/Pet",
            "#/components/schemas/",
            "#/components/schemas/Pet/properties/id",
            "other.yaml#/components/schemas/Pet",
            "#/components/headers/Pet",
        ] {
            assert!(
                matches!(
                    parse_ref(reference, SCHEMA_REF_PREFIX),
                    Err(ReadError::InvalidReference { .. })
                ),
                "{} should be rejected",
                reference
            );
        }
    }

    // === Fixed-Point Resolution Tests ===

    #[test]
    fn forward_reference_resolves() {
        let (resolver, resolved) = resolve(
            r#"
schemas:
  Pets:
    type: array
    items:
      $ref: '#/components/schemas/Pet'
  Pet:
    type: object
    required: [id]
    properties:
      id: { type: integer, format: int64 }
"#,
        )
        .unwrap();

        let pet = resolver.schema("Pet").unwrap();
        let pets = resolver.schema("Pets").unwrap();
        assert_eq!(pets.items.as_deref(), Some(pet));

        // Document order is kept even though Pet resolved first.
        let names: Vec<&String> = resolved.schemas.as_ref().unwrap().keys().collect();
        assert_eq!(names, vec!["Pets", "Pet"]);
    }

    #[test]
    fn reference_chain_resolves_over_several_passes() {
        let (resolver, _) = resolve(
            r#"
schemas:
  A: { $ref: '#/components/schemas/B' }
  B: { $ref: '#/components/schemas/C' }
  C: { type: string, enum: [x, y] }
"#,
        )
        .unwrap();

        assert_eq!(resolver.schema("A"), resolver.schema("C"));
        assert_eq!(
            resolver.schema("A").unwrap().enum_values,
            Some(vec!["x".to_string(), "y".to_string()])
        );
    }

    #[test]
    fn cyclic_reference_names_both_keys() {
        let err = resolve(
            r#"
schemas:
  A:
    type: array
    items: { $ref: '#/components/schemas/B' }
  B:
    type: array
    items: { $ref: '#/components/schemas/A' }
  C:
    type: string
"#,
        )
        .unwrap_err();

        match err {
            ReadError::UnresolvedReferences {
                component,
                names,
                reference,
            } => {
                assert_eq!(component, "schemas");
                assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
                assert!(reference.is_some());
            }
            other => panic!("expected unresolved references, got {:?}", other),
        }
    }

    #[test]
    fn self_reference_is_unresolvable() {
        let err = resolve(
            r#"
schemas:
  Node:
    type: object
    properties:
      next: { $ref: '#/components/schemas/Node' }
"#,
        )
        .unwrap_err();
        assert!(err.is_unresolved());
        assert!(err.to_string().contains("[Node]"));
    }

    #[test]
    fn reference_to_missing_name_is_unresolvable() {
        let err = resolve(
            r#"
schemas:
  Pet:
    $ref: '#/components/schemas/Animal'
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ReadError::UnresolvedReferences { ref names, reference: Some(ref r), .. }
                if names == &vec!["Pet".to_string()] && r == "#/components/schemas/Animal"
        ));
    }

    #[test]
    fn malformed_entry_fails_immediately() {
        let err = resolve(
            r#"
schemas:
  Pet:
    $ref: '#/definitions/Pet'
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ReadError::InvalidReference { .. }));

        let err = resolve(
            r#"
schemas:
  Pet:
    type: object
    properties: [id]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ReadError::InvalidType { .. }));
    }

    // === Header Resolution Tests ===

    #[test]
    fn headers_reference_schemas_and_headers() {
        let (resolver, resolved) = resolve(
            r#"
headers:
  X-Limit-Alias:
    $ref: '#/components/headers/X-Limit'
  X-Limit:
    required: true
    schema: { $ref: '#/components/schemas/Limit' }
schemas:
  Limit: { type: integer, format: int32 }
"#,
        )
        .unwrap();

        let limit = resolver.header("X-Limit").unwrap();
        assert!(limit.required);
        assert_eq!(limit.schema.format.as_deref(), Some("int32"));

        let alias = resolver.header("X-Limit-Alias").unwrap();
        assert_eq!(alias.name, "X-Limit-Alias");
        assert_eq!(alias.schema, limit.schema);

        assert_eq!(resolved.headers.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn cyclic_headers_are_unresolvable() {
        let err = resolve(
            r#"
headers:
  A: { $ref: '#/components/headers/B' }
  B: { $ref: '#/components/headers/A' }
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ReadError::UnresolvedReferences { component: "headers", .. }
        ));
    }

    // === Schema Field Tests ===

    #[test]
    fn reads_all_schema_fields() {
        let resolver = ComponentResolver::new();
        let node = components(
            r#"
title: Pet
type: object
deprecated: true
nullable: true
format: custom
default: 42
uniqueItems: false
required: [id]
properties:
  id: { type: integer }
additionalProperties:
  type: string
items:
  type: number
enum: [a, b]
"#,
        );
        let schema = resolver.read_schema(&node, "").unwrap();

        assert_eq!(schema.title.as_deref(), Some("Pet"));
        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert!(schema.deprecated);
        assert!(schema.nullable);
        assert_eq!(schema.format.as_deref(), Some("custom"));
        assert_eq!(schema.default, Some(Value::from(42)));
        assert_eq!(schema.unique_items, Some(false));
        assert_eq!(schema.required, Some(vec!["id".to_string()]));
        assert_eq!(
            schema.property("id").unwrap().schema,
            Schema::of_type("integer")
        );
        assert_eq!(
            schema.additional_properties.as_deref(),
            Some(&Schema::of_type("string"))
        );
        assert_eq!(schema.items.as_deref(), Some(&Schema::of_type("number")));
        assert_eq!(
            schema.enum_values,
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn boolean_additional_properties() {
        let resolver = ComponentResolver::new();

        let open = components("{ type: object, additionalProperties: true }");
        let schema = resolver.read_schema(&open, "").unwrap();
        assert_eq!(schema.additional_properties.as_deref(), Some(&Schema::default()));

        let closed = components("{ type: object, additionalProperties: false }");
        let schema = resolver.read_schema(&closed, "").unwrap();
        assert!(schema.additional_properties.is_none());
    }

    #[test]
    fn unknown_schema_reference_outside_components() {
        let resolver = ComponentResolver::new();
        let node = components("$ref: '#/components/schemas/Pet'");
        assert!(matches!(
            resolver.read_schema(&node, ""),
            Err(ReadError::UnknownReference { .. })
        ));
    }

    #[test]
    fn header_requires_schema() {
        let resolver = ComponentResolver::new();
        let node = components("required: true");
        assert!(matches!(
            resolver.read_header("X-Id", &node, "/headers/X-Id"),
            Err(ReadError::MissingField { field: "schema", .. })
        ));
    }
}
