//! YAML serialization of the model.
//!
//! Output re-reads into an equivalent model. References are written inline,
//! so the output never contains `$ref`. Flags that default to `false` are
//! only written when set.

use serde_yaml::{Mapping, Value};

use crate::error::WriteError;
use crate::model::{
    Components, Header, MediaType, OpenApi, Operation, Parameter, Path, RequestBody, Response,
    Schema,
};

/// Serialize a document to YAML text.
///
/// # Errors
///
/// Returns `WriteError::Serialize` if the YAML emitter fails.
pub fn to_string(doc: &OpenApi) -> Result<String, WriteError> {
    serde_yaml::to_string(&to_value(doc)).map_err(|source| WriteError::Serialize { source })
}

/// Build the generic YAML tree of a document.
pub fn to_value(doc: &OpenApi) -> Value {
    let mut map = Mapping::new();
    insert(&mut map, "openapi", Value::String(doc.version.clone()));

    let paths: Mapping = doc
        .paths
        .iter()
        .map(|path| (Value::String(path.path.clone()), path_value(path)))
        .collect();
    insert(&mut map, "paths", Value::Mapping(paths));

    if let Some(components) = &doc.components {
        insert(&mut map, "components", components_value(components));
    }

    Value::Mapping(map)
}

fn components_value(components: &Components) -> Value {
    let mut map = Mapping::new();

    if let Some(schemas) = &components.schemas {
        let schemas: Mapping = schemas
            .iter()
            .map(|(name, schema)| (Value::String(name.clone()), schema_value(schema)))
            .collect();
        insert(&mut map, "schemas", Value::Mapping(schemas));
    }

    if let Some(headers) = &components.headers {
        let headers: Mapping = headers
            .iter()
            .map(|(name, header)| (Value::String(name.clone()), header_value(header)))
            .collect();
        insert(&mut map, "headers", Value::Mapping(headers));
    }

    Value::Mapping(map)
}

fn path_value(path: &Path) -> Value {
    let operations: Mapping = path
        .operations
        .iter()
        .map(|op| (Value::from(op.method.as_str()), operation_value(op)))
        .collect();
    Value::Mapping(operations)
}

fn operation_value(op: &Operation) -> Value {
    let mut map = Mapping::new();

    flag(&mut map, "deprecated", op.deprecated);

    if let Some(parameters) = &op.parameters {
        let parameters = parameters.iter().map(parameter_value).collect();
        insert(&mut map, "parameters", Value::Sequence(parameters));
    }

    if let Some(body) = &op.request_body {
        insert(&mut map, "requestBody", request_body_value(body));
    }

    let responses: Mapping = op
        .responses
        .iter()
        .map(|response| (Value::String(response.code.clone()), response_value(response)))
        .collect();
    insert(&mut map, "responses", Value::Mapping(responses));

    Value::Mapping(map)
}

fn parameter_value(param: &Parameter) -> Value {
    let mut map = Mapping::new();
    insert(&mut map, "name", Value::String(param.name.clone()));
    insert(&mut map, "in", Value::from(param.location.as_str()));
    flag(&mut map, "required", param.required);
    flag(&mut map, "deprecated", param.deprecated);
    if let Some(description) = &param.description {
        insert(&mut map, "description", Value::String(description.clone()));
    }
    insert(&mut map, "schema", schema_value(&param.schema));
    Value::Mapping(map)
}

fn request_body_value(body: &RequestBody) -> Value {
    let mut map = Mapping::new();
    flag(&mut map, "required", body.required);
    insert(&mut map, "content", content_value(&body.content));
    Value::Mapping(map)
}

fn response_value(response: &Response) -> Value {
    let mut map = Mapping::new();
    insert(&mut map, "description", Value::String(response.description.clone()));

    if let Some(headers) = &response.headers {
        let headers: Mapping = headers
            .iter()
            .map(|header| (Value::String(header.name.clone()), header_value(header)))
            .collect();
        insert(&mut map, "headers", Value::Mapping(headers));
    }

    if let Some(content) = &response.content {
        insert(&mut map, "content", content_value(content));
    }

    Value::Mapping(map)
}

/// The header's name is the key of the enclosing mapping.
fn header_value(header: &Header) -> Value {
    let mut map = Mapping::new();
    flag(&mut map, "required", header.required);
    flag(&mut map, "deprecated", header.deprecated);
    insert(&mut map, "schema", schema_value(&header.schema));
    Value::Mapping(map)
}

fn content_value(content: &[MediaType]) -> Value {
    let content: Mapping = content
        .iter()
        .map(|media| {
            let mut map = Mapping::new();
            if let Some(schema) = &media.schema {
                insert(&mut map, "schema", schema_value(schema));
            }
            (Value::String(media.content_type.clone()), Value::Mapping(map))
        })
        .collect();
    Value::Mapping(content)
}

fn schema_value(schema: &Schema) -> Value {
    let mut map = Mapping::new();

    if let Some(title) = &schema.title {
        insert(&mut map, "title", Value::String(title.clone()));
    }
    if let Some(schema_type) = &schema.schema_type {
        insert(&mut map, "type", Value::String(schema_type.clone()));
    }
    flag(&mut map, "deprecated", schema.deprecated);
    flag(&mut map, "nullable", schema.nullable);
    if let Some(format) = &schema.format {
        insert(&mut map, "format", Value::String(format.clone()));
    }
    if let Some(default) = schema.default.as_ref().filter(|value| !value.is_null()) {
        insert(&mut map, "default", default.clone());
    }
    if let Some(unique_items) = schema.unique_items {
        insert(&mut map, "uniqueItems", Value::Bool(unique_items));
    }
    if let Some(required) = &schema.required {
        insert(&mut map, "required", string_list(required));
    }
    if let Some(properties) = &schema.properties {
        let properties: Mapping = properties
            .iter()
            .map(|prop| (Value::String(prop.name.clone()), schema_value(&prop.schema)))
            .collect();
        insert(&mut map, "properties", Value::Mapping(properties));
    }
    if let Some(additional) = &schema.additional_properties {
        insert(&mut map, "additionalProperties", schema_value(additional));
    }
    if let Some(items) = &schema.items {
        insert(&mut map, "items", schema_value(items));
    }
    if let Some(values) = &schema.enum_values {
        insert(&mut map, "enum", string_list(values));
    }

    Value::Mapping(map)
}

fn string_list(values: &[String]) -> Value {
    Value::Sequence(values.iter().cloned().map(Value::String).collect())
}

fn insert(map: &mut Mapping, key: &str, value: Value) {
    map.insert(Value::from(key), value);
}

fn flag(map: &mut Mapping, key: &str, value: bool) {
    if value {
        insert(map, key, Value::Bool(true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Property;
    use crate::types::{Method, ParameterLocation};

    fn pet_schema() -> Schema {
        Schema {
            required: Some(vec!["id".to_string()]),
            properties: Some(vec![
                Property::new("id", Schema::of_type("integer")),
                Property::new("tag", Schema {
                    nullable: true,
                    ..Schema::of_type("string")
                }),
            ]),
            ..Schema::of_type("object")
        }
    }

    #[test]
    fn writes_only_set_flags() {
        let value = schema_value(&Schema::of_type("string"));
        assert_eq!(value, serde_yaml::from_str::<Value>("type: string").unwrap());
    }

    #[test]
    fn writes_nested_schema() {
        let value = schema_value(&pet_schema());
        let expected: Value = serde_yaml::from_str(
            r#"
type: object
required: [id]
properties:
  id: { type: integer }
  tag: { type: string, nullable: true }
"#,
        )
        .unwrap();
        assert_eq!(value, expected);
    }

    #[test]
    fn writes_empty_schema_as_empty_mapping() {
        assert_eq!(schema_value(&Schema::default()), Value::Mapping(Mapping::new()));
    }

    #[test]
    fn keeps_empty_lists() {
        let mut op = Operation::new(Method::Get);
        op.parameters = Some(Vec::new());
        let mut response = Response::new("200", "ok");
        response.content = Some(Vec::new());
        op.responses.push(response);

        let value = operation_value(&op);
        assert_eq!(value["parameters"], Value::Sequence(Vec::new()));
        assert_eq!(value["responses"]["200"]["content"], Value::Mapping(Mapping::new()));
    }

    #[test]
    fn writes_document() {
        let mut op = Operation::new(Method::Get);
        op.parameters = Some(vec![Parameter {
            name: "limit".to_string(),
            location: ParameterLocation::Query,
            required: false,
            deprecated: false,
            description: Some("How many items to return".to_string()),
            schema: Schema::of_type("integer"),
        }]);
        let mut response = Response::new("200", "A paged array of pets");
        response.content = Some(vec![MediaType {
            content_type: "application/json".to_string(),
            schema: Some(pet_schema()),
        }]);
        op.responses.push(response);
        let mut path = Path::new("/pets");
        path.operations.push(op);

        let doc = OpenApi {
            paths: vec![path],
            ..OpenApi::new()
        };

        let text = to_string(&doc).unwrap();
        assert!(text.starts_with("openapi: 3.0.2\n"));
        assert!(text.contains("/pets:"));
        assert!(text.contains("in: query"));
        assert!(!text.contains("$ref"));
    }

    #[test]
    fn null_default_is_omitted() {
        let schema = Schema {
            default: Some(Value::Null),
            ..Schema::of_type("string")
        };
        assert_eq!(schema_value(&schema), serde_yaml::from_str::<Value>("type: string").unwrap());
    }
}
