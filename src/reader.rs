//! Document reading - builds the model from a YAML document.

use serde_yaml::{Mapping, Value};
use tracing::{debug, trace};

use crate::error::ReadError;
use crate::model::{MediaType, OpenApi, Operation, Parameter, Path, RequestBody, Response};
use crate::node::{
    as_mapping, bool_or, child_path, entries, get, opt_mapping, opt_sequence, opt_string, req_node,
    req_string,
};
use crate::resolver::ComponentResolver;
use crate::types::{Method, ParameterLocation};

/// Read an OpenAPI document from YAML text.
///
/// # Errors
///
/// Returns `ReadError::InvalidYaml` if the text isn't valid YAML, or any
/// error from [`read_value`].
pub fn read(text: &str) -> Result<OpenApi, ReadError> {
    OpenApiReader::new().load(text)
}

/// Read an OpenAPI document from an already parsed YAML tree.
///
/// # Errors
///
/// Returns `ReadError::UnresolvedReferences` when component references never
/// resolve, and other `ReadError` variants for malformed documents.
pub fn read_value(document: &Value) -> Result<OpenApi, ReadError> {
    OpenApiReader::new().load_value(document)
}

/// Reader for OpenAPI documents.
///
/// Every `load` resolves components with its own [`ComponentResolver`], so a
/// reader can be reused for unrelated documents and shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenApiReader;

impl OpenApiReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse YAML text and read it. Merge keys (`<<: *anchor`) are expanded.
    pub fn load(&self, text: &str) -> Result<OpenApi, ReadError> {
        let mut document: Value =
            serde_yaml::from_str(text).map_err(|source| ReadError::InvalidYaml { source })?;
        document
            .apply_merge()
            .map_err(|source| ReadError::InvalidYaml { source })?;
        self.load_value(&document)
    }

    /// Read a parsed tree. All components are resolved before any path is read.
    pub fn load_value(&self, document: &Value) -> Result<OpenApi, ReadError> {
        let root = as_mapping(document, "")?;
        let mut resolver = ComponentResolver::new();

        let components = match get(root, "components") {
            Some(node) => Some(resolver.resolve(node, "/components")?),
            None => None,
        };

        let version = req_string(root, "openapi", "")?;
        let paths = req_node(root, "paths", "")?;
        let paths = read_paths(&resolver, as_mapping(paths, "/paths")?, "/paths")?;

        debug!(version = %version, paths = paths.len(), "read document");

        Ok(OpenApi {
            version,
            components,
            paths,
        })
    }
}

fn read_paths(resolver: &ComponentResolver, paths: &Mapping, path: &str) -> Result<Vec<Path>, ReadError> {
    let mut result = Vec::new();

    for (template, item) in entries(paths, path)? {
        let item_path = child_path(path, &template);
        let mut path_item = Path::new(template);

        if let Some(item) = non_null(item) {
            for (key, operation) in entries(as_mapping(item, &item_path)?, &item_path)? {
                let Some(method) = Method::parse(&key) else {
                    trace!(path = %path_item.path, key = %key, "skipping non-operation key");
                    continue;
                };
                let operation = read_operation(resolver, method, operation, &child_path(&item_path, &key))?;
                path_item.operations.push(operation);
            }
        }

        result.push(path_item);
    }

    Ok(result)
}

fn read_operation(
    resolver: &ComponentResolver,
    method: Method,
    node: &Value,
    path: &str,
) -> Result<Operation, ReadError> {
    let map = as_mapping(node, path)?;

    let responses_path = child_path(path, "responses");
    let responses = as_mapping(req_node(map, "responses", path)?, &responses_path)?;
    let responses = entries(responses, &responses_path)?
        .into_iter()
        .map(|(code, response)| {
            let response_path = child_path(&responses_path, &code);
            read_response(resolver, code, response, &response_path)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let request_body = match get(map, "requestBody") {
        Some(body) => Some(read_request_body(resolver, body, &child_path(path, "requestBody"))?),
        None => None,
    };

    let parameters = match opt_sequence(map, "parameters", path)? {
        Some(params) => {
            let params_path = child_path(path, "parameters");
            let params = params
                .iter()
                .enumerate()
                .map(|(i, param)| read_parameter(resolver, param, &child_path(&params_path, &i.to_string())))
                .collect::<Result<Vec<_>, _>>()?;
            Some(params)
        }
        None => None,
    };

    Ok(Operation {
        method,
        responses,
        request_body,
        parameters,
        deprecated: bool_or(map, "deprecated", false, path)?,
    })
}

fn read_parameter(resolver: &ComponentResolver, node: &Value, path: &str) -> Result<Parameter, ReadError> {
    let map = as_mapping(node, path)?;
    reject_ref(map, path)?;

    let location = req_string(map, "in", path)?;
    let location = ParameterLocation::parse(&location).ok_or_else(|| ReadError::InvalidValue {
        path: child_path(path, "in"),
        value: location.clone(),
        expected: "query, header, path or cookie",
    })?;

    let schema = req_node(map, "schema", path)?;

    Ok(Parameter {
        name: req_string(map, "name", path)?,
        location,
        required: bool_or(map, "required", false, path)?,
        deprecated: bool_or(map, "deprecated", false, path)?,
        description: opt_string(map, "description", path)?,
        schema: resolver.read_schema(schema, &child_path(path, "schema"))?,
    })
}

fn read_response(
    resolver: &ComponentResolver,
    code: String,
    node: &Value,
    path: &str,
) -> Result<Response, ReadError> {
    let map = as_mapping(node, path)?;
    reject_ref(map, path)?;

    let headers = match opt_mapping(map, "headers", path)? {
        Some(headers) => {
            let headers_path = child_path(path, "headers");
            let headers = entries(headers, &headers_path)?
                .into_iter()
                .map(|(name, header)| {
                    let header_path = child_path(&headers_path, &name);
                    resolver.read_header(&name, header, &header_path)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Some(headers)
        }
        None => None,
    };

    let content = match opt_mapping(map, "content", path)? {
        Some(content) => Some(read_content(resolver, content, &child_path(path, "content"))?),
        None => None,
    };

    Ok(Response {
        code,
        content,
        description: opt_string(map, "description", path)?.unwrap_or_default(),
        headers,
    })
}

fn read_request_body(resolver: &ComponentResolver, node: &Value, path: &str) -> Result<RequestBody, ReadError> {
    let map = as_mapping(node, path)?;
    reject_ref(map, path)?;

    let content = match opt_mapping(map, "content", path)? {
        Some(content) => read_content(resolver, content, &child_path(path, "content"))?,
        None => Vec::new(),
    };

    Ok(RequestBody {
        content,
        required: bool_or(map, "required", false, path)?,
    })
}

fn read_content(resolver: &ComponentResolver, content: &Mapping, path: &str) -> Result<Vec<MediaType>, ReadError> {
    entries(content, path)?
        .into_iter()
        .map(|(content_type, media)| {
            let media_path = child_path(path, &content_type);
            let schema = match non_null(media) {
                Some(media) => match get(as_mapping(media, &media_path)?, "schema") {
                    Some(schema) => Some(resolver.read_schema(schema, &child_path(&media_path, "schema"))?),
                    None => None,
                },
                None => None,
            };
            Ok(MediaType {
                content_type,
                schema,
            })
        })
        .collect()
}

/// Only schema and header references are supported.
fn reject_ref(map: &Mapping, path: &str) -> Result<(), ReadError> {
    match opt_string(map, "$ref", path)? {
        Some(reference) => Err(ReadError::InvalidReference { reference }),
        None => Ok(()),
    }
}

fn non_null(value: &Value) -> Option<&Value> {
    if value.is_null() {
        None
    } else {
        Some(value)
    }
}
