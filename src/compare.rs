//! Compatibility comparison between documentation and its source document.
//!
//! The comparison walks the whole tree and collects every divergence that
//! breaks, or may break, compatibility. Messages are prefixed with the
//! location they were found at, outermost first, e.g.
//! `In path /pets: In operation get: In responses: In response 200: ...`.

use std::collections::HashSet;
use std::fmt::Display;

use serde_yaml::Value;
use tracing::debug;

use crate::model::{
    Header, MediaType, OpenApi, Operation, Parameter, Path, Property, RequestBody, Response,
    Schema,
};
use crate::types::scalar_string;

/// Compare documentation against the source of truth.
///
/// Returns the list of violations; an empty list means the documentation is
/// compatible with the source. Response and parameter descriptions and
/// schema titles are never compared.
pub fn compare(doc: &OpenApi, source: &OpenApi) -> Vec<String> {
    let mut violations = Vec::new();

    if doc.version != source.version {
        violations.push(format!(
            "Doc's OpenAPI version doesn't match source's: {} != {}",
            doc.version, source.version
        ));
    }

    match_entries(
        &mut violations,
        "",
        "",
        "path",
        "paths",
        &doc.paths,
        &source.paths,
        compare_path,
    );

    debug!(violations = violations.len(), "compared documents");
    violations
}

/// Natural identity of an entry within its parent list.
trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Path {
    fn key(&self) -> &str {
        &self.path
    }
}

impl Keyed for Operation {
    fn key(&self) -> &str {
        self.method.as_str()
    }
}

impl Keyed for Parameter {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for Response {
    fn key(&self) -> &str {
        &self.code
    }
}

impl Keyed for Header {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for MediaType {
    fn key(&self) -> &str {
        &self.content_type
    }
}

impl Keyed for Property {
    fn key(&self) -> &str {
        &self.name
    }
}

/// Pair up doc and source entries by identity.
///
/// Source entries without a doc counterpart are reported and not compared
/// further. Doc entries left unmatched are reported once, together. Matched
/// entries are compared under `scope`, then `group`, then their own prefix.
#[allow(clippy::too_many_arguments)]
fn match_entries<T: Keyed>(
    violations: &mut Vec<String>,
    scope: &str,
    group: &str,
    kind: &str,
    kinds: &str,
    doc: &[T],
    source: &[T],
    compare_entry: fn(&mut Vec<String>, &str, &T, &T),
) {
    let mut unmatched: Vec<&T> = doc.iter().collect();

    for entry in source {
        let Some(index) = unmatched.iter().position(|d| d.key() == entry.key()) else {
            violations.push(format!("{}Cannot find doc for {}: {}", scope, kind, entry.key()));
            continue;
        };
        let doc_entry = unmatched.remove(index);

        let entry_scope = format!("{}{}In {} {}: ", scope, group, kind, entry.key());
        compare_entry(violations, &entry_scope, doc_entry, entry);
    }

    if !unmatched.is_empty() {
        let keys: Vec<&str> = unmatched.iter().map(|d| d.key()).collect();
        violations.push(format!(
            "{}There are unknown {} in the doc: {}",
            scope,
            kinds,
            list(&keys)
        ));
    }
}

fn compare_path(violations: &mut Vec<String>, scope: &str, doc: &Path, source: &Path) {
    match_entries(
        violations,
        scope,
        "",
        "operation",
        "operations",
        &doc.operations,
        &source.operations,
        compare_operation,
    );
}

fn compare_operation(violations: &mut Vec<String>, scope: &str, doc: &Operation, source: &Operation) {
    if doc.deprecated != source.deprecated {
        violations.push(format!(
            "{}Doc's deprecation doesn't match source's: {} != {}",
            scope, doc.deprecated, source.deprecated
        ));
    }

    match (&doc.request_body, &source.request_body) {
        (None, Some(_)) => push(violations, scope, "Doc is missing requestBody definition"),
        (Some(_), None) => push(violations, scope, "There is unknown requestBody in the doc"),
        (Some(doc_body), Some(source_body)) => {
            compare_request_body(violations, &format!("{}In requestBody: ", scope), doc_body, source_body);
        }
        (None, None) => {}
    }

    match (&doc.parameters, &source.parameters) {
        (None, Some(_)) => push(violations, scope, "Doc is entirely missing parameters definition"),
        (Some(_), None) => push(violations, scope, "Doc has unknown parameters definition"),
        (Some(doc_params), Some(source_params)) => {
            match_entries(
                violations,
                scope,
                "In parameters: ",
                "parameter",
                "parameters",
                doc_params,
                source_params,
                compare_parameter,
            );
        }
        (None, None) => {}
    }

    match_entries(
        violations,
        scope,
        "In responses: ",
        "response",
        "responses",
        &doc.responses,
        &source.responses,
        compare_response,
    );
}

fn compare_parameter(violations: &mut Vec<String>, scope: &str, doc: &Parameter, source: &Parameter) {
    if doc.location != source.location {
        violations.push(format!(
            "{}Doc's 'in' doesn't match source's: {} != {}",
            scope, doc.location, source.location
        ));
    }

    mismatch(violations, scope, "required", &doc.required, &source.required);
    mismatch(violations, scope, "deprecated", &doc.deprecated, &source.deprecated);

    compare_schema(violations, &format!("{}In schema: ", scope), &doc.schema, &source.schema);
}

fn compare_response(violations: &mut Vec<String>, scope: &str, doc: &Response, source: &Response) {
    if doc.description.is_empty() {
        push(violations, scope, "Doc's description is empty");
    }

    // Absent content matches like an empty content map.
    match_entries(
        violations,
        scope,
        "",
        "content",
        "contents",
        doc.content.as_deref().unwrap_or_default(),
        source.content.as_deref().unwrap_or_default(),
        compare_media_type,
    );

    match (&doc.headers, &source.headers) {
        (None, Some(_)) => push(violations, scope, "Doc is entirely missing headers definition"),
        (Some(_), None) => push(violations, scope, "Doc has unknown headers definition"),
        (Some(doc_headers), Some(source_headers)) => {
            match_entries(
                violations,
                scope,
                "In headers: ",
                "header",
                "headers",
                doc_headers,
                source_headers,
                compare_header,
            );
        }
        (None, None) => {}
    }
}

fn compare_header(violations: &mut Vec<String>, scope: &str, doc: &Header, source: &Header) {
    mismatch(violations, scope, "required", &doc.required, &source.required);
    mismatch(violations, scope, "deprecated", &doc.deprecated, &source.deprecated);

    compare_schema(violations, &format!("{}In schema: ", scope), &doc.schema, &source.schema);
}

fn compare_request_body(violations: &mut Vec<String>, scope: &str, doc: &RequestBody, source: &RequestBody) {
    mismatch(violations, scope, "required", &doc.required, &source.required);

    match_entries(
        violations,
        scope,
        "",
        "content",
        "contents",
        &doc.content,
        &source.content,
        compare_media_type,
    );
}

fn compare_media_type(violations: &mut Vec<String>, scope: &str, doc: &MediaType, source: &MediaType) {
    match (&doc.schema, &source.schema) {
        (Some(_), None) => push(violations, scope, "Doc has unknown schema"),
        (None, Some(_)) => push(violations, scope, "Doc is missing schema"),
        (Some(doc_schema), Some(source_schema)) => {
            compare_schema(violations, &format!("{}In schema: ", scope), doc_schema, source_schema);
        }
        (None, None) => {}
    }
}

fn compare_schema(violations: &mut Vec<String>, scope: &str, doc: &Schema, source: &Schema) {
    mismatch(violations, scope, "type", &show(&doc.schema_type), &show(&source.schema_type));
    mismatch(violations, scope, "deprecated", &doc.deprecated, &source.deprecated);
    mismatch(violations, scope, "nullable", &doc.nullable, &source.nullable);
    mismatch(violations, scope, "format", &show(&doc.format), &show(&source.format));
    mismatch(
        violations,
        scope,
        "default",
        &show(&default_text(doc)),
        &show(&default_text(source)),
    );
    mismatch(violations, scope, "uniqueItems", &show(&doc.unique_items), &show(&source.unique_items));

    compare_sets(
        violations,
        scope,
        "required properties",
        doc.required.as_deref(),
        source.required.as_deref(),
    );

    match (&doc.properties, &source.properties) {
        (None, Some(_)) => push(violations, scope, "Doc is entirely missing properties definition"),
        (Some(_), None) => push(violations, scope, "Doc has unknown properties definition"),
        (Some(doc_props), Some(source_props)) => {
            match_entries(
                violations,
                &format!("{}In properties: ", scope),
                "",
                "property",
                "properties",
                doc_props,
                source_props,
                compare_property,
            );
        }
        (None, None) => {}
    }

    match (&doc.additional_properties, &source.additional_properties) {
        (None, Some(_)) => push(
            violations,
            scope,
            "Doc is entirely missing additionalProperties definition",
        ),
        (Some(_), None) => push(violations, scope, "Doc has unknown additionalProperties definition"),
        (Some(doc_additional), Some(source_additional)) => compare_schema(
            violations,
            &format!("{}In additionalProperties: ", scope),
            doc_additional,
            source_additional,
        ),
        (None, None) => {}
    }

    match (&doc.items, &source.items) {
        (None, Some(_)) => push(violations, scope, "Doc is entirely missing items definition"),
        (Some(_), None) => push(violations, scope, "Doc has unknown items definition"),
        (Some(doc_items), Some(source_items)) => {
            compare_schema(violations, &format!("{}In items: ", scope), doc_items, source_items);
        }
        (None, None) => {}
    }

    compare_sets(
        violations,
        scope,
        "enum values",
        doc.enum_values.as_deref(),
        source.enum_values.as_deref(),
    );
}

fn compare_property(violations: &mut Vec<String>, scope: &str, doc: &Property, source: &Property) {
    compare_schema(violations, scope, &doc.schema, &source.schema);
}

/// Set comparison where an absent list counts as empty.
fn compare_sets(
    violations: &mut Vec<String>,
    scope: &str,
    what: &str,
    doc: Option<&[String]>,
    source: Option<&[String]>,
) {
    let doc = doc.unwrap_or_default();
    let source = source.unwrap_or_default();

    let missing = difference(source, doc);
    if !missing.is_empty() {
        violations.push(format!("{}Doc is missing {}: {}", scope, what, list(&missing)));
    }

    let unknown = difference(doc, source);
    if !unknown.is_empty() {
        violations.push(format!("{}Doc has unknown {}: {}", scope, what, list(&unknown)));
    }
}

/// Distinct values of `left` absent from `right`, in `left` order.
fn difference<'a>(left: &'a [String], right: &[String]) -> Vec<&'a str> {
    let right: HashSet<&str> = right.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    left.iter()
        .map(String::as_str)
        .filter(|value| !right.contains(value) && seen.insert(*value))
        .collect()
}

fn mismatch<T: PartialEq + Display>(violations: &mut Vec<String>, scope: &str, field: &str, doc: &T, source: &T) {
    if doc != source {
        violations.push(format!(
            "{}Doc's {} doesn't match source's: {} != {}",
            scope, field, doc, source
        ));
    }
}

fn push(violations: &mut Vec<String>, scope: &str, message: &str) {
    violations.push(format!("{}{}", scope, message));
}

fn show<T: Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "null".to_string(),
    }
}

/// An explicit `null` default is the same as no default.
fn default_text(schema: &Schema) -> Option<String> {
    schema
        .default
        .as_ref()
        .filter(|value| !value.is_null())
        .map(value_text)
}

/// Scalars as plain text, collections in flow style such as `["a","b"]`.
fn value_text(value: &Value) -> String {
    if let Some(text) = scalar_string(value) {
        return text;
    }
    serde_json::to_string(value)
        .or_else(|_| serde_yaml::to_string(value).map(|text| text.trim_end().to_string()))
        .unwrap_or_default()
}

fn list(items: &[&str]) -> String {
    format!("[{}]", items.join(", "))
}
