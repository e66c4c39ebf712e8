//! Typed access to generic YAML nodes.
//!
//! A key holding an explicit `null` is treated the same as a missing key.

use serde_yaml::{Mapping, Value};

use crate::error::ReadError;
use crate::types::{scalar_string, yaml_type_name};

pub(crate) fn child_path(path: &str, key: &str) -> String {
    format!("{}/{}", path, key)
}

pub(crate) fn as_mapping<'a>(value: &'a Value, path: &str) -> Result<&'a Mapping, ReadError> {
    match value {
        Value::Mapping(map) => Ok(map),
        Value::Tagged(tagged) => as_mapping(&tagged.value, path),
        other => Err(invalid_type(path, "mapping", other)),
    }
}

/// Entries of a mapping with keys rendered as text, in document order.
pub(crate) fn entries<'a>(map: &'a Mapping, path: &str) -> Result<Vec<(String, &'a Value)>, ReadError> {
    map.iter()
        .map(|(key, value)| match scalar_string(key) {
            Some(key) => Ok((key, value)),
            None => Err(invalid_type(path, "scalar key", key)),
        })
        .collect()
}

pub(crate) fn get<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    match map.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

pub(crate) fn opt_string(map: &Mapping, key: &str, path: &str) -> Result<Option<String>, ReadError> {
    match get(map, key) {
        None => Ok(None),
        Some(value) => scalar_string(value)
            .map(Some)
            .ok_or_else(|| invalid_type(&child_path(path, key), "string", value)),
    }
}

pub(crate) fn req_string(map: &Mapping, key: &'static str, path: &str) -> Result<String, ReadError> {
    opt_string(map, key, path)?.ok_or_else(|| ReadError::MissingField {
        path: path.to_string(),
        field: key,
    })
}

pub(crate) fn req_node<'a>(map: &'a Mapping, key: &'static str, path: &str) -> Result<&'a Value, ReadError> {
    get(map, key).ok_or_else(|| ReadError::MissingField {
        path: path.to_string(),
        field: key,
    })
}

pub(crate) fn opt_bool(map: &Mapping, key: &str, path: &str) -> Result<Option<bool>, ReadError> {
    match get(map, key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(invalid_type(&child_path(path, key), "boolean", other)),
    }
}

pub(crate) fn bool_or(map: &Mapping, key: &str, default: bool, path: &str) -> Result<bool, ReadError> {
    Ok(opt_bool(map, key, path)?.unwrap_or(default))
}

pub(crate) fn opt_mapping<'a>(
    map: &'a Mapping,
    key: &str,
    path: &str,
) -> Result<Option<&'a Mapping>, ReadError> {
    get(map, key)
        .map(|value| as_mapping(value, &child_path(path, key)))
        .transpose()
}

pub(crate) fn opt_sequence<'a>(
    map: &'a Mapping,
    key: &str,
    path: &str,
) -> Result<Option<&'a [Value]>, ReadError> {
    match get(map, key) {
        None => Ok(None),
        Some(Value::Sequence(seq)) => Ok(Some(seq.as_slice())),
        Some(other) => Err(invalid_type(&child_path(path, key), "sequence", other)),
    }
}

/// A sequence of scalars as text. Null items are kept as `"null"`.
pub(crate) fn opt_string_list(
    map: &Mapping,
    key: &str,
    path: &str,
) -> Result<Option<Vec<String>>, ReadError> {
    let Some(seq) = opt_sequence(map, key, path)? else {
        return Ok(None);
    };

    let list_path = child_path(path, key);
    seq.iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Null => Ok("null".to_string()),
            other => scalar_string(other)
                .ok_or_else(|| invalid_type(&child_path(&list_path, &i.to_string()), "scalar", other)),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn invalid_type(path: &str, expected: &'static str, actual: &Value) -> ReadError {
    ReadError::InvalidType {
        path: path.to_string(),
        expected,
        actual: yaml_type_name(actual),
    }
}
