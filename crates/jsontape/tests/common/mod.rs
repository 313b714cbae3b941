//! Shared helpers: reconstruct `serde_json::Value`s from both front-ends so
//! tests can compare them against each other and against serde_json itself.
#![allow(dead_code)]

use jsontape::{
    Element, ElementType, Number, OndemandDocument, PaddedString, Result, Value, ValueKind,
};
use serde_json::Value as Json;

pub fn padded(json: &str) -> PaddedString {
    PaddedString::from(json)
}

/// Walks the tape into a `serde_json` tree. Duplicate keys resolve to the
/// last occurrence, matching what `serde_json::from_str` does.
pub fn element_to_json(element: Element<'_>) -> Json {
    match element.element_type() {
        ElementType::Null => Json::Null,
        ElementType::Bool => Json::Bool(element.get_bool().expect("tagged bool")),
        ElementType::I64 => Json::from(element.get_i64().expect("tagged i64")),
        ElementType::U64 => Json::from(element.get_u64().expect("tagged u64")),
        ElementType::F64 => number_to_json(element.get_f64().expect("tagged f64")),
        ElementType::String => Json::String(element.get_str().expect("tagged string").to_owned()),
        ElementType::Array => Json::Array(
            element
                .get_array()
                .expect("tagged array")
                .iter()
                .map(element_to_json)
                .collect(),
        ),
        ElementType::Object => {
            let mut map = serde_json::Map::new();
            for (key, value) in &element.get_object().expect("tagged object") {
                map.insert(key.to_owned(), element_to_json(value));
            }
            Json::Object(map)
        }
    }
}

/// Drives the on-demand cursor over one whole value.
pub fn value_to_json(value: Value<'_, '_>) -> Result<Json> {
    Ok(match value.kind()? {
        ValueKind::Null => {
            let mut value = value;
            assert!(value.is_null()?);
            Json::Null
        }
        ValueKind::Bool => Json::Bool(value.get_bool()?),
        ValueKind::Number => match value.get_number()? {
            Number::I64(v) => Json::from(v),
            Number::U64(v) => Json::from(v),
            Number::F64(v) => number_to_json(v),
        },
        ValueKind::String => Json::String(value.get_str()?.to_owned()),
        ValueKind::Array => {
            let mut array = value.get_array()?;
            let mut items = Vec::new();
            while let Some(item) = array.next()? {
                items.push(value_to_json(item)?);
            }
            Json::Array(items)
        }
        ValueKind::Object => {
            let mut object = value.get_object()?;
            let mut map = serde_json::Map::new();
            while let Some(field) = object.next_field()? {
                let key = field.unescaped_key()?;
                map.insert(key, value_to_json(field.value())?);
            }
            Json::Object(map)
        }
    })
}

/// Drives a whole on-demand document, scalar roots included.
pub fn ondemand_to_json(doc: &mut OndemandDocument<'_>) -> Result<Json> {
    match doc.get_value() {
        Ok(value) => value_to_json(value),
        Err(jsontape::Error::ScalarDocumentAsValue) => scalar_root_to_json(doc),
        Err(err) => Err(err),
    }
}

fn scalar_root_to_json(doc: &mut OndemandDocument<'_>) -> Result<Json> {
    if doc.is_null()? {
        return Ok(Json::Null);
    }
    if let Ok(b) = doc.get_bool() {
        return Ok(Json::Bool(b));
    }
    if let Ok(s) = doc.get_str() {
        return Ok(Json::String(s.to_owned()));
    }
    if let Ok(v) = doc.get_i64() {
        return Ok(Json::from(v));
    }
    if let Ok(v) = doc.get_u64() {
        return Ok(Json::from(v));
    }
    doc.get_f64().map(number_to_json)
}

fn number_to_json(v: f64) -> Json {
    serde_json::Number::from_f64(v).map_or(Json::Null, Json::Number)
}
