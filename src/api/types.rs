//! Domain record types and their mapping to and from API JSON.
//!
//! Resources differ only in which JSON properties carry the title and body,
//! so decoding goes through `serde_json::Value` and a [`FieldMap`] instead of
//! a fixed `#[derive(Deserialize)]` shape.

use crate::config::FieldMap;
use color_eyre::{eyre::eyre, Result};
use serde_json::{Map, Value};

/// A single remote record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
  pub id: u64,
  pub title: String,
  pub body: String,
}

/// The user-editable part of a record, sent on create and update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFields {
  pub title: String,
  pub body: String,
}

impl RecordFields {
  pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      body: body.into(),
    }
  }

  /// Request body for POST/PUT
  pub fn to_json(&self, fields: &FieldMap) -> Value {
    let mut map = Map::new();
    map.insert(fields.title.clone(), Value::String(self.title.clone()));
    map.insert(fields.body.clone(), Value::String(self.body.clone()));
    Value::Object(map)
  }
}

fn as_object(value: &Value) -> Result<&Map<String, Value>> {
  value
    .as_object()
    .ok_or_else(|| eyre!("expected a JSON object"))
}

/// Read an id that may be sent as a number or a numeric string.
fn id_of(object: &Map<String, Value>) -> Option<u64> {
  match object.get("id")? {
    Value::Number(n) => n.as_u64(),
    Value::String(s) => s.parse().ok(),
    _ => None,
  }
}

/// Missing or non-string values become empty strings.
fn text_of(object: &Map<String, Value>, key: &str) -> String {
  match object.get(key) {
    Some(Value::String(s)) => s.clone(),
    Some(Value::Null) | None => String::new(),
    Some(other) => other.to_string(),
  }
}

/// Decode a record that must carry its own id.
pub fn decode_record(value: &Value, fields: &FieldMap) -> Result<Record> {
  let object = as_object(value)?;
  let id = id_of(object).ok_or_else(|| eyre!("record has no numeric id"))?;
  Ok(Record {
    id,
    title: text_of(object, &fields.title),
    body: text_of(object, &fields.body),
  })
}

/// Decode an update response, forcing `id` onto the result.
///
/// Some APIs echo the payload without an id (or with an unrelated one); the
/// cache is keyed by the id that was requested, so that one always wins.
pub fn decode_with_id(value: &Value, id: u64, fields: &FieldMap) -> Result<Record> {
  let object = as_object(value)?;
  Ok(Record {
    id,
    title: text_of(object, &fields.title),
    body: text_of(object, &fields.body),
  })
}

/// Decode a list response.
pub fn decode_list(value: &Value, fields: &FieldMap) -> Result<Vec<Record>> {
  value
    .as_array()
    .ok_or_else(|| eyre!("expected a JSON array"))?
    .iter()
    .map(|item| decode_record(item, fields))
    .collect()
}
