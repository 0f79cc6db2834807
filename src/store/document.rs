//! Dotted-path accessor over an untyped [`serde_json::Value`] document
//! (spec §4.A, §9 "dynamic typing in source").
//!
//! The document itself stays schema-flexible so unknown keys always
//! round-trip; typed projections such as [`crate::domain::session::SessionDoc`]
//! are layered on top for business logic.

use serde_json::Value;

use crate::error::{Error, Result};

/// A single operation inside a [`setMany`](super::league_store::LeagueStore::set_many)
/// transaction.
#[derive(Debug, Clone)]
pub struct SetOp {
    pub key: String,
    pub value: Value,
    pub default: Option<Value>,
    pub overwrite: bool,
}

impl SetOp {
    pub fn overwrite(key: impl Into<String>, value: Value) -> Self {
        SetOp {
            key: key.into(),
            value,
            default: None,
            overwrite: true,
        }
    }

    pub fn merge(key: impl Into<String>, value: Value, default: Value) -> Self {
        SetOp {
            key: key.into(),
            value,
            default: Some(default),
            overwrite: false,
        }
    }
}

/// Reads the value at a dotted path, e.g. `"teams.Blue"`.
pub fn get<'a>(doc: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = doc;
    for part in key.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn ensure_path_mut<'a>(root: &'a mut Value, parts: &[&str]) -> &'a mut Value {
    let mut current = root;
    for part in parts {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        let map = current
            .as_object_mut()
            .expect("just coerced to an object above");
        current = map.entry(part.to_string()).or_insert(Value::Null);
    }
    current
}

/// Applies one `set` operation against the in-memory document.
///
/// `overwrite` replaces the value outright. Otherwise the existing value's
/// type at `key` governs: arrays get `value` appended, objects get `value`
/// shallow-merged in (`value` must itself be an object), and a missing slot
/// is first seeded from `default` before either rule applies.
pub fn set(doc: &mut Value, op: &SetOp) -> Result<()> {
    let parts: Vec<&str> = op.key.split('.').collect();
    let slot = ensure_path_mut(doc, &parts);

    if op.overwrite {
        *slot = op.value.clone();
        return Ok(());
    }

    if slot.is_null() {
        if let Some(default) = &op.default {
            *slot = default.clone();
        }
    }

    match slot {
        Value::Array(arr) => {
            arr.push(op.value.clone());
        }
        Value::Object(obj) => match &op.value {
            Value::Object(incoming) => {
                for (k, v) in incoming {
                    obj.insert(k.clone(), v.clone());
                }
            }
            _ => {
                return Err(Error::validation(format!(
                    "cannot merge non-object value into object field '{}'",
                    op.key
                )))
            }
        },
        _ => {
            *slot = op.value.clone();
        }
    }

    Ok(())
}
