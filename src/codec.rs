//! Bidirectional mapping between typed domain values and wire attribute
//! values.
//!
//! Domain values are [`serde_json::Value`]s as handed over by the model
//! layer. Encoding dispatches exhaustively over [`SemanticType`], so every
//! supported type is an explicit match arm and an unsupported value fails
//! with a typed error instead of being dropped.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::schema::{AttributeRole, Schema, SemanticType};
use crate::types::{AttributeAction, AttributeUpdate, AttributeValue, Item, ItemKey};

/// Encoding options.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EncodeOptions {
    /// Degrade a set-typed attribute to its scalar element encoding.
    ///
    /// Needed when a single element is compared against a set attribute,
    /// e.g. a `CONTAINS` filter on a string-set column.
    pub convert_sets: bool,
}

impl EncodeOptions {
    /// Options with `convert_sets` enabled.
    pub fn converting_sets() -> Self {
        Self { convert_sets: true }
    }
}

/// Encode one domain value as a wire attribute value.
///
/// Booleans encode as numbers: any value other than exactly `false` or the
/// string `"false"` encodes as `{N:"1"}` — including the number `0`, which
/// is therefore indistinguishable from `true` on the wire. Dates accept an
/// RFC 3339 string or an epoch-milliseconds number and always normalize to
/// RFC 3339 UTC; anything else fails with [`Error::InvalidDate`]. A scalar
/// value given for a set attribute is promoted to a one-element set.
pub fn encode(
    attribute: &str,
    value: &Value,
    semantic_type: SemanticType,
    options: EncodeOptions,
) -> Result<AttributeValue> {
    if options.convert_sets && semantic_type.is_set() {
        return encode(
            attribute,
            value,
            semantic_type.element_type(),
            EncodeOptions::default(),
        );
    }
    match semantic_type {
        SemanticType::Binary => match value {
            Value::String(s) => Ok(AttributeValue::B(s.clone().into_bytes())),
            _ => Err(unsupported(attribute)),
        },
        SemanticType::Boolean => {
            let truthy = !matches!(value, Value::Bool(false))
                && value.as_str() != Some("false");
            let encoded = if truthy { "1" } else { "0" };
            Ok(AttributeValue::N(encoded.to_string()))
        }
        SemanticType::Date => {
            let formatted = coerce_date(value)
                .ok_or_else(|| Error::InvalidDate {
                    attribute: attribute.to_string(),
                    value: value.to_string(),
                })?;
            Ok(AttributeValue::S(formatted))
        }
        SemanticType::Number => Ok(AttributeValue::N(encode_number(value)?)),
        SemanticType::NumberSet => {
            let elements = set_elements(value)
                .into_iter()
                .map(encode_number)
                .collect::<Result<Vec<_>>>()?;
            Ok(AttributeValue::Ns(elements))
        }
        SemanticType::String => match value {
            Value::Number(n) => Ok(AttributeValue::S(decimal_string(n))),
            Value::String(s) => Ok(AttributeValue::S(s.clone())),
            _ => Err(unsupported(attribute)),
        },
        SemanticType::StringSet => {
            let elements = set_elements(value)
                .into_iter()
                .map(|element| match element {
                    Value::Number(n) => Ok(decimal_string(n)),
                    Value::String(s) => Ok(s.clone()),
                    _ => Err(unsupported(attribute)),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(AttributeValue::Ss(elements))
        }
    }
}

/// Decode one wire attribute value back to a domain value.
///
/// Decoding is tolerant across tags: a number decodes from `{N}` or `{S}`,
/// a boolean from a number (non-zero is true) or the string `"true"`, and a
/// scalar wire value decodes into a one-element set for set types. A
/// missing attribute decodes to `null` for scalars and `[]` for sets.
pub fn decode(value: Option<&AttributeValue>, semantic_type: SemanticType) -> Result<Value> {
    let Some(value) = value else {
        return Ok(if semantic_type.is_set() {
            Value::Array(Vec::new())
        } else {
            Value::Null
        });
    };
    match semantic_type {
        SemanticType::Binary => match value {
            AttributeValue::B(bytes) => String::from_utf8(bytes.clone())
                .map(Value::String)
                .map_err(|_| mismatch(value, "Binary")),
            other => Err(mismatch(other, "Binary")),
        },
        SemanticType::Boolean => match value {
            AttributeValue::N(n) => {
                let parsed: f64 = n.parse().map_err(|_| Error::InvalidNumber {
                    value: n.clone(),
                })?;
                Ok(Value::Bool(parsed != 0.0))
            }
            AttributeValue::S(s) => Ok(Value::Bool(s == "true")),
            other => Err(mismatch(other, "Boolean")),
        },
        SemanticType::Date => match value {
            AttributeValue::N(millis) => {
                let millis: i64 = millis.parse().map_err(|_| Error::InvalidNumber {
                    value: millis.clone(),
                })?;
                let formatted = DateTime::<Utc>::from_timestamp_millis(millis)
                    .map(|date| date.to_rfc3339_opts(SecondsFormat::Millis, true))
                    .ok_or_else(|| Error::InvalidDate {
                        attribute: String::new(),
                        value: millis.to_string(),
                    })?;
                Ok(Value::String(formatted))
            }
            AttributeValue::S(s) => Ok(Value::String(s.clone())),
            other => Err(mismatch(other, "Date")),
        },
        SemanticType::Number => match value {
            AttributeValue::N(n) | AttributeValue::S(n) => decode_number(n),
            other => Err(mismatch(other, "Number")),
        },
        SemanticType::NumberSet => match value {
            AttributeValue::N(n) => Ok(Value::Array(vec![decode_number(n)?])),
            AttributeValue::Ns(elements) => {
                let decoded = elements
                    .iter()
                    .map(|element| decode_number(element))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Array(decoded))
            }
            other => Err(mismatch(other, "NumberSet")),
        },
        SemanticType::String => match value {
            AttributeValue::N(s) | AttributeValue::S(s) => Ok(Value::String(s.clone())),
            other => Err(mismatch(other, "String")),
        },
        SemanticType::StringSet => match value {
            AttributeValue::S(s) => Ok(Value::Array(vec![Value::String(s.clone())])),
            AttributeValue::Ss(elements) => Ok(Value::Array(
                elements.iter().cloned().map(Value::String).collect(),
            )),
            other => Err(mismatch(other, "StringSet")),
        },
    }
}

/// Encode every declared attribute present in the record.
///
/// Absent attributes (and explicit nulls) are omitted, never defaulted.
pub fn serialize_item(
    schema: &Schema,
    record: &Map<String, Value>,
    options: EncodeOptions,
) -> Result<Item> {
    let mut item = Item::with_capacity(record.len());
    for (name, definition) in schema.attributes() {
        let Some(value) = record.get(name) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let encoded = encode(name, value, definition.semantic_type, options)?;
        item.insert(name.clone(), encoded);
    }
    Ok(item)
}

/// Emit a per-attribute `{Action, Value}` map for the record, excluding key
/// attributes.
///
/// An explicit `null` becomes a `DELETE` action with no value, removing the
/// attribute regardless of the requested action.
pub fn serialize_item_for_update(
    schema: &Schema,
    action: AttributeAction,
    record: &Map<String, Value>,
) -> Result<HashMap<String, AttributeUpdate>> {
    let mut updates = HashMap::with_capacity(record.len());
    for (name, definition) in schema.attributes() {
        if matches!(
            definition.role,
            AttributeRole::HashKey | AttributeRole::RangeKey
        ) {
            continue;
        }
        let Some(value) = record.get(name) else {
            continue;
        };
        let update = if value.is_null() {
            AttributeUpdate {
                action: AttributeAction::Delete,
                value: None,
            }
        } else {
            AttributeUpdate {
                action,
                value: Some(encode(
                    name,
                    value,
                    definition.semantic_type,
                    EncodeOptions::default(),
                )?),
            }
        };
        updates.insert(name.clone(), update);
    }
    Ok(updates)
}

/// Decode every attribute of the wire item that the schema declares.
pub fn deserialize_item(schema: &Schema, item: &Item) -> Result<Map<String, Value>> {
    let mut record = Map::new();
    for (name, definition) in schema.attributes() {
        let Some(value) = item.get(name) else {
            continue;
        };
        record.insert(name.clone(), decode(Some(value), definition.semantic_type)?);
    }
    Ok(record)
}

/// Build a wire key from key values.
///
/// Accepts either two scalars (hash, then optional range) or a single
/// object carrying both key fields. A range value is ignored when the
/// table declares no range key.
pub fn build_key(hash: &Value, range: Option<&Value>, schema: &Schema) -> Result<ItemKey> {
    if let Value::Object(record) = hash {
        let hash_value = record.get(schema.hash_key()).ok_or_else(|| Error::InvalidKey {
            message: format!("key object is missing hash key '{}'", schema.hash_key()),
        })?;
        let range_value = schema.range_key().and_then(|name| record.get(name));
        return build_key_from_scalars(hash_value, range_value, schema);
    }
    build_key_from_scalars(hash, range, schema)
}

fn build_key_from_scalars(
    hash: &Value,
    range: Option<&Value>,
    schema: &Schema,
) -> Result<ItemKey> {
    let mut key = ItemKey::with_capacity(2);
    let hash_name = schema.hash_key();
    let hash_type = schema
        .semantic_type(hash_name)
        .ok_or_else(|| undeclared(hash_name))?;
    key.insert(
        hash_name.to_string(),
        encode(hash_name, hash, hash_type, EncodeOptions::default())?,
    );
    if let (Some(range_name), Some(range_value)) = (schema.range_key(), range) {
        let range_type = schema
            .semantic_type(range_name)
            .ok_or_else(|| undeclared(range_name))?;
        key.insert(
            range_name.to_string(),
            encode(range_name, range_value, range_type, EncodeOptions::default())?,
        );
    }
    Ok(key)
}

fn unsupported(attribute: &str) -> Error {
    Error::UnsupportedType {
        attribute: attribute.to_string(),
    }
}

fn undeclared(attribute: &str) -> Error {
    Error::UndeclaredAttribute {
        attribute: attribute.to_string(),
    }
}

fn mismatch(value: &AttributeValue, expected: &str) -> Error {
    Error::UnexpectedTag {
        tag: value.type_tag().to_string(),
        expected: expected.to_string(),
    }
}

fn set_elements(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(elements) => elements.iter().collect(),
        scalar => vec![scalar],
    }
}

/// Render a JSON number as a decimal string with no exponent notation.
fn decimal_string(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        match n.as_f64() {
            Some(f) => format!("{f}"),
            None => n.to_string(),
        }
    }
}

fn encode_number(value: &Value) -> Result<String> {
    match value {
        Value::Number(n) => Ok(decimal_string(n)),
        Value::String(s) => {
            let parsed = parse_number(s)?;
            Ok(decimal_string(&parsed))
        }
        other => Err(Error::InvalidNumber {
            value: other.to_string(),
        }),
    }
}

fn decode_number(raw: &str) -> Result<Value> {
    parse_number(raw).map(Value::Number)
}

fn parse_number(raw: &str) -> Result<serde_json::Number> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(i.into());
    }
    if let Ok(u) = raw.parse::<u64>() {
        return Ok(u.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .ok_or_else(|| Error::InvalidNumber {
            value: raw.to_string(),
        })
}

fn coerce_date(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => {
            let millis = n.as_i64()?;
            let date = DateTime::<Utc>::from_timestamp_millis(millis)?;
            Some(date.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        Value::String(s) => {
            let date = DateTime::parse_from_rfc3339(s).ok()?;
            Some(
                date.with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            )
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeDefinition, SecondaryIndex};

    use indexmap::IndexMap;
    use rstest::rstest;
    use serde_json::json;

    fn account_schema() -> Schema {
        Schema::new(
            IndexMap::from([
                (
                    "email".to_string(),
                    AttributeDefinition::hash_key(SemanticType::String),
                ),
                (
                    "name".to_string(),
                    AttributeDefinition::range_key(SemanticType::String),
                ),
                (
                    "age".to_string(),
                    AttributeDefinition::plain(SemanticType::Number),
                ),
                (
                    "verified".to_string(),
                    AttributeDefinition::plain(SemanticType::Boolean),
                ),
                (
                    "created".to_string(),
                    AttributeDefinition::plain(SemanticType::Date),
                ),
                (
                    "roles".to_string(),
                    AttributeDefinition::plain(SemanticType::StringSet),
                ),
                (
                    "scores".to_string(),
                    AttributeDefinition::plain(SemanticType::NumberSet),
                ),
            ]),
            IndexMap::new(),
            IndexMap::from([(
                "age-index".to_string(),
                SecondaryIndex {
                    hash_key: "age".to_string(),
                    range_key: None,
                },
            )]),
        )
        .unwrap()
    }

    #[rstest]
    #[case::string(json!("hello"), SemanticType::String, AttributeValue::S("hello".to_string()))]
    #[case::numeric_string(json!(7), SemanticType::String, AttributeValue::S("7".to_string()))]
    #[case::integer(json!(42), SemanticType::Number, AttributeValue::N("42".to_string()))]
    #[case::negative(json!(-3), SemanticType::Number, AttributeValue::N("-3".to_string()))]
    #[case::fractional(json!(2.5), SemanticType::Number, AttributeValue::N("2.5".to_string()))]
    #[case::number_from_string(
        json!("19"),
        SemanticType::Number,
        AttributeValue::N("19".to_string())
    )]
    #[case::string_set(
        json!(["a", "b"]),
        SemanticType::StringSet,
        AttributeValue::Ss(vec!["a".to_string(), "b".to_string()])
    )]
    #[case::scalar_promoted_to_set(
        json!("a"),
        SemanticType::StringSet,
        AttributeValue::Ss(vec!["a".to_string()])
    )]
    #[case::number_set(
        json!([1, 2]),
        SemanticType::NumberSet,
        AttributeValue::Ns(vec!["1".to_string(), "2".to_string()])
    )]
    fn test_encode(
        #[case] value: Value,
        #[case] semantic_type: SemanticType,
        #[case] expected: AttributeValue,
    ) {
        let actual = encode("attr", &value, semantic_type, EncodeOptions::default()).unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::true_value(json!(true), "1")]
    #[case::false_value(json!(false), "0")]
    #[case::false_string(json!("false"), "0")]
    #[case::true_string(json!("true"), "1")]
    // Zero is *not* exactly false, so it encodes as true.
    #[case::zero_number(json!(0), "1")]
    #[case::arbitrary_string(json!("anything"), "1")]
    fn test_encode_boolean_truthiness(#[case] value: Value, #[case] expected: &str) {
        let actual = encode("flag", &value, SemanticType::Boolean, EncodeOptions::default());
        assert_eq!(actual.unwrap(), AttributeValue::N(expected.to_string()));
    }

    #[rstest]
    #[case::rfc3339(json!("2024-05-01T10:30:00Z"), "2024-05-01T10:30:00.000Z")]
    #[case::offset_normalized_to_utc(
        json!("2024-05-01T12:30:00+02:00"),
        "2024-05-01T10:30:00.000Z"
    )]
    #[case::epoch_millis(json!(1714559400000i64), "2024-05-01T10:30:00.000Z")]
    fn test_encode_date_normalizes_to_rfc3339_utc(#[case] value: Value, #[case] expected: &str) {
        let actual = encode("created", &value, SemanticType::Date, EncodeOptions::default());
        assert_eq!(actual.unwrap(), AttributeValue::S(expected.to_string()));
    }

    #[test]
    fn test_encode_unparseable_date_is_rejected() {
        let result = encode(
            "created",
            &json!("not a date"),
            SemanticType::Date,
            EncodeOptions::default(),
        );
        assert!(matches!(result, Err(Error::InvalidDate { .. })));
    }

    #[test]
    fn test_encode_convert_sets_degrades_to_element() {
        let actual = encode(
            "roles",
            &json!("admin"),
            SemanticType::StringSet,
            EncodeOptions::converting_sets(),
        )
        .unwrap();
        assert_eq!(actual, AttributeValue::S("admin".to_string()));
    }

    #[test]
    fn test_encode_rejects_object_for_scalar() {
        let result = encode(
            "attr",
            &json!({"nested": true}),
            SemanticType::String,
            EncodeOptions::default(),
        );
        assert!(matches!(result, Err(Error::UnsupportedType { .. })));
    }

    #[rstest]
    #[case::string(json!("hello"), SemanticType::String)]
    #[case::integer(json!(42), SemanticType::Number)]
    #[case::fractional(json!(2.5), SemanticType::Number)]
    #[case::true_value(json!(true), SemanticType::Boolean)]
    #[case::false_value(json!(false), SemanticType::Boolean)]
    #[case::string_set(json!(["a", "b"]), SemanticType::StringSet)]
    #[case::number_set(json!([1, 2.5]), SemanticType::NumberSet)]
    fn test_round_trip(#[case] value: Value, #[case] semantic_type: SemanticType) {
        let encoded = encode("attr", &value, semantic_type, EncodeOptions::default()).unwrap();
        let decoded = decode(Some(&encoded), semantic_type).unwrap();
        assert_eq!(decoded, value);
    }

    #[rstest]
    #[case::number_from_s(AttributeValue::S("7".to_string()), SemanticType::Number, json!(7))]
    #[case::boolean_from_nonzero_n(
        AttributeValue::N("5".to_string()),
        SemanticType::Boolean,
        json!(true)
    )]
    #[case::boolean_from_zero_n(
        AttributeValue::N("0".to_string()),
        SemanticType::Boolean,
        json!(false)
    )]
    #[case::boolean_from_true_s(
        AttributeValue::S("true".to_string()),
        SemanticType::Boolean,
        json!(true)
    )]
    #[case::boolean_from_other_s(
        AttributeValue::S("yes".to_string()),
        SemanticType::Boolean,
        json!(false)
    )]
    #[case::string_from_n(AttributeValue::N("12".to_string()), SemanticType::String, json!("12"))]
    #[case::set_from_scalar(
        AttributeValue::S("a".to_string()),
        SemanticType::StringSet,
        json!(["a"])
    )]
    fn test_decode_tolerance(
        #[case] wire: AttributeValue,
        #[case] semantic_type: SemanticType,
        #[case] expected: Value,
    ) {
        assert_eq!(decode(Some(&wire), semantic_type).unwrap(), expected);
    }

    #[rstest]
    #[case::scalar(SemanticType::String, json!(null))]
    #[case::number(SemanticType::Number, json!(null))]
    #[case::string_set(SemanticType::StringSet, json!([]))]
    #[case::number_set(SemanticType::NumberSet, json!([]))]
    fn test_decode_missing(#[case] semantic_type: SemanticType, #[case] expected: Value) {
        assert_eq!(decode(None, semantic_type).unwrap(), expected);
    }

    #[test]
    fn test_decode_tag_mismatch() {
        let wire = AttributeValue::Ss(vec!["a".to_string()]);
        let result = decode(Some(&wire), SemanticType::Number);
        assert!(matches!(result, Err(Error::UnexpectedTag { .. })));
    }

    #[test]
    fn test_serialize_item_omits_absent_attributes() {
        let schema = account_schema();
        let record = json!({"email": "a@b.c", "age": 30, "ignored": true})
            .as_object()
            .unwrap()
            .clone();
        let item = serialize_item(&schema, &record, EncodeOptions::default()).unwrap();
        assert_eq!(
            item,
            Item::from([
                ("email".to_string(), AttributeValue::S("a@b.c".to_string())),
                ("age".to_string(), AttributeValue::N("30".to_string())),
            ])
        );
    }

    #[test]
    fn test_serialize_item_for_update_excludes_keys_and_maps_null_to_delete() {
        let schema = account_schema();
        let record = json!({"email": "a@b.c", "name": "x", "age": 31, "verified": null})
            .as_object()
            .unwrap()
            .clone();
        let updates =
            serialize_item_for_update(&schema, AttributeAction::Put, &record).unwrap();
        assert_eq!(
            updates,
            HashMap::from([
                (
                    "age".to_string(),
                    AttributeUpdate {
                        action: AttributeAction::Put,
                        value: Some(AttributeValue::N("31".to_string())),
                    }
                ),
                (
                    "verified".to_string(),
                    AttributeUpdate {
                        action: AttributeAction::Delete,
                        value: None,
                    }
                ),
            ])
        );
    }

    #[test]
    fn test_deserialize_item_decodes_declared_attributes() {
        let schema = account_schema();
        let item = Item::from([
            ("email".to_string(), AttributeValue::S("a@b.c".to_string())),
            ("age".to_string(), AttributeValue::N("30".to_string())),
            ("verified".to_string(), AttributeValue::N("1".to_string())),
            ("undeclared".to_string(), AttributeValue::S("x".to_string())),
        ]);
        let record = deserialize_item(&schema, &item).unwrap();
        assert_eq!(
            Value::Object(record),
            json!({"email": "a@b.c", "age": 30, "verified": true})
        );
    }

    #[rstest]
    #[case::scalars(json!("a@b.c"), Some(json!("alice")))]
    #[case::object_carrying_both(json!({"email": "a@b.c", "name": "alice"}), None)]
    fn test_build_key(#[case] hash: Value, #[case] range: Option<Value>) {
        let schema = account_schema();
        let key = build_key(&hash, range.as_ref(), &schema).unwrap();
        let mut expected = ItemKey::from([(
            "email".to_string(),
            AttributeValue::S("a@b.c".to_string()),
        )]);
        expected.insert("name".to_string(), AttributeValue::S("alice".to_string()));
        assert_eq!(key, expected);
    }

    #[test]
    fn test_build_key_object_missing_hash_key_is_rejected() {
        let schema = account_schema();
        let result = build_key(&json!({"name": "alice"}), None, &schema);
        assert!(matches!(result, Err(Error::InvalidKey { .. })));
    }
}
