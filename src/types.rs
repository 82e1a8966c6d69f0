//! Wire-format types exchanged with the transport collaborator.
//!
//! All request and response structs use `PascalCase` JSON field naming to
//! match the store's wire protocol. Optional fields and empty maps are
//! omitted to produce minimal payloads.

use std::collections::HashMap;
use std::fmt;

use base64::Engine;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An item as stored on the wire: attribute name to tagged value.
pub type Item = HashMap<String, AttributeValue>;

/// The primary key of an item on the wire.
pub type ItemKey = HashMap<String, AttributeValue>;

/// Wire attribute value.
///
/// A closed tagged union where exactly one variant is present. The JSON
/// wire form is a single-key object such as `{"S": "hello"}` or
/// `{"NS": ["1", "2"]}`. Numbers are string-encoded to preserve precision.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum AttributeValue {
    /// Binary value (base64-encoded in JSON).
    B(Vec<u8>),
    /// Number value (decimal string, no exponent notation).
    N(String),
    /// Number set.
    Ns(Vec<String>),
    /// String value.
    S(String),
    /// String set.
    Ss(Vec<String>),
}

impl AttributeValue {
    /// The wire type tag of this value (`"S"`, `"N"`, `"SS"`, `"NS"`, `"B"`).
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::B(_) => "B",
            Self::N(_) => "N",
            Self::Ns(_) => "NS",
            Self::S(_) => "S",
            Self::Ss(_) => "SS",
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::B(bytes) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                map.serialize_entry("B", &encoded)?;
            }
            Self::N(n) => map.serialize_entry("N", n)?,
            Self::Ns(values) => map.serialize_entry("NS", values)?,
            Self::S(s) => map.serialize_entry("S", s)?,
            Self::Ss(values) => map.serialize_entry("SS", values)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AttributeValueVisitor)
    }
}

struct AttributeValueVisitor;

impl<'de> Visitor<'de> for AttributeValueVisitor {
    type Value = AttributeValue;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an attribute value object with exactly one type tag")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
        let Some(tag) = map.next_key::<String>()? else {
            return Err(de::Error::custom("attribute value must carry one type tag"));
        };
        let value = match tag.as_str() {
            "B" => {
                let encoded: String = map.next_value()?;
                let decoded = base64::engine::general_purpose::STANDARD
                    .decode(&encoded)
                    .map_err(de::Error::custom)?;
                AttributeValue::B(decoded)
            }
            "N" => AttributeValue::N(map.next_value()?),
            "NS" => AttributeValue::Ns(map.next_value()?),
            "S" => AttributeValue::S(map.next_value()?),
            "SS" => AttributeValue::Ss(map.next_value()?),
            other => {
                return Err(de::Error::unknown_field(other, &["B", "N", "NS", "S", "SS"]));
            }
        };
        Ok(value)
    }
}

/// Comparison operator of a key-condition or filter fragment.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ComparisonOperator {
    /// Attribute begins with the operand (strings only).
    #[serde(rename = "BEGINS_WITH")]
    BeginsWith,
    /// Attribute is between the two operands, inclusive.
    #[serde(rename = "BETWEEN")]
    Between,
    /// Attribute contains the operand.
    #[serde(rename = "CONTAINS")]
    Contains,
    /// Attribute equals the operand.
    #[serde(rename = "EQ")]
    Eq,
    /// Attribute is greater than or equal to the operand.
    #[serde(rename = "GE")]
    Ge,
    /// Attribute is greater than the operand.
    #[serde(rename = "GT")]
    Gt,
    /// Attribute equals one of the operands.
    #[serde(rename = "IN")]
    In,
    /// Attribute is less than or equal to the operand.
    #[serde(rename = "LE")]
    Le,
    /// Attribute is less than the operand.
    #[serde(rename = "LT")]
    Lt,
    /// Attribute does not equal the operand.
    #[serde(rename = "NE")]
    Ne,
    /// Attribute does not contain the operand.
    #[serde(rename = "NOT_CONTAINS")]
    NotContains,
    /// Attribute exists.
    #[serde(rename = "NOT_NULL")]
    NotNull,
    /// Attribute does not exist.
    #[serde(rename = "NULL")]
    Null,
}

/// A key-condition or filter fragment: operand list plus operator.
///
/// `NULL` and `NOT_NULL` fragments carry no operands and omit
/// `AttributeValueList` from the wire form entirely.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConditionFragment {
    /// Operand values, in operator order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attribute_value_list: Vec<AttributeValue>,
    /// The comparison operator.
    pub comparison_operator: ComparisonOperator,
}

/// Action of a per-attribute update.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum AttributeAction {
    /// Add the value to a number or set attribute.
    #[serde(rename = "ADD")]
    Add,
    /// Remove the attribute (or subtract set elements).
    #[serde(rename = "DELETE")]
    Delete,
    /// Set the attribute to the value.
    #[serde(rename = "PUT")]
    Put,
}

/// A per-attribute `{Action, Value}` update entry.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeUpdate {
    /// The action to apply.
    pub action: AttributeAction,
    /// The operand value; absent for plain removals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<AttributeValue>,
}

/// Which item attributes a write operation returns.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ReturnValues {
    /// Return all attributes as they were after the operation.
    #[serde(rename = "ALL_NEW")]
    AllNew,
    /// Return all attributes as they were before the operation.
    #[serde(rename = "ALL_OLD")]
    AllOld,
    /// Return nothing.
    #[serde(rename = "NONE")]
    None,
    /// Return updated attributes as they are after the operation.
    #[serde(rename = "UPDATED_NEW")]
    UpdatedNew,
    /// Return updated attributes as they were before the operation.
    #[serde(rename = "UPDATED_OLD")]
    UpdatedOld,
}

/// Level of consumed-capacity detail to request.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ReturnConsumedCapacity {
    /// Aggregate plus per-index detail.
    #[serde(rename = "INDEXES")]
    Indexes,
    /// No capacity information.
    #[serde(rename = "NONE")]
    None,
    /// Aggregate table-level detail.
    #[serde(rename = "TOTAL")]
    Total,
}

/// Throughput-accounting metric returned by the transport.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConsumedCapacity {
    /// Total capacity units consumed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_units: Option<f64>,
    /// Read capacity units consumed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_capacity_units: Option<f64>,
    /// The table the capacity was consumed against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// Write capacity units consumed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_capacity_units: Option<f64>,
}

/// Keys and read settings for one table of a batch get.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeysAndAttributes {
    /// Which attributes to retrieve; all attributes when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes_to_get: Option<Vec<String>>,
    /// Whether to use strongly consistent reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,
    /// The keys to retrieve.
    pub keys: Vec<ItemKey>,
}

/// Request descriptor for a single-item read.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemRequest {
    /// Which attributes to retrieve; all attributes when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes_to_get: Option<Vec<String>>,
    /// Whether to use strongly consistent reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,
    /// The primary key of the item.
    pub key: ItemKey,
    /// Level of consumed-capacity detail to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
    /// The table to read from.
    pub table_name: String,
}

/// Request descriptor for a put.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemRequest {
    /// A condition that must hold for the put to succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,
    /// Substitution tokens for attribute names in the condition.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,
    /// Substitution tokens for attribute values in the condition.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_values: HashMap<String, AttributeValue>,
    /// The item to store.
    pub item: Item,
    /// Level of consumed-capacity detail to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
    /// Which attributes of the replaced item to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_values: Option<ReturnValues>,
    /// The table to write to.
    pub table_name: String,
}

/// Request descriptor for an update.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemRequest {
    /// Legacy per-attribute `{Action, Value}` updates.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attribute_updates: HashMap<String, AttributeUpdate>,
    /// A condition that must hold for the update to succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,
    /// Substitution tokens for attribute names in the expressions.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,
    /// Substitution tokens for attribute values in the expressions.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_values: HashMap<String, AttributeValue>,
    /// The primary key of the item to update.
    pub key: ItemKey,
    /// Level of consumed-capacity detail to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
    /// Which attributes to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_values: Option<ReturnValues>,
    /// The table to write to.
    pub table_name: String,
    /// Update-expression form of the changes (`SET`/`ADD`/`REMOVE`/`DELETE`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_expression: Option<String>,
}

/// Request descriptor for a delete.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemRequest {
    /// A condition that must hold for the delete to succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,
    /// Substitution tokens for attribute names in the condition.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,
    /// Substitution tokens for attribute values in the condition.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_values: HashMap<String, AttributeValue>,
    /// The primary key of the item to delete.
    pub key: ItemKey,
    /// Level of consumed-capacity detail to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
    /// Which attributes of the deleted item to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_values: Option<ReturnValues>,
    /// The table to write to.
    pub table_name: String,
}

/// Request descriptor for a query.
///
/// Built and consumed by exactly one `exec` call; the fluent plan methods
/// mutate it in place before dispatch.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryRequest {
    /// Which attributes to retrieve; all attributes when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes_to_get: Option<Vec<String>>,
    /// Whether to use strongly consistent reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,
    /// Continuation cursor from the previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_start_key: Option<ItemKey>,
    /// The index to query instead of the base table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    /// Conditions on the key attributes.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub key_conditions: HashMap<String, ConditionFragment>,
    /// Maximum number of items to evaluate per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    /// Filter applied after the key conditions.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub query_filter: HashMap<String, ConditionFragment>,
    /// Level of consumed-capacity detail to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
    /// Sort direction on the range key (`true` = ascending).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_index_forward: Option<bool>,
    /// The table to read from.
    pub table_name: String,
}

/// Request descriptor for a scan.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanRequest {
    /// Which attributes to retrieve; all attributes when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes_to_get: Option<Vec<String>>,
    /// Whether to use strongly consistent reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,
    /// Continuation cursor from the previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_start_key: Option<ItemKey>,
    /// Maximum number of items to evaluate per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    /// Level of consumed-capacity detail to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
    /// Independent filter conditions applied to every scanned item.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub scan_filter: HashMap<String, ConditionFragment>,
    /// This scan's segment index for parallel scanning (0-based).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<i32>,
    /// The table to read from.
    pub table_name: String,
    /// Total number of segments of the parallel scan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_segments: Option<i32>,
}

/// Request descriptor for a batch get.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchGetItemRequest {
    /// Per-table keys and read settings.
    pub request_items: HashMap<String, KeysAndAttributes>,
    /// Level of consumed-capacity detail to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
}

/// One page of a query or scan traversal, and the shape of a fully merged
/// traversal result.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultPage {
    /// Capacity consumed producing this page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_capacity: Option<ConsumedCapacity>,
    /// Number of items in this page.
    #[serde(default)]
    pub count: i64,
    /// The items, in store order within the page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
    /// Continuation cursor; absent when the traversal is exhausted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<ItemKey>,
    /// Number of items evaluated before filtering.
    #[serde(default)]
    pub scanned_count: i64,
}

/// Response of a single-item read.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemResponse {
    /// Capacity consumed by the read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_capacity: Option<ConsumedCapacity>,
    /// The item, when one matched the key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
}

/// Response of a put, update, or delete.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WriteResponse {
    /// Attributes returned per the request's `ReturnValues`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Item>,
    /// Capacity consumed by the write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_capacity: Option<ConsumedCapacity>,
}

/// Response of a batch get.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchGetResponse {
    /// Per-table capacity consumed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumed_capacity: Vec<ConsumedCapacity>,
    /// Retrieved items, per table.
    #[serde(default)]
    pub responses: HashMap<String, Vec<Item>>,
    /// Keys the store did not process; reissue them in a follow-up call.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub unprocessed_keys: HashMap<String, KeysAndAttributes>,
}
