//! Key-condition and filter fragments built from comparison operators.
//!
//! Each condition encodes its operands through the codec (with set
//! conversion, so a single element can be compared against a set
//! attribute) and produces the legacy wire fragment
//! `{AttributeValueList, ComparisonOperator}`. Fragments merge into a
//! descriptor's condition map per attribute; the last write for an
//! attribute wins.

use std::collections::HashMap;

use serde_json::Value;

use crate::codec::{self, EncodeOptions};
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::{AttributeValue, ComparisonOperator, ConditionFragment};

/// A comparison against one attribute.
///
/// The store accepts `Equals`, `LessThanOrEqual`, `LessThan`,
/// `GreaterThanOrEqual`, `GreaterThan`, `BeginsWith`, and `Between` as key
/// conditions; the remaining variants are filter-only (scan filters and
/// post-key query filters).
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Attribute begins with the prefix (string attributes only).
    BeginsWith(String),
    /// Attribute is between the two operands, inclusive.
    Between(Value, Value),
    /// Attribute contains the operand.
    Contains(Value),
    /// Attribute equals the operand.
    Equals(Value),
    /// `Exists(true)` requires the attribute to be present (`NOT_NULL`);
    /// `Exists(false)` requires it to be absent (`NULL`).
    Exists(bool),
    /// Attribute is greater than the operand.
    GreaterThan(Value),
    /// Attribute is greater than or equal to the operand.
    GreaterThanOrEqual(Value),
    /// Attribute equals one of the operands.
    In(Vec<Value>),
    /// Attribute is less than the operand.
    LessThan(Value),
    /// Attribute is less than or equal to the operand.
    LessThanOrEqual(Value),
    /// Attribute does not contain the operand.
    NotContains(Value),
    /// Attribute does not equal the operand.
    NotEquals(Value),
    /// Attribute is present.
    NotNull,
    /// Attribute is absent.
    Null,
}

impl Condition {
    /// Encode this condition as a wire fragment for the given attribute.
    ///
    /// The attribute must be declared by the schema (or an index over it);
    /// silently dropping a condition on an unknown attribute would change
    /// which items a traversal returns.
    pub(crate) fn to_fragment(
        &self,
        attribute: &str,
        schema: &Schema,
    ) -> Result<ConditionFragment> {
        let semantic_type =
            schema
                .semantic_type(attribute)
                .ok_or_else(|| Error::UndeclaredAttribute {
                    attribute: attribute.to_string(),
                })?;
        let encode = |value: &Value| {
            codec::encode(
                attribute,
                value,
                semantic_type,
                EncodeOptions::converting_sets(),
            )
        };
        let (attribute_value_list, comparison_operator) = match self {
            Self::BeginsWith(prefix) => (
                vec![AttributeValue::S(prefix.clone())],
                ComparisonOperator::BeginsWith,
            ),
            Self::Between(low, high) => (
                vec![encode(low)?, encode(high)?],
                ComparisonOperator::Between,
            ),
            Self::Contains(value) => (vec![encode(value)?], ComparisonOperator::Contains),
            Self::Equals(value) => (vec![encode(value)?], ComparisonOperator::Eq),
            Self::Exists(true) | Self::NotNull => (Vec::new(), ComparisonOperator::NotNull),
            Self::Exists(false) | Self::Null => (Vec::new(), ComparisonOperator::Null),
            Self::GreaterThan(value) => (vec![encode(value)?], ComparisonOperator::Gt),
            Self::GreaterThanOrEqual(value) => (vec![encode(value)?], ComparisonOperator::Ge),
            Self::In(values) => (
                values.iter().map(encode).collect::<Result<Vec<_>>>()?,
                ComparisonOperator::In,
            ),
            Self::LessThan(value) => (vec![encode(value)?], ComparisonOperator::Lt),
            Self::LessThanOrEqual(value) => (vec![encode(value)?], ComparisonOperator::Le),
            Self::NotContains(value) => {
                (vec![encode(value)?], ComparisonOperator::NotContains)
            }
            Self::NotEquals(value) => (vec![encode(value)?], ComparisonOperator::Ne),
        };
        Ok(ConditionFragment {
            attribute_value_list,
            comparison_operator,
        })
    }
}

/// Merge a fragment into a descriptor's condition map.
pub(crate) fn merge_fragment(
    conditions: &mut HashMap<String, ConditionFragment>,
    attribute: &str,
    fragment: ConditionFragment,
) {
    conditions.insert(attribute.to_string(), fragment);
}
