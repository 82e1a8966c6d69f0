//! Table schema: attribute semantic types, key roles, and index layout.
//!
//! A [`Schema`] is created once at model-definition time and never mutated.
//! Plans share it read-only through an [`std::sync::Arc`]-wrapped [`Table`].

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Semantic type of a declared attribute.
///
/// A closed enumeration: the codec dispatches over it exhaustively, so
/// supporting a new type is an explicit variant addition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SemanticType {
    /// Raw bytes.
    Binary,
    /// True/false, stored as a number on the wire.
    Boolean,
    /// A point in time, stored as an RFC 3339 string on the wire.
    Date,
    /// Arbitrary-precision decimal number.
    Number,
    /// Set of numbers.
    NumberSet,
    /// UTF-8 string.
    String,
    /// Set of strings.
    StringSet,
}

impl SemanticType {
    /// Whether this type is a set type.
    pub fn is_set(self) -> bool {
        matches!(self, Self::NumberSet | Self::StringSet)
    }

    /// The scalar element type of a set type; identity for scalars.
    pub(crate) fn element_type(self) -> Self {
        match self {
            Self::NumberSet => Self::Number,
            Self::StringSet => Self::String,
            other => other,
        }
    }
}

/// Role an attribute plays in the table's key layout.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AttributeRole {
    /// The mandatory partition key.
    HashKey,
    /// A non-key attribute.
    #[default]
    Plain,
    /// The optional sort key.
    RangeKey,
}

/// A declared attribute: semantic type plus key role.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AttributeDefinition {
    /// Role in the key layout.
    pub role: AttributeRole,
    /// Semantic type driving the codec.
    pub semantic_type: SemanticType,
}

impl AttributeDefinition {
    /// A non-key attribute of the given type.
    pub fn plain(semantic_type: SemanticType) -> Self {
        Self {
            role: AttributeRole::Plain,
            semantic_type,
        }
    }

    /// The partition-key attribute of the given type.
    pub fn hash_key(semantic_type: SemanticType) -> Self {
        Self {
            role: AttributeRole::HashKey,
            semantic_type,
        }
    }

    /// The sort-key attribute of the given type.
    pub fn range_key(semantic_type: SemanticType) -> Self {
        Self {
            role: AttributeRole::RangeKey,
            semantic_type,
        }
    }
}

/// Key layout of a secondary or global index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SecondaryIndex {
    /// The index's partition-key attribute.
    pub hash_key: String,
    /// The index's optional sort-key attribute.
    pub range_key: Option<String>,
}

/// Immutable attribute and index table of one store table.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    attributes: IndexMap<String, AttributeDefinition>,
    global_indexes: IndexMap<String, SecondaryIndex>,
    hash_key: String,
    range_key: Option<String>,
    secondary_indexes: IndexMap<String, SecondaryIndex>,
}

impl Schema {
    /// Build a schema, validating the key layout.
    ///
    /// Fails unless exactly one attribute carries the `HashKey` role and at
    /// most one carries `RangeKey`.
    pub fn new(
        attributes: IndexMap<String, AttributeDefinition>,
        secondary_indexes: IndexMap<String, SecondaryIndex>,
        global_indexes: IndexMap<String, SecondaryIndex>,
    ) -> Result<Self> {
        let mut hash_key = None;
        let mut range_key = None;
        for (name, definition) in &attributes {
            match definition.role {
                AttributeRole::HashKey => {
                    if hash_key.replace(name.clone()).is_some() {
                        return Err(Error::Schema {
                            message: "more than one hash key declared".to_string(),
                        });
                    }
                }
                AttributeRole::RangeKey => {
                    if range_key.replace(name.clone()).is_some() {
                        return Err(Error::Schema {
                            message: "more than one range key declared".to_string(),
                        });
                    }
                }
                AttributeRole::Plain => {}
            }
        }
        let Some(hash_key) = hash_key else {
            return Err(Error::Schema {
                message: "no hash key declared".to_string(),
            });
        };
        Ok(Self {
            attributes,
            global_indexes,
            hash_key,
            range_key,
            secondary_indexes,
        })
    }

    /// The declared attributes, in declaration order.
    pub fn attributes(&self) -> &IndexMap<String, AttributeDefinition> {
        &self.attributes
    }

    /// The partition-key attribute name.
    pub fn hash_key(&self) -> &str {
        &self.hash_key
    }

    /// The sort-key attribute name, when the table has one.
    pub fn range_key(&self) -> Option<&str> {
        self.range_key.as_deref()
    }

    /// The named secondary (local) indexes.
    pub fn secondary_indexes(&self) -> &IndexMap<String, SecondaryIndex> {
        &self.secondary_indexes
    }

    /// The named global indexes.
    pub fn global_indexes(&self) -> &IndexMap<String, SecondaryIndex> {
        &self.global_indexes
    }

    /// Look up an index by name, global indexes first.
    pub fn index(&self, name: &str) -> Option<&SecondaryIndex> {
        self.global_indexes
            .get(name)
            .or_else(|| self.secondary_indexes.get(name))
    }

    /// Semantic type of a declared attribute.
    pub fn semantic_type(&self, attribute: &str) -> Option<SemanticType> {
        self.attributes
            .get(attribute)
            .map(|definition| definition.semantic_type)
    }

    /// Whether the attribute is the table's hash or range key.
    pub fn is_key_attribute(&self, attribute: &str) -> bool {
        attribute == self.hash_key || self.range_key.as_deref() == Some(attribute)
    }
}

/// A named table plus its schema: the read-only collaborator plans hold.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    name: String,
    schema: Schema,
}

impl Table {
    /// Bind a schema to a table name.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// The table name used in wire requests.
    pub fn table_name(&self) -> &str {
        &self.name
    }

    /// The table's schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

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

    #[test]
    fn test_key_accessors() {
        let schema = account_schema();
        assert_eq!(schema.hash_key(), "email");
        assert_eq!(schema.range_key(), Some("name"));
        assert!(schema.is_key_attribute("email"));
        assert!(schema.is_key_attribute("name"));
        assert!(!schema.is_key_attribute("age"));
        assert_eq!(schema.semantic_type("age"), Some(SemanticType::Number));
        assert_eq!(schema.index("age-index").unwrap().hash_key, "age");
        assert!(schema.index("missing").is_none());
    }

    #[rstest]
    #[case::no_hash_key(
        IndexMap::from([
            ("a".to_string(), AttributeDefinition::plain(SemanticType::String)),
        ])
    )]
    #[case::two_hash_keys(
        IndexMap::from([
            ("a".to_string(), AttributeDefinition::hash_key(SemanticType::String)),
            ("b".to_string(), AttributeDefinition::hash_key(SemanticType::String)),
        ])
    )]
    #[case::two_range_keys(
        IndexMap::from([
            ("a".to_string(), AttributeDefinition::hash_key(SemanticType::String)),
            ("b".to_string(), AttributeDefinition::range_key(SemanticType::String)),
            ("c".to_string(), AttributeDefinition::range_key(SemanticType::Number)),
        ])
    )]
    fn test_invalid_key_layout_is_rejected(
        #[case] attributes: IndexMap<String, AttributeDefinition>,
    ) {
        let result = Schema::new(attributes, IndexMap::new(), IndexMap::new());
        assert!(matches!(result, Err(Error::Schema { .. })));
    }
}
