//! Update-expression parsing and serialization.
//!
//! Expressions are split with an explicit scanner that tracks parenthesis
//! and index-bracket depth, so commas inside `list_append(a, :v)` or paths
//! like `a[1]` never split a clause. Action keywords (`SET`, `ADD`,
//! `REMOVE`, `DELETE`) are matched case-insensitively at depth zero.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::codec::{self, EncodeOptions};
use crate::error::Result;
use crate::schema::Schema;
use crate::types::AttributeValue;

/// One update-expression section per action keyword.
///
/// `None` means the section is absent from the expression — distinct from
/// an explicit empty clause list.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParsedExpression {
    /// `ADD` clauses.
    pub add: Option<Vec<String>>,
    /// `DELETE` clauses.
    pub delete: Option<Vec<String>>,
    /// `REMOVE` clauses.
    pub remove: Option<Vec<String>>,
    /// `SET` clauses.
    pub set: Option<Vec<String>>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Section {
    Add,
    Delete,
    Remove,
    Set,
}

impl Section {
    fn from_keyword(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("SET") {
            Some(Self::Set)
        } else if word.eq_ignore_ascii_case("ADD") {
            Some(Self::Add)
        } else if word.eq_ignore_ascii_case("REMOVE") {
            Some(Self::Remove)
        } else if word.eq_ignore_ascii_case("DELETE") {
            Some(Self::Delete)
        } else {
            None
        }
    }
}

impl ParsedExpression {
    fn section_mut(&mut self, section: Section) -> &mut Option<Vec<String>> {
        match section {
            Section::Add => &mut self.add,
            Section::Delete => &mut self.delete,
            Section::Remove => &mut self.remove,
            Section::Set => &mut self.set,
        }
    }
}

/// Split an update expression into its per-action clause lists.
///
/// Each section's content runs from its keyword to the next action keyword
/// or end of input; clauses split on commas at bracket depth zero.
pub fn parse(expression: &str) -> ParsedExpression {
    let spans = keyword_spans(expression);
    let mut parsed = ParsedExpression::default();
    for (position, &(_, content_start, section)) in spans.iter().enumerate() {
        let content_end = spans
            .get(position + 1)
            .map_or(expression.len(), |&(next_start, _, _)| next_start);
        let clauses = split_clauses(&expression[content_start..content_end]);
        parsed
            .section_mut(section)
            .get_or_insert_with(Vec::new)
            .extend(clauses);
    }
    parsed
}

/// Render the sections back to an expression string.
///
/// Sections are emitted in the fixed order `SET ADD REMOVE DELETE`, each as
/// `KEYWORD clause, clause`, space-joined; absent and empty sections are
/// skipped. `stringify(parse(s)) == s` for any `s` this function produced.
pub fn stringify(expression: &ParsedExpression) -> String {
    let sections = [
        ("SET", &expression.set),
        ("ADD", &expression.add),
        ("REMOVE", &expression.remove),
        ("DELETE", &expression.delete),
    ];
    let mut parts = Vec::with_capacity(sections.len());
    for (keyword, clauses) in sections {
        if let Some(clauses) = clauses
            && !clauses.is_empty()
        {
            parts.push(format!("{keyword} {}", clauses.join(", ")));
        }
    }
    parts.join(" ")
}

/// Keyword occurrences at depth zero: (keyword start, content start, section).
fn keyword_spans(expression: &str) -> Vec<(usize, usize, Section)> {
    let bytes = expression.as_bytes();
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            '(' | '[' => {
                depth += 1;
                i += 1;
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len() && is_word_continue(bytes[i] as char) {
                    i += 1;
                }
                if depth == 0
                    && word_boundary_before(bytes, start)
                    && let Some(section) = Section::from_keyword(&expression[start..i])
                {
                    spans.push((start, i, section));
                }
            }
            _ => i += 1,
        }
    }
    spans
}

fn is_word_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A keyword must not continue an identifier or a `#name`/`:value` token.
fn word_boundary_before(bytes: &[u8], start: usize) -> bool {
    if start == 0 {
        return true;
    }
    let previous = bytes[start - 1] as char;
    !is_word_continue(previous) && previous != '#' && previous != ':' && previous != '.'
}

/// Split section content on commas not nested in parentheses or brackets.
fn split_clauses(content: &str) -> Vec<String> {
    let mut clauses = Vec::new();
    let mut depth = 0usize;
    let mut clause_start = 0;
    for (position, c) in content.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                push_clause(&mut clauses, &content[clause_start..position]);
                clause_start = position + 1;
            }
            _ => {}
        }
    }
    push_clause(&mut clauses, &content[clause_start..]);
    clauses
}

fn push_clause(clauses: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        clauses.push(trimmed.to_string());
    }
}

/// A fully serialized update expression: per-action clause lists plus the
/// placeholder maps the clauses reference.
///
/// Clause lists are empty (never `None`) at this layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateExpression {
    /// `ADD` clauses.
    pub add: Vec<String>,
    /// Name placeholders (`#name` → attribute name).
    pub attribute_names: HashMap<String, String>,
    /// Value placeholders (`:name` → encoded operand).
    pub attribute_values: HashMap<String, AttributeValue>,
    /// `DELETE` clauses.
    pub delete: Vec<String>,
    /// `REMOVE` clauses.
    pub remove: Vec<String>,
    /// `SET` clauses.
    pub set: Vec<String>,
}

impl UpdateExpression {
    /// Whether no clause was produced.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
            && self.add.is_empty()
            && self.remove.is_empty()
            && self.delete.is_empty()
    }

    /// Render the expression string in fixed `SET ADD REMOVE DELETE` order.
    pub fn expression(&self) -> String {
        stringify(&ParsedExpression {
            add: Some(self.add.clone()),
            delete: Some(self.delete.clone()),
            remove: Some(self.remove.clone()),
            set: Some(self.set.clone()),
        })
    }
}

/// Serialize a change delta into update-expression clauses.
///
/// Walks every declared non-key attribute of the delta: `null` becomes a
/// `REMOVE` of the name placeholder, `{"$add": x}` an `ADD`, `{"$del": x}`
/// a `DELETE`, and anything else a `SET` assignment. Every attribute gets a
/// stable `#name`/`:name` placeholder pair so reserved words never collide
/// with the expression grammar. Key attributes and attributes the schema
/// does not declare are skipped.
pub fn serialize_update_expression(
    schema: &Schema,
    delta: &Map<String, Value>,
) -> Result<UpdateExpression> {
    let mut expression = UpdateExpression::default();
    for (name, value) in delta {
        if schema.is_key_attribute(name) {
            continue;
        }
        let Some(semantic_type) = schema.semantic_type(name) else {
            continue;
        };
        let name_placeholder = format!("#{name}");
        let value_placeholder = format!(":{name}");
        expression
            .attribute_names
            .insert(name_placeholder.clone(), name.clone());
        if value.is_null() {
            expression.remove.push(name_placeholder);
            continue;
        }
        let (clauses, operand) = match marker_operand(value) {
            Some(("$add", operand)) => (&mut expression.add, operand),
            Some(("$del", operand)) => (&mut expression.delete, operand),
            _ => {
                let encoded =
                    codec::encode(name, value, semantic_type, EncodeOptions::default())?;
                expression
                    .set
                    .push(format!("{name_placeholder} = {value_placeholder}"));
                expression.attribute_values.insert(value_placeholder, encoded);
                continue;
            }
        };
        let encoded = codec::encode(name, operand, semantic_type, EncodeOptions::default())?;
        clauses.push(format!("{name_placeholder} {value_placeholder}"));
        expression.attribute_values.insert(value_placeholder, encoded);
    }
    Ok(expression)
}

/// `{"$add": x}` / `{"$del": x}` markers in a delta value.
fn marker_operand(value: &Value) -> Option<(&str, &Value)> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    let (marker, operand) = object.iter().next()?;
    match marker.as_str() {
        "$add" => Some(("$add", operand)),
        "$del" => Some(("$del", operand)),
        _ => None,
    }
}
