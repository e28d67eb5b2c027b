//! Typed schema tree produced by the expression parser, and its lowering
//! into a JSON Schema document.

use serde_json::{Map, Number, Value, json};

/// How an object treats keys it does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum UnknownKeys {
    /// Unknown keys are allowed (and left in place).
    #[default]
    Allow,
    /// Unknown keys are a validation failure.
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct StringChecks {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub format: Option<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct NumberChecks {
    pub integer: bool,
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub exclusive_minimum: Option<Number>,
    pub exclusive_maximum: Option<Number>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SchemaKind {
    String(StringChecks),
    Number(NumberChecks),
    Boolean,
    Null,
    Any,
    Literal(Value),
    Enum(Vec<String>),
    Array {
        items: Box<SchemaNode>,
        min_items: Option<u64>,
        max_items: Option<u64>,
    },
    Tuple(Vec<SchemaNode>),
    Object {
        fields: Vec<(String, SchemaNode)>,
        unknown_keys: UnknownKeys,
    },
    Record {
        keys: Option<Box<SchemaNode>>,
        values: Box<SchemaNode>,
    },
    Union(Vec<SchemaNode>),
}

impl SchemaKind {
    /// Name used in error messages.
    pub(crate) const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Any => "any",
            Self::Literal(_) => "literal",
            Self::Enum(_) => "enum",
            Self::Array { .. } => "array",
            Self::Tuple(_) => "tuple",
            Self::Object { .. } => "object",
            Self::Record { .. } => "record",
            Self::Union(_) => "union",
        }
    }
}

/// A schema with its wrapper flags.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SchemaNode {
    pub kind: SchemaKind,
    pub optional: bool,
    pub nullable: bool,
    pub description: Option<String>,
    pub default: Option<Value>,
}

impl SchemaNode {
    pub(crate) const fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            optional: false,
            nullable: false,
            description: None,
            default: None,
        }
    }

    /// Whether an object may omit this field, i.e. the schema accepts
    /// `undefined`.
    pub(crate) fn may_be_absent(&self) -> bool {
        self.optional
            || self.default.is_some()
            || match &self.kind {
                SchemaKind::Any => true,
                SchemaKind::Union(options) => options.iter().any(Self::may_be_absent),
                _ => false,
            }
    }

    /// Lowers the tree into a JSON Schema (draft 2020-12) document.
    pub(crate) fn to_json_schema(&self) -> Value {
        let mut schema = self.kind.lower();

        if self.nullable {
            schema = json!({ "anyOf": [schema, { "type": "null" }] });
        }

        if let Value::Object(map) = &mut schema {
            if let Some(description) = &self.description {
                map.insert("description".to_owned(), Value::String(description.clone()));
            }
            // Annotation only: replies are validated, never filled in.
            if let Some(default) = &self.default {
                map.insert("default".to_owned(), default.clone());
            }
        }

        schema
    }
}

impl SchemaKind {
    fn lower(&self) -> Value {
        let mut map = Map::new();
        match self {
            Self::String(checks) => {
                map.insert("type".into(), "string".into());
                insert_opt(&mut map, "minLength", checks.min_length);
                insert_opt(&mut map, "maxLength", checks.max_length);
                if let Some(format) = checks.format {
                    map.insert("format".into(), format.into());
                }
            }
            Self::Number(checks) => {
                let ty = if checks.integer { "integer" } else { "number" };
                map.insert("type".into(), ty.into());
                insert_opt(&mut map, "minimum", checks.minimum.clone());
                insert_opt(&mut map, "maximum", checks.maximum.clone());
                insert_opt(&mut map, "exclusiveMinimum", checks.exclusive_minimum.clone());
                insert_opt(&mut map, "exclusiveMaximum", checks.exclusive_maximum.clone());
            }
            Self::Boolean => {
                map.insert("type".into(), "boolean".into());
            }
            Self::Null => {
                map.insert("type".into(), "null".into());
            }
            Self::Any => {}
            Self::Literal(value) => {
                map.insert("const".into(), value.clone());
            }
            Self::Enum(variants) => {
                map.insert("type".into(), "string".into());
                map.insert("enum".into(), variants.clone().into());
            }
            Self::Array {
                items,
                min_items,
                max_items,
            } => {
                map.insert("type".into(), "array".into());
                map.insert("items".into(), items.to_json_schema());
                insert_opt(&mut map, "minItems", *min_items);
                insert_opt(&mut map, "maxItems", *max_items);
            }
            Self::Tuple(elements) => {
                map.insert("type".into(), "array".into());
                map.insert(
                    "prefixItems".into(),
                    elements.iter().map(SchemaNode::to_json_schema).collect(),
                );
                map.insert("items".into(), false.into());
                map.insert("minItems".into(), elements.len().into());
            }
            Self::Object {
                fields,
                unknown_keys,
            } => {
                let properties: Map<String, Value> = fields
                    .iter()
                    .map(|(name, node)| (name.clone(), node.to_json_schema()))
                    .collect();
                let required: Vec<Value> = fields
                    .iter()
                    .filter(|(_, node)| !node.may_be_absent())
                    .map(|(name, _)| Value::String(name.clone()))
                    .collect();

                map.insert("type".into(), "object".into());
                map.insert("properties".into(), Value::Object(properties));
                map.insert("required".into(), Value::Array(required));
                if *unknown_keys == UnknownKeys::Reject {
                    map.insert("additionalProperties".into(), false.into());
                }
            }
            Self::Record { keys, values } => {
                map.insert("type".into(), "object".into());
                map.insert("additionalProperties".into(), values.to_json_schema());
                if let Some(keys) = keys {
                    map.insert("propertyNames".into(), keys.to_json_schema());
                }
            }
            Self::Union(options) => {
                map.insert(
                    "anyOf".into(),
                    options.iter().map(SchemaNode::to_json_schema).collect(),
                );
            }
        }
        Value::Object(map)
    }
}

fn insert_opt<T: Into<Value>>(map: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        map.insert(key.to_owned(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string() -> SchemaNode {
        SchemaNode::new(SchemaKind::String(StringChecks::default()))
    }

    #[test]
    fn test_object_required_excludes_optional_and_defaulted() {
        let mut optional = string();
        optional.optional = true;
        let mut defaulted = string();
        defaulted.default = Some(json!("x"));

        let node = SchemaNode::new(SchemaKind::Object {
            fields: vec![
                ("a".into(), string()),
                ("b".into(), optional),
                ("c".into(), defaulted),
            ],
            unknown_keys: UnknownKeys::Allow,
        });

        let schema = node.to_json_schema();
        assert_eq!(schema["required"], json!(["a"]));
        assert_eq!(schema["properties"]["c"]["default"], json!("x"));
        assert!(schema.get("additionalProperties").is_none());
    }

    #[test]
    fn test_any_and_unions_with_optional_member_may_be_absent() {
        let mut optional = string();
        optional.optional = true;
        let union_with_optional =
            SchemaNode::new(SchemaKind::Union(vec![optional, SchemaNode::new(SchemaKind::Null)]));
        let plain_union =
            SchemaNode::new(SchemaKind::Union(vec![string(), SchemaNode::new(SchemaKind::Null)]));

        let node = SchemaNode::new(SchemaKind::Object {
            fields: vec![
                ("any".into(), SchemaNode::new(SchemaKind::Any)),
                ("maybe".into(), union_with_optional),
                ("either".into(), plain_union),
            ],
            unknown_keys: UnknownKeys::Allow,
        });

        assert_eq!(node.to_json_schema()["required"], json!(["either"]));
    }

    #[test]
    fn test_nullable_wraps_in_any_of() {
        let mut node = string();
        node.nullable = true;
        node.description = Some("why".into());

        assert_eq!(
            node.to_json_schema(),
            json!({
                "anyOf": [{ "type": "string" }, { "type": "null" }],
                "description": "why"
            })
        );
    }

    #[test]
    fn test_tuple_is_closed() {
        let node = SchemaNode::new(SchemaKind::Tuple(vec![
            string(),
            SchemaNode::new(SchemaKind::Boolean),
        ]));
        assert_eq!(
            node.to_json_schema(),
            json!({
                "type": "array",
                "prefixItems": [{ "type": "string" }, { "type": "boolean" }],
                "items": false,
                "minItems": 2
            })
        );
    }
}
