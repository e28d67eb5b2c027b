//! Schema compilation and validation.
//!
//! Schema-source is untrusted text. It is read as data in one of two
//! declarative formats, chosen by its first non-whitespace character:
//!
//! - **JSON Schema** (`{ ... }`, `true` or `false`), used as-is.
//! - **Schema expressions** (`z.object({ ... })`), parsed by a dedicated
//!   parser into a typed tree and lowered into JSON Schema.
//!
//! Either way the result is compiled with [`jsonschema`] into a
//! [`CompiledSchema`]. Only in-document `$ref`s resolve; anything that
//! would need a fetch is refused.
//!
//! ```rust,ignore
//! let schema = compile("z.object({ name: z.string() })")?;
//! assert!(schema.is_valid(&json!({ "name": "Ada" })));
//! ```

mod lexer;
mod node;
mod parser;

use std::fmt;

use jsonschema::{Retrieve, Uri, Validator};
use serde::Serialize;
use serde_json::Value;

/// Error raised while turning schema-source into a validator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// The source is empty or whitespace.
    #[error("schema source is empty")]
    Empty,

    /// The source is neither JSON Schema nor a schema expression.
    #[error(
        "unrecognized schema format: expected a JSON Schema object or a `z.` expression, found `{0}`"
    )]
    UnknownFormat(char),

    /// The schema expression is malformed.
    #[error("{message} at line {line}, column {column}")]
    Syntax {
        /// What went wrong.
        message: String,
        /// 1-based line.
        line: usize,
        /// 1-based column.
        column: usize,
    },

    /// The JSON Schema text is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// The document is JSON but not a usable schema.
    #[error("{0}")]
    Invalid(String),
}

/// Which notation the schema-source was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaFormat {
    /// A JSON Schema document.
    JsonSchema,
    /// A `z.` schema expression.
    Expression,
}

impl SchemaFormat {
    /// Detects the format from the first non-whitespace character.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Empty`] for blank input and
    /// [`SchemaError::UnknownFormat`] for anything else unrecognized.
    pub fn detect(source: &str) -> Result<Self, SchemaError> {
        let trimmed = source.trim_start();
        match trimmed.chars().next() {
            None => Err(SchemaError::Empty),
            Some('{') => Ok(Self::JsonSchema),
            Some(_) if matches!(trimmed.trim_end(), "true" | "false") => Ok(Self::JsonSchema),
            Some('z') => Ok(Self::Expression),
            Some(other) => Err(SchemaError::UnknownFormat(other)),
        }
    }
}

/// Refuses every external `$ref` so compiling never touches the network
/// or the filesystem.
struct DenyRetriever;

impl Retrieve for DenyRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("external schema reference `{}` is not allowed", uri.as_str()).into())
    }
}

/// A validator built from schema-source for a single invocation.
pub struct CompiledSchema {
    format: SchemaFormat,
    json_schema: Value,
    validator: Validator,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("format", &self.format)
            .field("json_schema", &self.json_schema)
            .finish_non_exhaustive()
    }
}

impl CompiledSchema {
    /// The notation the source was written in.
    #[must_use]
    pub const fn format(&self) -> SchemaFormat {
        self.format
    }

    /// The normalized JSON Schema document the validator was built from.
    #[must_use]
    pub const fn json_schema(&self) -> &Value {
        &self.json_schema
    }

    /// Validates `instance`, collecting every violation.
    ///
    /// # Errors
    ///
    /// Returns all violations when `instance` does not conform.
    pub fn validate(&self, instance: &Value) -> Result<(), Violations> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(Violations(violations))
        }
    }

    /// Returns `true` if `instance` conforms.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }
}

/// Compiles schema-source into a validator.
///
/// # Errors
///
/// Returns a [`SchemaError`] describing why the source could not be used.
pub fn compile(source: &str) -> Result<CompiledSchema, SchemaError> {
    let format = SchemaFormat::detect(source)?;
    let json_schema = match format {
        SchemaFormat::JsonSchema => {
            serde_json::from_str(source).map_err(|e| SchemaError::InvalidJson(e.to_string()))?
        }
        SchemaFormat::Expression => parser::parse(source)?.to_json_schema(),
    };
    compile_json(format, json_schema)
}

fn compile_json(format: SchemaFormat, json_schema: Value) -> Result<CompiledSchema, SchemaError> {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft202012);
    opts.should_validate_formats(true);
    opts.with_retriever(DenyRetriever);

    let validator = opts
        .build(&json_schema)
        .map_err(|e| SchemaError::Invalid(e.to_string()))?;

    tracing::debug!(format = ?format, "compiled schema");

    Ok(CompiledSchema {
        format,
        json_schema,
        validator,
    })
}

/// One place where an instance fails its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// JSON pointer to the failing location; empty for the root.
    pub instance_path: String,
    /// Human-readable reason.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Every violation found in one validation pass. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// Number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a value returned by [`CompiledSchema::validate`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the violations.
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}
