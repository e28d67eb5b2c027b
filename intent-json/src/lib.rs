//! intent-json - schema-validated structured output from chat models
//!
//! Give it an image or some text, an instruction, and a schema; it asks a
//! chat-completion model for a JSON object and only hands the reply back
//! once it conforms to the schema.
//!
//! Schemas are accepted as JSON Schema or as `z.object({ ... })`
//! expressions. Either is read as data by a dedicated parser and is never
//! executed.

pub mod chat;
pub mod error;
pub mod form;
pub mod invoker;
pub mod llms;
pub mod message;
pub mod multimodal;
pub mod playground;
pub mod prelude;
pub mod presets;
pub mod schema;
pub mod usage;

pub use error::{Error, ErrorKind, LlmError, Result};
