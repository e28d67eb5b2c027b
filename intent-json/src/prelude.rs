//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use intent_json::prelude::*;
//! ```

#[cfg(feature = "openai")]
pub use crate::llms::{OpenAI, OpenAIConfig};
#[cfg(feature = "openai")]
pub use crate::playground::analyze_from_env;

pub use crate::chat::{
    ChatProvider, ChatRequest, ChatResponse, ResponseFormat, SharedChatProvider, StopReason,
};
pub use crate::error::{Error, ErrorKind, LlmError, Result};
pub use crate::form::{FieldErrors, FieldName, FormFields, InputMode, InvocationRequest};
pub use crate::invoker::StructuredInvoker;
pub use crate::llms::{MockProvider, MockReply};
pub use crate::message::{ImageDetail, Message, Role};
pub use crate::multimodal::{ImageFormat, ImageInput, UserContent};
pub use crate::playground::{PlaygroundState, analyze};
pub use crate::presets::Preset;
pub use crate::schema::{CompiledSchema, SchemaError, SchemaFormat, Violation, Violations, compile};
pub use crate::usage::Usage;
