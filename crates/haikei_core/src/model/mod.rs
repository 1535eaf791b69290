//! Model client module for chat completions
//!
//! This module provides:
//! - `types`: Prompt messages and the wire request/response shapes
//! - `client`: The configured completion client

mod client;
mod types;

pub use client::CompletionClient;
pub use types::{
    ApiErrorBody, ApiErrorDetail, ChatChoice, ChatCompletionBody, ChatCompletionResponse,
    ChatMessage, ChoiceMessage, CompletionRequest, Role,
};
