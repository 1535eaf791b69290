//! Configuration module for haikei_core
//!
//! This module contains:
//! - `i18n`: User-facing message tables
//! - `prompts`: System prompts for each feature
//! - `settings`: Client and HTTP settings

mod i18n;
mod prompts;
mod settings;

pub use i18n::{get_message, get_messages, Language, MESSAGES_EN, MESSAGES_JA};
pub use prompts::{get_system_prompt, CONVERT_STYLE_PROMPT, SUMMARIZE_PROMPT};
pub use settings::{
    mask_secret, ClientConfig, HttpConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    DEFAULT_TIMEOUT_SECS,
};
