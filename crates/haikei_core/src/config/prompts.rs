//! System prompts sent ahead of the user's text

use crate::assistant::Feature;

/// Directive for mail summarization
pub const SUMMARIZE_PROMPT: &str = "あなたはメールの要約を専門とするAIアシスタントです。与えられたメールの内容を簡潔に要約してください。";

/// Directive for conversion into polite business Japanese
pub const CONVERT_STYLE_PROMPT: &str = "あなたは文体変換を専門とするAIアシスタントです。与えられたテキストを丁寧なビジネス文書の文体に変換してください。";

/// Get the fixed system prompt for a feature
pub fn get_system_prompt(feature: Feature) -> &'static str {
    match feature {
        Feature::Summarize => SUMMARIZE_PROMPT,
        Feature::ConvertStyle => CONVERT_STYLE_PROMPT,
    }
}
