//! Internationalization (i18n) tables for user-facing messages
use phf::phf_map;
use serde::{Deserialize, Serialize};

/// Language options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    Japanese,
    English,
}

impl Language {
    /// Parse language from string
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "en" | "english" => Self::English,
            _ => Self::Japanese,
        }
    }

    /// Get language code string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Japanese => "ja",
            Self::English => "en",
        }
    }
}

/// Japanese messages
pub static MESSAGES_JA: phf::Map<&'static str, &'static str> = phf_map! {
    "api_error" => "APIリクエストに失敗しました。APIキーを確認してください。",
    "validation_error" => "入力内容に問題があります。",
    "network_error" => "ネットワーク接続に問題が発生しました。",
    "unknown_error" => "予期せぬエラーが発生しました。",
    "summarize_empty_input" => "メール本文を入力してください",
    "convert_empty_input" => "変換するテキストを入力してください",
    "summarize_title" => "メール要約",
    "convert_title" => "文体変換",
    "summary_result" => "要約結果",
    "converted_result" => "変換結果",
    "api_key_saved" => "APIキーを保存しました",
    "api_key_save_failed" => "APIキーの保存に失敗しました",
    "api_key_load_failed" => "APIキーの読み込みに失敗しました",
    "api_key_deleted" => "APIキーを削除しました",
    "api_key_delete_failed" => "APIキーの削除に失敗しました",
    "api_key_not_set" => "APIキーが設定されていません",
    "connection_successful" => "接続に成功しました",
    "connection_failed" => "接続に失敗しました",
};

/// English messages
pub static MESSAGES_EN: phf::Map<&'static str, &'static str> = phf_map! {
    "api_error" => "The API request failed. Please check your API key.",
    "validation_error" => "There is a problem with the input.",
    "network_error" => "A network connection problem occurred.",
    "unknown_error" => "An unexpected error occurred.",
    "summarize_empty_input" => "Please enter the mail body",
    "convert_empty_input" => "Please enter the text to convert",
    "summarize_title" => "Mail Summary",
    "convert_title" => "Style Conversion",
    "summary_result" => "Summary",
    "converted_result" => "Converted Text",
    "api_key_saved" => "API key saved",
    "api_key_save_failed" => "Failed to save the API key",
    "api_key_load_failed" => "Failed to load the API key",
    "api_key_deleted" => "API key deleted",
    "api_key_delete_failed" => "Failed to delete the API key",
    "api_key_not_set" => "No API key is set",
    "connection_successful" => "Connection Successful",
    "connection_failed" => "Connection Failed",
};

/// Get UI messages dictionary by language
pub fn get_messages(lang: Language) -> &'static phf::Map<&'static str, &'static str> {
    match lang {
        Language::English => &MESSAGES_EN,
        Language::Japanese => &MESSAGES_JA,
    }
}

/// Get a single UI message by key and language
/// Returns the message if found, otherwise returns the key as a fallback
pub fn get_message<'a>(key: &'a str, lang: Language) -> &'a str {
    let messages = get_messages(lang);
    match messages.get(key) {
        Some(msg) => msg,
        None => key,
    }
}
