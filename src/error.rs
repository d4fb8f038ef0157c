use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThemeError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("DOM error: {0}")]
    Dom(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ThemeError {
    /// Wrap a browser exception as a DOM error, keeping its message when it has one.
    pub fn dom(err: JsValue) -> Self {
        ThemeError::Dom(js_message(&err))
    }

    /// Wrap a browser exception raised by `localStorage`.
    pub fn storage(err: JsValue) -> Self {
        ThemeError::Storage(js_message(&err))
    }
}

impl From<ThemeError> for String {
    fn from(err: ThemeError) -> Self {
        err.to_string()
    }
}

impl From<ThemeError> for JsValue {
    fn from(err: ThemeError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

fn js_message(err: &JsValue) -> String {
    err.as_string()
        .unwrap_or_else(|| format!("{:?}", err))
}
