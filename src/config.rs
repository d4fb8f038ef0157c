use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

use crate::error::ThemeError;
use crate::theme::{Theme, ToggleLabels};

/// Button content per active theme. Each entry describes the action the
/// button offers while that theme is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSet {
    pub light: ToggleLabels,
    pub dark: ToggleLabels,
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            light: ToggleLabels::offer_dark(),
            dark: ToggleLabels::offer_light(),
        }
    }
}

impl LabelSet {
    pub fn for_theme(&self, theme: Theme) -> &ToggleLabels {
        match theme {
            Theme::Light => &self.light,
            Theme::Dark => &self.dark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub storage_key: String,
    pub theme_attribute: String,
    pub toggle_id: String,
    pub icon_class: String,
    pub text_class: String,
    pub status_bar_class: String,
    pub transition_class: String,
    pub transition_ms: u32,
    pub identity_name: String,
    pub identity_affiliation: String,
    pub labels: LabelSet,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            storage_key: "theme".to_string(),
            theme_attribute: "data-theme".to_string(),
            toggle_id: "theme-toggle".to_string(),
            icon_class: "theme-toggle-icon".to_string(),
            text_class: "theme-toggle-text".to_string(),
            status_bar_class: "top-bar".to_string(),
            transition_class: "theme-transitioning".to_string(),
            transition_ms: 300,
            identity_name: "Kimi Ergulec".to_string(),
            identity_affiliation: "Università di Verona".to_string(),
            labels: LabelSet::default(),
        }
    }
}

impl ThemeConfig {
    /// Parse a (possibly partial) JSON configuration; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ThemeError> {
        let config: ThemeConfig =
            serde_json::from_str(json).map_err(|e| ThemeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration object handed over from JavaScript.
    /// `undefined` and `null` mean "use the defaults".
    pub fn from_js(value: JsValue) -> Result<Self, ThemeError> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        let config: ThemeConfig = serde_wasm_bindgen::from_value(value)
            .map_err(|e| ThemeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ThemeError> {
        let required = [
            ("storage_key", &self.storage_key),
            ("theme_attribute", &self.theme_attribute),
            ("toggle_id", &self.toggle_id),
            ("icon_class", &self.icon_class),
            ("text_class", &self.text_class),
            ("status_bar_class", &self.status_bar_class),
            ("transition_class", &self.transition_class),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ThemeError::Config(format!("{} must not be empty", name)));
            }
            if value.chars().any(char::is_whitespace) {
                return Err(ThemeError::Config(format!(
                    "{} must not contain whitespace: '{}'",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn labels_for(&self, theme: Theme) -> &ToggleLabels {
        self.labels.for_theme(theme)
    }

    pub(crate) fn toggle_selector(&self) -> String {
        format!("#{}", self.toggle_id)
    }

    pub(crate) fn status_bar_selector(&self) -> String {
        format!(".{}", self.status_bar_class)
    }

    pub(crate) fn icon_selector(&self) -> String {
        format!(".{}", self.icon_class)
    }

    pub(crate) fn text_selector(&self) -> String {
        format!(".{}", self.text_class)
    }
}
