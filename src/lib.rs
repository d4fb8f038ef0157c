pub mod components;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod page;
pub mod schedule;
pub mod storage;
pub mod theme;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info};
use wasm_bindgen::prelude::*;

pub use config::ThemeConfig;
pub use controller::ThemeController;
pub use error::ThemeError;
pub use theme::Theme;

use page::WebPage;
use schedule::TimeoutScheduler;
use storage::LocalStore;

pub type WebThemeController = ThemeController<WebPage, LocalStore, TimeoutScheduler>;

thread_local! {
    static INSTALLED: RefCell<Option<Rc<WebThemeController>>> = const { RefCell::new(None) };
}

/// Install logging and the controller on the current page. A second call
/// returns the controller from the first one.
pub fn install(config: ThemeConfig) -> Result<Rc<WebThemeController>, ThemeError> {
    logging::init();
    if let Some(existing) = installed() {
        if existing.config() != &config {
            debug!("Theme controller already installed, ignoring new config");
        }
        return Ok(existing);
    }
    config.validate()?;
    let page = WebPage::current()
        .ok_or_else(|| ThemeError::Dom("no browser document".to_string()))?;
    let controller = Rc::new(ThemeController::new(
        page,
        LocalStore::new(),
        TimeoutScheduler,
        config,
    ));
    controller.initialize();
    info!("Theme controller installed");
    INSTALLED.with(|slot| *slot.borrow_mut() = Some(Rc::clone(&controller)));
    Ok(controller)
}

pub fn installed() -> Option<Rc<WebThemeController>> {
    INSTALLED.with(|slot| slot.borrow().clone())
}

#[wasm_bindgen]
pub fn start() -> Result<(), JsValue> {
    install(ThemeConfig::default())?;
    Ok(())
}

/// Entry point for scripts passing a (partial) configuration object.
#[wasm_bindgen(js_name = startWithConfig)]
pub fn start_with_config(config: JsValue) -> Result<(), JsValue> {
    install(ThemeConfig::from_js(config)?)?;
    Ok(())
}

#[wasm_bindgen(js_name = toggleTheme)]
pub fn toggle_theme() {
    if let Some(controller) = installed() {
        controller.toggle_theme();
    }
}

/// The theme on the page, `undefined` before `start`.
#[wasm_bindgen(js_name = currentTheme)]
pub fn current_theme() -> Option<String> {
    installed()
        .and_then(|controller| controller.current_theme())
        .map(|theme| theme.as_str().to_string())
}
