use tracing::debug;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, MediaQueryListEvent, Window};

use super::{Fragment, Page, PageElement};
use crate::error::ThemeError;

const DARK_SCHEME_QUERY: &str = "(prefers-color-scheme: dark)";

/// The live browser document.
#[derive(Debug, Clone)]
pub struct WebPage {
    window: Window,
    document: Document,
}

impl WebPage {
    /// The page this module was loaded into, if running in a browser.
    pub fn current() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }

    fn build(&self, fragment: &Fragment) -> Result<Element, ThemeError> {
        let el = self
            .document
            .create_element(&fragment.tag)
            .map_err(ThemeError::dom)?;
        if let Some(id) = &fragment.id {
            el.set_id(id);
        }
        if !fragment.classes.is_empty() {
            el.set_class_name(&fragment.classes.join(" "));
        }
        for (name, value) in &fragment.attributes {
            el.set_attribute(name, value).map_err(ThemeError::dom)?;
        }
        if let Some(text) = &fragment.text {
            el.set_text_content(Some(text));
        }
        for child in &fragment.children {
            let child = self.build(child)?;
            el.append_child(&child).map_err(ThemeError::dom)?;
        }
        Ok(el)
    }
}

impl PageElement for Element {
    fn set_attribute(&self, name: &str, value: &str) -> Result<(), ThemeError> {
        Element::set_attribute(self, name, value).map_err(ThemeError::dom)
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.get_attribute(name)
    }

    fn set_text(&self, text: &str) {
        self.set_text_content(Some(text));
    }

    fn text(&self) -> String {
        self.text_content().unwrap_or_default()
    }

    fn query(&self, selector: &str) -> Option<Self> {
        self.query_selector(selector).ok().flatten()
    }

    fn add_class(&self, class: &str) -> Result<(), ThemeError> {
        self.class_list().add_1(class).map_err(ThemeError::dom)
    }

    fn remove_class(&self, class: &str) -> Result<(), ThemeError> {
        self.class_list().remove_1(class).map_err(ThemeError::dom)
    }

    fn has_class(&self, class: &str) -> bool {
        self.class_list().contains(class)
    }
}

impl Page for WebPage {
    type Element = Element;

    fn root(&self) -> Option<Element> {
        self.document.document_element()
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Into::into)
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn prepend_to_body(&self, fragment: &Fragment) -> Result<Element, ThemeError> {
        let body = self
            .document
            .body()
            .ok_or_else(|| ThemeError::Dom("document has no body".to_string()))?;
        let el = self.build(fragment)?;
        let first = body.first_child();
        body.insert_before(&el, first.as_ref())
            .map_err(ThemeError::dom)?;
        Ok(el)
    }

    fn on_click(&self, element: &Element, handler: Box<dyn FnMut()>) -> Result<(), ThemeError> {
        let closure = Closure::wrap(handler);
        element
            .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
            .map_err(ThemeError::dom)?;
        // The listener lives as long as the document.
        closure.forget();
        Ok(())
    }

    fn when_ready(&self, task: Box<dyn FnOnce()>) {
        if self.document.ready_state() != "loading" {
            task();
            return;
        }
        let callback = Closure::once_into_js(move || task());
        if let Err(e) = self
            .document
            .add_event_listener_with_callback("DOMContentLoaded", callback.unchecked_ref())
        {
            debug!("Failed to listen for DOMContentLoaded: {:?}", e);
        }
    }

    fn on_color_scheme_change(
        &self,
        mut handler: Box<dyn FnMut(bool)>,
    ) -> Result<(), ThemeError> {
        let list = self
            .window
            .match_media(DARK_SCHEME_QUERY)
            .map_err(ThemeError::dom)?
            .ok_or_else(|| ThemeError::Dom("matchMedia returned null".to_string()))?;
        let closure = Closure::wrap(Box::new(move |event: MediaQueryListEvent| {
            handler(event.matches());
        }) as Box<dyn FnMut(_)>);
        list.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref())
            .map_err(ThemeError::dom)?;
        closure.forget();
        Ok(())
    }
}
