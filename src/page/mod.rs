//! The host page as seen by the theme controller.
//!
//! Lookups return `Option` because every element the controller touches may be
//! missing from the host markup. Mutations return `Result` so the browser's
//! exceptions surface as [`ThemeError::Dom`]; the controller logs and moves on.

pub mod memory;
pub mod web;

use crate::error::ThemeError;

pub use memory::{MemoryElement, MemoryPage};
pub use web::WebPage;

pub trait PageElement: Clone + 'static {
    fn set_attribute(&self, name: &str, value: &str) -> Result<(), ThemeError>;
    fn attribute(&self, name: &str) -> Option<String>;
    fn set_text(&self, text: &str);
    fn text(&self) -> String;
    /// First descendant matching `selector`.
    fn query(&self, selector: &str) -> Option<Self>;
    fn add_class(&self, class: &str) -> Result<(), ThemeError>;
    fn remove_class(&self, class: &str) -> Result<(), ThemeError>;
    fn has_class(&self, class: &str) -> bool;
}

pub trait Page {
    type Element: PageElement;

    /// The document element (`<html>`).
    fn root(&self) -> Option<Self::Element>;
    fn body(&self) -> Option<Self::Element>;
    fn element_by_id(&self, id: &str) -> Option<Self::Element>;
    fn query(&self, selector: &str) -> Option<Self::Element>;
    /// Build `fragment` and insert it as the first child of the body.
    fn prepend_to_body(&self, fragment: &Fragment) -> Result<Self::Element, ThemeError>;
    fn on_click(
        &self,
        element: &Self::Element,
        handler: Box<dyn FnMut()>,
    ) -> Result<(), ThemeError>;
    /// Run `task` once the document structure is parsed; immediately if it already is.
    fn when_ready(&self, task: Box<dyn FnOnce()>);
    /// Subscribe to `prefers-color-scheme: dark` changes.
    fn on_color_scheme_change(&self, handler: Box<dyn FnMut(bool)>) -> Result<(), ThemeError>;
}

/// A detached element tree, materialized by [`Page::prepend_to_body`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Fragment>,
}

impl Fragment {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn child(mut self, child: Fragment) -> Self {
        self.children.push(child);
        self
    }
}
