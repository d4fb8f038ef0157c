use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{Fragment, Page, PageElement};
use crate::error::ThemeError;

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    children: Vec<MemoryElement>,
}

/// An element of a [`MemoryPage`]. Clones share the same node.
#[derive(Debug, Clone)]
pub struct MemoryElement(Rc<RefCell<NodeData>>);

impl PartialEq for MemoryElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for MemoryElement {}

impl MemoryElement {
    pub fn new(tag: &str) -> Self {
        Self(Rc::new(RefCell::new(NodeData {
            tag: tag.to_ascii_lowercase(),
            ..NodeData::default()
        })))
    }

    pub fn from_fragment(fragment: &Fragment) -> Self {
        let el = Self::new(&fragment.tag);
        {
            let mut node = el.0.borrow_mut();
            if let Some(id) = &fragment.id {
                node.attributes.insert("id".to_string(), id.clone());
            }
            node.classes = fragment.classes.clone();
            for (name, value) in &fragment.attributes {
                node.attributes.insert(name.clone(), value.clone());
            }
            if let Some(text) = &fragment.text {
                node.text = text.clone();
            }
            node.children = fragment.children.iter().map(Self::from_fragment).collect();
        }
        el
    }

    pub fn tag(&self) -> String {
        self.0.borrow().tag.clone()
    }

    pub fn children(&self) -> Vec<MemoryElement> {
        self.0.borrow().children.clone()
    }

    pub fn first_child(&self) -> Option<MemoryElement> {
        self.0.borrow().children.first().cloned()
    }

    pub fn append_child(&self, child: MemoryElement) {
        self.0.borrow_mut().children.push(child);
    }

    pub fn prepend_child(&self, child: MemoryElement) {
        self.0.borrow_mut().children.insert(0, child);
    }

    pub fn classes(&self) -> Vec<String> {
        self.0.borrow().classes.clone()
    }

    /// Every descendant matching `selector`, in document order.
    pub fn query_all(&self, selector: &str) -> Vec<MemoryElement> {
        let mut found = Vec::new();
        self.collect(selector, &mut found);
        found
    }

    fn collect(&self, selector: &str, found: &mut Vec<MemoryElement>) {
        for child in self.children() {
            if child.matches(selector) {
                found.push(child.clone());
            }
            child.collect(selector, found);
        }
    }

    /// Supports `#id`, `.class` and bare tag names.
    pub fn matches(&self, selector: &str) -> bool {
        let node = self.0.borrow();
        if let Some(id) = selector.strip_prefix('#') {
            node.attributes.get("id").map(String::as_str) == Some(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            node.classes.iter().any(|c| c == class)
        } else {
            node.tag.eq_ignore_ascii_case(selector)
        }
    }
}

impl PageElement for MemoryElement {
    fn set_attribute(&self, name: &str, value: &str) -> Result<(), ThemeError> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ThemeError::Dom(format!("invalid attribute name '{}'", name)));
        }
        let mut node = self.0.borrow_mut();
        if name == "class" {
            node.classes = value.split_whitespace().map(str::to_string).collect();
        } else {
            node.attributes.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<String> {
        let node = self.0.borrow();
        if name == "class" {
            if node.classes.is_empty() {
                None
            } else {
                Some(node.classes.join(" "))
            }
        } else {
            node.attributes.get(name).cloned()
        }
    }

    fn set_text(&self, text: &str) {
        let mut node = self.0.borrow_mut();
        node.children.clear();
        node.text = text.to_string();
    }

    fn text(&self) -> String {
        let node = self.0.borrow();
        let mut text = node.text.clone();
        for child in &node.children {
            text.push_str(&child.text());
        }
        text
    }

    fn query(&self, selector: &str) -> Option<Self> {
        for child in self.children() {
            if child.matches(selector) {
                return Some(child);
            }
            if let Some(found) = child.query(selector) {
                return Some(found);
            }
        }
        None
    }

    fn add_class(&self, class: &str) -> Result<(), ThemeError> {
        if class.is_empty() || class.chars().any(char::is_whitespace) {
            return Err(ThemeError::Dom(format!("invalid class token '{}'", class)));
        }
        let mut node = self.0.borrow_mut();
        if !node.classes.iter().any(|c| c == class) {
            node.classes.push(class.to_string());
        }
        Ok(())
    }

    fn remove_class(&self, class: &str) -> Result<(), ThemeError> {
        if class.is_empty() || class.chars().any(char::is_whitespace) {
            return Err(ThemeError::Dom(format!("invalid class token '{}'", class)));
        }
        self.0.borrow_mut().classes.retain(|c| c != class);
        Ok(())
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.borrow().classes.iter().any(|c| c == class)
    }
}

type ClickHandler = Rc<RefCell<Box<dyn FnMut()>>>;
type SchemeHandler = Rc<RefCell<Box<dyn FnMut(bool)>>>;

/// A headless page: an `<html>` root with an optional `<body>`, plus
/// hand-driven readiness, click and color-scheme events.
pub struct MemoryPage {
    root: MemoryElement,
    body: Option<MemoryElement>,
    ready: Cell<bool>,
    ready_tasks: RefCell<Vec<Box<dyn FnOnce()>>>,
    click_handlers: RefCell<Vec<(MemoryElement, ClickHandler)>>,
    scheme_handlers: RefCell<Vec<SchemeHandler>>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    /// A page still loading: `when_ready` tasks wait for [`MemoryPage::fire_ready`].
    pub fn new() -> Self {
        let root = MemoryElement::new("html");
        let body = MemoryElement::new("body");
        root.append_child(MemoryElement::new("head"));
        root.append_child(body.clone());
        Self::with_parts(root, Some(body))
    }

    /// A page whose document has no `<body>`.
    pub fn without_body() -> Self {
        let root = MemoryElement::new("html");
        root.append_child(MemoryElement::new("head"));
        Self::with_parts(root, None)
    }

    fn with_parts(root: MemoryElement, body: Option<MemoryElement>) -> Self {
        Self {
            root,
            body,
            ready: Cell::new(false),
            ready_tasks: RefCell::new(Vec::new()),
            click_handlers: RefCell::new(Vec::new()),
            scheme_handlers: RefCell::new(Vec::new()),
        }
    }

    /// Append host markup to the body, as if it came with the HTML.
    pub fn append_to_body(&self, fragment: &Fragment) -> Option<MemoryElement> {
        let body = self.body.as_ref()?;
        let el = MemoryElement::from_fragment(fragment);
        body.append_child(el.clone());
        Some(el)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    /// Mark the structure as parsed and run waiting tasks in registration order.
    pub fn fire_ready(&self) {
        if self.ready.replace(true) {
            return;
        }
        let tasks = std::mem::take(&mut *self.ready_tasks.borrow_mut());
        for task in tasks {
            task();
        }
    }

    /// Dispatch a click on `element`. Returns how many handlers ran.
    pub fn click(&self, element: &MemoryElement) -> usize {
        let handlers: Vec<ClickHandler> = self
            .click_handlers
            .borrow()
            .iter()
            .filter(|(target, _)| target == element)
            .map(|(_, handler)| Rc::clone(handler))
            .collect();
        for handler in &handlers {
            (handler.borrow_mut())();
        }
        handlers.len()
    }

    /// Click the element with `id`, if present.
    pub fn click_id(&self, id: &str) -> usize {
        match self.element_by_id(id) {
            Some(el) => self.click(&el),
            None => 0,
        }
    }

    pub fn emit_color_scheme(&self, matches_dark: bool) {
        let handlers: Vec<SchemeHandler> = self.scheme_handlers.borrow().clone();
        for handler in &handlers {
            (handler.borrow_mut())(matches_dark);
        }
    }

    pub fn count(&self, selector: &str) -> usize {
        let self_match = usize::from(self.root.matches(selector));
        self_match + self.root.query_all(selector).len()
    }
}

impl Page for MemoryPage {
    type Element = MemoryElement;

    fn root(&self) -> Option<MemoryElement> {
        Some(self.root.clone())
    }

    fn body(&self) -> Option<MemoryElement> {
        self.body.clone()
    }

    fn element_by_id(&self, id: &str) -> Option<MemoryElement> {
        self.query(&format!("#{}", id))
    }

    fn query(&self, selector: &str) -> Option<MemoryElement> {
        if self.root.matches(selector) {
            return Some(self.root.clone());
        }
        self.root.query(selector)
    }

    fn prepend_to_body(&self, fragment: &Fragment) -> Result<MemoryElement, ThemeError> {
        let body = self
            .body
            .as_ref()
            .ok_or_else(|| ThemeError::Dom("document has no body".to_string()))?;
        let el = MemoryElement::from_fragment(fragment);
        body.prepend_child(el.clone());
        Ok(el)
    }

    fn on_click(
        &self,
        element: &MemoryElement,
        handler: Box<dyn FnMut()>,
    ) -> Result<(), ThemeError> {
        self.click_handlers
            .borrow_mut()
            .push((element.clone(), Rc::new(RefCell::new(handler))));
        Ok(())
    }

    fn when_ready(&self, task: Box<dyn FnOnce()>) {
        if self.ready.get() {
            task();
        } else {
            self.ready_tasks.borrow_mut().push(task);
        }
    }

    fn on_color_scheme_change(&self, handler: Box<dyn FnMut(bool)>) -> Result<(), ThemeError> {
        self.scheme_handlers
            .borrow_mut()
            .push(Rc::new(RefCell::new(handler)));
        Ok(())
    }
}

impl std::fmt::Debug for MemoryPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPage")
            .field("root", &self.root)
            .field("ready", &self.ready.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toggle_button() -> Fragment {
        Fragment::new("button")
            .id("theme-toggle")
            .child(Fragment::new("span").class("theme-toggle-icon").text("🌙"))
            .child(Fragment::new("span").class("theme-toggle-text").text("Modalità Scura"))
    }

    #[test]
    fn test_lookup_by_id_class_and_tag() {
        let page = MemoryPage::new();
        page.append_to_body(&toggle_button());

        let button = page.element_by_id("theme-toggle").unwrap();
        assert_eq!(button.tag(), "button");
        assert_eq!(button.query(".theme-toggle-icon").unwrap().text(), "🌙");
        assert!(page.query("body").is_some());
        assert!(page.query("html").is_some());
        assert!(page.element_by_id("missing").is_none());
    }

    #[test]
    fn test_text_concatenates_descendants() {
        let page = MemoryPage::new();
        let button = page.append_to_body(&toggle_button()).unwrap();
        assert_eq!(button.text(), "🌙Modalità Scura");

        button.set_text("plain");
        assert_eq!(button.text(), "plain");
        assert!(button.children().is_empty());
    }

    #[test]
    fn test_prepend_inserts_first() {
        let page = MemoryPage::new();
        page.append_to_body(&Fragment::new("main"));
        page.prepend_to_body(&Fragment::new("div").class("top-bar"))
            .unwrap();

        let body = page.body().unwrap();
        assert!(body.first_child().unwrap().matches(".top-bar"));
        assert_eq!(body.children().len(), 2);
    }

    #[test]
    fn test_prepend_without_body_fails() {
        let page = MemoryPage::without_body();
        assert!(matches!(
            page.prepend_to_body(&Fragment::new("div")),
            Err(ThemeError::Dom(_))
        ));
    }

    #[test]
    fn test_class_list() {
        let el = MemoryElement::new("body");
        el.add_class("a").unwrap();
        el.add_class("a").unwrap();
        el.add_class("b").unwrap();
        assert_eq!(el.classes(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(el.attribute("class").as_deref(), Some("a b"));

        el.remove_class("a").unwrap();
        assert!(!el.has_class("a"));
        assert!(el.add_class("two words").is_err());
    }

    #[test]
    fn test_ready_tasks_wait_for_fire() {
        let page = MemoryPage::new();
        let ran = Rc::new(Cell::new(0));

        let counter = Rc::clone(&ran);
        page.when_ready(Box::new(move || counter.set(counter.get() + 1)));
        assert_eq!(ran.get(), 0);

        page.fire_ready();
        assert_eq!(ran.get(), 1);

        let counter = Rc::clone(&ran);
        page.when_ready(Box::new(move || counter.set(counter.get() + 1)));
        assert_eq!(ran.get(), 2);

        page.fire_ready();
        assert_eq!(ran.get(), 2);
    }

    #[test]
    fn test_click_dispatches_to_target_only() {
        let page = MemoryPage::new();
        let button = page.append_to_body(&toggle_button()).unwrap();
        let other = page.append_to_body(&Fragment::new("a")).unwrap();
        let clicks = Rc::new(Cell::new(0));

        let counter = Rc::clone(&clicks);
        page.on_click(&button, Box::new(move || counter.set(counter.get() + 1)))
            .unwrap();

        assert_eq!(page.click(&other), 0);
        assert_eq!(page.click_id("theme-toggle"), 1);
        assert_eq!(clicks.get(), 1);
        assert_eq!(page.click_id("missing"), 0);
    }

    #[test]
    fn test_count() {
        let page = MemoryPage::new();
        page.append_to_body(&Fragment::new("div").class("top-bar"));
        page.append_to_body(&Fragment::new("div").class("top-bar"));
        assert_eq!(page.count(".top-bar"), 2);
        assert_eq!(page.count("html"), 1);
    }
}
