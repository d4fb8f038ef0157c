use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::config::ThemeConfig;
use crate::page::{Fragment, Page, PageElement};
use crate::schedule::{Scheduler, TaskHandle};
use crate::storage::PreferenceStore;
use crate::theme::Theme;

type Listener = Rc<dyn Fn(Theme)>;

/// Owns the theme of one page: reads and writes the persisted preference,
/// reflects it on the root element and the toggle button, and injects the
/// status bar.
pub struct ThemeController<P: Page, S: PreferenceStore, T: Scheduler> {
    page: P,
    store: S,
    scheduler: T,
    config: ThemeConfig,
    initialized: Cell<bool>,
    pending_transition: RefCell<Option<TaskHandle>>,
    listeners: RefCell<Vec<Listener>>,
}

impl<P, S, T> ThemeController<P, S, T>
where
    P: Page + 'static,
    S: PreferenceStore + 'static,
    T: Scheduler + 'static,
{
    pub fn new(page: P, store: S, scheduler: T, config: ThemeConfig) -> Self {
        Self {
            page,
            store,
            scheduler,
            config,
            initialized: Cell::new(false),
            pending_transition: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ThemeConfig {
        &self.config
    }

    /// The persisted choice, if there is a valid one. Store failures read as "no choice".
    pub fn stored_preference(&self) -> Option<Theme> {
        let raw = self.read_key()?;
        match raw.parse() {
            Ok(theme) => Some(theme),
            Err(_) => {
                debug!("Ignoring stored theme '{}'", raw);
                None
            }
        }
    }

    /// Whether the user has made an explicit choice. Any non-empty stored value counts.
    pub fn has_explicit_preference(&self) -> bool {
        self.read_key().is_some_and(|v| !v.is_empty())
    }

    pub fn resolve_preference(&self) -> Theme {
        self.stored_preference().unwrap_or_default()
    }

    /// The theme currently marked on the root element.
    pub fn current_theme(&self) -> Option<Theme> {
        self.page
            .root()?
            .attribute(&self.config.theme_attribute)?
            .parse()
            .ok()
    }

    pub fn apply_theme(&self, theme: Theme) {
        match self.page.root() {
            Some(root) => {
                if let Err(e) = root.set_attribute(&self.config.theme_attribute, theme.as_str()) {
                    debug!("Failed to set {}: {}", self.config.theme_attribute, e);
                }
            }
            None => debug!("No root element, theme attribute not set"),
        }

        if let Some(button) = self.page.query(&self.config.toggle_selector()) {
            let labels = self.config.labels_for(theme);
            if let Some(icon) = button.query(&self.config.icon_selector()) {
                icon.set_text(&labels.icon);
            }
            if let Some(text) = button.query(&self.config.text_selector()) {
                text.set_text(&labels.text);
            }
            if let Err(e) = button.set_attribute("aria-label", &labels.aria_label) {
                debug!("Failed to set aria-label: {}", e);
            }
        }

        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(theme);
        }
    }

    pub fn toggle_theme(&self) {
        let next = self.resolve_preference().toggled();
        info!("Toggling theme to {}", next);
        self.persist(next);
        self.apply_theme(next);
        self.start_transition();
    }

    /// Persist and apply an explicit choice.
    pub fn set_theme(&self, theme: Theme) {
        info!("Setting theme to {}", theme);
        self.persist(theme);
        self.apply_theme(theme);
    }

    /// Forget the explicit choice so system preference changes apply again.
    /// The theme on the page is left as it is.
    pub fn clear_preference(&self) {
        if let Err(e) = self.store.remove(&self.config.storage_key) {
            warn!("Failed to clear theme preference: {}", e);
        }
    }

    pub fn ensure_status_bar(&self) {
        if self.page.query(&self.config.status_bar_selector()).is_some() {
            debug!("Status bar already present");
            return;
        }
        if let Err(e) = self.page.prepend_to_body(&self.status_bar()) {
            warn!("Failed to insert status bar: {}", e);
        }
    }

    fn status_bar(&self) -> Fragment {
        let config = &self.config;
        let labels = config.labels_for(Theme::Light);
        Fragment::new("div")
            .class(&config.status_bar_class)
            .child(
                Fragment::new("div")
                    .class("top-bar-info")
                    .child(
                        Fragment::new("div")
                            .class("top-bar-name")
                            .text(&config.identity_name),
                    )
                    .child(
                        Fragment::new("div")
                            .class("top-bar-university")
                            .text(&config.identity_affiliation),
                    ),
            )
            .child(
                Fragment::new("button")
                    .id(&config.toggle_id)
                    .class("theme-toggle")
                    .attr("aria-label", &labels.aria_label)
                    .child(Fragment::new("span").class(&config.icon_class).text(&labels.icon))
                    .child(Fragment::new("span").class(&config.text_class).text(&labels.text)),
            )
    }

    /// Apply the stored theme now, then wire up the page once its structure is ready.
    /// Only the first call wires handlers; later calls are no-ops.
    pub fn initialize(self: &Rc<Self>) {
        if self.initialized.replace(true) {
            debug!("Theme controller already initialized");
            return;
        }
        self.apply_theme(self.resolve_preference());

        let controller = Rc::clone(self);
        self.page.when_ready(Box::new(move || {
            controller.ensure_status_bar();
            controller.attach_toggle();
        }));

        let controller = Rc::clone(self);
        if let Err(e) = self
            .page
            .on_color_scheme_change(Box::new(move |matches_dark| {
                controller.on_system_preference_change(matches_dark);
            }))
        {
            warn!("Cannot follow system color scheme: {}", e);
        }
    }

    fn attach_toggle(self: &Rc<Self>) {
        let Some(button) = self.page.query(&self.config.toggle_selector()) else {
            debug!("No #{} on the page", self.config.toggle_id);
            return;
        };
        let controller = Rc::clone(self);
        if let Err(e) = self
            .page
            .on_click(&button, Box::new(move || controller.toggle_theme()))
        {
            warn!("Failed to attach toggle handler: {}", e);
        }
        self.apply_theme(self.resolve_preference());
    }

    pub fn on_system_preference_change(&self, matches_dark: bool) {
        if self.has_explicit_preference() {
            debug!("System color scheme changed, keeping explicit preference");
            return;
        }
        let theme = Theme::from_system(matches_dark);
        info!("Following system color scheme: {}", theme);
        self.apply_theme(theme);
    }

    /// Call `listener` with the theme every time one is applied.
    pub fn subscribe(&self, listener: impl Fn(Theme) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Cancel a pending transition-class removal.
    pub fn shutdown(&self) {
        if let Some(handle) = self.pending_transition.borrow_mut().take() {
            handle.cancel();
        }
    }

    fn start_transition(&self) {
        let Some(body) = self.page.body() else {
            return;
        };
        let class = self.config.transition_class.clone();
        if let Err(e) = body.add_class(&class) {
            debug!("Failed to add {}: {}", class, e);
            return;
        }

        self.shutdown();
        let handle = self.scheduler.schedule(
            self.config.transition_ms,
            Box::new(move || {
                if let Err(e) = body.remove_class(&class) {
                    debug!("Failed to remove {}: {}", class, e);
                }
            }),
        );
        *self.pending_transition.borrow_mut() = handle;
    }

    fn read_key(&self) -> Option<String> {
        match self.store.get(&self.config.storage_key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read theme preference: {}", e);
                None
            }
        }
    }

    fn persist(&self, theme: Theme) {
        if let Err(e) = self.store.set(&self.config.storage_key, theme.as_str()) {
            warn!("Failed to persist theme preference: {}", e);
        }
    }
}
