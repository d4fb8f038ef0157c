use std::rc::Rc;

use leptos::prelude::*;

use crate::controller::ThemeController;
use crate::page::Page;
use crate::schedule::Scheduler;
use crate::storage::PreferenceStore;
use crate::theme::Theme;

/// The applied theme as a signal, for Leptos components that style themselves.
#[derive(Clone, Copy)]
pub struct ThemeContext {
    pub theme: ReadSignal<Theme>,
}

/// Provide a [`ThemeContext`] that follows every theme `controller` applies.
pub fn provide_theme_context<P, S, T>(controller: &Rc<ThemeController<P, S, T>>) -> ThemeContext
where
    P: Page + 'static,
    S: PreferenceStore + 'static,
    T: Scheduler + 'static,
{
    let initial = controller
        .current_theme()
        .unwrap_or_else(|| controller.resolve_preference());
    let (theme, set_theme) = signal(initial);
    controller.subscribe(move |applied| set_theme.set(applied));

    let ctx = ThemeContext { theme };
    provide_context(ctx);
    ctx
}

/// The nearest [`ThemeContext`], if one was provided.
pub fn use_theme() -> Option<ThemeContext> {
    use_context::<ThemeContext>()
}
