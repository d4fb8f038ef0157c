fn main() {
    if let Err(e) = theme_toggle::install(theme_toggle::ThemeConfig::default()) {
        tracing::error!("Failed to start theme toggle: {}", e);
    }
}
