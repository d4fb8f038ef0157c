pub mod theme_context;
