pub mod app;
pub mod effects;
pub mod logging;
pub mod render;
pub mod shell;
