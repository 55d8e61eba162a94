pub mod api;
pub mod app;
pub mod logging;
pub mod ui;
pub mod utils;
pub mod validation;
