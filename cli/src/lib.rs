pub mod cases;
pub mod cmd;
pub mod config;
pub mod reporter;
pub mod style;
pub mod util;
