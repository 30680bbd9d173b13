mod commands;
mod drill;
mod logging;
mod render;
mod setup;

pub use commands::run;
