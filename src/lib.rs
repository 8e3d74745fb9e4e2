#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod formats;
pub mod labels;
pub mod layout;
pub mod logging;
pub mod render;
pub mod report;
pub mod score;
pub mod site;
pub mod store;
pub mod table;
pub mod venue;
