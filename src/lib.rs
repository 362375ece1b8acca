pub mod catalog;
pub mod client;
pub mod commands;
pub mod complaint;
pub mod config;
pub mod devserver;
pub mod error;
pub mod flow;
pub mod identity;
pub mod license;
pub mod logging;
pub mod report;
