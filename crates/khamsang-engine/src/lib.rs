pub mod backend;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod evidence;
pub mod pipeline;
pub mod resolution;

pub use khamsang_common::error_mapping;
pub use khamsang_common::protocol;
pub use khamsang_parser as parser;
