pub mod common;
pub mod delete;
pub mod list;
pub mod log;
pub mod stats;
