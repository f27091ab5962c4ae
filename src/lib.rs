pub mod benchmarks;
pub mod command;
pub mod config;
pub mod error;
pub mod init;
pub mod path_utils;
pub mod results;
pub mod system_info;
