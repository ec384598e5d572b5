pub mod config;
pub mod extract;
pub mod run;
pub mod store;
