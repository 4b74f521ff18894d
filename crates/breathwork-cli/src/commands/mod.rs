pub mod config;
pub mod patterns;
pub mod run;
