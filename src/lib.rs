pub mod aggregate;
pub mod config;
pub mod gateway;
pub mod judgment;
pub mod matrix;
pub mod questions;
pub mod run;
pub mod storage;
