// sensors/mod.rs
pub mod parser;

pub use parser::*;
