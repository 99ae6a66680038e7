//! Cross-crate helpers shared by the directory crates and the CLI.

pub mod utils;
pub mod pagination;
