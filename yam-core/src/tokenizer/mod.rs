//! Text to tokens to events.

pub use parser::Parser;
pub use reader::StreamReader;
pub use scanner::{Scanner, DEFAULT_SIMPLE_KEY_WINDOW};

pub mod char_utils;
mod parser;
mod reader;
mod scanner;
