pub mod document;
pub mod error;
pub mod example;
pub mod inputs;
pub mod navigation;
pub mod resolve;
pub mod security;
pub mod warnings;
