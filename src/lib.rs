pub mod agent;
pub mod config;
pub mod error;
pub mod http;
pub mod llm;
pub mod prompt;
pub mod repl;
pub mod tools;
