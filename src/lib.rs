pub mod cards;
pub mod config;
pub mod extraction;
pub mod llm;
pub mod logging;
pub mod persistence;
pub mod prompt;
pub mod session;
pub mod ui;
