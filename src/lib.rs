//! Hobby Mentor — conversational hobby recommendations over HTTP.

pub mod config;
pub mod error;
pub mod llm;
pub mod mentor;
pub mod store;
