pub mod category;
pub mod classifier;
pub mod config;
pub mod gemini;
pub mod reply;
pub mod server;
