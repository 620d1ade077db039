pub mod clipboard;
pub mod llm;
pub mod local_storage;
pub mod ticket_api;
