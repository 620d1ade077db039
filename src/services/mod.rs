pub mod clipboard;
pub mod language_model;
pub mod local_storage;
pub mod ticket_service;

pub use clipboard::Clipboard;
pub use language_model::LanguageModelService;
pub use local_storage::LocalStorage;
pub use ticket_service::TicketService;
