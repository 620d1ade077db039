pub mod credits;
pub mod prompt;
pub mod ticket;
