pub mod attachment;
pub mod render;
pub mod session;
