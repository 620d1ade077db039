pub mod analyze;
pub mod diagnostics;
