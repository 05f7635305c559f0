// ============================================================================
// STATE MODULE - Estado compartido del scanner
// ============================================================================

pub mod scanner_state;

pub use scanner_state::*;
