/*!
 * Core Module
 * Fundamental types, error handling and per-thread interrupt status
 */

pub mod errors;
pub mod interrupt;
pub mod limits;
pub mod types;

// Re-export for convenience
pub use errors::*;
pub use types::*;
