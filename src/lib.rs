pub mod client;
pub mod harvest;
pub mod model;
pub mod predictions;
pub mod traits;

// Re-export common types for convenience
pub use client::*;
pub use model::*;
pub use traits::*;
