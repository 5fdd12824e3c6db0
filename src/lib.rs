pub mod abi;
pub mod engine;
pub mod render;

pub use engine::*;
