pub mod engine;

pub use engine::{resolve, weighted_average, REFERENCE_BOOKMAKER};
