//! File-backed repositories.

mod difference;

pub use difference::JsonDifferenceRepository;
