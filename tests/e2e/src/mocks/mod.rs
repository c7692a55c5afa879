//! Test fixtures


pub use fixtures::{TestCard, TestDataFactory};
