//! Deterministic collaborators and fixture data

mod encoders;
mod fixtures;

pub use encoders::{
    CountingEncoder, FailingEncoder, HashingEncoder, SlowEncoder, WordTokens, VOCAB_SIZE,
};
pub use fixtures::{medical_abstracts, TestDataFactory};
