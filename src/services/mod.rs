// src/services/mod.rs

pub mod grading;
pub mod quiz;
pub mod quiz_attempt;
