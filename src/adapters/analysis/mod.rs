//! Token analysis, safety and credibility services

mod client;

pub use client::{AnalysisClient, AnalysisConfig, ID_PLACEHOLDER};
