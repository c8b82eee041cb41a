pub mod application;
pub mod domain;
pub mod error;
pub mod extractor;
pub mod normalizer;
pub mod ports;
pub mod utils;
