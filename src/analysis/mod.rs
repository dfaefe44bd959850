//! Result assembly modules

pub mod result;
