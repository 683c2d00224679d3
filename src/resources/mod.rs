//! Decoders for the data the game streams in: texture uploads and model
//! polygon streams.

pub mod model;
pub mod texture;
