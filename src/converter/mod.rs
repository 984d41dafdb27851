//! Client for the unix-timestamp converter service.

mod client;
mod types;

pub use client::{Converter, ConverterApi, invalid_method_body};
pub use types::{ConversionRequest, ConversionResponse};

#[cfg(test)]
pub use client::MockConverterApi;
