//! Image derivatives via an external command line tool
//!
//! The tool is probed once per process. Conversions go through the
//! `ImageConverter` trait; `DerivativeGenerator` turns one stored image into
//! a thumbnail and a web-format copy.

mod converter;
mod derivatives;
mod tool_locator;

pub use converter::{CommandLineConverter, ConversionError, ImageConverter};
pub use derivatives::{DerivativeGenerator, DerivativeKind, DerivativeRecord, GeneratedFile};
pub use tool_locator::detect;
