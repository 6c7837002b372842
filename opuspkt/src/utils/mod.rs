//! Utility functions and supporting infrastructure.
//!
//! Provides bounded bitstream reading, the frame size and padding length
//! codecs, and error handling.

pub mod bitstream_io;
pub mod errors;
pub mod size;
