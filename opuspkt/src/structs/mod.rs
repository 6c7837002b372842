//! Data structures representing packet components.
//!
//! Contains the decoded TOC byte and the validated frame layout of a packet,
//! in both owned and borrowed form.

pub mod packet;
pub mod toc;
