//! Volcanic ash particle contribution tool.
//!
//! The [`data`] module decodes particle image file names into the records
//! the ash database stores; the desktop front-end lives in the binary.

pub mod config;
pub mod data;
