//! OMR Grade Adapters - External adapters for omr-grade.
//!
//! This crate provides the filesystem image source used to feed key and
//! response sheets into the grading session.

pub mod fs;

pub use fs::{read_image, FsImageSource};
