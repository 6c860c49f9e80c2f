//! Internal utilities for the Siphon loopback driver.
//!
//! This crate provides low-level helpers shared between `siphon-core` and
//! `siphon-hal`. Everything here is `const fn` where possible and has zero
//! external dependencies.
//!
//! # Contents
//!
//! - [`FourCharCode`] - Four-character codes used by the host audio server for
//!   property selectors, class IDs, scopes and I/O operation IDs
//! - [`fourcc`] - `const fn` constructor returning the raw big-endian `u32`

pub mod fourcc;

pub use fourcc::{fourcc, FourCharCode};
