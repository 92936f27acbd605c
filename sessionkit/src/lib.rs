//! Bindings entry point for `SessionKit`.
//!
//! The static and dynamic libraries built from this crate carry the `UniFFI`
//! scaffolding of [`sessionkit_core`], from which the Swift and Kotlin bindings are
//! generated.

pub use sessionkit_core::*;
