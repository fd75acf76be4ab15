//! Grammars bundled with this crate.

pub mod mini_java;
