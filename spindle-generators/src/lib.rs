//! Sample source generators for Spindle.
//!
//! - [`HelloWorldGenerator`] - emits `Generated.HelloWorld` listing the input trees
//! - [`TypeIndexGenerator`] - emits `Generated.TypeIndex` listing declared types
//! - [`CodeBuilder`] - indentation-aware builder for generated brace source

mod builder;
mod hello_world;
mod type_index;

pub use builder::{CodeBuilder, Indent, string_literal};
pub use hello_world::HelloWorldGenerator;
pub use type_index::{TypeIndexGenerator, codes};
