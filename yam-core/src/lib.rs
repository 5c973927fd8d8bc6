//! YAML 1.1 loader and dumper.
//!
//! Loading runs text through [`tokenizer::StreamReader`], [`tokenizer::Scanner`]
//! and [`tokenizer::Parser`] into events, [`treebuild::Composer`] turns events
//! into a [`treebuild::NodeGraph`] and [`construct::Constructor`] builds
//! [`construct::Value`]s from it. Dumping goes the other way through
//! [`represent::Representer`], [`emitter::Serializer`] and [`emitter::Emitter`].
//! [`Yaml`] wires the stages together.
extern crate yam_common;

pub use construct::{Value, YamlObject};
pub use options::{DumperOptions, LoaderOptions};
pub use resolver::Resolver;
pub use tokenizer::Parser;
pub use yaml::{EngineConfig, Yaml};

pub mod comments;
pub mod construct;
pub mod emitter;
pub mod options;
pub mod represent;
pub mod resolver;
pub mod tokenizer;
pub mod treebuild;
mod yaml;
