//! One entry point over every stage, for both directions.

use crate::construct::{Constructor, TypeDescription, TypeRegistry, Value, YamlObject};
use crate::emitter::{Emitter, Serializer};
use crate::options::{DumperOptions, LoaderOptions};
use crate::represent::Representer;
use crate::resolver::Resolver;
use crate::tokenizer::{Parser, Scanner};
use crate::treebuild::{Composer, NodeGraph};
use std::str::Chars;
use tracing::debug;
use yam_common::{Event, FlowStyle, Token, YamlError, YamlResult};

/// Everything the stages are built from.
#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    pub resolver: Resolver,
    pub types: TypeRegistry,
    pub loader: LoaderOptions,
    pub dumper: DumperOptions,
}

impl EngineConfig {
    /// Binds `T` to `tag` for loading and dumping.
    pub fn register<T: YamlObject>(&mut self, tag: impl Into<String>) -> YamlResult<()> {
        self.types.register(TypeDescription::of::<T>(tag))
    }
}

///
/// Loads and dumps YAML with one [`EngineConfig`].
///
/// Every call builds its own reader, scanner, parser, composer and
/// constructor (or representer, serializer and emitter), so a `Yaml` can be
/// reused and shared between calls.
///
/// # Methods
/// - `scan`, `parse`, `compose`, `load`: Run the loading pipeline up to tokens,
///   events, node graphs or values.
/// - `represent`, `serialize`, `emit`, `dump`: The dumping pipeline, from values
///   to nodes, events and text.
#[derive(Clone, Debug, Default)]
pub struct Yaml {
    config: EngineConfig,
}

impl Yaml {
    #[must_use]
    pub fn new() -> Self {
        Yaml::default()
    }

    pub fn with_config(config: EngineConfig) -> YamlResult<Self> {
        config.dumper.validate()?;
        Ok(Yaml { config })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn scanner<'a>(&self, input: &'a str) -> Scanner<Chars<'a>> {
        let mut scanner = Scanner::new_from_str(input);
        scanner
            .emit_comments(self.config.loader.process_comments)
            .simple_key_window(self.config.loader.simple_key_window);
        scanner
    }

    fn composer<'s, 'a>(&'s self, input: &'a str) -> Composer<'s, Chars<'a>> {
        Composer::new(
            Parser::new(self.scanner(input)),
            &self.config.resolver,
            self.config.loader.clone(),
        )
    }

    pub fn scan(&self, input: &str) -> YamlResult<Vec<Token>> {
        self.scanner(input).collect()
    }

    pub fn parse(&self, input: &str) -> YamlResult<Vec<Event>> {
        Parser::new(self.scanner(input)).collect()
    }

    /// Node graph of the only document, `None` for an empty stream.
    pub fn compose(&self, input: &str) -> YamlResult<Option<NodeGraph>> {
        self.composer(input).get_single_node()
    }

    pub fn compose_all(&self, input: &str) -> YamlResult<Vec<NodeGraph>> {
        self.composer(input).collect()
    }

    /// Value of the only document, [`Value::Null`] for an empty stream.
    pub fn load(&self, input: &str) -> YamlResult<Value> {
        let mut constructor = Constructor::new(&self.config.types, &self.config.loader);
        match self.compose(input)? {
            Some(mut graph) => constructor.construct_document(&mut graph),
            None => Ok(Value::Null),
        }
    }

    pub fn load_all(&self, input: &str) -> YamlResult<Vec<Value>> {
        let mut constructor = Constructor::new(&self.config.types, &self.config.loader);
        let mut values = Vec::new();
        for graph in self.composer(input) {
            let mut graph = graph?;
            values.push(constructor.construct_document(&mut graph)?);
        }
        debug!("loaded {} documents", values.len());
        Ok(values)
    }

    /// Loads the only document as `T`. An untagged root is bound with the tag
    /// `T` was registered under.
    pub fn load_as<T: YamlObject + Clone>(&self, input: &str) -> YamlResult<T> {
        let tag = self.config.types.tag_of::<T>().ok_or_else(|| {
            YamlError::Config(format!(
                "{} is not registered",
                std::any::type_name::<T>()
            ))
        })?;
        let mut graph = self.compose(input)?.ok_or_else(|| {
            YamlError::constructor(None, None, "the stream contains no document", None)
        })?;
        let mut constructor = Constructor::new(&self.config.types, &self.config.loader);
        constructor
            .construct_document_as(&mut graph, tag)?
            .to_object::<T>()
    }

    pub fn represent(&self, value: &Value) -> YamlResult<NodeGraph> {
        Representer::new(&self.config.types, &self.config.dumper).represent(value)
    }

    /// Events of a stream holding `graphs`, one document each.
    pub fn serialize(&self, graphs: &[NodeGraph]) -> YamlResult<Vec<Event>> {
        let mut serializer =
            Serializer::new(Vec::new(), &self.config.resolver, &self.config.dumper);
        serializer.open()?;
        for graph in graphs {
            serializer.serialize(graph)?;
        }
        serializer.close()?;
        Ok(serializer.into_inner())
    }

    pub fn emit(&self, events: impl IntoIterator<Item = Event>) -> YamlResult<String> {
        let mut out = String::new();
        let mut emitter = Emitter::new(&mut out, &self.config.dumper);
        for event in events {
            emitter.emit(event)?;
        }
        Ok(out)
    }

    /// Writes node graphs as a stream, one document each.
    pub fn dump_graphs(&self, graphs: &[NodeGraph], root_tag: Option<&str>) -> YamlResult<String> {
        let mut out = String::new();
        {
            let emitter = Emitter::new(&mut out, &self.config.dumper);
            let mut serializer =
                Serializer::new(emitter, &self.config.resolver, &self.config.dumper)
                    .with_root_tag(root_tag.map(str::to_string));
            serializer.open()?;
            for graph in graphs {
                serializer.serialize(graph)?;
            }
            serializer.close()?;
        }
        Ok(out)
    }

    pub fn dump(&self, value: &Value) -> YamlResult<String> {
        let graph = self.represent(value)?;
        self.dump_graphs(&[graph], None)
    }

    pub fn dump_all(&self, values: &[Value]) -> YamlResult<String> {
        let mut representer = Representer::new(&self.config.types, &self.config.dumper);
        let graphs = values
            .iter()
            .map(|value| representer.represent(value))
            .collect::<YamlResult<Vec<_>>>()?;
        self.dump_graphs(&graphs, None)
    }

    /// Dumps with `root_tag` written on the root node and `flow_style` in
    /// place of the configured default.
    pub fn dump_as(
        &self,
        value: &Value,
        root_tag: Option<&str>,
        flow_style: FlowStyle,
    ) -> YamlResult<String> {
        let graph = Representer::new(&self.config.types, &self.config.dumper)
            .with_flow_style(flow_style)
            .represent(value)?;
        self.dump_graphs(&[graph], root_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yam_common::tags;

    #[test]
    fn load_and_dump() {
        let yaml = Yaml::new();
        let value = yaml.load("a: 1\nb: x\n").expect("load");
        assert_eq!(value.get("a").and_then(|v| v.as_i64()), Some(1));
        assert_eq!(yaml.dump(&value).expect("dump"), "{a: 1, b: x}\n");
        assert_eq!(
            yaml.dump_as(&value, None, FlowStyle::Block).expect("dump"),
            "a: 1\nb: x\n"
        );
    }

    #[test]
    fn empty_stream() {
        let yaml = Yaml::new();
        assert!(yaml.compose("").expect("compose").is_none());
        assert!(yaml.load("").expect("load").is_null());
        assert!(yaml.load_all("").expect("load").is_empty());
    }

    #[test]
    fn many_documents() {
        let yaml = Yaml::new();
        let values = yaml.load_all("--- 1\n--- 2\n").expect("load");
        assert_eq!(values.len(), 2);
        assert!(yaml.load("--- 1\n--- 2\n").is_err());
        let text = yaml
            .dump_all(&[Value::from("a"), Value::from("b")])
            .expect("dump");
        assert_eq!(text, "a\n--- b\n");
    }

    #[test]
    fn explicit_root_tag() {
        let yaml = Yaml::new();
        let text = yaml
            .dump_as(&Value::from("x"), Some(tags::STR), FlowStyle::Auto)
            .expect("dump");
        assert_eq!(text, "x\n");
        let text = yaml
            .dump_as(&Value::from("x"), Some("!name"), FlowStyle::Auto)
            .expect("dump");
        assert_eq!(text, "!name 'x'\n");
    }

    #[test]
    fn invalid_dumper_options() {
        let mut config = EngineConfig::default();
        config.dumper.indent_with_indicator = false;
        config.dumper.set_indent(2).expect("indent");
        config.dumper.set_indicator_indent(2).expect("indicator");
        assert!(Yaml::with_config(config).is_err());
    }
}
