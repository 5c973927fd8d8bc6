//! Node graphs to values.

pub use object::{
    DynObject, Field, FieldKind, FieldSet, ObjectRef, TypeDescription, TypeRegistry, YamlObject,
};
pub use timestamp::Timestamp;
pub use value::{Mapping, Shared, Value};

mod object;
mod timestamp;
mod value;

use crate::options::LoaderOptions;
use crate::treebuild::{NodeData, NodeGraph, NodeId, NodeKind};
use base64::Engine;
use hashbrown::{HashMap, HashSet};
use indexmap::{IndexMap, IndexSet};
use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;
use tracing::debug;
use yam_common::{tags, Marker, MarkedError, YamlError, YamlResult};

/// A map or set entry whose key was still under construction.
enum Deferred {
    MapEntry {
        map: Shared<Mapping>,
        key: Value,
        value: Value,
    },
    SetEntry {
        set: Shared<IndexSet<Value>>,
        key: Value,
    },
}

///
/// Turns the node graph of one document into a [`Value`].
///
/// Every node is constructed once; aliases get a clone of the first result, so
/// shared collections stay shared. Collections flagged `two_steps` are created
/// empty, registered and then filled. Map and set entries whose key is such a
/// collection are queued and inserted, in order, after the whole document is
/// done.
pub struct Constructor<'c> {
    types: &'c TypeRegistry,
    options: &'c LoaderOptions,
    constructed: HashMap<NodeId, Value>,
    recursive: HashSet<NodeId>,
    deferred: VecDeque<Deferred>,
}

impl<'c> Constructor<'c> {
    #[must_use]
    pub fn new(types: &'c TypeRegistry, options: &'c LoaderOptions) -> Self {
        Constructor {
            types,
            options,
            constructed: HashMap::new(),
            recursive: HashSet::new(),
            deferred: VecDeque::new(),
        }
    }

    pub fn construct_document(&mut self, graph: &mut NodeGraph) -> YamlResult<Value> {
        let result = match graph.root() {
            Some(root) => self.construct_object(graph, root).map(|value| {
                self.fill_recursive();
                value
            }),
            None => Ok(Value::Null),
        };
        debug!(
            "constructed document with {} nodes, {} deferred entries left",
            self.constructed.len(),
            self.deferred.len()
        );
        self.constructed.clear();
        self.recursive.clear();
        self.deferred.clear();
        result
    }

    /// Like [`Constructor::construct_document`], but an untagged root is
    /// constructed as `tag`.
    pub fn construct_document_as(&mut self, graph: &mut NodeGraph, tag: &str) -> YamlResult<Value> {
        if let Some(root) = graph.root() {
            let root = &mut graph[root];
            if root.resolved && root.tag != tags::NULL {
                root.type_hint = Some(tag.to_string());
            }
        }
        self.construct_document(graph)
    }

    fn fill_recursive(&mut self) {
        while let Some(entry) = self.deferred.pop_front() {
            match entry {
                Deferred::MapEntry { map, key, value } => {
                    map.borrow_mut().insert(key, value);
                }
                Deferred::SetEntry { set, key } => {
                    set.borrow_mut().insert(key);
                }
            }
        }
    }

    pub fn construct_object(&mut self, graph: &mut NodeGraph, id: NodeId) -> YamlResult<Value> {
        if let Some(value) = self.constructed.get(&id) {
            return Ok(value.clone());
        }
        if self.recursive.contains(&id) {
            return Err(YamlError::constructor(
                None,
                None,
                "found unconstructable recursive node",
                Some(graph[id].span.start),
            ));
        }
        self.recursive.insert(id);
        let value = self.construct_first_step(graph, id)?;
        self.constructed.insert(id, value.clone());
        self.recursive.remove(&id);
        if graph[id].two_steps {
            self.construct_second_step(graph, id, &value)?;
        }
        Ok(value)
    }

    fn construct_first_step(&mut self, graph: &mut NodeGraph, id: NodeId) -> YamlResult<Value> {
        let tag = graph[id].construct_tag().to_string();
        let two_steps = graph[id].two_steps;
        let types = self.types;
        match tag.as_str() {
            tags::NULL => {
                self.scalar(graph, id)?;
                Ok(Value::Null)
            }
            tags::BOOL => self.construct_bool(graph, id),
            tags::INT => self.construct_int(graph, id),
            tags::FLOAT => self.construct_float(graph, id),
            tags::BINARY => self.construct_binary(graph, id),
            tags::TIMESTAMP => self.construct_timestamp(graph, id),
            tags::STR => Ok(Value::Str(self.scalar(graph, id)?.to_string())),
            tags::OMAP => self.construct_omap(graph, id),
            tags::PAIRS => self.construct_pairs(graph, id),
            tags::SEQ => {
                let items = Rc::new(RefCell::new(Vec::new()));
                if !two_steps {
                    self.fill_sequence(graph, id, &items)?;
                }
                Ok(Value::Seq(items))
            }
            tags::MAP => {
                let map = Rc::new(RefCell::new(IndexMap::new()));
                if !two_steps {
                    self.fill_mapping(graph, id, &map)?;
                }
                Ok(Value::Map(map))
            }
            tags::SET => {
                let set = Rc::new(RefCell::new(IndexSet::new()));
                if !two_steps {
                    self.fill_set(graph, id, &set)?;
                }
                Ok(Value::Set(set))
            }
            tags::COMMENT => Ok(Value::Null),
            _ => match types.by_tag(&tag) {
                Some(description) => self.construct_registered(graph, id, description),
                None => Err(YamlError::constructor(
                    None,
                    None,
                    format!("could not determine a constructor for the tag {tag}"),
                    Some(graph[id].span.start),
                )),
            },
        }
    }

    fn construct_second_step(
        &mut self,
        graph: &mut NodeGraph,
        id: NodeId,
        value: &Value,
    ) -> YamlResult<()> {
        match value {
            Value::Seq(items) => self.fill_sequence(graph, id, items),
            Value::Map(map) => self.fill_mapping(graph, id, map),
            Value::Set(set) => self.fill_set(graph, id, set),
            Value::Object(object) if graph[id].kind() == NodeKind::Mapping => {
                self.fill_object(graph, id, object)
            }
            _ => Err(YamlError::constructor(
                None,
                None,
                format!("unexpected recursive {} structure", graph[id].kind()),
                Some(graph[id].span.start),
            )),
        }
    }

    fn scalar<'g>(&self, graph: &'g NodeGraph, id: NodeId) -> YamlResult<&'g str> {
        graph[id].scalar_value().ok_or_else(|| {
            YamlError::constructor(
                None,
                None,
                format!("expected a scalar node, but found {}", graph[id].kind()),
                Some(graph[id].span.start),
            )
        })
    }

    fn construct_bool(&self, graph: &NodeGraph, id: NodeId) -> YamlResult<Value> {
        let value = self.scalar(graph, id)?;
        match value.to_lowercase().as_str() {
            "yes" | "true" | "on" => Ok(Value::Bool(true)),
            "no" | "false" | "off" => Ok(Value::Bool(false)),
            _ => Err(invalid_scalar("a boolean", value, graph[id].span.start)),
        }
    }

    fn construct_int(&self, graph: &NodeGraph, id: NodeId) -> YamlResult<Value> {
        let value = self.scalar(graph, id)?;
        parse_int(value)
            .map(Value::Int)
            .ok_or_else(|| invalid_scalar("an int", value, graph[id].span.start))
    }

    fn construct_float(&self, graph: &NodeGraph, id: NodeId) -> YamlResult<Value> {
        let value = self.scalar(graph, id)?;
        parse_float(value)
            .map(Value::Float)
            .ok_or_else(|| invalid_scalar("a float", value, graph[id].span.start))
    }

    fn construct_binary(&self, graph: &NodeGraph, id: NodeId) -> YamlResult<Value> {
        let value = self.scalar(graph, id)?;
        let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map(Value::Binary)
            .map_err(|err| {
                YamlError::constructor(
                    Some("while constructing binary data"),
                    Some(graph[id].span.start),
                    format!("failed to decode base64 data: {err}"),
                    Some(graph[id].span.start),
                )
            })
    }

    fn construct_timestamp(&self, graph: &NodeGraph, id: NodeId) -> YamlResult<Value> {
        let value = self.scalar(graph, id)?;
        Timestamp::parse(value).map(Value::Timestamp).ok_or_else(|| {
            YamlError::constructor(
                None,
                None,
                format!("unexpected timestamp: {value}"),
                Some(graph[id].span.start),
            )
        })
    }

    /// The `(key, value)` node of each single-pair mapping in a sequence.
    fn single_pairs(
        &self,
        graph: &NodeGraph,
        id: NodeId,
        context: &str,
    ) -> YamlResult<Vec<(NodeId, NodeId)>> {
        let start = graph[id].span.start;
        let NodeData::Sequence { items, .. } = &graph[id].data else {
            return Err(YamlError::constructor(
                Some(context),
                Some(start),
                format!("expected a sequence, but found {}", graph[id].kind()),
                Some(start),
            ));
        };
        let mut result = Vec::with_capacity(items.len());
        for &item in items {
            let node = &graph[item];
            let NodeData::Mapping { pairs, .. } = &node.data else {
                return Err(YamlError::constructor(
                    Some(context),
                    Some(start),
                    format!("expected a mapping of length 1, but found {}", node.kind()),
                    Some(node.span.start),
                ));
            };
            if pairs.len() != 1 {
                return Err(YamlError::constructor(
                    Some(context),
                    Some(start),
                    format!(
                        "expected a single mapping item, but found {} items",
                        pairs.len()
                    ),
                    Some(node.span.start),
                ));
            }
            result.push(pairs[0]);
        }
        Ok(result)
    }

    fn construct_omap(&mut self, graph: &mut NodeGraph, id: NodeId) -> YamlResult<Value> {
        let pairs = self.single_pairs(graph, id, "while constructing an ordered map")?;
        let mut omap = IndexMap::with_capacity(pairs.len());
        for (key, value) in pairs {
            let key = self.construct_object(graph, key)?;
            let value = self.construct_object(graph, value)?;
            omap.insert(key, value);
        }
        Ok(Value::Omap(Rc::new(RefCell::new(omap))))
    }

    fn construct_pairs(&mut self, graph: &mut NodeGraph, id: NodeId) -> YamlResult<Value> {
        let pairs = self.single_pairs(graph, id, "while constructing pairs")?;
        let mut result = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let key = self.construct_object(graph, key)?;
            let value = self.construct_object(graph, value)?;
            result.push((key, value));
        }
        Ok(Value::Pairs(Rc::new(RefCell::new(result))))
    }

    fn fill_sequence(
        &mut self,
        graph: &mut NodeGraph,
        id: NodeId,
        items: &Shared<Vec<Value>>,
    ) -> YamlResult<()> {
        let NodeData::Sequence { items: children, .. } = &graph[id].data else {
            return Err(YamlError::constructor(
                None,
                None,
                format!("expected a sequence node, but found {}", graph[id].kind()),
                Some(graph[id].span.start),
            ));
        };
        let children = children.clone();
        for child in children {
            let value = self.construct_object(graph, child)?;
            items.borrow_mut().push(value);
        }
        Ok(())
    }

    fn mapping_pairs(&self, graph: &NodeGraph, id: NodeId) -> YamlResult<Vec<(NodeId, NodeId)>> {
        match &graph[id].data {
            NodeData::Mapping { pairs, .. } => Ok(pairs.clone()),
            _ => Err(YamlError::constructor(
                None,
                None,
                format!("expected a mapping node, but found {}", graph[id].kind()),
                Some(graph[id].span.start),
            )),
        }
    }

    fn check_recursive_key(&self, graph: &NodeGraph, key: NodeId) -> YamlResult<bool> {
        if !graph[key].two_steps {
            return Ok(false);
        }
        if self.options.allow_recursive_keys {
            Ok(true)
        } else {
            Err(YamlError::constructor(
                None,
                None,
                "Recursive key for mapping is detected but it is not configured to be allowed.",
                Some(graph[key].span.start),
            ))
        }
    }

    fn fill_mapping(
        &mut self,
        graph: &mut NodeGraph,
        id: NodeId,
        map: &Shared<Mapping>,
    ) -> YamlResult<()> {
        self.flatten_mapping(graph, id)?;
        for (key_id, value_id) in self.mapping_pairs(graph, id)? {
            let key = self.construct_object(graph, key_id)?;
            let value = self.construct_object(graph, value_id)?;
            if self.check_recursive_key(graph, key_id)? {
                self.deferred.push_back(Deferred::MapEntry {
                    map: map.clone(),
                    key,
                    value,
                });
            } else {
                map.borrow_mut().insert(key, value);
            }
        }
        Ok(())
    }

    fn fill_set(
        &mut self,
        graph: &mut NodeGraph,
        id: NodeId,
        set: &Shared<IndexSet<Value>>,
    ) -> YamlResult<()> {
        self.flatten_mapping(graph, id)?;
        for (key_id, _) in self.mapping_pairs(graph, id)? {
            let key = self.construct_object(graph, key_id)?;
            if self.check_recursive_key(graph, key_id)? {
                self.deferred.push_back(Deferred::SetEntry {
                    set: set.clone(),
                    key,
                });
            } else {
                set.borrow_mut().insert(key);
            }
        }
        Ok(())
    }

    /// Drops earlier duplicates of a key (or fails, depending on the options)
    /// and expands `<<` merge keys in place.
    fn flatten_mapping(&mut self, graph: &mut NodeGraph, id: NodeId) -> YamlResult<()> {
        let mut pairs = self.mapping_pairs(graph, id)?;
        let mut seen: HashMap<Value, usize> = HashMap::with_capacity(pairs.len());
        let mut to_remove = BTreeSet::new();
        for (index, &(key_id, _)) in pairs.iter().enumerate() {
            if graph[key_id].tag == tags::MERGE {
                continue;
            }
            let key = self.construct_object(graph, key_id)?;
            if let Some(previous) = seen.get(&key).copied() {
                if !self.options.allow_duplicate_keys {
                    return Err(YamlError::DuplicateKey(MarkedError::new(
                        Some("while constructing a mapping"),
                        Some(graph[id].span.start),
                        format!("found duplicate key {key}"),
                        Some(graph[key_id].span.start),
                    )));
                }
                to_remove.insert(previous);
            }
            seen.insert(key, index);
        }
        for index in to_remove.into_iter().rev() {
            pairs.remove(index);
        }

        let merged = matches!(graph[id].data, NodeData::Mapping { merged: true, .. });
        if merged {
            let mut positions = HashMap::new();
            let mut flattened = Vec::with_capacity(pairs.len());
            let mut visited = HashSet::new();
            self.merge_pairs(graph, id, &pairs, true, &mut positions, &mut flattened, &mut visited)?;
            pairs = flattened;
        }
        if let NodeData::Mapping {
            pairs: node_pairs,
            merged,
            ..
        } = &mut graph[id].data
        {
            *node_pairs = pairs;
            *merged = false;
        }
        Ok(())
    }

    /// Keys of the mapping itself win over merged ones; among merged mappings
    /// the first one listed wins.
    #[allow(clippy::too_many_arguments)]
    fn merge_pairs(
        &mut self,
        graph: &mut NodeGraph,
        id: NodeId,
        pairs: &[(NodeId, NodeId)],
        preferred: bool,
        positions: &mut HashMap<Value, usize>,
        flattened: &mut Vec<(NodeId, NodeId)>,
        visited: &mut HashSet<NodeId>,
    ) -> YamlResult<()> {
        visited.insert(id);
        for &(key_id, value_id) in pairs {
            if graph[key_id].tag == tags::MERGE {
                let sources = match &graph[value_id].data {
                    NodeData::Mapping { .. } => vec![value_id],
                    NodeData::Sequence { items, .. } => {
                        for &item in items {
                            if graph[item].kind() != NodeKind::Mapping {
                                return Err(YamlError::constructor(
                                    Some("while constructing a mapping"),
                                    Some(graph[id].span.start),
                                    format!(
                                        "expected a mapping for merging, but found {}",
                                        graph[item].kind()
                                    ),
                                    Some(graph[item].span.start),
                                ));
                            }
                        }
                        items.clone()
                    }
                    NodeData::Scalar { .. } => {
                        return Err(YamlError::constructor(
                            Some("while constructing a mapping"),
                            Some(graph[id].span.start),
                            format!(
                                "expected a mapping or list of mappings for merging, but found {}",
                                graph[value_id].kind()
                            ),
                            Some(graph[value_id].span.start),
                        ));
                    }
                };
                for source in sources {
                    if visited.contains(&source) {
                        continue;
                    }
                    let source_pairs = self.mapping_pairs(graph, source)?;
                    self.merge_pairs(
                        graph,
                        source,
                        &source_pairs,
                        false,
                        positions,
                        flattened,
                        visited,
                    )?;
                }
            } else {
                let key = self.construct_object(graph, key_id)?;
                match positions.get(&key).copied() {
                    None => {
                        flattened.push((key_id, value_id));
                        positions.insert(key, flattened.len() - 1);
                    }
                    Some(position) if preferred => flattened[position] = (key_id, value_id),
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    fn construct_registered(
        &mut self,
        graph: &mut NodeGraph,
        id: NodeId,
        description: &TypeDescription,
    ) -> YamlResult<Value> {
        let context = format!("while constructing an object of type {}", description.type_name());
        let start = graph[id].span.start;
        match graph[id].kind() {
            NodeKind::Scalar => {
                let value = self.scalar(graph, id)?;
                description
                    .from_scalar(value)
                    .map(Value::Object)
                    .ok_or_else(|| {
                        YamlError::constructor(
                            Some(&context),
                            Some(start),
                            format!(
                                "no single argument constructor found for {}",
                                description.type_name()
                            ),
                            Some(start),
                        )
                    })
            }
            NodeKind::Sequence => {
                let items = Rc::new(RefCell::new(Vec::new()));
                self.fill_sequence(graph, id, &items)?;
                let args = items.take();
                let count = args.len();
                description
                    .from_arguments(args)
                    .map(Value::Object)
                    .ok_or_else(|| {
                        YamlError::constructor(
                            Some(&context),
                            Some(start),
                            format!(
                                "no suitable constructor with {count} arguments found for {}",
                                description.type_name()
                            ),
                            Some(start),
                        )
                    })
            }
            NodeKind::Mapping => {
                let object = description.new_default();
                if !graph[id].two_steps {
                    self.fill_object(graph, id, &object)?;
                }
                Ok(Value::Object(object))
            }
        }
    }

    fn fill_object(&mut self, graph: &mut NodeGraph, id: NodeId, object: &ObjectRef) -> YamlResult<()> {
        self.flatten_mapping(graph, id)?;
        let type_name = object.borrow().type_name();
        for (key_id, value_id) in self.mapping_pairs(graph, id)? {
            let Some(name) = graph[key_id].scalar_value().map(str::to_string) else {
                return Err(YamlError::constructor(
                    Some(&format!("while constructing an object of type {type_name}")),
                    Some(graph[id].span.start),
                    format!("keys must be scalars but found: {}", graph[key_id].kind()),
                    Some(graph[key_id].span.start),
                ));
            };
            let (map_mark, key_mark) = (graph[id].span.start, graph[key_id].span.start);
            let unknown = || {
                YamlError::constructor(
                    Some(&format!("cannot create property={name} for type={type_name}")),
                    Some(map_mark),
                    format!("unable to find property '{name}' on {type_name}"),
                    Some(key_mark),
                )
            };
            let Some(kind) = object.borrow().field_kind(&name) else {
                return Err(unknown());
            };
            apply_hint(graph, value_id, kind);
            let value = self.construct_object(graph, value_id)?;
            let mut target = object.try_borrow_mut().map_err(|_| {
                YamlError::constructor(
                    None,
                    None,
                    format!("object of type {type_name} is already in use"),
                    Some(graph[value_id].span.start),
                )
            })?;
            if !target.set_property(&name, value).map_err(|err| {
                YamlError::constructor(
                    Some(&format!("cannot create property={name} for type={type_name}")),
                    Some(map_mark),
                    err.problem(),
                    Some(graph[value_id].span.start),
                )
            })? {
                return Err(unknown());
            }
        }
        Ok(())
    }
}

/// Steers construction of an untagged node towards the declared kind of the
/// field it is bound to.
fn apply_hint(graph: &mut NodeGraph, id: NodeId, kind: FieldKind) {
    let Some(tag) = kind.tag() else {
        return;
    };
    let node = &mut graph[id];
    if !node.resolved {
        return;
    }
    node.type_hint = Some(tag.to_string());
    let items = match (kind, &node.data) {
        (FieldKind::SeqOf(item_tag), NodeData::Sequence { items, .. }) => {
            Some((item_tag, items.clone()))
        }
        _ => None,
    };
    if let Some((item_tag, items)) = items {
        for item in items {
            if graph[item].resolved {
                graph[item].type_hint = Some(item_tag.to_string());
            }
        }
    }
}

fn invalid_scalar(what: &str, value: &str, mark: Marker) -> YamlError {
    YamlError::constructor(
        Some(&format!("while constructing {what}")),
        Some(mark),
        format!("invalid value '{value}'"),
        Some(mark),
    )
}

/// Splits an optional sign off and drops `_` separators.
fn sign_and_digits(value: &str) -> (bool, String) {
    let cleaned: String = value.chars().filter(|&c| c != '_').collect();
    match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest.to_string()),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned).to_string()),
    }
}

/// Integers in the YAML 1.1 forms: decimal, `0b` binary, `0` octal, `0x` hex
/// and base 60 (`1:30`). Values outside of `i64` are rejected.
#[must_use]
pub fn parse_int(value: &str) -> Option<i64> {
    let (negative, digits) = sign_and_digits(value);
    if digits.is_empty() {
        return None;
    }
    if digits == "0" {
        return Some(0);
    }
    let signed = |digits: &str, radix: u32| -> Option<i64> {
        if digits.is_empty() || digits.starts_with(['+', '-']) {
            return None;
        }
        let text = if negative {
            format!("-{digits}")
        } else {
            digits.to_string()
        };
        i64::from_str_radix(&text, radix).ok()
    };
    if let Some(bin) = digits.strip_prefix("0b") {
        signed(bin, 2)
    } else if let Some(hex) = digits.strip_prefix("0x") {
        signed(hex, 16)
    } else if let Some(oct) = digits.strip_prefix('0') {
        signed(oct, 8)
    } else if digits.contains(':') {
        let mut total: i64 = 0;
        for part in digits.split(':') {
            let part: i64 = part.parse().ok()?;
            total = total.checked_mul(60)?.checked_add(part)?;
        }
        Some(if negative { -total } else { total })
    } else {
        signed(&digits, 10)
    }
}

/// Floats in the YAML 1.1 forms, including `.inf`, `.nan` and base 60.
#[must_use]
pub fn parse_float(value: &str) -> Option<f64> {
    let (negative, digits) = sign_and_digits(value);
    let sign = if negative { -1.0 } else { 1.0 };
    match digits.to_lowercase().as_str() {
        ".inf" => return Some(sign * f64::INFINITY),
        ".nan" => return Some(f64::NAN),
        "" => return None,
        _ => {}
    }
    if digits.contains(':') {
        let mut total = 0.0;
        for part in digits.split(':') {
            total = total * 60.0 + part.parse::<f64>().ok()?;
        }
        return Some(sign * total);
    }
    if !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    digits.parse::<f64>().ok().map(|f| sign * f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Resolver;
    use crate::treebuild::Composer;

    fn load_with(input: &str, options: &LoaderOptions, types: &TypeRegistry) -> YamlResult<Value> {
        let resolver = Resolver::default();
        let mut composer = Composer::from_str(input, &resolver, options.clone());
        let mut graph = composer.get_single_node()?.unwrap_or_default();
        Constructor::new(types, options).construct_document(&mut graph)
    }

    fn load(input: &str) -> YamlResult<Value> {
        load_with(input, &LoaderOptions::default(), &TypeRegistry::new())
    }

    #[test]
    fn core_scalars() {
        let value = load(
            "- ~\n- yes\n- Off\n- 0x1F\n- -0b101\n- 0o17x\n- 017\n- 1_000\n- 1:30\n- 1.5e3\n- -.inf\n- .NaN\n- 1:30.5\n- 2002-12-14\n- text\n",
        )
        .expect("load");
        let items: Vec<Value> = value.try_into().expect("seq");
        assert_eq!(items[0], Value::Null);
        assert_eq!(items[1], Value::Bool(true));
        assert_eq!(items[2], Value::Bool(false));
        assert_eq!(items[3], Value::Int(31));
        assert_eq!(items[4], Value::Int(-5));
        assert_eq!(items[5], Value::from("0o17x"));
        assert_eq!(items[6], Value::Int(15));
        assert_eq!(items[7], Value::Int(1000));
        assert_eq!(items[8], Value::Int(90));
        assert_eq!(items[9], Value::Float(1500.0));
        assert_eq!(items[10], Value::Float(f64::NEG_INFINITY));
        assert!(items[11].as_f64().expect("nan").is_nan());
        assert_eq!(items[12], Value::Float(90.5));
        assert_eq!(items[13], Value::Timestamp(Timestamp::from_date(2002, 12, 14)));
        assert_eq!(items[14], Value::from("text"));
    }

    #[test]
    fn int_limits() {
        assert_eq!(parse_int("-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse_int("9223372036854775808"), None);
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_int("+0x_FF"), Some(255));
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("0x"), None);
        let err = load("!!int 99999999999999999999").expect_err("overflow");
        assert_eq!(err.problem(), "invalid value '99999999999999999999'");
    }

    #[test]
    fn floats() {
        assert_eq!(parse_float("6.8523015e+5"), Some(685_230.15));
        assert_eq!(parse_float("685.230_15e+03"), Some(685_230.15));
        assert_eq!(parse_float("190:20:30.5"), Some(685_230.5));
        assert_eq!(parse_float("+.inf"), Some(f64::INFINITY));
        assert_eq!(parse_float("inf"), None);
        assert_eq!(parse_float(""), None);
    }

    #[test]
    fn explicit_tags() {
        let value = load("a: !!str 123\nb: !!float 1\nc: !!binary aGVsbG8=\nd: !!bool maybe\n")
            .expect_err("bad bool");
        assert_eq!(value.problem(), "invalid value 'maybe'");
        let value = load("a: !!str 123\nb: !!float 1\nc: !!binary |\n  aGVs\n  bG8=\n")
            .expect("load");
        assert_eq!(value.get("a"), Some(Value::from("123")));
        assert_eq!(value.get("b"), Some(Value::Float(1.0)));
        assert_eq!(value.get("c"), Some(Value::Binary(b"hello".to_vec())));
        let err = load("!unknown x").expect_err("unknown tag");
        assert_eq!(err.problem(), "could not determine a constructor for the tag !unknown");
    }

    #[test]
    fn aliases_keep_identity() {
        let value = load("a: &x [1, 2]\nb: *x\n").expect("load");
        let a = value.get("a").expect("a");
        let b = value.get("b").expect("b");
        assert!(a.same_identity(&b));
        if let Value::Seq(items) = &a {
            items.borrow_mut().push(Value::Int(3));
        }
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn recursive_sequence() {
        let value = load("&a [1, *a]").expect("load");
        let inner = value.at(1).expect("self");
        assert!(inner.same_identity(&value));
    }

    #[test]
    fn recursive_key() {
        let input = "&m {*m : x}";
        let err = load(input).expect_err("not allowed");
        assert_eq!(
            err.problem(),
            "Recursive key for mapping is detected but it is not configured to be allowed."
        );
        let options = LoaderOptions {
            allow_recursive_keys: true,
            ..LoaderOptions::default()
        };
        let value = load_with(input, &options, &TypeRegistry::new()).expect("allowed");
        assert_eq!(value.len(), 1);
        if let Value::Map(map) = &value {
            let map = map.borrow();
            let (key, _) = map.get_index(0).expect("entry");
            assert!(key.same_identity(&value));
        }
    }

    #[test]
    fn duplicate_keys() {
        let value = load("{a: 1, a: 2}").expect("duplicates allowed");
        assert_eq!(value.len(), 1);
        assert_eq!(value.get("a"), Some(Value::Int(2)));

        let options = LoaderOptions {
            allow_duplicate_keys: false,
            ..LoaderOptions::default()
        };
        let err = load_with("{a: 1, a: 2}", &options, &TypeRegistry::new())
            .expect_err("duplicates rejected");
        assert!(matches!(err, YamlError::DuplicateKey(_)));
        assert_eq!(err.problem(), "found duplicate key a");
    }

    #[test]
    fn merge_keys() {
        let value = load("{<<: {a: 1, b: 2}, b: 3}").expect("merge");
        assert_eq!(value, Value::map([("a", 1), ("b", 3)]));

        let value = load(
            "- &CENTER {x: 1, y: 2}\n- &BIG {r: 10}\n- &SMALL {r: 1}\n- <<: [*CENTER, *BIG, *SMALL]\n  label: center/big\n",
        )
        .expect("merge list");
        let merged = value.at(3).expect("merged");
        assert_eq!(merged.get("r"), Some(Value::Int(10)));
        assert_eq!(merged.get("x"), Some(Value::Int(1)));
        assert_eq!(merged.len(), 4);

        let err = load("{<<: 1}").expect_err("scalar merge");
        assert_eq!(
            err.problem(),
            "expected a mapping or list of mappings for merging, but found scalar"
        );
    }

    #[test]
    fn ordered_collections() {
        let value = load("!!omap [a: 1, b: 2]").expect("omap");
        assert!(matches!(value, Value::Omap(_)));
        assert_eq!(value.get("b"), Some(Value::Int(2)));

        let value = load("!!pairs [a: 1, a: 2]").expect("pairs");
        assert_eq!(value.len(), 2);

        let value = load("!!set {a, b}").expect("set");
        assert_eq!(value, Value::set(["a", "b"]));

        let err = load("!!omap [a: 1, {b: 2, c: 3}]").expect_err("two items");
        assert_eq!(
            err.problem(),
            "expected a single mapping item, but found 2 items"
        );
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Person {
        name: String,
        age: i64,
        tags: Vec<Value>,
    }

    impl YamlObject for Person {
        fn describe(fields: &mut FieldSet<Self>) {
            fields
                .field(
                    "name",
                    FieldKind::Str,
                    |p| p.name.clone().into(),
                    |p, v| {
                        p.name = v.try_into()?;
                        Ok(())
                    },
                )
                .field(
                    "age",
                    FieldKind::Int,
                    |p| p.age.into(),
                    |p, v| {
                        p.age = v.try_into()?;
                        Ok(())
                    },
                )
                .field(
                    "tags",
                    FieldKind::Seq,
                    |p| Value::seq(p.tags.clone()),
                    |p, v| {
                        p.tags = v.try_into()?;
                        Ok(())
                    },
                );
        }

        fn from_scalar(value: &str) -> Option<Self> {
            Some(Person {
                name: value.to_string(),
                ..Person::default()
            })
        }
    }

    fn people() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        types
            .register(TypeDescription::of::<Person>("!person"))
            .expect("register");
        types
    }

    #[test]
    fn binds_objects() {
        let options = LoaderOptions::default();
        let value = load_with("!person {name: 123, age: 7, tags: [a]}", &options, &people())
            .expect("object");
        let person: Person = value.to_object().expect("person");
        assert_eq!(person.name, "123");
        assert_eq!(person.age, 7);
        assert_eq!(person.tags, vec![Value::from("a")]);

        let value = load_with("!person Ann", &options, &people()).expect("scalar object");
        assert_eq!(value.to_object::<Person>().expect("person").name, "Ann");

        let err = load_with("!person {nick: x}", &options, &people()).expect_err("unknown field");
        assert!(err.problem().contains("unable to find property 'nick'"));

        let err = load_with("!person [a, b]", &options, &people()).expect_err("no arguments");
        assert!(err.problem().contains("with 2 arguments"));
    }

    #[test]
    fn root_type_hint() {
        let resolver = Resolver::default();
        let options = LoaderOptions::default();
        let types = people();
        let mut composer = Composer::from_str("name: Bo\nage: 3\n", &resolver, options.clone());
        let mut graph = composer.get_single_node().expect("compose").expect("doc");
        let value = Constructor::new(&types, &options)
            .construct_document_as(&mut graph, "!person")
            .expect("as person");
        assert_eq!(value.to_object::<Person>().expect("person").age, 3);
    }
}
