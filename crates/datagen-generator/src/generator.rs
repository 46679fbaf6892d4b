//! Main generator: the schema-walk dispatcher.
//!
//! A [`Generator`] is bound to a parsed schema, a seeded RNG and a
//! generation offset. Every `generate()` call walks the schema tree
//! top-down; at each node the directives decide the strategy (options,
//! iteration, or the type default) and parents assemble containers from
//! their children's values.
//!
//! Per-node state (resolved options lists, compiled regexes, iterator
//! progress) lives in caches keyed by node identity, populated on first
//! visit. A generator instance is single-threaded by contract; callers
//! wanting concurrency build one generator per worker, which is cheap.

use crate::bounds::LengthBounds;
use crate::decimal;
use crate::directives::{
    double_field, enforce_mutual_exclusion, int_field, integral_field, require_object,
    string_field, Props, ITERATION_PROP, KEYS_PROP, LENGTH_PROP, ODDS_PROP, OPTIONS_PROP,
    PREFIX_PROP, RANGE_PROP, RANGE_PROP_MAX, RANGE_PROP_MIN, REGEX_PROP, SUFFIX_PROP,
};
use crate::error::{GeneratorError, Result};
use crate::iterators::{self, DecimalWidth, IntegralWidth, IterState};
use crate::options;
use crate::pattern::RegexStringSource;
use datagen_core::{NodeId, SchemaError, SchemaKind, SchemaNode, Value, ARG_PROPERTIES};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Generates value trees conforming to an Avro schema and its directives.
pub struct Generator {
    schema: Arc<SchemaNode>,
    rng: StdRng,
    generation: u64,
    options_cache: HashMap<NodeId, Vec<Value>>,
    pattern_cache: HashMap<NodeId, RegexStringSource>,
    iterator_cache: HashMap<NodeId, IterState>,
}

impl Generator {
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::default()
    }

    /// The schema this generator produces values for.
    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    /// The generation offset this generator was built with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Produce one value tree for the schema.
    pub fn generate(&mut self) -> Result<Value> {
        let schema = Arc::clone(&self.schema);
        self.generate_node(&schema)
    }

    fn generate_node(&mut self, node: &SchemaNode) -> Result<Value> {
        let empty = Props::new();
        let props = node.directive_properties().unwrap_or(&empty);
        if props.contains_key(OPTIONS_PROP) {
            return self.generate_from_options(node, props);
        }
        if props.contains_key(ITERATION_PROP) {
            return self.generate_from_iteration(node, props);
        }
        match node.kind() {
            SchemaKind::Null => Ok(Value::Null),
            SchemaKind::Boolean => self.generate_boolean(props),
            SchemaKind::Int => self.generate_int(props),
            SchemaKind::Long => self.generate_long(props),
            SchemaKind::Float => self.generate_float(props),
            SchemaKind::Double => self.generate_double(props),
            SchemaKind::Bytes { .. } => self.generate_bytes(node, props),
            SchemaKind::String => self
                .generate_string_body(node, props)
                .map(Value::String),
            SchemaKind::Fixed { size, .. } => self.generate_fixed(node, *size),
            SchemaKind::Enum { symbols, .. } => {
                let ordinal = self.rng.random_range(0..symbols.len());
                Ok(Value::Enum {
                    ordinal,
                    symbol: symbols[ordinal].clone(),
                })
            }
            SchemaKind::Array { items } => self.generate_array(items, props),
            SchemaKind::Map { values } => self.generate_map(node, values, props),
            SchemaKind::Record { name, fields } => {
                let mut generated = Vec::with_capacity(fields.len());
                for field in fields {
                    generated.push((field.name.clone(), self.generate_node(&field.schema)?));
                }
                Ok(Value::Record {
                    name: name.clone(),
                    fields: generated,
                })
            }
            SchemaKind::Union { branches } => {
                let index = self.rng.random_range(0..branches.len());
                self.generate_node(&branches[index])
            }
        }
    }

    fn generate_from_options(&mut self, node: &SchemaNode, props: &Props) -> Result<Value> {
        if !self.options_cache.contains_key(&node.id()) {
            let options = options::resolve_options(node, props)?;
            tracing::debug!(
                schema = node.type_name(),
                count = options.len(),
                "resolved options list"
            );
            self.options_cache.insert(node.id(), options);
        }
        let options = &self.options_cache[&node.id()];
        let index = self.rng.random_range(0..options.len());
        Ok(options[index].clone())
    }

    fn generate_from_iteration(&mut self, node: &SchemaNode, props: &Props) -> Result<Value> {
        let generation = self.generation;
        let state = match self.iterator_cache.entry(node.id()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(build_iterator(node, props, generation)?),
        };
        let value = state.next();
        if matches!(node.kind(), SchemaKind::String) {
            // string iteration runs on the integer iterator and renders
            // each value in base 10
            let number = value.as_i32().unwrap_or_default();
            return Ok(Value::String(prefix_and_suffix(
                number.to_string(),
                props,
            )?));
        }
        Ok(value)
    }

    fn generate_boolean(&mut self, props: &Props) -> Result<Value> {
        match double_field(ARG_PROPERTIES, ODDS_PROP, props)? {
            None => Ok(Value::Boolean(self.rng.random::<bool>())),
            Some(odds) => {
                if !(0.0..=1.0).contains(&odds) {
                    return Err(GeneratorError::Bounds {
                        directive: ODDS_PROP,
                        reason: "must be in the range [0.0, 1.0]".to_string(),
                    });
                }
                Ok(Value::Boolean(self.rng.random::<f64>() < odds))
            }
        }
    }

    fn generate_int(&mut self, props: &Props) -> Result<Value> {
        let Some(range) = range_object(props)? else {
            return Ok(Value::Int(self.rng.random::<i32>()));
        };
        let min = int_field(RANGE_PROP, RANGE_PROP_MIN, range)?.unwrap_or(i32::MIN);
        let max = int_field(RANGE_PROP, RANGE_PROP_MAX, range)?.unwrap_or(i32::MAX);
        check_range(i64::from(min) < i64::from(max))?;
        let span = i64::from(max) - i64::from(min);
        let offset = (self.rng.random::<f64>() * span as f64) as i64;
        Ok(Value::Int((i64::from(min) + offset) as i32))
    }

    fn generate_long(&mut self, props: &Props) -> Result<Value> {
        let Some(range) = range_object(props)? else {
            return Ok(Value::Long(self.rng.random::<i64>()));
        };
        let min = integral_field(RANGE_PROP, RANGE_PROP_MIN, range)?.unwrap_or(i64::MIN);
        let max = integral_field(RANGE_PROP, RANGE_PROP_MAX, range)?.unwrap_or(i64::MAX);
        check_range(min < max)?;
        let span = i128::from(max) - i128::from(min);
        let offset = (self.rng.random::<f64>() * span as f64) as i128;
        let value = (i128::from(min) + offset).clamp(i128::from(i64::MIN), i128::from(i64::MAX));
        Ok(Value::Long(value as i64))
    }

    fn generate_float(&mut self, props: &Props) -> Result<Value> {
        let Some(range) = range_object(props)? else {
            return Ok(Value::Float(self.rng.random::<f32>()));
        };
        let min = crate::directives::float_field(RANGE_PROP, RANGE_PROP_MIN, range)?
            .unwrap_or(-f32::MAX);
        let max = crate::directives::float_field(RANGE_PROP, RANGE_PROP_MAX, range)?
            .unwrap_or(f32::MAX);
        check_range(min < max)?;
        Ok(Value::Float(min + self.rng.random::<f32>() * (max - min)))
    }

    fn generate_double(&mut self, props: &Props) -> Result<Value> {
        let Some(range) = range_object(props)? else {
            return Ok(Value::Double(self.rng.random::<f64>()));
        };
        let min = double_field(RANGE_PROP, RANGE_PROP_MIN, range)?.unwrap_or(-f64::MAX);
        let max = double_field(RANGE_PROP, RANGE_PROP_MAX, range)?.unwrap_or(f64::MAX);
        check_range(min < max)?;
        Ok(Value::Double(min + self.rng.random::<f64>() * (max - min)))
    }

    fn generate_bytes(&mut self, node: &SchemaNode, props: &Props) -> Result<Value> {
        if let Some(decimal_type) = node.decimal() {
            let bytes = decimal::generate_decimal(
                &mut self.rng,
                decimal_type,
                props.get(RANGE_PROP),
                None,
            )?;
            return Ok(Value::Bytes(bytes));
        }
        let bounds = LengthBounds::from_directive(props.get(LENGTH_PROP))?;
        let mut buffer = vec![0u8; bounds.sample(&mut self.rng)];
        self.rng.fill(&mut buffer[..]);
        Ok(Value::Bytes(buffer))
    }

    fn generate_fixed(&mut self, node: &SchemaNode, size: usize) -> Result<Value> {
        if let Some(decimal_type) = node.decimal() {
            // ranges are not supported for fixed decimal types
            let bytes =
                decimal::generate_decimal(&mut self.rng, decimal_type, None, Some(size))?;
            return Ok(Value::Fixed(bytes));
        }
        let mut buffer = vec![0u8; size];
        self.rng.fill(&mut buffer[..]);
        Ok(Value::Fixed(buffer))
    }

    /// Produce the body of a string value for `props`, caching compiled
    /// regexes under `cache_node`'s identity. Map keys pass the map node
    /// here, so a key regex is compiled once per map.
    fn generate_string_body(&mut self, cache_node: &SchemaNode, props: &Props) -> Result<String> {
        let body = match props.get(REGEX_PROP) {
            Some(regex_value) => {
                let bounds = match props.get(LENGTH_PROP) {
                    None => LengthBounds::new(0, i32::MAX as usize),
                    Some(length) => LengthBounds::from_directive(Some(length))?,
                };
                if !self.pattern_cache.contains_key(&cache_node.id()) {
                    let pattern =
                        regex_value
                            .as_str()
                            .ok_or_else(|| GeneratorError::Shape {
                                directive: REGEX_PROP,
                                reason: "must be a string".to_string(),
                            })?;
                    let source = RegexStringSource::compile(pattern)?;
                    tracing::debug!(schema = cache_node.type_name(), pattern, "compiled regex");
                    self.pattern_cache.insert(cache_node.id(), source);
                }
                let source = &self.pattern_cache[&cache_node.id()];
                // the regex engine's length range is inclusive on both
                // ends, so back the exclusive upper bound off by one
                source.random(&mut self.rng, bounds.min(), bounds.max() - 1)?
            }
            None => {
                let bounds = LengthBounds::from_directive(props.get(LENGTH_PROP))?;
                let length = bounds.sample(&mut self.rng);
                random_ascii(&mut self.rng, length)
            }
        };
        prefix_and_suffix(body, props)
    }

    fn generate_array(&mut self, items: &SchemaNode, props: &Props) -> Result<Value> {
        let bounds = LengthBounds::from_directive(props.get(LENGTH_PROP))?;
        let length = bounds.sample(&mut self.rng);
        let mut elements = Vec::with_capacity(length);
        for _ in 0..length {
            elements.push(self.generate_node(items)?);
        }
        Ok(Value::Array(elements))
    }

    fn generate_map(
        &mut self,
        node: &SchemaNode,
        values: &SchemaNode,
        props: &Props,
    ) -> Result<Value> {
        let bounds = LengthBounds::from_directive(props.get(LENGTH_PROP))?;
        let length = bounds.sample(&mut self.rng);
        let mut entries = BTreeMap::new();
        match props.get(KEYS_PROP) {
            None => {
                for _ in 0..length {
                    let key = random_ascii(&mut self.rng, 1);
                    entries.insert(key, self.generate_node(values)?);
                }
            }
            Some(keys_value) => {
                let key_props = require_object(KEYS_PROP, keys_value)?;
                if key_props.contains_key(OPTIONS_PROP) {
                    // key options are resolved against an implicit string
                    // schema and cached under the map node's identity
                    if !self.options_cache.contains_key(&node.id()) {
                        let string_schema = SchemaNode::new(SchemaKind::String);
                        let options = options::resolve_options(&string_schema, key_props)?;
                        self.options_cache.insert(node.id(), options);
                    }
                    for _ in 0..length {
                        let options = &self.options_cache[&node.id()];
                        let index = self.rng.random_range(0..options.len());
                        let key = options[index].as_str().unwrap_or("").to_string();
                        entries.insert(key, self.generate_node(values)?);
                    }
                } else {
                    for _ in 0..length {
                        let key = self.generate_string_body(node, key_props)?;
                        entries.insert(key, self.generate_node(values)?);
                    }
                }
            }
        }
        Ok(Value::Map(entries))
    }
}

/// Build the iterator for a node carrying an `iteration` directive.
fn build_iterator(node: &SchemaNode, props: &Props, generation: u64) -> Result<IterState> {
    enforce_mutual_exclusion(
        props,
        ITERATION_PROP,
        &[LENGTH_PROP, REGEX_PROP, OPTIONS_PROP, RANGE_PROP],
    )?;
    let Some(iteration_value) = props.get(ITERATION_PROP) else {
        unreachable!("caller checked the iteration prop is present");
    };
    let iteration = require_object(ITERATION_PROP, iteration_value)?;
    tracing::debug!(schema = node.type_name(), generation, "building iterator");
    match node.kind() {
        SchemaKind::Boolean => Ok(IterState::Boolean(iterators::boolean_iterator(
            iteration, generation,
        )?)),
        SchemaKind::Int => Ok(IterState::Integral(iterators::integral_iterator(
            iteration,
            IntegralWidth::Int,
            generation,
        )?)),
        SchemaKind::Long => Ok(IterState::Integral(iterators::integral_iterator(
            iteration,
            IntegralWidth::Long,
            generation,
        )?)),
        SchemaKind::Float => Ok(IterState::Decimal(iterators::decimal_iterator(
            iteration,
            DecimalWidth::Float,
            generation,
        )?)),
        SchemaKind::Double => Ok(IterState::Decimal(iterators::decimal_iterator(
            iteration,
            DecimalWidth::Double,
            generation,
        )?)),
        // string iteration runs on the int iterator
        SchemaKind::String => Ok(IterState::Integral(iterators::integral_iterator(
            iteration,
            IntegralWidth::Int,
            generation,
        )?)),
        _ => Err(GeneratorError::Unsupported {
            directive: ITERATION_PROP,
            supported: "numeric, boolean or string",
            schema: node.type_name(),
        }),
    }
}

fn range_object(props: &Props) -> Result<Option<&Props>> {
    match props.get(RANGE_PROP) {
        None => Ok(None),
        Some(value) => require_object(RANGE_PROP, value).map(Some),
    }
}

fn check_range(ordered: bool) -> Result<()> {
    if ordered {
        Ok(())
    } else {
        Err(GeneratorError::Bounds {
            directive: RANGE_PROP,
            reason: format!(
                "'{RANGE_PROP_MIN}' field must be strictly less than '{RANGE_PROP_MAX}' field"
            ),
        })
    }
}

fn random_ascii<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| rng.random_range(0..128u8) as char)
        .collect()
}

fn prefix_and_suffix(body: String, props: &Props) -> Result<String> {
    let prefix = string_field(ARG_PROPERTIES, PREFIX_PROP, props)?.unwrap_or("");
    let suffix = string_field(ARG_PROPERTIES, SUFFIX_PROP, props)?.unwrap_or("");
    if prefix.is_empty() && suffix.is_empty() {
        return Ok(body);
    }
    Ok(format!("{prefix}{body}{suffix}"))
}

/// Builds a [`Generator`] from a schema, an optional seed or RNG, and a
/// generation offset.
#[derive(Default)]
pub struct GeneratorBuilder {
    schema: Option<Arc<SchemaNode>>,
    rng: Option<StdRng>,
    generation: u64,
}

impl GeneratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already-parsed schema.
    pub fn schema(mut self, schema: SchemaNode) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    /// Parse and use a schema given as JSON text.
    pub fn schema_str(self, schema: &str) -> std::result::Result<Self, SchemaError> {
        Ok(self.schema(SchemaNode::parse_str(schema)?))
    }

    /// Read, parse and use a schema file.
    pub fn schema_file<P: AsRef<Path>>(self, path: P) -> std::result::Result<Self, SchemaError> {
        Ok(self.schema(SchemaNode::parse_file(path)?))
    }

    /// Use a specific random source.
    pub fn rng(mut self, rng: StdRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Seed the random source. Without a seed (or an explicit RNG) the
    /// generator draws fresh entropy.
    pub fn seed(self, seed: u64) -> Self {
        self.rng(StdRng::seed_from_u64(seed))
    }

    /// Fast-forward every iterative node by this many generations.
    pub fn generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn build(self) -> std::result::Result<Generator, SchemaError> {
        let schema = self
            .schema
            .ok_or_else(|| SchemaError::Invalid("a schema is required".to_string()))?;
        Ok(Generator {
            schema,
            rng: self.rng.unwrap_or_else(StdRng::from_os_rng),
            generation: self.generation,
            options_cache: HashMap::new(),
            pattern_cache: HashMap::new(),
            iterator_cache: HashMap::new(),
        })
    }
}
