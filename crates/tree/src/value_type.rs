//! Value-type registry
//!
//! Maps a type tag (`"real"`, `"colour"`, `"degree"`, ...) to its default
//! value, its string codec and, for aggregate parents, how the parent value
//! is built from and split into child values. Registration happens once at
//! startup through `EngineContext`; there is no global table.

use ahash::AHashMap as HashMap;

use crate::error::{GridError, Result};
use crate::text::{join_quoted, split_quoted};
use crate::value::{ValueKind, Variant};

/// Tag used for category nodes
pub const CATEGORY_TAG: &str = "category";

/// How an aggregate parent relates to its children
#[derive(Clone, Copy)]
pub struct Aggregate {
    /// Build the parent value from child values (in child order)
    pub compose: fn(&[Variant]) -> Variant,
    /// Split a parent value into `n` child values
    pub decompose: fn(&Variant, usize) -> Vec<Variant>,
}

/// One registered value type
#[derive(Clone)]
pub struct ValueType {
    pub tag: String,
    pub kind: ValueKind,
    pub default: Variant,
    /// Serialized form used by bulk records and text editors
    pub format: fn(&Variant) -> String,
    pub parse: fn(&str) -> Option<Variant>,
    pub aggregate: Option<Aggregate>,
}

impl ValueType {
    pub fn new(
        tag: impl Into<String>,
        kind: ValueKind,
        format: fn(&Variant) -> String,
        parse: fn(&str) -> Option<Variant>,
    ) -> Self {
        Self {
            tag: tag.into(),
            kind,
            default: Variant::default_for(kind),
            format,
            parse,
            aggregate: None,
        }
    }

    pub fn with_default(mut self, default: Variant) -> Self {
        self.default = default;
        self
    }

    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    /// Build a value of this type from an arbitrary variant, coercing where
    /// the conversion is lossless. Returns `None` when it is not.
    pub fn construct(&self, value: Variant) -> Option<Variant> {
        if value.kind() == self.kind {
            return Some(value);
        }
        match (self.kind, value) {
            (ValueKind::Real, Variant::Int(v)) => Some(Variant::Real(v as f64)),
            (ValueKind::Int, Variant::Real(v)) if v.fract() == 0.0 && v.is_finite() => {
                Some(Variant::Int(v as i64))
            }
            (ValueKind::Int, Variant::Bool(v)) => Some(Variant::Int(v as i64)),
            (ValueKind::Bool, Variant::Int(v)) => Some(Variant::Bool(v != 0)),
            (ValueKind::Str, other) => Some(Variant::Str(other.to_string())),
            (ValueKind::StrList, Variant::Str(s)) => (self.parse)(&s),
            (_, Variant::Str(s)) => (self.parse)(s.trim()),
            _ => None,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        self.aggregate.is_some()
    }
}

/// Registry of value types keyed by tag
pub struct ValueTypeRegistry {
    types: HashMap<String, ValueType>,
}

impl ValueTypeRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Registry preloaded with the built-in types
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(ValueType::new("int", ValueKind::Int, format_plain, parse_int));
        registry.register(ValueType::new("real", ValueKind::Real, format_plain, parse_real));
        registry.register(ValueType::new("string", ValueKind::Str, format_plain, parse_string));
        registry.register(ValueType::new("strlist", ValueKind::StrList, format_list, parse_list));
        registry.register(ValueType::new("bool", ValueKind::Bool, format_bool, parse_bool));
        registry.register(ValueType::new("opaque", ValueKind::Opaque, format_plain, parse_opaque));
        registry.register(ValueType::new("choice", ValueKind::Int, format_plain, parse_int));
        registry.register(ValueType::new(
            "multichoice",
            ValueKind::StrList,
            format_list,
            parse_list,
        ));
        registry.register(ValueType::new("colour", ValueKind::Int, format_colour, parse_colour));
        registry.register(
            ValueType::new("composite", ValueKind::StrList, format_list, parse_list)
                .with_aggregate(LIST_AGGREGATE),
        );
        registry.register(
            ValueType::new("range", ValueKind::StrList, format_list, parse_list)
                .with_aggregate(LIST_AGGREGATE),
        );
        registry.register(
            ValueType::new("degree", ValueKind::Real, format_plain, parse_real)
                .with_aggregate(DEGREE_AGGREGATE),
        );
        registry.register(ValueType::new(CATEGORY_TAG, ValueKind::Str, format_plain, parse_string));
        registry
    }

    /// Register or replace a value type
    pub fn register(&mut self, value_type: ValueType) {
        log::debug!("registered value type '{}'", value_type.tag);
        self.types.insert(value_type.tag.clone(), value_type);
    }

    pub fn get(&self, tag: &str) -> Option<&ValueType> {
        self.types.get(tag)
    }

    pub fn lookup(&self, tag: &str) -> Result<&ValueType> {
        self.get(tag)
            .ok_or_else(|| GridError::UnknownValueType(tag.to_string()))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    /// Serialize a value with its type's codec
    pub fn format(&self, tag: &str, value: &Variant) -> Result<String> {
        Ok((self.lookup(tag)?.format)(value))
    }

    /// Parse a serialized value with its type's codec
    pub fn parse(&self, tag: &str, text: &str) -> Result<Variant> {
        let value_type = self.lookup(tag)?;
        (value_type.parse)(text)
            .ok_or_else(|| GridError::Parse(format!("'{}' is not a valid {}", text, tag)))
    }
}

impl Default for ValueTypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// === Codecs ===

fn format_plain(value: &Variant) -> String {
    value.to_string()
}

fn format_list(value: &Variant) -> String {
    match value {
        Variant::StrList(items) => join_quoted(items),
        other => join_quoted(&[other.to_string()]),
    }
}

fn format_bool(value: &Variant) -> String {
    match value {
        Variant::Bool(true) => "true".to_string(),
        Variant::Bool(false) => "false".to_string(),
        other => other.to_string(),
    }
}

fn format_colour(value: &Variant) -> String {
    match value {
        Variant::Int(rgb) => format!("#{:06X}", rgb & 0xFF_FFFF),
        other => other.to_string(),
    }
}

fn parse_int(text: &str) -> Option<Variant> {
    text.trim().parse::<i64>().ok().map(Variant::Int)
}

fn parse_real(text: &str) -> Option<Variant> {
    text.trim().parse::<f64>().ok().map(Variant::Real)
}

fn parse_string(text: &str) -> Option<Variant> {
    Some(Variant::Str(text.to_string()))
}

fn parse_list(text: &str) -> Option<Variant> {
    Some(Variant::StrList(split_quoted(text)))
}

fn parse_bool(text: &str) -> Option<Variant> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(Variant::Bool(true)),
        "false" | "0" | "no" => Some(Variant::Bool(false)),
        _ => None,
    }
}

fn parse_opaque(text: &str) -> Option<Variant> {
    let text = text.trim();
    let digits = text.strip_prefix("0x").unwrap_or(text);
    u64::from_str_radix(digits, 16).ok().map(Variant::Opaque)
}

fn parse_colour(text: &str) -> Option<Variant> {
    let digits = text.trim().strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    i64::from_str_radix(digits, 16).ok().map(Variant::Int)
}

// === Aggregates ===

const LIST_AGGREGATE: Aggregate = Aggregate {
    compose: compose_list,
    decompose: decompose_list,
};

const DEGREE_AGGREGATE: Aggregate = Aggregate {
    compose: compose_degree,
    decompose: decompose_degree,
};

fn compose_list(children: &[Variant]) -> Variant {
    Variant::StrList(children.iter().map(|v| v.to_string()).collect())
}

fn decompose_list(value: &Variant, n: usize) -> Vec<Variant> {
    let items = value.as_str_list().unwrap_or(&[]);
    (0..n)
        .map(|i| Variant::Str(items.get(i).cloned().unwrap_or_default()))
        .collect()
}

/// Degrees, minutes, seconds to decimal degrees. The sign comes from the
/// degree part (including negative zero).
fn compose_degree(children: &[Variant]) -> Variant {
    let part = |i: usize| children.get(i).and_then(Variant::as_real).unwrap_or(0.0);
    let (d, m, s) = (part(0), part(1), part(2));
    let magnitude = d.abs() + m / 60.0 + s / 3600.0;
    Variant::Real(if d.is_sign_negative() { -magnitude } else { magnitude })
}

fn decompose_degree(value: &Variant, n: usize) -> Vec<Variant> {
    let decimal = value.as_real().unwrap_or(0.0);
    let x = decimal.abs();
    let d = x.floor();
    let minutes = (x - d) * 60.0;
    let m = minutes.floor();
    let s = (minutes - m) * 60.0;
    let d = if decimal.is_sign_negative() { -d } else { d };

    let mut parts = vec![Variant::Real(d), Variant::Real(m), Variant::Real(s)];
    parts.resize(n, Variant::Real(0.0));
    parts
}
