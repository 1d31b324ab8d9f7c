//! Property values
//!
//! A `Variant` is the tagged union every node stores. The tag alone is a
//! `ValueKind`, which is what editors and the value-type registry key on.

use serde::{Deserialize, Serialize};

/// Tag of a `Variant`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Int,
    Real,
    Str,
    StrList,
    Opaque,
    Bool,
}

/// Tagged value stored in a property node
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Int(i64),
    Real(f64),
    Str(String),
    StrList(Vec<String>),
    /// Host-owned handle, never dereferenced by the engine
    Opaque(u64),
    Bool(bool),
}

impl Variant {
    pub fn kind(&self) -> ValueKind {
        match self {
            Variant::Int(_) => ValueKind::Int,
            Variant::Real(_) => ValueKind::Real,
            Variant::Str(_) => ValueKind::Str,
            Variant::StrList(_) => ValueKind::StrList,
            Variant::Opaque(_) => ValueKind::Opaque,
            Variant::Bool(_) => ValueKind::Bool,
        }
    }

    /// Default value for a kind
    pub fn default_for(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Int => Variant::Int(0),
            ValueKind::Real => Variant::Real(0.0),
            ValueKind::Str => Variant::Str(String::new()),
            ValueKind::StrList => Variant::StrList(Vec::new()),
            ValueKind::Opaque => Variant::Opaque(0),
            ValueKind::Bool => Variant::Bool(false),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Variant::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Variant::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            Variant::StrList(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<u64> {
        match self {
            Variant::Opaque(v) => Some(*v),
            _ => None,
        }
    }

    /// Exact equality, comparing reals by bit pattern (NaN == NaN, 0.0 != -0.0)
    pub fn same_bits(&self, other: &Variant) -> bool {
        match (self, other) {
            (Variant::Real(a), Variant::Real(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Int(v) => write!(f, "{}", v),
            Variant::Real(v) => write!(f, "{}", v),
            Variant::Str(v) => f.write_str(v),
            Variant::StrList(items) => f.write_str(&items.join("; ")),
            Variant::Opaque(v) => write!(f, "0x{:x}", v),
            Variant::Bool(true) => f.write_str("True"),
            Variant::Bool(false) => f.write_str("False"),
        }
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Variant::Int(v)
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Variant::Real(v)
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Variant::Bool(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::Str(v.to_string())
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Variant::Str(v)
    }
}

impl From<Vec<String>> for Variant {
    fn from(v: Vec<String>) -> Self {
        Variant::StrList(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Variant::Real(12.5).to_string(), "12.5");
        assert_eq!(Variant::Real(3.0).to_string(), "3");
        assert_eq!(Variant::Bool(true).to_string(), "True");
        assert_eq!(
            Variant::StrList(vec!["a".into(), "b".into()]).to_string(),
            "a; b"
        );
    }

    #[test]
    fn test_same_bits() {
        assert!(Variant::Real(f64::NAN).same_bits(&Variant::Real(f64::NAN)));
        assert!(!Variant::Real(0.0).same_bits(&Variant::Real(-0.0)));
        assert!(Variant::Int(4).same_bits(&Variant::Int(4)));
    }
}
