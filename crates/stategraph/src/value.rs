//! Leaf payloads, tags, and opaque static field values.

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Classification label carried by a leaf (e.g. `"parameter"`, `"transient"`).
///
/// The engine never interprets tags beyond partitioning by them; filters are
/// the only consumers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(Arc<str>);

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Tag(Arc::<str>::from(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Tag::new(name)
    }
}

impl From<String> for Tag {
    fn from(name: String) -> Self {
        Tag::new(name)
    }
}

impl PartialEq<str> for Tag {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Tag {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Tag::new(name))
    }
}

/// Opaque non-traversed attribute value, copied verbatim into descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StaticValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<bool> for StaticValue {
    fn from(value: bool) -> Self {
        StaticValue::Bool(value)
    }
}

impl From<i64> for StaticValue {
    fn from(value: i64) -> Self {
        StaticValue::Int(value)
    }
}

impl From<f64> for StaticValue {
    fn from(value: f64) -> Self {
        StaticValue::Float(value)
    }
}

impl From<&str> for StaticValue {
    fn from(value: &str) -> Self {
        StaticValue::Str(value.to_string())
    }
}

impl From<String> for StaticValue {
    fn from(value: String) -> Self {
        StaticValue::Str(value)
    }
}

/// Host-side numeric buffer used as the common leaf payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorValue {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl TensorValue {
    /// Constructs a tensor from raw values.
    ///
    /// Panics if the data length does not match the shape's element count.
    pub fn from_vec(shape: impl Into<Vec<usize>>, data: Vec<f32>) -> Self {
        let shape = shape.into();
        let expected: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            expected,
            "tensor data length ({}) does not match shape {:?}",
            data.len(),
            shape
        );
        TensorValue { shape, data }
    }

    /// Returns a zero-initialized tensor of the requested shape.
    pub fn zeros(shape: impl Into<Vec<usize>>) -> Self {
        let shape = shape.into();
        let len: usize = shape.iter().product();
        TensorValue {
            shape,
            data: vec![0.0; len],
        }
    }

    /// Returns a tensor filled with uniform values in `[-1, 1)`.
    pub fn random<R: Rng>(shape: impl Into<Vec<usize>>, rng: &mut R) -> Self {
        let shape = shape.into();
        let len: usize = shape.iter().product();
        let data = (0..len).map(|_| rng.gen_range(-1.0f32..1.0f32)).collect();
        TensorValue { shape, data }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn num_elements(&self) -> usize {
        self.data.len()
    }
}

/// Leaf payload. `Empty` is the explicit placeholder left behind by
/// extraction and accepted by reconstruction and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Empty,
    Scalar(f64),
    Tensor(TensorValue),
}

impl Value {
    /// Convenience constructor for tensor-valued leaves.
    pub fn tensor(shape: impl Into<Vec<usize>>, data: Vec<f32>) -> Self {
        Value::Tensor(TensorValue::from_vec(shape, data))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Whether `other` may overwrite this value without changing the slot's
    /// structural shape. Transitions to or from `Empty` always match; two
    /// occupied values must agree in kind, and tensors in shape.
    pub fn structure_matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Empty, _) | (_, Value::Empty) => true,
            (Value::Scalar(_), Value::Scalar(_)) => true,
            (Value::Tensor(a), Value::Tensor(b)) => a.shape == b.shape,
            _ => false,
        }
    }
}

/// Tagged value owned directly by a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    pub tag: Tag,
    pub value: Value,
}

impl Leaf {
    pub fn new(tag: impl Into<Tag>, value: Value) -> Self {
        Leaf {
            tag: tag.into(),
            value,
        }
    }
}
