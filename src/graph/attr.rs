//! Attribute values and constant payloads

use std::sync::Arc;

use ndarray::{Array1, ArrayD, IxDyn};

use super::Graph;

/// Materialized tensor value of a constant node or tensor attribute
#[derive(Debug, Clone, PartialEq)]
pub enum Tensor {
    /// 32-bit float elements
    F32(ArrayD<f32>),
    /// 64-bit integer elements
    I64(ArrayD<i64>),
}

impl Tensor {
    /// Scalar f32 tensor
    pub fn scalar_f32(value: f32) -> Self {
        Tensor::F32(ArrayD::from_elem(IxDyn(&[]), value))
    }

    /// Scalar i64 tensor
    pub fn scalar_i64(value: i64) -> Self {
        Tensor::I64(ArrayD::from_elem(IxDyn(&[]), value))
    }

    /// 1-D f32 tensor
    pub fn from_vec_f32(values: Vec<f32>) -> Self {
        Tensor::F32(Array1::from_vec(values).into_dyn())
    }

    /// 1-D i64 tensor
    pub fn from_vec_i64(values: Vec<i64>) -> Self {
        Tensor::I64(Array1::from_vec(values).into_dyn())
    }

    /// Tensor dimensions
    pub fn shape(&self) -> &[usize] {
        match self {
            Tensor::F32(a) => a.shape(),
            Tensor::I64(a) => a.shape(),
        }
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        match self {
            Tensor::F32(a) => a.len(),
            Tensor::I64(a) => a.len(),
        }
    }

    /// Whether the tensor holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<ArrayD<f32>> for Tensor {
    fn from(array: ArrayD<f32>) -> Self {
        Tensor::F32(array)
    }
}

impl From<ArrayD<i64>> for Tensor {
    fn from(array: ArrayD<i64>) -> Self {
        Tensor::I64(array)
    }
}

/// Typed value of a node attribute
#[derive(Debug, Clone)]
pub enum AttrValue {
    /// Integer
    Int(i64),
    /// Float
    Float(f32),
    /// Boolean
    Bool(bool),
    /// String
    String(String),
    /// List of integers
    Ints(Vec<i64>),
    /// List of floats
    Floats(Vec<f32>),
    /// Tensor
    Tensor(Tensor),
    /// Nested graph (control-flow body, function)
    Graph(Arc<Graph>),
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrValue::Int(a), AttrValue::Int(b)) => a == b,
            (AttrValue::Float(a), AttrValue::Float(b)) => a == b,
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            (AttrValue::String(a), AttrValue::String(b)) => a == b,
            (AttrValue::Ints(a), AttrValue::Ints(b)) => a == b,
            (AttrValue::Floats(a), AttrValue::Floats(b)) => a == b,
            (AttrValue::Tensor(a), AttrValue::Tensor(b)) => a == b,
            // Nested graphs compare by identity
            (AttrValue::Graph(a), AttrValue::Graph(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f32> for AttrValue {
    fn from(v: f32) -> Self {
        AttrValue::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::String(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::String(v)
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(v: Vec<i64>) -> Self {
        AttrValue::Ints(v)
    }
}

impl From<Vec<f32>> for AttrValue {
    fn from(v: Vec<f32>) -> Self {
        AttrValue::Floats(v)
    }
}

impl From<Tensor> for AttrValue {
    fn from(v: Tensor) -> Self {
        AttrValue::Tensor(v)
    }
}
