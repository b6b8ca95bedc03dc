//! In-memory form of a source graph, as read from its JSON serialization.
//!
//! The structures mirror the parts of the ONNX protobuf messages the
//! translator consumes. Names of absent optional node inputs are empty
//! strings.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphProto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<ValueInfoProto>,
    #[serde(default)]
    pub initializers: Vec<TensorProto>,
    pub nodes: Vec<NodeProto>,
    pub outputs: Vec<String>,
}

/// A graph input. `None` dimensions are only known at run time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueInfoProto {
    pub name: String,
    #[serde(default = "default_datum_type")]
    pub datum_type: String,
    pub shape: Vec<Option<usize>>,
}

fn default_datum_type() -> String {
    "f32".to_string()
}

/// A constant tensor. `data` is the row-major flattening of the values; a
/// `null` entry is an unknown dimension, only valid in `tdim` tensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorProto {
    #[serde(default)]
    pub name: String,
    pub datum_type: String,
    #[serde(default)]
    pub shape: Vec<usize>,
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeProto {
    #[serde(default)]
    pub name: String,
    pub op_type: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeProto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeProto {
    pub name: String,
    #[serde(flatten)]
    pub value: AttributeValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeValue {
    Int(i64),
    Ints(Vec<i64>),
    Float(f32),
    Floats(Vec<f32>),
    String(String),
    Strings(Vec<String>),
    Tensor(TensorProto),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    Int,
    Ints,
    Float,
    Floats,
    String,
    Strings,
    Tensor,
}

impl AttributeValue {
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            AttributeValue::Int(_) => AttributeType::Int,
            AttributeValue::Ints(_) => AttributeType::Ints,
            AttributeValue::Float(_) => AttributeType::Float,
            AttributeValue::Floats(_) => AttributeType::Floats,
            AttributeValue::String(_) => AttributeType::String,
            AttributeValue::Strings(_) => AttributeType::Strings,
            AttributeValue::Tensor(_) => AttributeType::Tensor,
        }
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(match self {
            AttributeType::Int => "int",
            AttributeType::Ints => "list of ints",
            AttributeType::Float => "float",
            AttributeType::Floats => "list of floats",
            AttributeType::String => "string",
            AttributeType::Strings => "list of strings",
            AttributeType::Tensor => "tensor",
        })
    }
}
