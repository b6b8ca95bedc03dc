//! # Tessera ONNX
//!
//! Lowers a source graph, in ONNX operator vocabulary, to a `TargetModel`.
//!
//! Each source node is rewritten into zero or more target primitives.
//! Subgraphs depending only on constants are folded at translation time,
//! and the target graph can be built in channel-first or channel-last
//! ordering.
//!
//! ```
//! use tessera_onnx::prelude::*;
//!
//! let graph: tessera_onnx::pb::GraphProto = serde_json::from_str(r#"{
//!     "inputs": [ { "name": "x", "shape": [null, 3, 4] } ],
//!     "initializers": [ { "name": "s", "datum_type": "i64", "shape": [2], "data": [0, -1] } ],
//!     "nodes": [ { "name": "flat", "op_type": "Reshape", "inputs": ["x", "s"], "outputs": ["y"] } ],
//!     "outputs": ["y"]
//! }"#).unwrap();
//! let translation = Translator::default().translate(&graph).unwrap();
//! let y = translation.run(tvec!(Tensor::zero_dt(DatumType::F32, &[2, 3, 4]).unwrap())).unwrap();
//! assert_eq!(y[0].shape(), &[2, 12]);
//! ```
#[allow(unused_imports)]
#[macro_use]
extern crate derive_new;
#[allow(unused_imports)]
#[macro_use]
extern crate log;

pub mod env;
pub mod layout;
pub mod model;
pub mod ops;
pub mod pb;
pub mod pb_helpers;
pub mod reshape;
pub mod tensor;
pub mod value;

pub use self::model::for_path;
pub use self::model::for_reader;

pub mod prelude {
    pub use crate::layout::{Advisory, AxisOrdering, LoweringContext};
    pub use crate::model::{Translation, Translator};
    pub use crate::value::Value;
    pub use tessera_core::prelude::*;
}

#[cfg(test)]
#[allow(dead_code)]
fn setup_test_logger() {
    let _ = env_logger::Builder::from_env("TESSERA_LOG").try_init();
}
