//! # Tessera core
//!
//! The target side of the translator: a graph of typed primitives
//! (`TargetModel`), the primitives themselves, and a reference evaluator
//! used to run a translated graph in-process.
//!
//! ```
//! use tessera_core::internal::*;
//! use tessera_core::ops::array::Flatten;
//!
//! let mut model = TargetModel::default();
//! let input = model.add_source("input", TypedFact::shape(DatumType::F32, &[None, Some(3), Some(4)])).unwrap();
//! let flat = model.wire_node("flat", Flatten, &[input]).unwrap();
//! model.set_output_outlets(&[flat]).unwrap();
//! assert_eq!(model.outlet_fact(flat).unwrap().shape.to_string(), "?x12");
//!
//! let input = Tensor::zero_dt(DatumType::F32, &[2, 3, 4]).unwrap();
//! let outputs = SimplePlan::new(&model).unwrap().run(tvec!(input)).unwrap();
//! assert_eq!(outputs[0].shape(), &[2, 12]);
//! ```

#[macro_use]
extern crate derive_new;
#[allow(unused_imports)]
#[macro_use]
extern crate log;

pub mod model;
pub mod ops;
pub mod plan;

pub use tessera_data;

pub mod prelude {
    pub use crate::model::{OutletId, ShapeFact, TargetModel, TargetNode, TypedFact};
    pub use crate::plan::{SessionState, SimplePlan};
    pub use tessera_data::prelude::*;
}

pub mod internal {
    pub use crate::ops::{check_input_arity, LambdaFn, TargetOp};
    pub use crate::prelude::*;
    pub use std::collections::HashMap;
    pub use std::fmt;
    pub use tessera_data::internal::*;
}

#[cfg(test)]
#[allow(dead_code)]
fn setup_test_logger() {
    let _ = env_logger::Builder::from_env("TESSERA_LOG").try_init();
}
