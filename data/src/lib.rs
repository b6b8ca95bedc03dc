#[macro_use]
mod macros;

/// A Smallvec instantiation with 4 embeddable values.
///
/// Used about everywhere, for node inputs, permutations and tensor
/// dimensions.
pub type TVec<T> = smallvec::SmallVec<[T; 4]>;

pub type TesseraError = anyhow::Error;
pub type TesseraResult<T> = anyhow::Result<T>;

pub mod prelude {
    pub use crate::datum::{Datum, DatumType};
    pub use crate::dim::TDim;
    pub use crate::tensor::litteral::*;
    pub use crate::tensor::{IntoArcTensor, IntoTensor, Tensor};
    pub use crate::tvec;
    pub use crate::TVec;
    pub use crate::{dispatch_datum, dispatch_numbers};
    pub use crate::{TesseraError, TesseraResult};
    pub use std::sync::Arc;
}

pub mod internal {
    pub use crate::prelude::*;
    pub use crate::tensor::Storage;
    pub use anyhow::{anyhow, bail, ensure, format_err, Context as TesseraErrorContext};
    pub use ndarray as tessera_ndarray;
    pub use smallvec as tessera_smallvec;
    pub use std::borrow::Cow;
}

pub use anyhow;
pub use itertools;
pub use ndarray;

mod datum;
mod dim;
mod tensor;
