//! Operators on arrays and shapes.
mod add_dims;
mod concat;
mod flatten;
mod gather;
mod permute_axes;
mod reshape;
mod squeeze;
mod strided_slice;
mod tile;

pub use self::add_dims::ExpandDims;
pub use self::concat::{Concatenate, TypedConcat};
pub use self::flatten::Flatten;
pub use self::gather::{Embedding, Gather};
pub use self::permute_axes::{Permute, Transpose};
pub use self::reshape::{DynamicReshape, FullReshape, Reshape};
pub use self::squeeze::Squeeze;
pub use self::strided_slice::{SliceSpec, StridedSlice};
pub use self::tile::Tile;
