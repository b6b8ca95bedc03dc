//! `Tensor`, the constant data container of the translator.
use crate::datum::{Datum, DatumType};
use crate::dim::TDim;
use crate::TesseraResult;
use anyhow::Context;
use itertools::Itertools;
use ndarray::prelude::*;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Typed storage behind a `Tensor`. Arrays are always kept in standard
/// (row-major, contiguous) layout.
#[derive(Clone, PartialEq)]
pub enum Storage {
    Bool(ArrayD<bool>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    TDim(ArrayD<TDim>),
}

/// An n-dimensional array of one of the supported datum types.
#[derive(Clone, PartialEq)]
pub struct Tensor {
    storage: Storage,
}

impl Default for Tensor {
    fn default() -> Tensor {
        litteral::tensor0(0f32)
    }
}

impl Tensor {
    /// Create a tensor from a flat slice of data in row-major order.
    pub fn from_shape<T: Datum>(shape: &[usize], data: &[T]) -> TesseraResult<Tensor> {
        Ok(ArrayD::from_shape_vec(IxDyn(shape), data.to_vec())
            .with_context(|| format!("Building a tensor of shape {shape:?} from {} items", data.len()))?
            .into_tensor())
    }

    pub fn zero_dt(dt: DatumType, shape: &[usize]) -> TesseraResult<Tensor> {
        Self::from_i64s(shape, std::iter::repeat_n(0, shape.iter().product()), dt)
    }

    pub fn ones_dt(dt: DatumType, shape: &[usize]) -> TesseraResult<Tensor> {
        Self::from_i64s(shape, std::iter::repeat_n(1, shape.iter().product()), dt)
    }

    pub fn datum_type(&self) -> DatumType {
        match &self.storage {
            Storage::Bool(_) => DatumType::Bool,
            Storage::I32(_) => DatumType::I32,
            Storage::I64(_) => DatumType::I64,
            Storage::F32(_) => DatumType::F32,
            Storage::F64(_) => DatumType::F64,
            Storage::TDim(_) => DatumType::TDim,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match &self.storage {
            Storage::Bool(a) => a.shape(),
            Storage::I32(a) => a.shape(),
            Storage::I64(a) => a.shape(),
            Storage::F32(a) => a.shape(),
            Storage::F64(a) => a.shape(),
            Storage::TDim(a) => a.shape(),
        }
    }

    pub fn rank(&self) -> usize {
        self.shape().len()
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_for_access<D: Datum>(&self) -> TesseraResult<()> {
        if self.datum_type() != D::datum_type() {
            anyhow::bail!(
                "Tensor datum type error: tensor is {:?}, accessed as {:?}",
                self.datum_type(),
                D::datum_type(),
            );
        }
        Ok(())
    }

    /// Access the data as a `ndarray::ArrayView`.
    pub fn to_array_view<D: Datum>(&self) -> TesseraResult<ArrayViewD<'_, D>> {
        self.check_for_access::<D>()?;
        D::view(&self.storage).context("Inconsistent storage")
    }

    /// Transform the tensor into a `ndarray::Array`.
    pub fn into_array<D: Datum>(self) -> TesseraResult<ArrayD<D>> {
        self.check_for_access::<D>()?;
        D::unwrap(self.storage).map_err(|_| anyhow::anyhow!("Inconsistent storage"))
    }

    pub fn as_slice<D: Datum>(&self) -> TesseraResult<&[D]> {
        let view = self.to_array_view::<D>()?;
        view.to_slice().context("Tensor is not contiguous")
    }

    pub fn to_scalar<D: Datum>(&self) -> TesseraResult<&D> {
        anyhow::ensure!(self.len() == 1, "to_scalar called on a tensor of shape {:?}", self.shape());
        Ok(&self.as_slice::<D>()?[0])
    }

    pub fn cast_to<D: Datum>(&self) -> TesseraResult<Cow<'_, Tensor>> {
        self.cast_to_dt(D::datum_type())
    }

    /// Convert the tensor to another datum type.
    ///
    /// Conversions to `I32` fail when a value does not fit, conversions from
    /// `TDim` fail when a dimension is unknown.
    pub fn cast_to_dt(&self, dt: DatumType) -> TesseraResult<Cow<'_, Tensor>> {
        if self.datum_type() == dt {
            return Ok(Cow::Borrowed(self));
        }
        let shape = self.shape();
        let casted = match &self.storage {
            Storage::Bool(a) => Self::from_i64s(shape, a.iter().map(|&b| b as i64), dt)?,
            Storage::I32(a) => Self::from_i64s(shape, a.iter().map(|&x| x as i64), dt)?,
            Storage::I64(a) => Self::from_i64s(shape, a.iter().copied(), dt)?,
            Storage::F32(a) => Self::from_f64s(shape, a.iter().map(|&x| x as f64), dt)?,
            Storage::F64(a) => Self::from_f64s(shape, a.iter().copied(), dt)?,
            Storage::TDim(a) => {
                let ints = a.iter().map(|d| d.to_i64()).collect::<TesseraResult<Vec<i64>>>()?;
                Self::from_i64s(shape, ints.into_iter(), dt)?
            }
        };
        Ok(Cow::Owned(casted))
    }

    fn from_i64s(
        shape: &[usize],
        it: impl Iterator<Item = i64>,
        dt: DatumType,
    ) -> TesseraResult<Tensor> {
        let shape = IxDyn(shape);
        let t = match dt {
            DatumType::Bool => ArrayD::from_shape_vec(shape, it.map(|x| x != 0).collect())?.into_tensor(),
            DatumType::I32 => {
                let data = it
                    .map(|x| i32::try_from(x).with_context(|| format!("{x} does not fit in i32")))
                    .collect::<TesseraResult<Vec<i32>>>()?;
                ArrayD::from_shape_vec(shape, data)?.into_tensor()
            }
            DatumType::I64 => ArrayD::from_shape_vec(shape, it.collect())?.into_tensor(),
            DatumType::F32 => ArrayD::from_shape_vec(shape, it.map(|x| x as f32).collect())?.into_tensor(),
            DatumType::F64 => ArrayD::from_shape_vec(shape, it.map(|x| x as f64).collect())?.into_tensor(),
            DatumType::TDim => ArrayD::from_shape_vec(shape, it.map(TDim::Val).collect())?.into_tensor(),
        };
        Ok(t)
    }

    fn from_f64s(
        shape: &[usize],
        it: impl Iterator<Item = f64>,
        dt: DatumType,
    ) -> TesseraResult<Tensor> {
        let shape = IxDyn(shape);
        let t = match dt {
            DatumType::Bool => ArrayD::from_shape_vec(shape, it.map(|x| x != 0.0).collect())?.into_tensor(),
            DatumType::I32 => ArrayD::from_shape_vec(shape, it.map(|x| x as i32).collect())?.into_tensor(),
            DatumType::I64 => ArrayD::from_shape_vec(shape, it.map(|x| x as i64).collect())?.into_tensor(),
            DatumType::F32 => ArrayD::from_shape_vec(shape, it.map(|x| x as f32).collect())?.into_tensor(),
            DatumType::F64 => ArrayD::from_shape_vec(shape, it.collect())?.into_tensor(),
            DatumType::TDim => {
                ArrayD::from_shape_vec(shape, it.map(|x| TDim::Val(x as i64)).collect())?.into_tensor()
            }
        };
        Ok(t)
    }

    /// Permute the axes: output axis `i` is input axis `axes[i]`.
    pub fn permute_axes(self, axes: &[usize]) -> TesseraResult<Tensor> {
        anyhow::ensure!(
            axes.len() == self.rank() && axes.iter().sorted().copied().eq(0..self.rank()),
            "{:?} is not a permutation for a tensor of rank {}",
            axes,
            self.rank()
        );
        fn permute<T: Datum>(t: Tensor, axes: &[usize]) -> TesseraResult<Tensor> {
            Ok(t.into_array::<T>()?.permuted_axes(axes).into_tensor())
        }
        dispatch_datum!(permute(self.datum_type())(self, axes))
    }

    /// Reinterpret the row-major buffer with a new shape.
    pub fn into_shape(self, shape: &[usize]) -> TesseraResult<Tensor> {
        anyhow::ensure!(
            shape.iter().product::<usize>() == self.len(),
            "Can not reshape {:?} to {:?}",
            self.shape(),
            shape
        );
        fn reshape<T: Datum>(t: Tensor, shape: &[usize]) -> TesseraResult<Tensor> {
            let data = t.to_array_view::<T>()?.iter().cloned().collect();
            Ok(ArrayD::from_shape_vec(IxDyn(shape), data)?.into_tensor())
        }
        dispatch_datum!(reshape(self.datum_type())(self, shape))
    }

    pub fn insert_axis(self, axis: usize) -> TesseraResult<Tensor> {
        anyhow::ensure!(axis <= self.rank(), "Can not insert axis {} in rank {}", axis, self.rank());
        let mut shape = self.shape().to_vec();
        shape.insert(axis, 1);
        self.into_shape(&shape)
    }

    pub fn remove_axis(self, axis: usize) -> TesseraResult<Tensor> {
        anyhow::ensure!(
            axis < self.rank() && self.shape()[axis] == 1,
            "Can not remove axis {} from shape {:?}",
            axis,
            self.shape()
        );
        let mut shape = self.shape().to_vec();
        shape.remove(axis);
        self.into_shape(&shape)
    }

    /// Concatenate tensors of a same datum type along `axis`.
    pub fn concat(axis: usize, tensors: &[impl std::borrow::Borrow<Tensor>]) -> TesseraResult<Tensor> {
        anyhow::ensure!(!tensors.is_empty(), "Can not concatenate zero tensors");
        let dt = tensors[0].borrow().datum_type();
        fn concat_t<T: Datum>(axis: usize, tensors: &[impl std::borrow::Borrow<Tensor>]) -> TesseraResult<Tensor> {
            let views = tensors
                .iter()
                .map(|t| t.borrow().to_array_view::<T>())
                .collect::<TesseraResult<Vec<_>>>()?;
            Ok(ndarray::concatenate(Axis(axis), &views)?.into_tensor())
        }
        dispatch_datum!(concat_t(dt)(axis, tensors))
    }

    /// Compare two tensors, allowing for rounding errors.
    pub fn close_enough(&self, other: &Self, approx: bool) -> TesseraResult<()> {
        if self.shape() != other.shape() {
            anyhow::bail!("Shape mismatch {:?} != {:?}", self.shape(), other.shape())
        }
        if approx && self.datum_type().is_number() && other.datum_type().is_number() {
            let atol = 5e-4;
            let rtol = 1e-4;
            let ma = self.cast_to::<f64>()?;
            let mb = other.cast_to::<f64>()?;
            for (ix, (a, b)) in
                ma.as_slice::<f64>()?.iter().zip(mb.as_slice::<f64>()?.iter()).enumerate()
            {
                if !((a.is_nan() && b.is_nan()) || (a - b).abs() <= atol + rtol * b.abs()) {
                    anyhow::bail!("Mismatch at flat index {} {} != {}", ix, a, b)
                }
            }
            Ok(())
        } else if self == other {
            Ok(())
        } else {
            anyhow::bail!("Mismatch {:?} != {:?}", self, other)
        }
    }

    /// Dump the tensor in a human readable form.
    ///
    /// `force_full` will force the tensor to be dump in full even if it is big.
    pub fn dump(&self, force_full: bool) -> String {
        fn dump_t<D: Datum>(tensor: &Tensor, n: usize) -> String {
            tensor.to_array_view::<D>().map(|v| v.iter().take(n).join(", ")).unwrap_or_default()
        }
        let trunc = self.len() > 12 && !force_full;
        let data =
            dispatch_datum!(dump_t(self.datum_type())(self, if trunc { 12 } else { self.len() }));
        format!(
            "{},{:?} {}{}",
            self.shape().iter().join(","),
            self.datum_type(),
            data,
            if trunc { "..." } else { "" }
        )
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{}", self.dump(false))
    }
}

impl<D: ::ndarray::Dimension, T: Datum> From<Array<T, D>> for Tensor {
    fn from(it: Array<T, D>) -> Tensor {
        let it = it.into_dyn();
        let it = if it.is_standard_layout() { it } else { it.as_standard_layout().into_owned() };
        Tensor { storage: T::wrap(it) }
    }
}

pub trait IntoTensor: Sized {
    fn into_tensor(self) -> Tensor;
}

pub trait IntoArcTensor: Sized {
    fn into_arc_tensor(self) -> Arc<Tensor>;
}

impl<D: ::ndarray::Dimension, T: Datum> IntoTensor for Array<T, D> {
    fn into_tensor(self) -> Tensor {
        Tensor::from(self)
    }
}

impl<D: ::ndarray::Dimension, T: Datum> IntoArcTensor for Array<T, D> {
    fn into_arc_tensor(self) -> Arc<Tensor> {
        Arc::new(Tensor::from(self))
    }
}

impl IntoTensor for Tensor {
    fn into_tensor(self) -> Tensor {
        self
    }
}

impl IntoTensor for Arc<Tensor> {
    fn into_tensor(self) -> Tensor {
        Arc::try_unwrap(self).unwrap_or_else(|t| (*t).clone())
    }
}

impl IntoArcTensor for Tensor {
    fn into_arc_tensor(self) -> Arc<Tensor> {
        Arc::new(self)
    }
}

impl IntoArcTensor for Arc<Tensor> {
    fn into_arc_tensor(self) -> Arc<Tensor> {
        self
    }
}

pub mod litteral {
    use super::*;

    pub fn tensor0<A: Datum>(x: A) -> Tensor {
        Tensor::from(arr0(x))
    }

    pub fn tensor1<A: Datum>(xs: &[A]) -> Tensor {
        Tensor::from(arr1(xs))
    }

    pub fn tensor2<A: Datum, const N: usize>(xs: &[[A; N]]) -> Tensor {
        Tensor::from(arr2(xs))
    }

    pub fn rctensor0<A: Datum>(x: A) -> Arc<Tensor> {
        Arc::new(tensor0(x))
    }

    pub fn rctensor1<A: Datum>(xs: &[A]) -> Arc<Tensor> {
        Arc::new(tensor1(xs))
    }
}

#[cfg(test)]
mod tests {
    use super::litteral::*;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn permute_then_reshape_is_row_major() {
        let t = Tensor::from_shape(&[2, 3], &[0i32, 1, 2, 3, 4, 5]).unwrap();
        let t = t.permute_axes(&[1, 0]).unwrap();
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.as_slice::<i32>().unwrap(), &[0, 3, 1, 4, 2, 5]);
        let t = t.into_shape(&[6]).unwrap();
        assert_eq!(t, tensor1(&[0i32, 3, 1, 4, 2, 5]));
    }

    #[test]
    fn reject_bad_permutation() {
        let t = Tensor::zero_dt(DatumType::F32, &[2, 3]).unwrap();
        assert!(t.clone().permute_axes(&[0, 0]).is_err());
        assert!(t.permute_axes(&[0]).is_err());
    }

    #[test]
    fn default_is_scalar_zero() {
        let t = Tensor::default();
        assert_eq!(t.rank(), 0);
        assert_eq!(t, tensor0(0f32));
    }

    #[test]
    fn concat_along_axis() {
        let a = tensor2(&[[1i64, 2], [3, 4]]);
        let b = tensor2(&[[5i64, 6]]);
        let c = Tensor::concat(0, &[a, b]).unwrap();
        assert_eq!(c, tensor2(&[[1i64, 2], [3, 4], [5, 6]]));
    }

    #[test]
    fn i64_to_i32_overflow() {
        assert!(tensor1(&[i64::MAX]).cast_to::<i32>().is_err());
        assert_eq!(tensor1(&[7i64]).cast_to::<i32>().unwrap().into_owned(), tensor1(&[7i32]));
    }

    #[test]
    fn close_enough_with_rounding() {
        let a = tensor1(&[1.0f32, 2.0]);
        let b = tensor1(&[1.00001f32, 2.0]);
        assert!(a.close_enough(&b, true).is_ok());
        assert!(a.close_enough(&b, false).is_err());
    }

    proptest! {
        #[test]
        fn reshape_round_trip(data in proptest::collection::vec(-100i32..100, 24..=24)) {
            let t = Tensor::from_shape(&[2, 3, 4], &data).unwrap();
            let back = t.clone().into_shape(&[2, 12]).unwrap().into_shape(&[2, 3, 4]).unwrap();
            prop_assert_eq!(t, back);
        }
    }
}
