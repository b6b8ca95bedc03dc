use crate::dim::TDim;
use crate::tensor::litteral::*;
use crate::tensor::{Storage, Tensor};
use crate::TVec;
use ndarray::{ArrayD, ArrayViewD};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum DatumType {
    Bool,
    I32,
    I64,
    F32,
    F64,
    TDim,
}

impl DatumType {
    pub fn super_types(&self) -> TVec<DatumType> {
        use DatumType::*;
        match self {
            Bool => tvec!(Bool, I32, I64, F32, F64),
            I32 => tvec!(I32, I64, F32, F64),
            I64 => tvec!(I64, F64),
            F32 => tvec!(F32, F64),
            F64 => tvec!(F64),
            TDim => tvec!(TDim),
        }
    }

    pub fn super_type_for(
        i: impl IntoIterator<Item = impl std::borrow::Borrow<DatumType>>,
    ) -> Option<DatumType> {
        let mut iter = i.into_iter();
        let mut current = *iter.next()?.borrow();
        for n in iter {
            current = current.common_super_type(*n.borrow())?;
        }
        Some(current)
    }

    pub fn common_super_type(&self, rhs: DatumType) -> Option<DatumType> {
        let theirs = rhs.super_types();
        self.super_types().into_iter().find(|mine| theirs.contains(mine))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DatumType::F32 | DatumType::F64)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, DatumType::I32 | DatumType::I64)
    }

    pub fn is_number(&self) -> bool {
        self.is_float() || self.is_integer()
    }

    #[inline]
    pub fn size_of(&self) -> usize {
        dispatch_datum!(std::mem::size_of(self)())
    }
}

impl std::str::FromStr for DatumType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "I32" | "i32" | "int32" => Ok(DatumType::I32),
            "I64" | "i64" | "int64" => Ok(DatumType::I64),
            "F32" | "f32" | "float" | "float32" => Ok(DatumType::F32),
            "F64" | "f64" | "double" | "float64" => Ok(DatumType::F64),
            "Bool" | "bool" => Ok(DatumType::Bool),
            "TDim" | "tdim" | "dim" => Ok(DatumType::TDim),
            _ => anyhow::bail!("Unknown type {}", s),
        }
    }
}

impl fmt::Display for DatumType {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            DatumType::Bool => "bool",
            DatumType::I32 => "i32",
            DatumType::I64 => "i64",
            DatumType::F32 => "f32",
            DatumType::F64 => "f64",
            DatumType::TDim => "tdim",
        };
        fmt.write_str(s)
    }
}

pub trait Datum:
    Clone + Send + Sync + fmt::Debug + fmt::Display + Default + 'static + PartialEq
{
    fn name() -> &'static str;
    fn datum_type() -> DatumType;

    #[doc(hidden)]
    fn wrap(array: ArrayD<Self>) -> Storage;
    #[doc(hidden)]
    fn view(storage: &Storage) -> Option<ArrayViewD<'_, Self>>;
    #[doc(hidden)]
    fn unwrap(storage: Storage) -> Result<ArrayD<Self>, Storage>;
}

macro_rules! datum {
    ($t:ty, $v:ident) => {
        impl From<$t> for Tensor {
            fn from(it: $t) -> Tensor {
                tensor0(it)
            }
        }

        impl Datum for $t {
            fn name() -> &'static str {
                stringify!($t)
            }

            fn datum_type() -> DatumType {
                DatumType::$v
            }

            fn wrap(array: ArrayD<Self>) -> Storage {
                Storage::$v(array)
            }

            fn view(storage: &Storage) -> Option<ArrayViewD<'_, Self>> {
                if let Storage::$v(a) = storage { Some(a.view()) } else { None }
            }

            fn unwrap(storage: Storage) -> Result<ArrayD<Self>, Storage> {
                if let Storage::$v(a) = storage { Ok(a) } else { Err(storage) }
            }
        }
    };
}

datum!(bool, Bool);
datum!(i32, I32);
datum!(i64, I64);
datum!(f32, F32);
datum!(f64, F64);
datum!(TDim, TDim);
