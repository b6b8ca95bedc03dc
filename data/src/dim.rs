//! Possibly unknown dimensions, as found in shape arrays.
use std::fmt;

use crate::TesseraResult;

/// A dimension value in a shape array.
///
/// Shape arrays computed at translation time may contain dimensions that
/// are only known when the graph runs (typically the batch axis). Such an
/// array is the only kind of tensor allowed to carry `Unknown` entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TDim {
    Val(i64),
    #[default]
    Unknown,
}

impl TDim {
    pub fn is_known(&self) -> bool {
        matches!(self, TDim::Val(_))
    }

    pub fn as_option(&self) -> Option<i64> {
        match self {
            TDim::Val(v) => Some(*v),
            TDim::Unknown => None,
        }
    }

    pub fn to_i64(&self) -> TesseraResult<i64> {
        match self {
            TDim::Val(v) => Ok(*v),
            TDim::Unknown => anyhow::bail!("Unknown dimension can not be converted to an integer"),
        }
    }
}

impl From<i64> for TDim {
    fn from(v: i64) -> TDim {
        TDim::Val(v)
    }
}

impl From<usize> for TDim {
    fn from(v: usize) -> TDim {
        TDim::Val(v as i64)
    }
}

impl From<Option<usize>> for TDim {
    fn from(v: Option<usize>) -> TDim {
        v.map(TDim::from).unwrap_or(TDim::Unknown)
    }
}

impl PartialEq<i64> for TDim {
    fn eq(&self, other: &i64) -> bool {
        *self == TDim::Val(*other)
    }
}

impl fmt::Display for TDim {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TDim::Val(v) => write!(fmt, "{v}"),
            TDim::Unknown => write!(fmt, "?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_refuses_integer() {
        assert!(TDim::Unknown.to_i64().is_err());
        assert_eq!(TDim::Val(12).to_i64().unwrap(), 12);
    }

    #[test]
    fn from_optional_usize() {
        assert_eq!(TDim::from(None::<usize>), TDim::Unknown);
        assert_eq!(TDim::from(Some(3usize)), 3);
    }
}
