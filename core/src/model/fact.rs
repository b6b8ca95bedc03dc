//! Static type information about target tensors.
use crate::internal::*;
use itertools::Itertools;
use std::ops::Deref;

/// Partially known shape of a target tensor.
///
/// `None` marks a dimension only known when the graph runs: the batch axis
/// of graph inputs, and whatever depends on it.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ShapeFact(TVec<Option<usize>>);

impl ShapeFact {
    pub fn from_dims<D: Into<Option<usize>> + Copy>(dims: &[D]) -> ShapeFact {
        ShapeFact(dims.iter().map(|&d| d.into()).collect())
    }

    pub fn from_known(dims: &[usize]) -> ShapeFact {
        ShapeFact(dims.iter().map(|&d| Some(d)).collect())
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn dims(&self) -> &[Option<usize>] {
        &self.0
    }

    pub fn is_concrete(&self) -> bool {
        self.0.iter().all(|d| d.is_some())
    }

    pub fn has_unknown_beyond_batch(&self) -> bool {
        self.0.iter().skip(1).any(|d| d.is_none())
    }

    pub fn as_concrete(&self) -> Option<TVec<usize>> {
        self.0.iter().copied().collect()
    }

    /// Product of the dimensions, if they are all known.
    pub fn volume(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, d| d.map(|d| acc * d))
    }

    /// Check a runtime shape against the known dimensions.
    pub fn matches(&self, shape: &[usize]) -> bool {
        self.rank() == shape.len()
            && self.0.iter().zip(shape.iter()).all(|(f, s)| f.is_none_or(|f| f == *s))
    }

    pub fn to_tvec(&self) -> TVec<Option<usize>> {
        self.0.clone()
    }
}

impl Deref for ShapeFact {
    type Target = [Option<usize>];
    fn deref(&self) -> &[Option<usize>] {
        &self.0
    }
}

impl FromIterator<Option<usize>> for ShapeFact {
    fn from_iter<T: IntoIterator<Item = Option<usize>>>(iter: T) -> Self {
        ShapeFact(iter.into_iter().collect())
    }
}

impl fmt::Debug for ShapeFact {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{self}")
    }
}

impl fmt::Display for ShapeFact {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut dims = self.0.iter().map(|d| d.map(|d| d.to_string()).unwrap_or_else(|| "?".into()));
        write!(fmt, "{}", dims.join("x"))
    }
}

/// Fully determined tensor type: datum type and (partially known) shape,
/// plus the value when it is a constant.
#[derive(Clone, PartialEq)]
pub struct TypedFact {
    pub datum_type: DatumType,
    pub shape: ShapeFact,
    pub konst: Option<Arc<Tensor>>,
}

impl TypedFact {
    pub fn shape<D: Into<Option<usize>> + Copy>(datum_type: DatumType, dims: &[D]) -> TypedFact {
        TypedFact { datum_type, shape: ShapeFact::from_dims(dims), konst: None }
    }

    pub fn dt_shape(datum_type: DatumType, shape: ShapeFact) -> TypedFact {
        TypedFact { datum_type, shape, konst: None }
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn matches(&self, t: &Tensor) -> bool {
        self.datum_type == t.datum_type() && self.shape.matches(t.shape())
    }
}

impl From<Arc<Tensor>> for TypedFact {
    fn from(t: Arc<Tensor>) -> TypedFact {
        TypedFact {
            datum_type: t.datum_type(),
            shape: ShapeFact::from_known(t.shape()),
            konst: Some(t),
        }
    }
}

impl fmt::Debug for TypedFact {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        if self.shape.rank() > 0 {
            write!(fmt, "{},{}", self.shape, self.datum_type)?;
        } else {
            write!(fmt, "{}", self.datum_type)?;
        }
        if self.konst.is_some() {
            write!(fmt, " (const)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_dims() {
        let s = ShapeFact::from_dims(&[None, Some(3), Some(4)]);
        assert_eq!(s.to_string(), "?x3x4");
        assert_eq!(s.volume(), None);
        assert!(s.matches(&[7, 3, 4]));
        assert!(!s.matches(&[7, 4, 3]));
    }
}
