//! Axis orderings of feature maps, and the permutations between them.
use crate::ops::Lowering;
use crate::value::Value;
use tessera_core::internal::*;
use tessera_core::ops::array::{Permute, Transpose};

use std::str::FromStr;

/// Position of the channel axis in rank 4 feature maps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AxisOrdering {
    /// `[n, c, h, w]`, the ordering of source graphs.
    #[default]
    ChannelFirst,
    /// `[n, h, w, c]`
    ChannelLast,
}

/// Ordering of the tensors of the source graph.
pub const SOURCE_ORDERING: AxisOrdering = AxisOrdering::ChannelFirst;

impl FromStr for AxisOrdering {
    type Err = TesseraError;

    fn from_str(s: &str) -> TesseraResult<AxisOrdering> {
        match s {
            "channel-first" | "channel_first" | "nchw" | "NCHW" => Ok(AxisOrdering::ChannelFirst),
            "channel-last" | "channel_last" | "nhwc" | "NHWC" => Ok(AxisOrdering::ChannelLast),
            _ => bail!("Unknown axis ordering {}, expected channel-first or channel-last", s),
        }
    }
}

impl fmt::Display for AxisOrdering {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AxisOrdering::ChannelFirst => write!(fmt, "channel-first"),
            AxisOrdering::ChannelLast => write!(fmt, "channel-last"),
        }
    }
}

/// Settings of one translation run.
#[derive(Clone, Copy, Debug, Default, new, PartialEq, Eq)]
pub struct LoweringContext {
    /// Ordering the target graph is built in.
    pub ordering: AxisOrdering,
}

impl LoweringContext {
    pub fn changes_ordering(&self) -> bool {
        self.ordering != SOURCE_ORDERING
    }
}

/// Full axis permutation bringing a tensor of rank `rank` from `from` to
/// `to` ordering. `None` when there is nothing to move.
pub fn channel_permutation(from: AxisOrdering, to: AxisOrdering, rank: usize) -> Option<TVec<usize>> {
    if from == to || rank < 3 {
        return None;
    }
    let perm = match to {
        AxisOrdering::ChannelLast => (0..1).chain(2..rank).chain(1..2).collect(),
        AxisOrdering::ChannelFirst => (0..1).chain(rank - 1..rank).chain(1..rank - 1).collect(),
    };
    Some(perm)
}

pub fn is_identity(perm: &[usize]) -> bool {
    perm.iter().enumerate().all(|(ix, &p)| ix == p)
}

/// Non fatal condition met while lowering: the translation goes on, but
/// its result deserves a numerical check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advisory {
    /// A permutation moving the batch axis was lowered as a raw transpose.
    BatchAxisMoved { perm: TVec<usize> },
    /// A permutation was applied to a tensor with unknown non-batch
    /// dimensions.
    AmbiguousPermute { shape: ShapeFact },
    /// A flattening reshape under channel-last ordering goes through a
    /// custom transposition back to channel-first.
    ChannelLastFlatten { lambda: String },
}

impl fmt::Display for Advisory {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Advisory::BatchAxisMoved { perm } => {
                write!(fmt, "Can't permute batch dimension with {perm:?}. Result may be wrong.")
            }
            Advisory::AmbiguousPermute { shape } => {
                write!(fmt, "Permuting a tensor of partially unknown shape {shape}. Result may be wrong.")
            }
            Advisory::ChannelLastFlatten { lambda } => write!(
                fmt,
                "Flattening a channel-last tensor: transposed back to channel-first by lambda {lambda}"
            ),
        }
    }
}

/// Result of a lowering, with the advisories raised on the way.
#[derive(Clone, Debug, PartialEq)]
pub struct Lowered<T> {
    pub value: T,
    pub advisories: Vec<Advisory>,
}

impl<T> Lowered<T> {
    pub fn plain(value: T) -> Lowered<T> {
        Lowered { value, advisories: vec![] }
    }

    pub fn with_advisories(value: T, advisories: Vec<Advisory>) -> Lowered<T> {
        Lowered { value, advisories }
    }

    /// Chain a lowering step, accumulating advisories.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> TesseraResult<Lowered<U>>) -> TesseraResult<Lowered<U>> {
        let mut next = f(self.value)?;
        let mut advisories = self.advisories;
        advisories.append(&mut next.advisories);
        Ok(Lowered { value: next.value, advisories })
    }
}

impl Lowering<'_> {
    /// Apply a full axis permutation to `input`.
    ///
    /// Permutations keeping the batch axis in place become a `Permute`
    /// node. Moving the batch axis is not something `Permute` can express:
    /// constants are transposed directly, graph tensors go through a raw
    /// `Transpose`, and an advisory is raised either way.
    pub fn permute(&mut self, input: &Value, perm: &[usize], name: &str) -> TesseraResult<Lowered<Value>> {
        ensure!(
            perm.len() == input.rank(),
            "Permutation {:?} does not match rank {} of {}",
            perm,
            input.rank(),
            name
        );
        let mut advisories = vec![];
        if perm.first().is_some_and(|&p| p != 0) {
            debug!("{}: {:?} moves the batch axis, lowering as a transpose", name, perm);
            advisories.push(Advisory::BatchAxisMoved { perm: perm.into() });
            let value = match input {
                Value::Const(t) => {
                    debug!("{}: transposing constant data", name);
                    t.as_ref().clone().permute_axes(perm)?.into()
                }
                Value::Symbolic(s) => self.wire(name, Transpose::new(perm.into()), &[s.outlet])?,
            };
            return Ok(Lowered::with_advisories(value, advisories));
        }
        if input.shape().has_unknown_beyond_batch() {
            advisories.push(Advisory::AmbiguousPermute { shape: input.shape() });
        }
        let op = Permute::new(perm[1..].iter().copied().collect());
        let value = self.wire_or_fold(name, op, &[input.clone()])?;
        Ok(Lowered::with_advisories(value, advisories))
    }

    /// Permute a rank 4 feature map from `from` to `to` ordering. Other
    /// ranks, and same orderings, pass through.
    pub fn to_layout(
        &mut self,
        input: &Value,
        from: AxisOrdering,
        to: AxisOrdering,
        name: &str,
    ) -> TesseraResult<Lowered<Value>> {
        match channel_permutation(from, to, input.rank()).filter(|_| input.rank() == 4) {
            Some(perm) => self.permute(input, &perm, name),
            None => Ok(Lowered::plain(input.clone())),
        }
    }

    /// Source ordering to the ordering the target graph is built in.
    pub fn to_target_layout(&mut self, input: &Value, name: &str) -> TesseraResult<Lowered<Value>> {
        self.to_layout(input, SOURCE_ORDERING, self.ctx.ordering, name)
    }

    /// Target graph ordering back to the source ordering.
    pub fn from_target_layout(&mut self, input: &Value, name: &str) -> TesseraResult<Lowered<Value>> {
        self.to_layout(input, self.ctx.ordering, SOURCE_ORDERING, name)
    }

    /// Target graph ordering to channel-last, for the spatial primitives.
    pub fn to_channel_last(&mut self, input: &Value, name: &str) -> TesseraResult<Lowered<Value>> {
        self.to_layout(input, self.ctx.ordering, AxisOrdering::ChannelLast, name)
    }

    /// Inverse of `to_channel_last`.
    pub fn from_channel_last(&mut self, input: &Value, name: &str) -> TesseraResult<Lowered<Value>> {
        self.to_layout(input, AxisOrdering::ChannelLast, self.ctx.ordering, name)
    }
}
