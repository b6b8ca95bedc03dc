//! Reshape lowering.
//!
//! A reshape target comes as a shape array which may hold a `-1` wildcard
//! and unknown dimensions, while the input shape itself is only partially
//! known. The reconciler picks the target primitive able to express the
//! reshape with what is known at translation time.
use crate::layout::{Advisory, Lowered};
use crate::ops::Lowering;
use crate::pb::NodeProto;
use crate::value::Value;
use itertools::Itertools;
use tessera_core::internal::*;
use tessera_core::ops::array::{DynamicReshape, Flatten, FullReshape, Reshape};
use tessera_core::ops::lambda::Lambda;

/// How a partially known input shape is reshaped to a target spec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReshapePlan {
    /// Collapse the axes in `start..end` of the live shape into one.
    Dynamic { start: usize, end: usize },
    /// Keep the batch axis, collapse everything else.
    Flatten,
    /// Reshape everything, batch axis included.
    Full(TVec<i64>),
    /// Keep the batch axis, reshape the others.
    KeepBatch(TVec<i64>),
}

fn dim_matches(source: Option<usize>, target: TDim) -> bool {
    match (source, target) {
        (None, TDim::Unknown) => true,
        (Some(s), TDim::Val(t)) => s as i64 == t,
        _ => false,
    }
}

/// First position where the leading dimensions of both shapes disagree,
/// or 0 when they never do.
pub fn first_mismatch(source: &[Option<usize>], target: &[TDim]) -> usize {
    if source.len() < target.len() {
        return 0;
    }
    source.iter().zip(target.iter()).position(|(s, t)| !dim_matches(*s, *t)).unwrap_or(0)
}

/// Position in `source` where the trailing dimensions agree with the
/// target again, after `mismatch`.
pub fn resync_index(source: &[Option<usize>], target: &[TDim], mismatch: usize) -> Option<usize> {
    let (n, m) = (source.len(), target.len());
    if m > n {
        return None;
    }
    source[n - m..]
        .iter()
        .zip(target.iter())
        .position(|(s, t)| dim_matches(*s, *t))
        .filter(|&ix| ix > mismatch)
        .map(|ix| ix + n - m)
}

fn known_dims(dims: &[TDim]) -> TesseraResult<TVec<i64>> {
    dims.iter()
        .map(|d| d.as_option().with_context(|| format!("Can not reshape to partially unknown shape {}", dims.iter().join("x"))))
        .collect()
}

/// Choose how to reshape a tensor of shape `source` to `target`.
pub fn plan_reshape(source: &[Option<usize>], target: &[TDim]) -> TesseraResult<ReshapePlan> {
    let (n, m) = (source.len(), target.len());
    ensure!(n >= 1 && m >= 1, "Reshape needs a batch axis, got {:?} to {:?}", source, target);
    let mismatch = first_mismatch(source, target);
    let target_unknown = target.iter().any(|d| !d.is_known());
    let source_unknown = source.iter().any(|d| d.is_none());
    if target_unknown && source_unknown && m < n && target[mismatch] == -1 {
        let resync = resync_index(source, target, mismatch);
        if resync.is_none() && mismatch == 1 {
            return Ok(ReshapePlan::Flatten);
        }
        let end = resync.unwrap_or(n + 1);
        let runs = source[mismatch..end.min(n)]
            .iter()
            .map(|d| d.is_none())
            .dedup()
            .filter(|&unknown| unknown)
            .count();
        ensure!(
            runs <= 1,
            "Reshape {:?} to {:?}: collapsing several runs of unknown dimensions is not supported",
            source,
            target
        );
        return Ok(ReshapePlan::Dynamic { start: mismatch, end });
    }
    let rest = known_dims(&target[1..])?;
    if rest.as_slice() == [-1] {
        Ok(ReshapePlan::Flatten)
    } else if !dim_matches(source[0], target[0]) {
        let has_wildcard = target.iter().any(|d| *d == -1);
        let full = target
            .iter()
            .map(|d| match d {
                TDim::Val(v) => Ok(*v),
                TDim::Unknown if !has_wildcard => Ok(-1),
                TDim::Unknown => bail!("Can not reshape to {} with both a wildcard and an unknown dimension", target.iter().join("x")),
            })
            .collect::<TesseraResult<_>>()?;
        Ok(ReshapePlan::Full(full))
    } else {
        Ok(ReshapePlan::KeepBatch(rest))
    }
}

fn target_spec(target: &Tensor) -> TesseraResult<TVec<TDim>> {
    ensure!(target.rank() == 1, "Reshape target must be a 1D shape array, got {:?}", target.shape());
    Ok(target.cast_to::<TDim>()?.as_slice::<TDim>()?.iter().copied().collect())
}

pub fn reshape(lw: &mut Lowering, node: &NodeProto, name: &str) -> TesseraResult<Lowered<Value>> {
    let input = lw.input(node, 0)?;
    let Some(target) = lw.input(node, 1)?.as_const().cloned() else {
        return node.bail("Can't reshape dynamic size");
    };
    let spec = target_spec(&target)?;
    if input.is_const() {
        debug!("{}: reshaping constant data to {}", name, spec.iter().join("x"));
        let value = lw.wire_or_fold(name, FullReshape::new(known_dims(&spec)?), &[input])?;
        return Ok(Lowered::plain(value));
    }
    let input = lw.symbolic(&input, name)?;
    ensure!(!spec.is_empty(), "Reshape {} to a scalar is not supported", name);
    if lw.ctx.changes_ordering() {
        let mut advisories = vec![];
        let mut outlet = input.outlet;
        if spec.len() >= 2 && spec[0] == TDim::Unknown && spec[1] == -1 {
            ensure!(input.rank() == 4, "Flattening {} under channel-last ordering needs a rank 4 input", name);
            let lambda_name = format!("{name}_CHW");
            debug!("{}: flattening a channel-last tensor through lambda {}", name, lambda_name);
            let function: LambdaFn = Arc::new(|t: &Tensor| t.clone().permute_axes(&[0, 3, 1, 2]));
            lw.env.lambdas.insert(name.to_string(), function);
            let shape = [0, 3, 1, 2].iter().map(|&ax| input.shape[ax]).collect();
            let lambda = Lambda::new(name.to_string(), TypedFact::dt_shape(input.datum_type, shape));
            outlet = lw.model.wire_node(lambda_name.clone(), lambda, &[outlet])?;
            advisories.push(Advisory::ChannelLastFlatten { lambda: lambda_name });
        }
        let value = lw.wire(name, Reshape::new(known_dims(&spec[1..])?), &[outlet])?;
        return Ok(Lowered::with_advisories(value, advisories));
    }
    let plan = plan_reshape(input.shape.dims(), &spec)?;
    debug!("{}: reshape {} to {} as {:?}", name, input.shape, spec.iter().join("x"), plan);
    let value = match plan {
        ReshapePlan::Dynamic { start, end } => lw.wire(name, DynamicReshape::new(start, end), &[input.outlet])?,
        ReshapePlan::Flatten => lw.wire(name, Flatten, &[input.outlet])?,
        ReshapePlan::Full(shape) => lw.wire(name, FullReshape::new(shape), &[input.outlet])?,
        ReshapePlan::KeepBatch(shape) => lw.wire(name, Reshape::new(shape), &[input.outlet])?,
    };
    Ok(Lowered::plain(value))
}
