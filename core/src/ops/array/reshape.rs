use crate::internal::*;

/// Resolve a reshape target holding at most one `-1` against a known volume.
fn resolve_shape(spec: &[i64], volume: usize) -> TesseraResult<TVec<usize>> {
    let wildcards = spec.iter().filter(|&&d| d == -1).count();
    ensure!(wildcards <= 1, "Reshape to {:?}: at most one -1 is allowed", spec);
    ensure!(spec.iter().all(|&d| d >= -1), "Reshape to {:?}: invalid dimension", spec);
    let known: usize = spec.iter().filter(|&&d| d >= 0).map(|&d| d as usize).product();
    let shape = spec
        .iter()
        .map(|&d| {
            if d >= 0 {
                Ok(d as usize)
            } else if known != 0 && volume % known == 0 {
                Ok(volume / known)
            } else {
                bail!("Can not reshape {} elements to {:?}", volume, spec)
            }
        })
        .collect::<TesseraResult<TVec<usize>>>()?;
    ensure!(
        shape.iter().product::<usize>() == volume,
        "Can not reshape {} elements to {:?}",
        volume,
        spec
    );
    Ok(shape)
}

/// Fact-level counterpart of `resolve_shape`: the wildcard is only known if
/// the input volume is.
fn spec_fact(spec: &[i64], volume: Option<usize>) -> TesseraResult<ShapeFact> {
    if let Some(volume) = volume {
        return Ok(ShapeFact::from_known(&resolve_shape(spec, volume)?));
    }
    ensure!(spec.iter().filter(|&&d| d == -1).count() <= 1, "Reshape to {:?}: at most one -1 is allowed", spec);
    Ok(spec.iter().map(|&d| if d >= 0 { Some(d as usize) } else { None }).collect())
}

/// Batch-preserving reshape: `shape` describes the non-batch axes.
#[derive(Debug, Clone, new, PartialEq, Eq, Hash)]
pub struct Reshape {
    pub shape: TVec<i64>,
}

impl TargetOp for Reshape {
    fn name(&self) -> Cow<'_, str> {
        "Reshape".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(vec![format!("target_shape: {:?}", self.shape)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        check_input_arity(inputs, 1)?;
        let input = inputs[0];
        ensure!(input.rank() >= 1, "Reshape needs a batch axis");
        let inner = ShapeFact::from_dims(&input.shape[1..]).volume();
        let inner = spec_fact(&self.shape, inner)?;
        let shape = std::iter::once(input.shape[0]).chain(inner.iter().copied()).collect();
        Ok(TypedFact::dt_shape(input.datum_type, shape))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        let input = args_1!(inputs);
        ensure!(input.rank() >= 1, "Reshape needs a batch axis");
        let batch = input.shape()[0];
        let inner = resolve_shape(&self.shape, input.shape()[1..].iter().product())?;
        let shape: TVec<usize> = std::iter::once(batch).chain(inner).collect();
        Ok(input.into_tensor().into_shape(&shape)?.into_arc_tensor())
    }
}

/// Unconstrained reshape, batch axis included.
#[derive(Debug, Clone, new, PartialEq, Eq, Hash)]
pub struct FullReshape {
    pub shape: TVec<i64>,
}

impl TargetOp for FullReshape {
    fn name(&self) -> Cow<'_, str> {
        "FullReshape".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(vec![format!("shape: {:?}", self.shape)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        check_input_arity(inputs, 1)?;
        Ok(TypedFact::dt_shape(inputs[0].datum_type, spec_fact(&self.shape, inputs[0].shape.volume())?))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        let input = args_1!(inputs);
        let shape = resolve_shape(&self.shape, input.len())?;
        Ok(input.into_tensor().into_shape(&shape)?.into_arc_tensor())
    }
}

/// Reshape reading the live input shape: axes before `keep_leading` and from
/// `keep_trailing_from` on are kept, everything in between is collapsed into
/// a single axis.
#[derive(Debug, Clone, new, PartialEq, Eq, Hash)]
pub struct DynamicReshape {
    pub keep_leading: usize,
    pub keep_trailing_from: usize,
}

impl DynamicReshape {
    fn split(&self, rank: usize) -> TesseraResult<(usize, usize)> {
        let trail = self.keep_trailing_from.min(rank);
        ensure!(
            self.keep_leading <= trail,
            "Invalid dynamic reshape bounds {}..{} for rank {}",
            self.keep_leading,
            self.keep_trailing_from,
            rank
        );
        Ok((self.keep_leading, trail))
    }
}

impl TargetOp for DynamicReshape {
    fn name(&self) -> Cow<'_, str> {
        "DynamicReshape".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(vec![format!("collapse: {}..{}", self.keep_leading, self.keep_trailing_from)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        check_input_arity(inputs, 1)?;
        let input = inputs[0];
        let (lead, trail) = self.split(input.rank())?;
        let middle = ShapeFact::from_dims(&input.shape[lead..trail]).volume();
        let shape = input.shape[..lead]
            .iter()
            .copied()
            .chain(std::iter::once(middle))
            .chain(input.shape[trail..].iter().copied())
            .collect();
        Ok(TypedFact::dt_shape(input.datum_type, shape))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        let input = args_1!(inputs);
        let (lead, trail) = self.split(input.rank())?;
        let live = input.shape();
        let shape: TVec<usize> = live[..lead]
            .iter()
            .copied()
            .chain(std::iter::once(live[lead..trail].iter().product()))
            .chain(live[trail..].iter().copied())
            .collect();
        Ok(input.into_tensor().into_shape(&shape)?.into_arc_tensor())
    }
}
