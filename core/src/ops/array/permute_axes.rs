use crate::internal::*;
use itertools::Itertools;

fn check_permutation(perm: &[usize], rank: usize) -> TesseraResult<()> {
    ensure!(
        perm.len() == rank && perm.iter().sorted().copied().eq(0..rank),
        "{:?} is not a permutation of {} axes",
        perm,
        rank
    );
    Ok(())
}

fn permute_fact(input: &TypedFact, perm: &[usize]) -> TesseraResult<TypedFact> {
    check_permutation(perm, input.rank())?;
    let shape = perm.iter().map(|&ax| input.shape[ax]).collect();
    Ok(TypedFact::dt_shape(input.datum_type, shape))
}

/// Semantic permutation of the non-batch axes.
///
/// `dims` are 1-based: output axis `i + 1` is input axis `dims[i]`, the batch
/// axis stays in front.
#[derive(Debug, Clone, new, PartialEq, Eq, Hash)]
pub struct Permute {
    pub dims: TVec<usize>,
}

impl Permute {
    pub fn full_permutation(&self) -> TVec<usize> {
        std::iter::once(0).chain(self.dims.iter().copied()).collect()
    }
}

impl TargetOp for Permute {
    fn name(&self) -> Cow<'_, str> {
        "Permute".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(vec![format!("dims: {:?}", self.dims)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        check_input_arity(inputs, 1)?;
        ensure!(!self.dims.contains(&0), "Permute can not move the batch axis");
        permute_fact(inputs[0], &self.full_permutation())
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        let input = args_1!(inputs);
        Ok(input.into_tensor().permute_axes(&self.full_permutation())?.into_arc_tensor())
    }
}

/// Raw transposition of all axes, batch included.
#[derive(Debug, Clone, new, PartialEq, Eq, Hash)]
pub struct Transpose {
    pub perm: TVec<usize>,
}

impl TargetOp for Transpose {
    fn name(&self) -> Cow<'_, str> {
        "Transpose".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(vec![format!("perm: {:?}", self.perm)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        check_input_arity(inputs, 1)?;
        permute_fact(inputs[0], &self.perm)
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        let input = args_1!(inputs);
        Ok(input.into_tensor().permute_axes(&self.perm)?.into_arc_tensor())
    }
}
