use crate::internal::*;

/// Graph input. The plan feeds it directly, it never gets evaluated.
#[derive(Debug, Clone, new, PartialEq)]
pub struct Source {
    pub fact: TypedFact,
}

impl TargetOp for Source {
    fn name(&self) -> Cow<'_, str> {
        "Source".into()
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        check_input_arity(inputs, 0)?;
        Ok(self.fact.clone())
    }

    fn eval(&self, _inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        bail!("Source nodes are fed by the plan, not evaluated")
    }
}
