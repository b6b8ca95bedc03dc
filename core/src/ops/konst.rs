use crate::internal::*;

#[derive(Debug, Clone, new, PartialEq)]
pub struct Const(pub Arc<Tensor>);

impl TargetOp for Const {
    fn name(&self) -> Cow<'_, str> {
        "Const".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(vec![format!("{:?}", self.0)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        check_input_arity(inputs, 0)?;
        Ok(Arc::clone(&self.0).into())
    }

    fn eval(&self, _inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        Ok(self.0.clone())
    }
}
