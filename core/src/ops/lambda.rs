use crate::internal::*;

/// Custom computation, looked up by `name` in the session when the graph
/// runs. The output fact is declared at wiring time.
#[derive(Debug, Clone, new)]
pub struct Lambda {
    pub name: String,
    pub output: TypedFact,
}

impl TargetOp for Lambda {
    fn name(&self) -> Cow<'_, str> {
        "Lambda".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(vec![format!("function: {}", self.name)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        check_input_arity(inputs, 1)?;
        ensure!(
            inputs[0].rank() == self.output.rank(),
            "Lambda {} declared output rank {} for an input of rank {}",
            self.name,
            self.output.rank(),
            inputs[0].rank()
        );
        Ok(self.output.clone())
    }

    fn eval(&self, _inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        bail!("Lambda {} needs a session to run", self.name)
    }

    fn eval_with_session(
        &self,
        session: &SessionState,
        inputs: TVec<Arc<Tensor>>,
    ) -> TesseraResult<Arc<Tensor>> {
        let input = args_1!(inputs);
        let function = session
            .lambdas
            .get(&self.name)
            .with_context(|| format!("No function registered for lambda {}", self.name))?;
        let output = function(&input)?;
        ensure!(
            self.output.shape.matches(output.shape()),
            "Lambda {} produced shape {:?}, declared {}",
            self.name,
            output.shape(),
            self.output.shape
        );
        Ok(output.into_arc_tensor())
    }
}
