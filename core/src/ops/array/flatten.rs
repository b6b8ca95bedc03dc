use crate::internal::*;

/// Collapse every non-batch axis: `[b, d1, .., dn] -> [b, d1 * .. * dn]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flatten;

impl TargetOp for Flatten {
    fn name(&self) -> Cow<'_, str> {
        "Flatten".into()
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        check_input_arity(inputs, 1)?;
        let input = inputs[0];
        ensure!(input.rank() >= 1, "Flatten needs a batch axis");
        let inner = ShapeFact::from_dims(&input.shape[1..]).volume();
        Ok(TypedFact::shape(input.datum_type, &[input.shape[0], inner]))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        let input = args_1!(inputs);
        ensure!(input.rank() >= 1, "Flatten needs a batch axis");
        let shape = [input.shape()[0], input.shape()[1..].iter().product()];
        Ok(input.into_tensor().into_shape(&shape)?.into_arc_tensor())
    }
}
