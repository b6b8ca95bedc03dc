use crate::internal::*;
use crate::ops::resolve_axis;

fn concat_fact(axis: i64, datum_type: DatumType, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
    ensure!(!inputs.is_empty(), "Concatenation needs at least one input");
    let rank = inputs[0].rank();
    ensure!(inputs.iter().all(|f| f.rank() == rank), "Concatenating tensors of different ranks");
    let axis = resolve_axis(axis, rank)?;
    let mut shape = inputs[0].shape.to_tvec();
    for input in &inputs[1..] {
        for (ix, (acc, dim)) in shape.iter_mut().zip(input.shape.iter()).enumerate() {
            if ix == axis {
                *acc = acc.zip(*dim).map(|(a, b)| a + b);
            } else {
                match (*acc, *dim) {
                    (Some(a), Some(b)) if a != b => {
                        bail!("Concatenation: mismatched dimension on axis {}: {} vs {}", ix, a, b)
                    }
                    (None, known) => *acc = known,
                    _ => (),
                }
            }
        }
    }
    Ok(TypedFact::dt_shape(datum_type, shape.into_iter().collect()))
}

fn concat_tensors(axis: i64, inputs: &[Arc<Tensor>]) -> TesseraResult<Tensor> {
    let rank = inputs.first().map(|t| t.rank()).unwrap_or(0);
    Tensor::concat(resolve_axis(axis, rank)?, inputs)
}

/// Concatenation of tensors sharing a datum type.
#[derive(Debug, Clone, new, PartialEq, Eq, Hash)]
pub struct Concatenate {
    pub axis: i64,
}

impl TargetOp for Concatenate {
    fn name(&self) -> Cow<'_, str> {
        "Concatenate".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(vec![format!("axis: {}", self.axis)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        ensure!(!inputs.is_empty(), "Concatenation needs at least one input");
        let dt = inputs[0].datum_type;
        if let Some(other) = inputs.iter().find(|f| f.datum_type != dt) {
            bail!("Concatenate expects a single datum type, got {:?} and {:?}", dt, other.datum_type)
        }
        concat_fact(self.axis, dt, inputs)
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        Ok(concat_tensors(self.axis, &inputs)?.into_arc_tensor())
    }
}

/// Concatenation casting every input to `datum_type` first.
#[derive(Debug, Clone, new, PartialEq, Eq, Hash)]
pub struct TypedConcat {
    pub axis: i64,
    pub datum_type: DatumType,
}

impl TargetOp for TypedConcat {
    fn name(&self) -> Cow<'_, str> {
        "TypedConcat".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(vec![format!("axis: {}, datum_type: {:?}", self.axis, self.datum_type)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        concat_fact(self.axis, self.datum_type, inputs)
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        let casted = inputs
            .iter()
            .map(|t| Ok(t.cast_to_dt(self.datum_type)?.into_owned().into_arc_tensor()))
            .collect::<TesseraResult<Vec<_>>>()?;
        Ok(concat_tensors(self.axis, &casted)?.into_arc_tensor())
    }
}
