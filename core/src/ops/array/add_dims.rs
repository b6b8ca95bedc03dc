use crate::internal::*;

/// Insert an axis of size 1. A negative `axis` counts from the end of the
/// output shape.
#[derive(Debug, Clone, Copy, new, PartialEq, Eq, Hash)]
pub struct ExpandDims {
    pub axis: isize,
}

impl ExpandDims {
    fn resolved_axis(&self, rank: usize) -> TesseraResult<usize> {
        let axis = if self.axis < 0 { self.axis + rank as isize + 1 } else { self.axis };
        ensure!(
            0 <= axis && axis as usize <= rank,
            "Can not insert axis {} in a tensor of rank {}",
            self.axis,
            rank
        );
        Ok(axis as usize)
    }
}

impl TargetOp for ExpandDims {
    fn name(&self) -> Cow<'_, str> {
        "ExpandDims".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(vec![format!("axis: {}", self.axis)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        check_input_arity(inputs, 1)?;
        let axis = self.resolved_axis(inputs[0].rank())?;
        let mut shape = inputs[0].shape.to_tvec();
        shape.insert(axis, Some(1));
        Ok(TypedFact::dt_shape(inputs[0].datum_type, shape.into_iter().collect()))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        let input = args_1!(inputs);
        let axis = self.resolved_axis(input.rank())?;
        Ok(input.into_tensor().insert_axis(axis)?.into_arc_tensor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_axis_appends() {
        let op = ExpandDims::new(-1);
        let fact = TypedFact::shape(DatumType::F32, &[None, Some(3)]);
        assert_eq!(op.output_fact(&[&fact]).unwrap().shape.to_string(), "?x3x1");
        let output = op.eval(tvec!(rctensor1(&[1f32, 2.]))).unwrap();
        assert_eq!(output.shape(), &[2, 1]);
    }

    #[test]
    fn axis_out_of_range() {
        assert!(ExpandDims::new(3).eval(tvec!(rctensor1(&[1f32]))).is_err());
    }
}
