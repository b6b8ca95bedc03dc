use crate::internal::*;

/// Remove one axis of size 1, or every axis of size 1 when `axis` is unset.
#[derive(Debug, Clone, Copy, new, PartialEq, Eq, Hash)]
pub struct Squeeze {
    pub axis: Option<isize>,
}

impl Squeeze {
    fn resolved_axis(&self, rank: usize) -> TesseraResult<Option<usize>> {
        self.axis.map(|axis| crate::ops::resolve_axis(axis as i64, rank)).transpose()
    }
}

impl TargetOp for Squeeze {
    fn name(&self) -> Cow<'_, str> {
        "Squeeze".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(vec![format!("axis: {:?}", self.axis)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        check_input_arity(inputs, 1)?;
        let input = inputs[0];
        let shape = if let Some(axis) = self.resolved_axis(input.rank())? {
            match input.shape[axis] {
                Some(1) | None => (),
                Some(d) => bail!("Can not squeeze axis {} of size {}", axis, d),
            }
            let mut shape = input.shape.to_tvec();
            shape.remove(axis);
            shape.into_iter().collect()
        } else {
            ensure!(input.shape.is_concrete(), "Can not squeeze unit axes of partially known shape {}", input.shape);
            input.shape.iter().copied().filter(|d| *d != Some(1)).collect()
        };
        Ok(TypedFact::dt_shape(input.datum_type, shape))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        let input = args_1!(inputs);
        let output = if let Some(axis) = self.resolved_axis(input.rank())? {
            input.into_tensor().remove_axis(axis)?
        } else {
            let shape: TVec<usize> = input.shape().iter().copied().filter(|&d| d != 1).collect();
            input.into_tensor().into_shape(&shape)?
        };
        Ok(output.into_arc_tensor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squeeze_all() {
        let input = Tensor::zero_dt(DatumType::F32, &[1, 3, 1, 2]).unwrap();
        let output = Squeeze::new(None).eval(tvec!(input.into_arc_tensor())).unwrap();
        assert_eq!(output.shape(), &[3, 2]);
    }

    #[test]
    fn squeeze_one_axis() {
        let fact = TypedFact::shape(DatumType::F32, &[None, Some(1), Some(4)]);
        assert_eq!(Squeeze::new(Some(-2)).output_fact(&[&fact]).unwrap().shape.to_string(), "?x4");
        assert!(Squeeze::new(Some(2)).output_fact(&[&fact]).is_err());
    }

    #[test]
    fn squeeze_all_needs_known_dims() {
        let fact = TypedFact::shape(DatumType::F32, &[None, Some(1), Some(3)]);
        assert!(Squeeze::new(None).output_fact(&[&fact]).is_err());
        let fact = TypedFact::shape(DatumType::F32, &[Some(1), Some(1), Some(3)]);
        assert_eq!(Squeeze::new(None).output_fact(&[&fact]).unwrap().shape.to_string(), "3");
    }
}
