use crate::internal::*;
use ndarray::Axis;

/// Per-axis slicing parameters, with Python `slice` semantics: negative
/// bounds count from the end, missing bounds cover the whole axis in the
/// direction of `step`.
#[derive(Debug, Clone, Copy, Default, new, PartialEq, Eq, Hash)]
pub struct SliceSpec {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl SliceSpec {
    pub fn full() -> SliceSpec {
        SliceSpec::default()
    }

    pub fn is_full(&self) -> bool {
        self.start.is_none() && self.stop.is_none() && self.step.unwrap_or(1) == 1
    }

    /// Indices selected on an axis of length `len`.
    pub fn indices(&self, len: usize) -> TesseraResult<Vec<usize>> {
        let len = len as i64;
        let step = self.step.unwrap_or(1);
        ensure!(step != 0, "Slice step can not be zero");
        let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };
        let clamp = |bound: Option<i64>, default: i64| match bound {
            None => default,
            Some(b) if b < 0 => (b + len).max(lower),
            Some(b) => b.min(upper),
        };
        let start = clamp(self.start, if step > 0 { lower } else { upper });
        let stop = clamp(self.stop, if step > 0 { upper } else { lower });
        let mut indices = vec![];
        let mut ix = start;
        while (step > 0 && ix < stop) || (step < 0 && ix > stop) {
            indices.push(ix as usize);
            ix += step;
        }
        Ok(indices)
    }
}

/// Multi-axis slicing. Axes past the end of `specs` are kept whole.
#[derive(Debug, Clone, new, PartialEq, Eq, Hash)]
pub struct StridedSlice {
    pub specs: TVec<SliceSpec>,
}

impl StridedSlice {
    fn spec(&self, axis: usize) -> SliceSpec {
        self.specs.get(axis).copied().unwrap_or_default()
    }

    pub fn slice(&self, input: &Tensor) -> TesseraResult<Tensor> {
        ensure!(
            self.specs.len() <= input.rank(),
            "Slicing {} axes of a tensor of rank {}",
            self.specs.len(),
            input.rank()
        );
        fn slice_t<T: Datum>(input: &Tensor, op: &StridedSlice) -> TesseraResult<Tensor> {
            let mut array = input.to_array_view::<T>()?.to_owned();
            for axis in 0..array.ndim() {
                let spec = op.spec(axis);
                if spec.is_full() {
                    continue;
                }
                let indices = spec.indices(array.shape()[axis])?;
                array = array.select(Axis(axis), &indices);
            }
            Ok(array.into_tensor())
        }
        dispatch_datum!(slice_t(input.datum_type())(input, self))
    }
}

impl TargetOp for StridedSlice {
    fn name(&self) -> Cow<'_, str> {
        "StridedSlice".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(self
            .specs
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_full())
            .map(|(ax, s)| format!("axis {}: {:?}:{:?}:{:?}", ax, s.start, s.stop, s.step))
            .collect())
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        check_input_arity(inputs, 1)?;
        let input = inputs[0];
        ensure!(
            self.specs.len() <= input.rank(),
            "Slicing {} axes of a tensor of rank {}",
            self.specs.len(),
            input.rank()
        );
        let shape = input
            .shape
            .iter()
            .enumerate()
            .map(|(axis, dim)| {
                let spec = self.spec(axis);
                match dim {
                    _ if spec.is_full() => Ok(*dim),
                    Some(d) => Ok(Some(spec.indices(*d)?.len())),
                    None => Ok(None),
                }
            })
            .collect::<TesseraResult<ShapeFact>>()?;
        Ok(TypedFact::dt_shape(input.datum_type, shape))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        let input = args_1!(inputs);
        Ok(self.slice(&input)?.into_arc_tensor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn python_semantics() {
        assert_eq!(SliceSpec::new(Some(2), None, None).indices(10).unwrap(), (2..10).collect::<Vec<_>>());
        assert_eq!(SliceSpec::new(Some(-3), Some(-1), None).indices(5).unwrap(), vec![2, 3]);
        assert_eq!(SliceSpec::new(None, None, Some(-2)).indices(5).unwrap(), vec![4, 2, 0]);
        assert_eq!(SliceSpec::new(Some(7), Some(1), None).indices(5).unwrap(), Vec::<usize>::new());
        assert!(SliceSpec::new(None, None, Some(0)).indices(5).is_err());
    }

    #[test]
    fn slice_inner_axis_with_unknown_batch() {
        let op = StridedSlice::new(tvec!(SliceSpec::full(), SliceSpec::new(Some(1), Some(3), None)));
        let fact = TypedFact::shape(DatumType::F32, &[None, Some(4), Some(2)]);
        assert_eq!(op.output_fact(&[&fact]).unwrap().shape.to_string(), "?x2x2");
        let input = Tensor::from_shape(&[1, 4, 2], &[0f32, 1., 2., 3., 4., 5., 6., 7.]).unwrap();
        let output = op.eval(tvec!(input.into_arc_tensor())).unwrap();
        assert_eq!(output.as_slice::<f32>().unwrap(), &[2., 3., 4., 5.]);
    }

    proptest! {
        #[test]
        fn indices_stay_in_range(start in -12i64..12, stop in -12i64..12, step in -3i64..4, len in 0usize..10) {
            prop_assume!(step != 0);
            let indices = SliceSpec::new(Some(start), Some(stop), Some(step)).indices(len).unwrap();
            prop_assert!(indices.iter().all(|&ix| ix < len));
        }
    }
}
