use crate::internal::*;
use ndarray::Dimension;

/// Repeat the input `multiples[i]` times along each axis `i`. Without baked
/// multiples, they are read from a second input.
#[derive(Debug, Clone, new, PartialEq, Eq, Hash)]
pub struct Tile {
    pub multiples: Option<TVec<usize>>,
}

fn multiples_of(t: &Tensor) -> TesseraResult<TVec<usize>> {
    t.cast_to::<i64>()?
        .as_slice::<i64>()?
        .iter()
        .map(|&m| usize::try_from(m).with_context(|| format!("Invalid tile multiple {m}")))
        .collect()
}

impl Tile {
    fn eval_t<T: Datum>(data: &Tensor, multiples: &[usize]) -> TesseraResult<Tensor> {
        let view = data.to_array_view::<T>()?;
        let output_shape: TVec<usize> =
            view.shape().iter().zip(multiples.iter()).map(|(&d, &m)| d * m).collect();
        let output = ndarray::ArrayD::from_shape_fn(&*output_shape, |coords| {
            let coords: TVec<usize> =
                coords.slice().iter().zip(view.shape().iter()).map(|(&x, &d)| x % d).collect();
            view[&*coords].clone()
        });
        Ok(output.into_tensor())
    }
}

impl TargetOp for Tile {
    fn name(&self) -> Cow<'_, str> {
        "Tile".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(vec![format!("multiples: {:?}", self.multiples)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        let multiples = match &self.multiples {
            Some(m) => {
                check_input_arity(inputs, 1)?;
                Some(m.clone())
            }
            None => {
                check_input_arity(inputs, 2)?;
                inputs[1].konst.as_deref().map(multiples_of).transpose()?
            }
        };
        let input = inputs[0];
        let shape = match multiples {
            Some(m) => {
                ensure!(m.len() == input.rank(), "Tile multiples {:?} for rank {}", m, input.rank());
                input.shape.iter().zip(m.iter()).map(|(d, &m)| d.map(|d| d * m)).collect()
            }
            None => input.shape.iter().map(|_| None).collect(),
        };
        Ok(TypedFact::dt_shape(input.datum_type, shape))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        let (data, multiples) = match &self.multiples {
            Some(m) => (args_1!(inputs), m.clone()),
            None => {
                let (data, multiples) = args_2!(inputs);
                (data, multiples_of(&multiples)?)
            }
        };
        ensure!(multiples.len() == data.rank(), "Tile multiples {:?} for rank {}", multiples, data.rank());
        Ok(dispatch_datum!(Self::eval_t(data.datum_type())(&data, &multiples))?.into_arc_tensor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_2d() {
        let op = Tile::new(Some(tvec!(2, 1)));
        let output = op.eval(tvec!(tensor2(&[[1i32, 2]]).into_arc_tensor())).unwrap();
        assert_eq!(*output, tensor2(&[[1i32, 2], [1, 2]]));
    }

    #[test]
    fn tile_multiples_from_input() {
        let op = Tile::new(None);
        let data = TypedFact::shape(DatumType::F32, &[None, Some(3)]);
        let multiples = TypedFact::from(rctensor1(&[1i64, 2]));
        assert_eq!(op.output_fact(&[&data, &multiples]).unwrap().shape.to_string(), "?x6");
        let output = op.eval(tvec!(tensor2(&[[1f32, 2.]]).into_arc_tensor(), rctensor1(&[2i64, 2]))).unwrap();
        assert_eq!(output.shape(), &[2, 4]);
    }
}
