use crate::internal::*;

/// Numpy-style broadcast of two partially known shapes.
pub fn broadcast_shapes(a: &ShapeFact, b: &ShapeFact) -> TesseraResult<ShapeFact> {
    let rank = a.rank().max(b.rank());
    let pad = |s: &ShapeFact, ix: usize| {
        if ix + s.rank() < rank { Some(1) } else { s[ix + s.rank() - rank] }
    };
    (0..rank)
        .map(|ix| match (pad(a, ix), pad(b, ix)) {
            (Some(1), other) | (other, Some(1)) => Ok(other),
            (None, other) | (other, None) => Ok(other),
            (Some(x), Some(y)) if x == y => Ok(Some(x)),
            (Some(x), Some(y)) => bail!("Can not broadcast {} against {} ({} vs {})", a, b, x, y),
        })
        .collect()
}

/// Element-wise product, with broadcasting. Operands of different datum
/// types are cast to their common super type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Mul;

impl Mul {
    fn eval_t<T>(a: &Tensor, b: &Tensor) -> TesseraResult<Tensor>
    where
        T: Datum + Copy + std::ops::Mul<Output = T>,
    {
        let a = a.to_array_view::<T>()?;
        let b = b.to_array_view::<T>()?;
        Ok((&a * &b).into_tensor())
    }
}

impl TargetOp for Mul {
    fn name(&self) -> Cow<'_, str> {
        "Mul".into()
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        check_input_arity(inputs, 2)?;
        let dt = inputs[0]
            .datum_type
            .common_super_type(inputs[1].datum_type)
            .with_context(|| format!("No common type for {:?} and {:?}", inputs[0].datum_type, inputs[1].datum_type))?;
        ensure!(dt.is_number(), "Mul on {:?}", dt);
        Ok(TypedFact::dt_shape(dt, broadcast_shapes(&inputs[0].shape, &inputs[1].shape)?))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        let (a, b) = args_2!(inputs);
        let dt = a
            .datum_type()
            .common_super_type(b.datum_type())
            .with_context(|| format!("No common type for {:?} and {:?}", a.datum_type(), b.datum_type()))?;
        let a = a.cast_to_dt(dt)?;
        let b = b.cast_to_dt(dt)?;
        Ok(dispatch_numbers!(Self::eval_t(dt)(&a, &b))?.into_arc_tensor())
    }
}
