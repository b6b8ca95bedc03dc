use crate::internal::*;
use ndarray::Axis;

/// Take slices of the data along `axis`, numpy `take` style.
///
/// Indices are either baked in the op or fed as a second input. Negative
/// indices count from the end of the axis.
#[derive(Debug, Clone, new)]
pub struct Gather {
    pub axis: usize,
    pub indices: Option<Arc<Tensor>>,
}

fn output_shape<D: Clone>(data: &[D], axis: usize, indices: &[D]) -> TVec<D> {
    data[..axis].iter().chain(indices.iter()).chain(data[axis + 1..].iter()).cloned().collect()
}

fn normalized_indices(indices: &Tensor, dim: usize) -> TesseraResult<TVec<usize>> {
    let indices = indices.cast_to::<i64>()?;
    indices
        .as_slice::<i64>()?
        .iter()
        .map(|&ix| {
            let fixed = if ix < 0 { ix + dim as i64 } else { ix };
            if 0 <= fixed && (fixed as usize) < dim {
                Ok(fixed as usize)
            } else {
                bail!("Gather index {} out of bounds for axis of size {}", ix, dim)
            }
        })
        .collect()
}

pub(crate) fn gather(data: &Tensor, axis: usize, indices: &Tensor) -> TesseraResult<Tensor> {
    ensure!(axis < data.rank(), "Gather axis {} out of range for rank {}", axis, data.rank());
    let ixs = normalized_indices(indices, data.shape()[axis])?;
    let shape = output_shape(data.shape(), axis, indices.shape());
    if ixs.is_empty() {
        return Tensor::zero_dt(data.datum_type(), &shape);
    }
    fn eval_t<T: Datum>(data: &Tensor, axis: usize, ixs: &[usize]) -> TesseraResult<Tensor> {
        let view = data.to_array_view::<T>()?;
        let slices = ixs.iter().map(|&ix| view.index_axis(Axis(axis), ix)).collect::<Vec<_>>();
        Ok(ndarray::stack(Axis(axis), &slices)?.into_tensor())
    }
    let stacked = dispatch_datum!(eval_t(data.datum_type())(data, axis, &ixs))?;
    stacked.into_shape(&shape)
}

impl Gather {
    fn indices_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<ShapeFact> {
        match &self.indices {
            Some(indices) => {
                check_input_arity(inputs, 1)?;
                Ok(ShapeFact::from_known(indices.shape()))
            }
            None => {
                check_input_arity(inputs, 2)?;
                Ok(inputs[1].shape.clone())
            }
        }
    }
}

impl TargetOp for Gather {
    fn name(&self) -> Cow<'_, str> {
        "Gather".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        let mut info = vec![format!("axis: {}", self.axis)];
        if let Some(indices) = &self.indices {
            info.push(format!("indices: {:?}", indices));
        }
        Ok(info)
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        let indices = self.indices_fact(inputs)?;
        let data = inputs[0];
        ensure!(self.axis < data.rank(), "Gather axis {} out of range for rank {}", self.axis, data.rank());
        if let Some(idt) = inputs.get(1).map(|f| f.datum_type) {
            ensure!(idt.is_integer(), "Gather indices must be integers, got {:?}", idt);
        }
        let shape = output_shape(&data.shape[..], self.axis, &indices[..]).into_iter().collect();
        Ok(TypedFact::dt_shape(data.datum_type, shape))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        let (data, indices) = match &self.indices {
            Some(indices) => (args_1!(inputs), indices.clone()),
            None => args_2!(inputs),
        };
        Ok(gather(&data, self.axis, &indices)?.into_arc_tensor())
    }
}

/// Dense lookup table: every index of the input selects a row of `table`.
#[derive(Debug, Clone, new)]
pub struct Embedding {
    pub table: Arc<Tensor>,
}

impl TargetOp for Embedding {
    fn name(&self) -> Cow<'_, str> {
        "Embedding".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(vec![format!("table: {:?}", self.table.shape())])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        check_input_arity(inputs, 1)?;
        ensure!(self.table.rank() == 2, "Embedding table must be 2D, got {:?}", self.table.shape());
        ensure!(
            inputs[0].datum_type.is_integer(),
            "Embedding indices must be integers, got {:?}",
            inputs[0].datum_type
        );
        let shape = inputs[0].shape.iter().copied().chain(std::iter::once(Some(self.table.shape()[1]))).collect();
        Ok(TypedFact::dt_shape(self.table.datum_type(), shape))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        let indices = args_1!(inputs);
        Ok(gather(&self.table, 0, &indices)?.into_arc_tensor())
    }
}
