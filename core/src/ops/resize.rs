//! Spatial resampling of channel-last feature maps.
use crate::internal::*;
use ndarray::{ArrayD, ArrayViewD, Axis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeMethod {
    Nearest,
    Bilinear,
    Bicubic,
}

/// Resize the two spatial axes of a `[n, h, w, c]` tensor to `size`.
///
/// Sampling uses half-pixel centres. Nearest keeps the input datum type,
/// the interpolating methods produce f32.
#[derive(Debug, Clone, new, PartialEq, Eq, Hash)]
pub struct Resize {
    pub size: [usize; 2],
    pub method: ResizeMethod,
}

type Kernel = Vec<(TVec<usize>, TVec<f32>)>;

fn source_coord(i: usize, scale: f32) -> f32 {
    (i as f32 + 0.5) * scale - 0.5
}

fn nearest_indices(in_len: usize, out_len: usize) -> Vec<usize> {
    let scale = in_len as f32 / out_len as f32;
    (0..out_len).map(|i| (((i as f32 + 0.5) * scale).floor() as usize).min(in_len - 1)).collect()
}

fn bilinear_kernel(in_len: usize, out_len: usize) -> Kernel {
    let scale = in_len as f32 / out_len as f32;
    (0..out_len)
        .map(|i| {
            let x = source_coord(i, scale);
            let floor = x.floor();
            let lower = floor.max(0.0) as usize;
            let upper = (x.ceil().max(0.0) as usize).min(in_len - 1);
            let lerp = x - floor;
            (tvec!(lower, upper), tvec!(1.0 - lerp, lerp))
        })
        .collect()
}

fn cubic_weights(t: f32) -> [f32; 4] {
    const A: f32 = -0.5;
    let far = |x: f32| ((A * x - 5.0 * A) * x + 8.0 * A) * x - 4.0 * A;
    let near = |x: f32| ((A + 2.0) * x - (A + 3.0)) * x * x + 1.0;
    [far(t + 1.0), near(t), near(1.0 - t), far(2.0 - t)]
}

fn bicubic_kernel(in_len: usize, out_len: usize) -> Kernel {
    let scale = in_len as f32 / out_len as f32;
    (0..out_len)
        .map(|i| {
            let x = source_coord(i, scale);
            let floor = x.floor();
            let taps = (-1..3)
                .map(|k| (floor as isize + k).clamp(0, in_len as isize - 1) as usize)
                .collect();
            (taps, cubic_weights(x - floor).into_iter().collect())
        })
        .collect()
}

fn apply_kernel(input: ArrayViewD<f32>, axis: usize, kernel: &Kernel) -> ArrayD<f32> {
    let mut shape = input.shape().to_vec();
    shape[axis] = kernel.len();
    let mut output = ArrayD::<f32>::zeros(shape);
    for (o, (taps, weights)) in kernel.iter().enumerate() {
        let mut lane = output.index_axis_mut(Axis(axis), o);
        for (&tap, &weight) in taps.iter().zip(weights.iter()) {
            lane.scaled_add(weight, &input.index_axis(Axis(axis), tap));
        }
    }
    output
}

impl Resize {
    fn kernel(&self, in_len: usize, out_len: usize) -> Kernel {
        match self.method {
            ResizeMethod::Bicubic => bicubic_kernel(in_len, out_len),
            _ => bilinear_kernel(in_len, out_len),
        }
    }

    pub fn resize(&self, input: &Tensor) -> TesseraResult<Tensor> {
        ensure!(input.rank() == 4, "Resize expects a rank 4 channel-last tensor, got {:?}", input.shape());
        ensure!(
            input.shape()[1] > 0 && input.shape()[2] > 0,
            "Can not resize an empty image {:?}",
            input.shape()
        );
        if self.method == ResizeMethod::Nearest {
            fn nearest_t<T: Datum>(input: &Tensor, size: [usize; 2]) -> TesseraResult<Tensor> {
                let view = input.to_array_view::<T>()?;
                let rows = nearest_indices(view.shape()[1], size[0]);
                let cols = nearest_indices(view.shape()[2], size[1]);
                Ok(view.select(Axis(1), &rows).select(Axis(2), &cols).into_tensor())
            }
            return dispatch_datum!(nearest_t(input.datum_type())(input, self.size));
        }
        let input = input.cast_to::<f32>()?;
        let view = input.to_array_view::<f32>()?;
        let (h, w) = (view.shape()[1], view.shape()[2]);
        let rows = apply_kernel(view, 1, &self.kernel(h, self.size[0]));
        let output = apply_kernel(rows.view(), 2, &self.kernel(w, self.size[1]));
        Ok(output.into_tensor())
    }
}

impl TargetOp for Resize {
    fn name(&self) -> Cow<'_, str> {
        "Resize".into()
    }

    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(vec![format!("size: {:?}, method: {:?}", self.size, self.method)])
    }

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact> {
        check_input_arity(inputs, 1)?;
        let input = inputs[0];
        ensure!(input.rank() == 4, "Resize expects a rank 4 channel-last tensor, got {}", input.shape);
        let dt = if self.method == ResizeMethod::Nearest {
            input.datum_type
        } else {
            ensure!(input.datum_type.is_number(), "Can not interpolate {:?}", input.datum_type);
            DatumType::F32
        };
        let shape = ShapeFact::from_dims(&[input.shape[0], Some(self.size[0]), Some(self.size[1]), input.shape[3]]);
        Ok(TypedFact::dt_shape(dt, shape))
    }

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>> {
        let input = args_1!(inputs);
        Ok(self.resize(&input)?.into_arc_tensor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn image(h: usize, w: usize) -> Tensor {
        let data = (0..h * w).map(|x| x as f32).collect::<Vec<_>>();
        Tensor::from_shape(&[1, h, w, 1], &data).unwrap()
    }

    #[test]
    fn nearest_upsample() {
        let op = Resize::new([4, 4], ResizeMethod::Nearest);
        let output = op.resize(&image(2, 2)).unwrap();
        assert_eq!(
            output.as_slice::<f32>().unwrap(),
            &[0., 0., 1., 1., 0., 0., 1., 1., 2., 2., 3., 3., 2., 2., 3., 3.]
        );
    }

    #[test]
    fn bilinear_upsample() {
        let op = Resize::new([1, 4], ResizeMethod::Bilinear);
        let output = op.resize(&Tensor::from_shape(&[1, 1, 2, 1], &[0f32, 4.]).unwrap()).unwrap();
        let expected = [0f32, 1., 3., 4.];
        for (o, e) in output.as_slice::<f32>().unwrap().iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*o, *e, epsilon = 1e-5);
        }
    }

    #[test]
    fn cubic_weights_sum_to_one() {
        for t in [0.0f32, 0.25, 0.5, 0.9] {
            assert_abs_diff_eq!(cubic_weights(t).iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn identity_resize_is_noop() {
        for method in [ResizeMethod::Nearest, ResizeMethod::Bilinear, ResizeMethod::Bicubic] {
            let input = image(3, 5);
            let output = Resize::new([3, 5], method).resize(&input).unwrap();
            output.close_enough(&input, true).unwrap();
        }
    }

    #[test]
    fn fact_keeps_batch_and_channels() {
        let op = Resize::new([8, 6], ResizeMethod::Bicubic);
        let fact = TypedFact::shape(DatumType::I32, &[None, Some(4), Some(3), Some(2)]);
        let output = op.output_fact(&[&fact]).unwrap();
        assert_eq!(output.shape.to_string(), "?x8x6x2");
        assert_eq!(output.datum_type, DatumType::F32);
    }
}
