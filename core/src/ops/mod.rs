//! Target primitives.
use downcast_rs::Downcast;

use crate::internal::*;
use crate::plan::SessionState;

#[macro_use]
mod macros;

pub mod array;
pub mod konst;
pub mod lambda;
pub mod math;
pub mod resize;
pub mod source;

/// A custom computation attached to the graph by name, for layout fixups no
/// built-in primitive covers.
pub type LambdaFn = Arc<dyn Fn(&Tensor) -> TesseraResult<Tensor> + Send + Sync>;

pub fn check_input_arity(inputs: &[impl Sized], expected: usize) -> TesseraResult<()> {
    if inputs.len() != expected {
        bail!("Wrong input number. Op expects {}, node has {}.", expected, inputs.len())
    } else {
        Ok(())
    }
}

/// A primitive of the target graph.
///
/// Every primitive has exactly one output. `output_fact` types the output
/// from the input facts at wiring time, `eval` computes it when the graph
/// runs.
pub trait TargetOp: fmt::Debug + dyn_clone::DynClone + Downcast + Send + Sync + 'static {
    fn name(&self) -> Cow<'_, str>;

    fn output_fact(&self, inputs: &[&TypedFact]) -> TesseraResult<TypedFact>;

    fn eval(&self, inputs: TVec<Arc<Tensor>>) -> TesseraResult<Arc<Tensor>>;

    /// Ops depending on the session (custom closures) override this one.
    fn eval_with_session(
        &self,
        _session: &SessionState,
        inputs: TVec<Arc<Tensor>>,
    ) -> TesseraResult<Arc<Tensor>> {
        self.eval(inputs)
    }

    /// Short human readable description of the op parameters.
    fn info(&self) -> TesseraResult<Vec<String>> {
        Ok(vec![])
    }
}

downcast_rs::impl_downcast!(TargetOp);
dyn_clone::clone_trait_object!(TargetOp);

impl<O: TargetOp> From<O> for Box<dyn TargetOp> {
    fn from(it: O) -> Box<dyn TargetOp> {
        Box::new(it)
    }
}

/// Normalize a possibly negative axis against `rank`.
pub fn resolve_axis(axis: i64, rank: usize) -> TesseraResult<usize> {
    let r = rank as i64;
    if 0 <= axis && axis < r {
        Ok(axis as usize)
    } else if -r <= axis && axis < 0 {
        Ok((axis + r) as usize)
    } else {
        bail!("Illegal combination of values for rank and axis: {} and {}", rank, axis)
    }
}
