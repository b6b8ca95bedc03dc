//! Reference evaluation of a target graph.
use std::borrow::Borrow;

use crate::internal::*;
use crate::ops::source::Source;

/// Runtime resources shared by every node of a run: the custom functions
/// `Lambda` nodes refer to by name.
#[derive(Clone, Default)]
pub struct SessionState {
    pub lambdas: HashMap<String, LambdaFn>,
}

impl fmt::Debug for SessionState {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut names = self.lambdas.keys().collect::<Vec<_>>();
        names.sort();
        fmt.debug_struct("SessionState").field("lambdas", &names).finish()
    }
}

/// Nodes needed to compute `outputs`, in evaluation order.
fn eval_order(model: &TargetModel, outputs: &[OutletId]) -> TesseraResult<Vec<usize>> {
    let mut needed = vec![false; model.nodes().len()];
    let mut stack = outputs.iter().map(|o| o.node).collect::<Vec<_>>();
    while let Some(id) = stack.pop() {
        ensure!(id < needed.len(), "Invalid node reference #{}", id);
        if std::mem::replace(&mut needed[id], true) {
            continue;
        }
        stack.extend(model.node(id).inputs.iter().map(|i| i.node));
    }
    // nodes are appended after their inputs
    Ok((0..needed.len()).filter(|&id| needed[id]).collect())
}

#[derive(Debug, Clone)]
pub struct SimplePlan<M: Borrow<TargetModel>> {
    pub model: M,
    pub outputs: Vec<OutletId>,
    pub order: Vec<usize>,
}

impl<M: Borrow<TargetModel>> SimplePlan<M> {
    /// A plan computing all the model outputs.
    pub fn new(model: M) -> TesseraResult<SimplePlan<M>> {
        let outputs = model.borrow().output_outlets().to_vec();
        ensure!(!outputs.is_empty(), "Model has no declared output");
        Self::new_for_outputs(model, &outputs)
    }

    /// A plan computing only the specified outlets.
    pub fn new_for_outputs(model: M, outputs: &[OutletId]) -> TesseraResult<SimplePlan<M>> {
        let order = eval_order(model.borrow(), outputs)?;
        Ok(SimplePlan { model, outputs: outputs.to_vec(), order })
    }

    pub fn model(&self) -> &TargetModel {
        self.model.borrow()
    }

    pub fn run(&self, inputs: TVec<Tensor>) -> TesseraResult<TVec<Arc<Tensor>>> {
        self.run_with_session(&SessionState::default(), inputs)
    }

    /// Run the plan, feeding the model inputs in declaration order.
    pub fn run_with_session(
        &self,
        session: &SessionState,
        inputs: TVec<Tensor>,
    ) -> TesseraResult<TVec<Arc<Tensor>>> {
        let model = self.model();
        ensure!(
            inputs.len() == model.input_outlets().len(),
            "Model expects {} inputs, got {}",
            model.input_outlets().len(),
            inputs.len()
        );
        let mut fed = HashMap::new();
        for (outlet, input) in model.input_outlets().iter().zip(inputs) {
            let fact = model.outlet_fact(*outlet)?;
            ensure!(
                fact.matches(&input),
                "Input \"{}\" expects {:?}, got {:?}",
                model.node(outlet.node).name,
                fact,
                input
            );
            fed.insert(outlet.node, input.into_arc_tensor());
        }
        self.run_fed(session, fed)
    }

    fn run_fed(
        &self,
        session: &SessionState,
        mut fed: HashMap<usize, Arc<Tensor>>,
    ) -> TesseraResult<TVec<Arc<Tensor>>> {
        let model = self.model();
        let mut values: Vec<Option<Arc<Tensor>>> = vec![None; model.nodes().len()];
        for &id in &self.order {
            let node = model.node(id);
            let value = if node.op_is::<Source>() {
                fed.remove(&id).with_context(|| format!("No value fed for source {node}"))?
            } else {
                let inputs = node
                    .inputs
                    .iter()
                    .map(|i| values[i.node].clone().with_context(|| format!("Missing input {i} for {node}")))
                    .collect::<TesseraResult<TVec<_>>>()?;
                node.op
                    .eval_with_session(session, inputs)
                    .with_context(|| format!("Evaluating {node}"))?
            };
            trace!("{node} -> {value:?}");
            values[id] = Some(value);
        }
        self.outputs
            .iter()
            .map(|o| values[o.node].clone().with_context(|| format!("Output {o} was not computed")))
            .collect()
    }
}

/// Compute an outlet at translation time. Fails if its value depends on a
/// graph input.
pub fn eval_outlet(
    model: &TargetModel,
    session: &SessionState,
    outlet: OutletId,
) -> TesseraResult<Arc<Tensor>> {
    ensure!(
        model.is_source_free(outlet),
        "Node {} depends on a graph input and can not be evaluated eagerly",
        model.node(outlet.node)
    );
    let plan = SimplePlan::new_for_outputs(model, &[outlet])?;
    let mut outputs = plan.run_fed(session, HashMap::new())?;
    outputs.pop().context("Plan produced no output")
}
