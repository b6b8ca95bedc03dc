//! Values of the source nodes lowered so far.
use crate::value::{SymbolicTensor, Value};
use tessera_core::internal::*;
use tessera_core::plan::eval_outlet;

/// Append-only map from source value ids to their lowered `Value`, plus
/// the side tables filled while lowering.
#[derive(Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    /// Custom functions backing `Lambda` nodes, by target node name.
    pub lambdas: HashMap<String, LambdaFn>,
    /// Display name of the target node produced for each source value id.
    pub names: HashMap<String, String>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut ids = self.values.keys().collect::<Vec<_>>();
        ids.sort();
        let mut lambdas = self.lambdas.keys().collect::<Vec<_>>();
        lambdas.sort();
        fmt.debug_struct("Environment").field("values", &ids).field("lambdas", &lambdas).finish()
    }
}

impl Environment {
    pub fn insert(&mut self, id: impl Into<String>, value: Value) -> TesseraResult<()> {
        let id = id.into();
        ensure!(!self.values.contains_key(&id), "Value \"{}\" is already defined", id);
        trace!("env: {} = {}", id, value);
        self.values.insert(id, value);
        Ok(())
    }

    pub fn get(&self, id: &str) -> TesseraResult<&Value> {
        self.values.get(id).with_context(|| format!("Unknown value \"{id}\""))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Runtime resources for evaluating the graph built so far.
    pub fn session(&self) -> SessionState {
        SessionState { lambdas: self.lambdas.clone() }
    }

    /// Graph tensor for `value`, adding a `Const` node named after
    /// `<name>_const` for constant data.
    ///
    /// Shape arrays are materialized as i64. A shape array with unknown
    /// entries has no graph counterpart.
    pub fn ensure_symbolic(
        &self,
        model: &mut TargetModel,
        value: &Value,
        name: &str,
    ) -> TesseraResult<SymbolicTensor> {
        match value {
            Value::Symbolic(s) => Ok(s.clone()),
            Value::Const(t) => {
                let t = if t.datum_type() == DatumType::TDim {
                    t.cast_to::<i64>()
                        .context("Shape array with unknown dimensions can not be materialized")?
                        .into_owned()
                        .into_arc_tensor()
                } else {
                    t.clone()
                };
                let const_name = model.unique_name(format!("{name}_const"));
                debug!("materializing {} as {}", t.dump(false), const_name);
                let outlet = model.add_const(const_name, t)?;
                SymbolicTensor::for_outlet(model, outlet)
            }
        }
    }

    /// Data for `value`, evaluating the graph when it is symbolic. Fails
    /// if the tensor depends on a graph input.
    pub fn ensure_const(&self, model: &TargetModel, value: &Value) -> TesseraResult<Arc<Tensor>> {
        match value {
            Value::Const(t) => Ok(t.clone()),
            Value::Symbolic(s) => {
                debug!("folding {} eagerly", model.node(s.outlet.node));
                eval_outlet(model, &self.session(), s.outlet)
            }
        }
    }
}
