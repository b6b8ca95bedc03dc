//! Materialized result of a source node.
use tessera_core::internal::*;

/// Handle on a tensor computed by the target graph.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolicTensor {
    pub outlet: OutletId,
    pub datum_type: DatumType,
    pub shape: ShapeFact,
}

impl SymbolicTensor {
    pub fn for_outlet(model: &TargetModel, outlet: OutletId) -> TesseraResult<SymbolicTensor> {
        let fact = model.outlet_fact(outlet)?;
        Ok(SymbolicTensor { outlet, datum_type: fact.datum_type, shape: fact.shape.clone() })
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }
}

/// Either data known at translation time, or a tensor of the target graph.
///
/// The variant is fixed once the value is built: folding a symbolic tensor
/// into data is always an explicit evaluation (`Environment::ensure_const`),
/// and constants only become graph tensors through
/// `Environment::ensure_symbolic`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Const(Arc<Tensor>),
    Symbolic(SymbolicTensor),
}

impl Value {
    pub fn symbolic(model: &TargetModel, outlet: OutletId) -> TesseraResult<Value> {
        Ok(Value::Symbolic(SymbolicTensor::for_outlet(model, outlet)?))
    }

    pub fn shape(&self) -> ShapeFact {
        match self {
            Value::Const(t) => ShapeFact::from_known(t.shape()),
            Value::Symbolic(s) => s.shape.clone(),
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            Value::Const(t) => t.rank(),
            Value::Symbolic(s) => s.rank(),
        }
    }

    pub fn datum_type(&self) -> DatumType {
        match self {
            Value::Const(t) => t.datum_type(),
            Value::Symbolic(s) => s.datum_type,
        }
    }

    pub fn is_const(&self) -> bool {
        matches!(self, Value::Const(_))
    }

    pub fn as_const(&self) -> Option<&Arc<Tensor>> {
        match self {
            Value::Const(t) => Some(t),
            Value::Symbolic(_) => None,
        }
    }
}

impl From<Tensor> for Value {
    fn from(t: Tensor) -> Value {
        Value::Const(t.into_arc_tensor())
    }
}

impl From<Arc<Tensor>> for Value {
    fn from(t: Arc<Tensor>) -> Value {
        Value::Const(t)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Const(t) => write!(fmt, "const {}", t.dump(false)),
            Value::Symbolic(s) => write!(fmt, "{} {},{}", s.outlet, s.shape, s.datum_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbolic_value_reads_outlet_fact() {
        let mut model = TargetModel::default();
        let s = model.add_source("x", TypedFact::shape(DatumType::F32, &[None, Some(3)])).unwrap();
        let v = Value::symbolic(&model, s).unwrap();
        assert_eq!(v.shape().to_string(), "?x3");
        assert_eq!(v.datum_type(), DatumType::F32);
        assert!(!v.is_const());
    }
}
