//! Operator lowering table.
use crate::env::Environment;
use crate::layout::{Lowered, LoweringContext};
use crate::pb::NodeProto;
use crate::pb_helpers::OptionExt;
use crate::value::{SymbolicTensor, Value};
use tessera_core::internal::*;

pub mod array;
pub mod resize;

/// Parameters of a `Slice` node carried as attributes (older opsets).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SliceAttributes {
    pub starts: TVec<i64>,
    pub ends: TVec<i64>,
    pub axes: TVec<i64>,
    pub steps: Option<TVec<i64>>,
}

/// Supported source operators, with their static attributes.
#[derive(Clone, Debug, PartialEq)]
pub enum OpKind {
    Transpose { perm: Option<TVec<usize>> },
    Shape,
    Gather { axis: i64, is_embedding: bool },
    Concat { axis: i64 },
    Reshape,
    Unsqueeze { axes: Option<TVec<i64>> },
    Flatten,
    Slice { attributes: Option<SliceAttributes> },
    Squeeze { axes: Option<TVec<i64>> },
    Resize { mode: String },
    Expand,
    Tile,
    Constant { value: Arc<Tensor> },
    Identity,
}

impl OpKind {
    pub fn from_proto(node: &NodeProto) -> TesseraResult<OpKind> {
        let op = match &*node.op_type {
            "Transpose" => OpKind::Transpose { perm: node.get_attr_opt_tvec("perm")? },
            "Shape" => OpKind::Shape,
            "Gather" => OpKind::Gather {
                axis: node.get_attr_opt("axis")?.unwrap_or(0),
                is_embedding: node.get_attr_opt("is_embedding")?.unwrap_or(false),
            },
            "Concat" => OpKind::Concat { axis: node.get_attr("axis")? },
            "Reshape" => OpKind::Reshape,
            "Unsqueeze" => OpKind::Unsqueeze { axes: node.get_attr_opt_tvec("axes")? },
            "Flatten" => OpKind::Flatten,
            "Slice" => OpKind::Slice { attributes: slice_attributes(node)? },
            "Squeeze" => OpKind::Squeeze { axes: node.get_attr_opt_tvec("axes")? },
            "Resize" => OpKind::Resize {
                mode: node.get_attr_opt::<String>("mode")?.unwrap_or_else(|| "nearest".into()),
            },
            "Expand" => OpKind::Expand,
            "Tile" => OpKind::Tile,
            "Constant" => OpKind::Constant { value: node.get_attr::<Tensor>("value")?.into_arc_tensor() },
            "Identity" => OpKind::Identity,
            _ => node.bail("unsupported operator")?,
        };
        Ok(op)
    }
}

fn slice_attributes(node: &NodeProto) -> TesseraResult<Option<SliceAttributes>> {
    node.get_attr_opt_tvec::<i64>("axes")?.and_try(|axes| {
        let starts = node.get_attr_tvec("starts")?;
        let ends = node.get_attr_tvec("ends")?;
        let steps = node.get_attr_opt_tvec("steps")?;
        node.expect(starts.len() == axes.len() && ends.len() == axes.len(), "as many starts and ends as axes")?;
        Ok(SliceAttributes { starts, ends, axes, steps })
    })
}

/// What a lowering routine works with: the run settings, the values
/// lowered so far, and the target graph under construction.
pub struct Lowering<'a> {
    pub ctx: &'a LoweringContext,
    pub env: &'a mut Environment,
    pub model: &'a mut TargetModel,
}

impl Lowering<'_> {
    /// Value of the `ix`-th input of `node`.
    pub fn input(&self, node: &NodeProto, ix: usize) -> TesseraResult<Value> {
        match node.input_opt(ix) {
            Some(id) => Ok(self.env.get(id)?.clone()),
            None => node.bail(&format!("missing input #{ix}")),
        }
    }

    /// Value of an optional input: `None` if absent or left empty.
    pub fn input_opt(&self, node: &NodeProto, ix: usize) -> TesseraResult<Option<Value>> {
        node.input_opt(ix).map(|id| Ok(self.env.get(id)?.clone())).transpose()
    }

    pub fn symbolic(&mut self, value: &Value, name: &str) -> TesseraResult<SymbolicTensor> {
        self.env.ensure_symbolic(self.model, value, name)
    }

    pub fn konst(&self, value: &Value) -> TesseraResult<Arc<Tensor>> {
        self.env.ensure_const(self.model, value)
    }

    /// Integer data of a value, folding it if needed.
    pub fn ints(&self, value: &Value) -> TesseraResult<TVec<i64>> {
        let t = self.konst(value)?;
        let t = t.cast_to::<i64>()?;
        Ok(t.as_slice::<i64>()?.iter().copied().collect())
    }

    pub fn wire(
        &mut self,
        name: &str,
        op: impl Into<Box<dyn TargetOp>>,
        inputs: &[OutletId],
    ) -> TesseraResult<Value> {
        let outlet = self.model.wire_node(name, op, inputs)?;
        Value::symbolic(self.model, outlet)
    }

    /// Evaluate `op` right away when every input is a constant, wire it in
    /// the graph otherwise.
    pub fn wire_or_fold(
        &mut self,
        name: &str,
        op: impl Into<Box<dyn TargetOp>>,
        inputs: &[Value],
    ) -> TesseraResult<Value> {
        let op = op.into();
        if let Some(tensors) = inputs.iter().map(|v| v.as_const().cloned()).collect::<Option<TVec<_>>>() {
            debug!("{}: folding {}", name, op.name());
            let output = op
                .eval_with_session(&self.env.session(), tensors)
                .with_context(|| format!("Folding {} {:?}", name, op))?;
            return Ok(Value::Const(output));
        }
        let outlets = inputs
            .iter()
            .map(|v| Ok(self.symbolic(v, name)?.outlet))
            .collect::<TesseraResult<TVec<_>>>()?;
        self.wire(name, op, &outlets)
    }
}

/// Lower one source node, returning the value of its (first) output.
///
/// `name` is the display name of the node: the main target node is given
/// this name, helper nodes are suffixed.
pub fn lower_node(
    ctx: &LoweringContext,
    env: &mut Environment,
    model: &mut TargetModel,
    node: &NodeProto,
    name: &str,
) -> TesseraResult<Lowered<Value>> {
    let op = OpKind::from_proto(node)?;
    debug!("lowering {} as {:?}", name, op);
    let mut lw = Lowering { ctx, env, model };
    match op {
        OpKind::Transpose { perm } => array::transpose(&mut lw, node, name, perm),
        OpKind::Shape => array::shape(&mut lw, node),
        OpKind::Gather { axis, is_embedding } => array::gather(&mut lw, node, name, axis, is_embedding),
        OpKind::Concat { axis } => array::concat(&mut lw, node, name, axis),
        OpKind::Reshape => crate::reshape::reshape(&mut lw, node, name),
        OpKind::Unsqueeze { axes } => array::unsqueeze(&mut lw, node, name, axes),
        OpKind::Flatten => array::flatten(&mut lw, node, name),
        OpKind::Slice { attributes } => array::slice(&mut lw, node, name, attributes),
        OpKind::Squeeze { axes } => array::squeeze(&mut lw, node, name, axes),
        OpKind::Resize { mode } => resize::resize(&mut lw, node, name, &mode),
        OpKind::Expand => array::expand(&mut lw, node, name),
        OpKind::Tile => array::tile(&mut lw, node, name),
        OpKind::Constant { value } => Ok(Lowered::plain(Value::Const(value))),
        OpKind::Identity => Ok(Lowered::plain(lw.input(node, 0)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(json: &str) -> NodeProto {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parse_op_kinds() {
        let gather = node(r#"{ "op_type": "Gather", "inputs": ["d", "i"], "outputs": ["y"],
                               "attributes": [ { "name": "axis", "int": 1 } ] }"#);
        assert_eq!(OpKind::from_proto(&gather).unwrap(), OpKind::Gather { axis: 1, is_embedding: false });
        let resize = node(r#"{ "op_type": "Resize", "inputs": ["x"], "outputs": ["y"] }"#);
        assert_eq!(OpKind::from_proto(&resize).unwrap(), OpKind::Resize { mode: "nearest".into() });
        let slice = node(r#"{ "op_type": "Slice", "inputs": ["x"], "outputs": ["y"],
                              "attributes": [ { "name": "axes", "ints": [0] }, { "name": "starts", "ints": [2] },
                                              { "name": "ends", "ints": [2147483647] } ] }"#);
        let OpKind::Slice { attributes: Some(attrs) } = OpKind::from_proto(&slice).unwrap() else {
            panic!("expected slice attributes")
        };
        assert_eq!(attrs.ends.as_slice(), &[2147483647]);
        assert_eq!(attrs.steps, None);
    }

    #[test]
    fn unknown_operator_is_refused() {
        let conv = node(r#"{ "name": "conv1", "op_type": "Conv", "inputs": ["x"], "outputs": ["y"] }"#);
        let err = OpKind::from_proto(&conv).unwrap_err();
        assert!(err.to_string().contains("conv1"), "{err}");
    }

    #[test]
    fn concat_needs_axis() {
        let concat = node(r#"{ "op_type": "Concat", "inputs": ["a"], "outputs": ["y"] }"#);
        assert!(OpKind::from_proto(&concat).is_err());
    }
}
