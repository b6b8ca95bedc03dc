//! The target graph.
//!
//! A `TargetModel` is built append-only: every node is wired after its
//! inputs, so the node list is always in topological order.
use crate::internal::*;
use crate::ops::konst::Const;
use crate::ops::source::Source;

mod fact;

pub use self::fact::{ShapeFact, TypedFact};

/// Reference to the (single) output of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, new)]
pub struct OutletId {
    pub node: usize,
}

impl fmt::Display for OutletId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "#{}", self.node)
    }
}

#[derive(Clone, Debug)]
pub struct TargetNode {
    pub id: usize,
    pub name: String,
    pub op: Box<dyn TargetOp>,
    pub inputs: TVec<OutletId>,
    pub fact: TypedFact,
}

impl TargetNode {
    pub fn op(&self) -> &dyn TargetOp {
        &*self.op
    }

    pub fn op_as<O: TargetOp>(&self) -> Option<&O> {
        self.op().downcast_ref::<O>()
    }

    pub fn op_is<O: TargetOp>(&self) -> bool {
        self.op_as::<O>().is_some()
    }
}

impl fmt::Display for TargetNode {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "#{} \"{}\" {}", self.id, self.name, self.op.name())
    }
}

#[derive(Clone, Debug, Default)]
pub struct TargetModel {
    nodes: Vec<TargetNode>,
    inputs: Vec<OutletId>,
    outputs: Vec<OutletId>,
}

impl TargetModel {
    pub fn nodes(&self) -> &[TargetNode] {
        &self.nodes
    }

    pub fn node(&self, id: usize) -> &TargetNode {
        &self.nodes[id]
    }

    pub fn node_by_name(&self, name: impl AsRef<str>) -> TesseraResult<&TargetNode> {
        let name = name.as_ref();
        self.nodes.iter().find(|n| n.name == name).with_context(|| format!("No node found for name: \"{name}\""))
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| &*n.name)
    }

    /// A node name starting with `prefix`, suffixed if needed to be unique.
    pub fn unique_name(&self, prefix: impl Into<String>) -> String {
        let prefix = prefix.into();
        if self.node_by_name(&prefix).is_err() {
            return prefix;
        }
        (1..).map(|i| format!("{prefix}.{i}")).find(|n| self.node_by_name(n).is_err()).unwrap_or(prefix)
    }

    pub fn add_source(&mut self, name: impl Into<String>, fact: TypedFact) -> TesseraResult<OutletId> {
        let outlet = self.add_node(name.into(), Box::new(Source::new(fact.clone())), tvec!(), fact)?;
        self.inputs.push(outlet);
        Ok(outlet)
    }

    pub fn add_const(&mut self, name: impl Into<String>, v: impl IntoArcTensor) -> TesseraResult<OutletId> {
        let v = v.into_arc_tensor();
        let fact = TypedFact::from(v.clone());
        self.add_node(name.into(), Box::new(Const::new(v)), tvec!(), fact)
    }

    /// Append a node computing `op` on `inputs`, typing it on the way.
    pub fn wire_node(
        &mut self,
        name: impl Into<String>,
        op: impl Into<Box<dyn TargetOp>>,
        inputs: &[OutletId],
    ) -> TesseraResult<OutletId> {
        let name = name.into();
        let op = op.into();
        let fact = {
            let input_facts =
                inputs.iter().map(|o| self.outlet_fact(*o)).collect::<TesseraResult<TVec<_>>>()?;
            op.output_fact(&input_facts).with_context(|| format!("Wiring node \"{}\", {:?}", name, op))?
        };
        trace!("wiring {} {} -> {:?}", name, op.name(), fact);
        self.add_node(name, op, inputs.into(), fact)
    }

    fn add_node(
        &mut self,
        name: String,
        op: Box<dyn TargetOp>,
        inputs: TVec<OutletId>,
        fact: TypedFact,
    ) -> TesseraResult<OutletId> {
        if self.node_by_name(&name).is_ok() {
            bail!("Duplicate node name: \"{}\"", name)
        }
        let id = self.nodes.len();
        self.nodes.push(TargetNode { id, name, op, inputs, fact });
        Ok(OutletId::new(id))
    }

    pub fn outlet_fact(&self, outlet: OutletId) -> TesseraResult<&TypedFact> {
        self.nodes
            .get(outlet.node)
            .map(|n| &n.fact)
            .with_context(|| format!("Invalid outlet reference: {outlet}"))
    }

    pub fn input_outlets(&self) -> &[OutletId] {
        &self.inputs
    }

    pub fn output_outlets(&self) -> &[OutletId] {
        &self.outputs
    }

    pub fn set_output_outlets(&mut self, outputs: &[OutletId]) -> TesseraResult<()> {
        for o in outputs {
            self.outlet_fact(*o)?;
        }
        self.outputs = outputs.to_vec();
        Ok(())
    }

    /// True if the outlet can be computed without feeding any input.
    pub fn is_source_free(&self, outlet: OutletId) -> bool {
        let mut stack = vec![outlet.node];
        let mut seen = vec![false; self.nodes.len()];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id], true) {
                continue;
            }
            if self.nodes[id].op_is::<Source>() {
                return false;
            }
            stack.extend(self.nodes[id].inputs.iter().map(|i| i.node));
        }
        true
    }
}

impl fmt::Display for TargetModel {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        for node in &self.nodes {
            write!(fmt, "{node} {:?}", node.fact)?;
            if !node.inputs.is_empty() {
                write!(fmt, " <- {}", node.inputs.iter().map(|i| &*self.nodes[i.node].name).collect::<Vec<_>>().join(", "))?;
            }
            for info in node.op.info().unwrap_or_default() {
                write!(fmt, "\n    * {info}")?;
            }
            writeln!(fmt)?;
        }
        Ok(())
    }
}
