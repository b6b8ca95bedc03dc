use std::io::Read;
use std::path::Path;

use tessera_core::internal::*;

use crate::env::Environment;
use crate::layout::{Advisory, LoweringContext};
use crate::ops::{lower_node, Lowering};
use crate::pb;
use crate::value::Value;

/// Load a source graph from its JSON serialization.
pub fn for_reader<R: Read>(r: R) -> TesseraResult<pb::GraphProto> {
    Ok(serde_json::from_reader(r)?)
}

pub fn for_path(p: impl AsRef<Path>) -> TesseraResult<pb::GraphProto> {
    let p = p.as_ref();
    let file = std::fs::File::open(p).with_context(|| format!("Opening {}", p.display()))?;
    for_reader(std::io::BufReader::new(file)).with_context(|| format!("Parsing {}", p.display()))
}

/// Outcome of a successful translation.
#[derive(Clone, Debug)]
pub struct Translation {
    pub model: TargetModel,
    /// Lowered value of every source value id.
    pub env: Environment,
    /// Advisories raised while lowering, with the name of the node.
    pub advisories: Vec<(String, Advisory)>,
}

impl Translation {
    pub fn value(&self, id: &str) -> TesseraResult<&Value> {
        self.env.get(id)
    }

    pub fn session(&self) -> SessionState {
        self.env.session()
    }

    /// Evaluate the target graph on `inputs`, in graph input order.
    pub fn run(&self, inputs: TVec<Tensor>) -> TesseraResult<TVec<Arc<Tensor>>> {
        SimplePlan::new(&self.model)?.run_with_session(&self.session(), inputs)
    }
}

/// Drives the lowering of a whole source graph.
#[derive(Clone, Debug, Default, new)]
pub struct Translator {
    pub ctx: LoweringContext,
}

fn node_name(ix: usize, node: &pb::NodeProto) -> String {
    if !node.name.is_empty() {
        node.name.clone()
    } else if let Some(output) = node.outputs.first().filter(|o| !o.is_empty()) {
        output.clone()
    } else {
        format!("{}-{}", ix, node.op_type)
    }
}

impl Translator {
    pub fn translate(&self, graph: &pb::GraphProto) -> TesseraResult<Translation> {
        let mut model = TargetModel::default();
        let mut env = Environment::default();
        let mut advisories = vec![];
        for init in &graph.initializers {
            let tensor = Tensor::try_from(init).with_context(|| format!("Loading initializer {}", init.name))?;
            trace!("Initializer: {} {:?}", init.name, tensor);
            env.insert(init.name.clone(), tensor.into())?;
        }
        for input in &graph.inputs {
            if env.contains(&input.name) {
                trace!("Input: {} is initialized", input.name);
                continue;
            }
            let fact = TypedFact::try_from(input)?;
            trace!("Input: {} is a source ({:?})", input.name, fact);
            let outlet = model.add_source(input.name.clone(), fact)?;
            let source = Value::symbolic(&model, outlet)?;
            let mut lw = Lowering { ctx: &self.ctx, env: &mut env, model: &mut model };
            let lowered = lw.to_target_layout(&source, &format!("{}_{}", input.name, self.ctx.ordering))?;
            advisories.extend(lowered.advisories.into_iter().map(|a| (input.name.clone(), a)));
            env.insert(input.name.clone(), lowered.value)?;
        }
        for (ix, node) in graph.nodes.iter().enumerate() {
            let name = node_name(ix, node);
            let Some(output) = node.outputs.first().filter(|o| !o.is_empty()) else {
                return node.bail("no output");
            };
            trace!("Lowering node {} ({})", name, node.op_type);
            let lowered = lower_node(&self.ctx, &mut env, &mut model, node, &name)
                .with_context(|| format!("lowering node {name}"))?;
            for advisory in lowered.advisories {
                warn!("{}: {}", name, advisory);
                advisories.push((name.clone(), advisory));
            }
            env.names.insert(output.clone(), name);
            env.insert(output.clone(), lowered.value)?;
        }
        let mut outputs = vec![];
        for output in &graph.outputs {
            let value = env.get(output)?.clone();
            let name = env.names.get(output).cloned().unwrap_or_else(|| output.clone());
            outputs.push(env.ensure_symbolic(&mut model, &value, &name)?.outlet);
        }
        model.set_output_outlets(&outputs)?;
        Ok(Translation { model, env, advisories })
    }
}
