use crate::layout::Lowered;
use crate::ops::Lowering;
use crate::pb::NodeProto;
use crate::value::Value;
use tessera_core::internal::*;
use tessera_core::ops::array::{ExpandDims, Squeeze};

pub fn squeeze(
    lw: &mut Lowering,
    node: &NodeProto,
    name: &str,
    axes: Option<TVec<i64>>,
) -> TesseraResult<Lowered<Value>> {
    node.expect(node.inputs.len() == 1, "a single input")?;
    let input = lw.input(node, 0)?;
    let input = lw.symbolic(&input, name)?;
    // Without axes, only the dimensions known to be 1 are removed, highest
    // first so the lower indices stay valid.
    let axes: TVec<isize> = match axes.filter(|axes| !axes.is_empty()) {
        Some(axes) => tvec!(axes[0] as isize),
        None => input
            .shape
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, d)| **d == Some(1))
            .map(|(ax, _)| ax as isize)
            .collect(),
    };
    let Some((&last, rest)) = axes.split_last() else {
        debug!("{}: no unit axis in {}", name, input.shape);
        return Ok(Lowered::plain(Value::Symbolic(input)));
    };
    let mut outlet = input.outlet;
    for &axis in rest {
        outlet = lw.model.wire_node(format!("{name}_{axis}"), Squeeze::new(Some(axis)), &[outlet])?;
    }
    Ok(Lowered::plain(lw.wire(name, Squeeze::new(Some(last)), &[outlet])?))
}

pub fn unsqueeze(
    lw: &mut Lowering,
    node: &NodeProto,
    name: &str,
    axes: Option<TVec<i64>>,
) -> TesseraResult<Lowered<Value>> {
    let axes = match (node.inputs.len(), axes) {
        (1, Some(axes)) => axes,
        (1, None) => return node.bail("expected attribute 'axes'"),
        (2, _) => lw.ints(&lw.input(node, 1)?)?,
        _ => return node.bail("Number of inputs is not equal 1 for unsqueeze layer"),
    };
    let input = lw.input(node, 0)?;
    let value = match input {
        Value::Const(_) => {
            let mut value = input;
            for &axis in &axes {
                value = lw.wire_or_fold(name, ExpandDims::new(axis as isize), &[value])?;
            }
            value
        }
        Value::Symbolic(s) => {
            if axes.len() != 1 {
                return node.bail("Number of axes is not equal 1. Cannot unsqueeze");
            }
            lw.wire(name, ExpandDims::new(axes[0] as isize), &[s.outlet])?
        }
    };
    Ok(Lowered::plain(value))
}
