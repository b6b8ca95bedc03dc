use crate::layout::Lowered;
use crate::ops::Lowering;
use crate::pb::NodeProto;
use crate::value::Value;
use tessera_core::internal::*;
use tessera_core::ops::array::{Embedding, Gather};
use tessera_core::ops::resolve_axis;

pub fn gather(
    lw: &mut Lowering,
    node: &NodeProto,
    name: &str,
    axis: i64,
    is_embedding: bool,
) -> TesseraResult<Lowered<Value>> {
    let data = lw.input(node, 0)?;
    let indices = lw.input(node, 1)?;
    let axis = resolve_axis(axis, data.rank())?;
    if axis > 3 {
        return node.bail(&format!("Can't gather by axis more than 3, got {axis}"));
    }
    let value = match (&data, &indices) {
        (Value::Const(_), Value::Const(ixs)) if !is_embedding => {
            debug!("{}: gather from constant data", name);
            let gathered = lw.wire_or_fold(name, Gather::new(axis, Some(ixs.clone())), &[data.clone()])?;
            match gathered {
                // shape arrays become plain integers when they are fully known
                Value::Const(t) if t.datum_type() == DatumType::TDim => {
                    let ints = t.cast_to::<i32>().ok().map(|ints| ints.into_owned());
                    ints.map(Value::from).unwrap_or(Value::Const(t))
                }
                other => other,
            }
        }
        _ if is_embedding => {
            let Value::Const(table) = &data else {
                return node.bail("embedding weights must be constant");
            };
            if table.rank() != 2 {
                return node.bail("Cannot transform gather into embedding with non 2D array");
            }
            lw.wire_or_fold(name, Embedding::new(table.clone()), &[indices.clone()])?
        }
        _ => {
            let data = lw.symbolic(&data, name)?;
            match &indices {
                Value::Const(ixs) => lw.wire(name, Gather::new(axis, Some(ixs.clone())), &[data.outlet])?,
                Value::Symbolic(ixs) => lw.wire(name, Gather::new(axis, None), &[data.outlet, ixs.outlet])?,
            }
        }
    };
    Ok(Lowered::plain(value))
}
