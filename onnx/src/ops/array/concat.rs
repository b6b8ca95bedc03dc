use crate::layout::Lowered;
use crate::ops::Lowering;
use crate::pb::NodeProto;
use crate::value::Value;
use tessera_core::internal::*;
use tessera_core::ops::array::{Concatenate, TypedConcat};

fn common_type(node: &NodeProto, inputs: &[Value]) -> TesseraResult<DatumType> {
    let types = inputs.iter().map(|v| v.datum_type()).collect::<TVec<_>>();
    if types.contains(&DatumType::TDim) {
        return Ok(DatumType::TDim);
    }
    match DatumType::super_type_for(&types) {
        Some(dt) => Ok(dt),
        None => node.bail(&format!("no common type for {types:?}")),
    }
}

pub fn concat(lw: &mut Lowering, node: &NodeProto, name: &str, axis: i64) -> TesseraResult<Lowered<Value>> {
    let inputs = (0..node.inputs.len()).map(|ix| lw.input(node, ix)).collect::<TesseraResult<TVec<_>>>()?;
    node.expect(!inputs.is_empty(), "at least one input")?;
    if inputs.iter().all(Value::is_const) {
        debug!("{}: concatenating constant data", name);
        let dt = common_type(node, &inputs)?;
        return Ok(Lowered::plain(lw.wire_or_fold(name, TypedConcat::new(axis, dt), &inputs)?));
    }
    if inputs.len() == 1 {
        return Ok(Lowered::plain(inputs[0].clone()));
    }
    let tensors = inputs.iter().map(|v| lw.symbolic(v, name)).collect::<TesseraResult<TVec<_>>>()?;
    let types = tensors.iter().map(|t| t.datum_type).collect::<TVec<_>>();
    let outlets = tensors.iter().map(|t| t.outlet).collect::<TVec<_>>();
    let native = inputs.iter().all(|v| !v.is_const()) && types.iter().all(|&dt| dt == types[0]);
    let value = if native {
        lw.wire(name, Concatenate::new(axis), &outlets)?
    } else {
        let Some(dt) = DatumType::super_type_for(&types) else {
            return node.bail(&format!("no common type for {types:?}"));
        };
        debug!("{}: concatenating mixed inputs as {:?}", name, dt);
        lw.wire(name, TypedConcat::new(axis, dt), &outlets)?
    };
    Ok(Lowered::plain(value))
}
