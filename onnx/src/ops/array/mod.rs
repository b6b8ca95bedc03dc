mod concat;
mod gather;
mod slice;
mod squeeze;

pub use self::concat::concat;
pub use self::gather::gather;
pub use self::slice::slice;
pub use self::squeeze::{squeeze, unsqueeze};

use crate::layout::Lowered;
use crate::ops::Lowering;
use crate::pb::NodeProto;
use crate::value::Value;
use tessera_core::internal::*;
use tessera_core::ops::array::{Flatten, Tile};
use tessera_core::ops::math::Mul;

pub fn transpose(
    lw: &mut Lowering,
    node: &NodeProto,
    name: &str,
    perm: Option<TVec<usize>>,
) -> TesseraResult<Lowered<Value>> {
    let input = lw.input(node, 0)?;
    let perm = perm.unwrap_or_else(|| (0..input.rank()).rev().collect());
    lw.permute(&input, &perm, name)
}

/// Static shape of the input, as data. Unknown dimensions make it a
/// partial shape array.
pub fn shape(lw: &mut Lowering, node: &NodeProto) -> TesseraResult<Lowered<Value>> {
    let shape = lw.input(node, 0)?.shape();
    let array = match shape.as_concrete() {
        Some(dims) => tensor1(&dims.iter().map(|&d| d as i64).collect::<Vec<_>>()),
        None => tensor1(&shape.iter().map(|&d| TDim::from(d)).collect::<Vec<_>>()),
    };
    Ok(Lowered::plain(array.into()))
}

/// Flatten all non-batch axes, after bringing the input back to the source
/// axis ordering.
pub fn flatten(lw: &mut Lowering, node: &NodeProto, name: &str) -> TesseraResult<Lowered<Value>> {
    node.expect(node.inputs.len() == 1, "a single input")?;
    let input = lw.input(node, 0)?;
    let input = Value::Symbolic(lw.symbolic(&input, name)?);
    // Only permuted back to channel-first when the target ordering differs.
    // Under channel-first the flattened order is already the source one.
    lw.from_target_layout(&input, &format!("{name}_permute"))?
        .and_then(|chw| Ok(Lowered::plain(lw.wire_or_fold(name, Flatten, &[chw])?)))
}

/// Broadcast the input to a shape by multiplying it with ones.
pub fn expand(lw: &mut Lowering, node: &NodeProto, name: &str) -> TesseraResult<Lowered<Value>> {
    node.expect(node.inputs.len() == 2, "two inputs")?;
    let input = lw.input(node, 0)?;
    let input = lw.symbolic(&input, name)?;
    let shape = lw.input(node, 1)?;
    let shape = lw.konst(&shape)?;
    let shape = shape.cast_to::<i32>()?;
    let dims = shape
        .as_slice::<i32>()?
        .iter()
        .map(|&d| usize::try_from(d).with_context(|| format!("Invalid expand dimension {d}")))
        .collect::<TesseraResult<Vec<_>>>()?;
    let ones_name = lw.model.unique_name(format!("{name}_ones"));
    let ones = lw.model.add_const(ones_name, Tensor::ones_dt(input.datum_type, &dims)?)?;
    Ok(Lowered::plain(lw.wire(name, Mul, &[input.outlet, ones])?))
}

pub fn tile(lw: &mut Lowering, node: &NodeProto, name: &str) -> TesseraResult<Lowered<Value>> {
    let input = lw.input(node, 0)?;
    let repeats = lw.input(node, 1)?;
    let value = match &repeats {
        Value::Const(r) => {
            let multiples = r
                .cast_to::<i64>()?
                .as_slice::<i64>()?
                .iter()
                .map(|&m| usize::try_from(m).with_context(|| format!("Invalid tile multiple {m}")))
                .collect::<TesseraResult<TVec<_>>>()?;
            lw.wire_or_fold(name, Tile::new(Some(multiples)), &[input])?
        }
        Value::Symbolic(_) => lw.wire_or_fold(name, Tile::new(None), &[input, repeats.clone()])?,
    };
    Ok(Lowered::plain(value))
}
