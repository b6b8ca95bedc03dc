use crate::layout::Lowered;
use crate::ops::{Lowering, SliceAttributes};
use crate::pb::NodeProto;
use crate::value::Value;
use tessera_core::internal::*;
use tessera_core::ops::array::{SliceSpec, StridedSlice};
use tessera_core::ops::resolve_axis;

/// Ends at or past this value mean "up to the end of the axis".
const OPEN_END: i64 = i32::MAX as i64;

/// Per-axis slicing of a tensor of rank `rank`. Axes not named in
/// `axes` are kept whole.
pub fn slice_specs(rank: usize, params: &SliceAttributes) -> TesseraResult<TVec<SliceSpec>> {
    let SliceAttributes { starts, ends, axes, steps } = params;
    ensure!(
        starts.len() == axes.len() && ends.len() == axes.len(),
        "Slice: {} starts and {} ends for {} axes",
        starts.len(),
        ends.len(),
        axes.len()
    );
    if let Some(steps) = steps {
        ensure!(steps.len() == axes.len(), "Slice: {} steps for {} axes", steps.len(), axes.len());
    }
    let axes = axes.iter().map(|&a| resolve_axis(a, rank)).collect::<TesseraResult<TVec<_>>>()?;
    let specs = (0..rank)
        .map(|axis| match axes.iter().position(|&a| a == axis) {
            Some(ix) => SliceSpec::new(
                Some(starts[ix]),
                Some(ends[ix]).filter(|&end| end < OPEN_END),
                steps.as_ref().map(|s| s[ix]),
            ),
            None => SliceSpec::full(),
        })
        .collect();
    Ok(specs)
}

fn slice_inputs(lw: &Lowering, node: &NodeProto) -> TesseraResult<SliceAttributes> {
    let starts = lw.ints(&lw.input(node, 1)?)?;
    let ends = lw.ints(&lw.input(node, 2)?)?;
    let axes = match lw.input_opt(node, 3)? {
        Some(axes) => lw.ints(&axes)?,
        None => (0..starts.len() as i64).collect(),
    };
    let steps = lw.input_opt(node, 4)?.map(|steps| lw.ints(&steps)).transpose()?;
    Ok(SliceAttributes { starts, ends, axes, steps })
}

pub fn slice(
    lw: &mut Lowering,
    node: &NodeProto,
    name: &str,
    attributes: Option<SliceAttributes>,
) -> TesseraResult<Lowered<Value>> {
    if lw.ctx.changes_ordering() {
        return node.bail(&format!("slicing is not supported under {} ordering", lw.ctx.ordering));
    }
    let input = lw.input(node, 0)?;
    let params = match attributes {
        Some(attributes) => attributes,
        None => slice_inputs(lw, node)?,
    };
    let op = StridedSlice::new(slice_specs(input.rank(), &params)?);
    Ok(Lowered::plain(lw.wire_or_fold(name, op, &[input])?))
}
