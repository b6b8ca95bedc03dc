use crate::layout::{AxisOrdering, Lowered};
use crate::ops::Lowering;
use crate::pb::NodeProto;
use crate::value::Value;
use tessera_core::internal::*;
use tessera_core::ops::resize::{Resize, ResizeMethod};

fn method(node: &NodeProto, mode: &str) -> TesseraResult<ResizeMethod> {
    match mode {
        "nearest" => Ok(ResizeMethod::Nearest),
        "cubic" => Ok(ResizeMethod::Bicubic),
        "linear" => Ok(ResizeMethod::Bilinear),
        _ => node.bail_attr("mode", &format!("unsupported resize method {mode}")),
    }
}

/// Output spatial size from the scales or sizes input, checked against the
/// `[n, h, w, c]` shape of the channel-last input.
fn spatial_size(
    lw: &Lowering,
    node: &NodeProto,
    channel_last: &ShapeFact,
) -> TesseraResult<[usize; 2]> {
    let scales = lw.input_opt(node, 2)?.map(|s| lw.konst(&s)).transpose()?.filter(|s| !s.is_empty());
    if let Some(scales) = scales {
        let scales = scales.cast_to::<f64>()?;
        let scales = scales.as_slice::<f64>()?;
        node.expect(scales.len() == 4, "four scales")?;
        if scales[0] != 1.0 || scales[1] != 1.0 {
            return node.bail("Resize of channels or batch dim not supported");
        }
        let (Some(h), Some(w)) = (channel_last[1], channel_last[2]) else {
            return node.bail("resizing by scales needs known spatial dimensions");
        };
        return Ok([(scales[2] * h as f64) as usize, (scales[3] * w as f64) as usize]);
    }
    let Some(sizes) = lw.input_opt(node, 3)? else {
        return node.bail("expected scales or sizes");
    };
    let sizes = lw.ints(&sizes)?;
    node.expect(sizes.len() == 4, "four sizes")?;
    let keeps = |dim: Option<usize>, size: i64| dim.is_none_or(|d| d as i64 == size);
    if !keeps(channel_last[0], sizes[0]) || !keeps(channel_last[3], sizes[1]) {
        return node.bail("Resize of channels or batch dim not supported");
    }
    let h = usize::try_from(sizes[2]).with_context(|| format!("Invalid resize height {}", sizes[2]))?;
    let w = usize::try_from(sizes[3]).with_context(|| format!("Invalid resize width {}", sizes[3]))?;
    Ok([h, w])
}

/// Spatial resize of a feature map. Inputs are `[x, roi, scales, sizes]`.
pub fn resize(lw: &mut Lowering, node: &NodeProto, name: &str, mode: &str) -> TesseraResult<Lowered<Value>> {
    let input = lw.input(node, 0)?;
    match lw.input_opt(node, 1)? {
        None => (),
        Some(Value::Const(roi)) if roi.is_empty() => (),
        Some(_) => return node.bail("Resize with roi not supported"),
    }
    let method = method(node, mode)?;
    node.expect(input.rank() == 4, "a rank 4 input")?;
    let input = Value::Symbolic(lw.symbolic(&input, name)?);
    let resize_name =
        if lw.ctx.ordering == AxisOrdering::ChannelLast { name.to_string() } else { format!("{name}_resize") };
    lw.to_channel_last(&input, &format!("{name}_channel_last"))?
        .and_then(|nhwc| {
            let size = spatial_size(lw, node, &nhwc.shape())?;
            debug!("{}: resize to {:?} with {:?}", name, size, method);
            Ok(Lowered::plain(lw.wire_or_fold(&resize_name, Resize::new(size, method), &[nhwc])?))
        })?
        .and_then(|resized| lw.from_channel_last(&resized, name))
}
