use serde_json::json;
use tessera_onnx::env::Environment;
use tessera_onnx::ops::lower_node;
use tessera_onnx::pb::{GraphProto, NodeProto};
use tessera_onnx::prelude::*;

fn setup_test_logger() {
    let _ = env_logger::Builder::from_env("TESSERA_LOG").try_init();
}

fn graph(value: serde_json::Value) -> GraphProto {
    tessera_onnx::for_reader(value.to_string().as_bytes()).unwrap()
}

fn range(shape: &[usize]) -> Tensor {
    let len = shape.iter().product::<usize>();
    Tensor::from_shape(shape, &(0..len).map(|x| x as f32).collect::<Vec<_>>()).unwrap()
}

fn op_name(translation: &Translation, node: &str) -> String {
    translation.model.node_by_name(node).unwrap().op.name().to_string()
}

#[test]
fn unsqueeze_then_flatten() {
    setup_test_logger();
    let g = graph(json!({
        "inputs": [ { "name": "a", "shape": [1, 4, 6, 6] } ],
        "initializers": [ { "name": "s", "datum_type": "i64", "shape": [2], "data": [1, -1] } ],
        "nodes": [
            { "op_type": "Unsqueeze", "inputs": ["a"], "outputs": ["u"],
              "attributes": [ { "name": "axes", "ints": [0] } ] },
            { "op_type": "Reshape", "inputs": ["u", "s"], "outputs": ["y"] }
        ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    assert!(translation.advisories.is_empty());
    let y = translation.run(tvec!(range(&[1, 4, 6, 6]))).unwrap();
    assert_eq!(y[0].shape(), &[1, 144]);
    assert_eq!(*y[0], range(&[1, 144]));
}

#[test]
fn wildcard_with_unknown_batch_is_a_flatten() {
    setup_test_logger();
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 3, 4, 4] } ],
        "initializers": [ { "name": "s", "datum_type": "tdim", "shape": [2], "data": [null, -1] } ],
        "nodes": [ { "name": "flat", "op_type": "Reshape", "inputs": ["x", "s"], "outputs": ["y"] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    assert_eq!(op_name(&translation, "flat"), "Flatten");
    let fact = translation.model.outlet_fact(translation.model.output_outlets()[0]).unwrap();
    assert_eq!(fact.shape.dims(), &[None, Some(48)]);
    let y = translation.run(tvec!(range(&[1, 3, 4, 4]))).unwrap();
    assert_eq!(y[0].shape(), &[1, 48]);
}

#[test]
fn slice_up_to_the_end() {
    let g = graph(json!({
        "initializers": [ { "name": "x", "datum_type": "i64", "shape": [10], "data": [0, 1, 2, 3, 4, 5, 6, 7, 8, 9] } ],
        "nodes": [ { "op_type": "Slice", "inputs": ["x"], "outputs": ["y"],
                     "attributes": [ { "name": "axes", "ints": [0] }, { "name": "starts", "ints": [2] },
                                     { "name": "ends", "ints": [2147483647] } ] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    let expected = tensor1(&[2i64, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(translation.value("y").unwrap().as_const().map(|t| &**t), Some(&expected));
    let y = translation.run(tvec!()).unwrap();
    assert_eq!(*y[0], expected);
}

#[test]
fn slice_with_input_parameters() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 6] } ],
        "initializers": [
            { "name": "starts", "datum_type": "i64", "shape": [1], "data": [1] },
            { "name": "ends", "datum_type": "i64", "shape": [1], "data": [-1] },
            { "name": "axes", "datum_type": "i64", "shape": [1], "data": [1] },
            { "name": "steps", "datum_type": "i64", "shape": [1], "data": [2] }
        ],
        "nodes": [ { "op_type": "Slice", "inputs": ["x", "starts", "ends", "axes", "steps"], "outputs": ["y"] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    let y = translation.run(tvec!(range(&[2, 6]))).unwrap();
    assert_eq!(*y[0], tensor2(&[[1f32, 3.], [7., 9.]]));
}

#[test]
fn gather_beyond_fourth_axis_is_refused() {
    let ctx = LoweringContext::default();
    let mut model = TargetModel::default();
    let mut env = Environment::default();
    let x = model.add_source("x", TypedFact::shape(DatumType::F32, &[None, Some(2), Some(2), Some(2), Some(2)])).unwrap();
    env.insert("x", Value::symbolic(&model, x).unwrap()).unwrap();
    env.insert("i", tensor1(&[0i64]).into()).unwrap();
    let node: NodeProto = serde_json::from_value(json!({
        "name": "g", "op_type": "Gather", "inputs": ["x", "i"], "outputs": ["y"],
        "attributes": [ { "name": "axis", "int": 4 } ]
    }))
    .unwrap();
    assert!(lower_node(&ctx, &mut env, &mut model, &node, "g").is_err());
    assert!(!env.contains("y"));
    assert_eq!(model.nodes().len(), 1);
}

#[test]
fn gather_as_embedding() {
    let g = graph(json!({
        "inputs": [ { "name": "ids", "datum_type": "i64", "shape": [null, 3] } ],
        "initializers": [ { "name": "table", "datum_type": "f32", "shape": [4, 2], "data": [0, 1, 2, 3, 4, 5, 6, 7] } ],
        "nodes": [ { "name": "embed", "op_type": "Gather", "inputs": ["table", "ids"], "outputs": ["y"],
                     "attributes": [ { "name": "is_embedding", "int": 1 } ] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    assert_eq!(op_name(&translation, "embed"), "Embedding");
    let ids = Tensor::from_shape(&[1, 3], &[3i64, 0, 1]).unwrap();
    let y = translation.run(tvec!(ids)).unwrap();
    assert_eq!(y[0].shape(), &[1, 3, 2]);
    assert_eq!(y[0].as_slice::<f32>().unwrap(), &[6., 7., 0., 1., 2., 3.]);
}

#[test]
fn resize_with_roi_is_refused() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [1, 1, 2, 2] } ],
        "initializers": [
            { "name": "roi", "datum_type": "f32", "shape": [4], "data": [0, 0, 1, 1] },
            { "name": "scales", "datum_type": "f32", "shape": [4], "data": [1, 1, 2, 2] }
        ],
        "nodes": [ { "op_type": "Resize", "inputs": ["x", "roi", "scales"], "outputs": ["y"] } ],
        "outputs": ["y"]
    }));
    let err = Translator::default().translate(&g).unwrap_err();
    assert!(format!("{err:?}").contains("roi"), "{err:?}");
}

#[test]
fn nearest_resize_by_scales() {
    setup_test_logger();
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [1, 1, 2, 2] } ],
        "initializers": [ { "name": "scales", "datum_type": "f32", "shape": [4], "data": [1, 1, 2, 2] } ],
        "nodes": [ { "name": "up", "op_type": "Resize", "inputs": ["x", "", "scales"], "outputs": ["y"] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    let y = translation.run(tvec!(range(&[1, 1, 2, 2]))).unwrap();
    assert_eq!(y[0].shape(), &[1, 1, 4, 4]);
    assert_eq!(
        y[0].as_slice::<f32>().unwrap(),
        &[0., 0., 1., 1., 0., 0., 1., 1., 2., 2., 3., 3., 2., 2., 3., 3.]
    );
}

#[test]
fn linear_resize_by_sizes() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 2, 3, 3] } ],
        "initializers": [ { "name": "sizes", "datum_type": "i64", "shape": [4], "data": [1, 2, 5, 4] } ],
        "nodes": [ { "op_type": "Resize", "inputs": ["x", "", "", "sizes"], "outputs": ["y"],
                     "attributes": [ { "name": "mode", "string": "linear" } ] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    let x = Tensor::from_shape(&[1, 2, 3, 3], &[0.5f32; 18]).unwrap();
    let y = translation.run(tvec!(x)).unwrap();
    assert_eq!(y[0].shape(), &[1, 2, 5, 4]);
    for v in y[0].as_slice::<f32>().unwrap() {
        approx::assert_abs_diff_eq!(*v, 0.5, epsilon = 1e-6);
    }
}

#[test]
fn resize_of_channels_is_refused() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [1, 2, 3, 3] } ],
        "initializers": [ { "name": "sizes", "datum_type": "i64", "shape": [4], "data": [1, 4, 6, 6] } ],
        "nodes": [ { "op_type": "Resize", "inputs": ["x", "", "", "sizes"], "outputs": ["y"] } ],
        "outputs": ["y"]
    }));
    assert!(Translator::default().translate(&g).is_err());
}

#[test]
fn reshape_round_trip() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [2, 3, 4] } ],
        "initializers": [
            { "name": "flat", "datum_type": "i64", "shape": [2], "data": [2, 12] },
            { "name": "back", "datum_type": "i64", "shape": [3], "data": [2, 3, 4] }
        ],
        "nodes": [
            { "op_type": "Reshape", "inputs": ["x", "flat"], "outputs": ["f"] },
            { "op_type": "Reshape", "inputs": ["f", "back"], "outputs": ["b"] },
            { "op_type": "Reshape", "inputs": ["b", "back"], "outputs": ["y"] }
        ],
        "outputs": ["f", "y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    let outputs = translation.run(tvec!(range(&[2, 3, 4]))).unwrap();
    assert_eq!(*outputs[0], range(&[2, 12]));
    assert_eq!(*outputs[1], range(&[2, 3, 4]));
}

#[test]
fn reshape_to_dynamic_size_is_refused() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 6] }, { "name": "s", "datum_type": "i64", "shape": [2] } ],
        "nodes": [ { "op_type": "Reshape", "inputs": ["x", "s"], "outputs": ["y"] } ],
        "outputs": ["y"]
    }));
    let err = Translator::default().translate(&g).unwrap_err();
    assert!(format!("{err:?}").contains("Can't reshape dynamic size"), "{err:?}");
}

#[test]
fn shape_arithmetic_folds() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 3, 4] } ],
        "initializers": [
            { "name": "one", "datum_type": "i64", "shape": [1], "data": [1] },
            { "name": "minus_one", "datum_type": "i64", "shape": [1], "data": [-1] }
        ],
        "nodes": [
            { "op_type": "Shape", "inputs": ["x"], "outputs": ["shape"] },
            { "op_type": "Gather", "inputs": ["shape", "one"], "outputs": ["c"] },
            { "op_type": "Concat", "inputs": ["minus_one", "c"], "outputs": ["target"],
              "attributes": [ { "name": "axis", "int": 0 } ] },
            { "name": "r", "op_type": "Reshape", "inputs": ["x", "target"], "outputs": ["y"] }
        ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    assert!(translation.value("target").unwrap().is_const());
    let y = translation.run(tvec!(range(&[2, 3, 4]))).unwrap();
    assert_eq!(y[0].shape(), &[8, 3]);
}

#[test]
fn channel_last_flatten_goes_through_lambda() {
    setup_test_logger();
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 2, 3, 3] } ],
        "initializers": [ { "name": "s", "datum_type": "tdim", "shape": [2], "data": [null, -1] } ],
        "nodes": [ { "name": "flat", "op_type": "Reshape", "inputs": ["x", "s"], "outputs": ["y"] } ],
        "outputs": ["y"]
    }));
    let translator = Translator::new(LoweringContext::new(AxisOrdering::ChannelLast));
    let translation = translator.translate(&g).unwrap();
    assert!(translation.advisories.contains(&(
        "flat".to_string(),
        Advisory::ChannelLastFlatten { lambda: "flat_CHW".to_string() }
    )));
    assert_eq!(op_name(&translation, "flat_CHW"), "Lambda");
    assert!(translation.env.lambdas.contains_key("flat"));
    let y = translation.run(tvec!(range(&[1, 2, 3, 3]))).unwrap();
    assert_eq!(*y[0], range(&[1, 18]));
}

#[test]
fn channel_last_refuses_slice() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 2, 3, 3] } ],
        "nodes": [ { "op_type": "Slice", "inputs": ["x"], "outputs": ["y"],
                     "attributes": [ { "name": "axes", "ints": [1] }, { "name": "starts", "ints": [0] },
                                     { "name": "ends", "ints": [1] } ] } ],
        "outputs": ["y"]
    }));
    let translator = Translator::new(LoweringContext::new(AxisOrdering::ChannelLast));
    assert!(translator.translate(&g).is_err());
}

#[test]
fn transposing_batch_axis_raises_advisory() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [2, 3] } ],
        "nodes": [ { "name": "t", "op_type": "Transpose", "inputs": ["x"], "outputs": ["y"],
                     "attributes": [ { "name": "perm", "ints": [1, 0] } ] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    assert_eq!(
        translation.advisories,
        vec![("t".to_string(), Advisory::BatchAxisMoved { perm: tvec!(1, 0) })]
    );
    let y = translation.run(tvec!(range(&[2, 3]))).unwrap();
    assert_eq!(*y[0], tensor2(&[[0f32, 3.], [1., 4.], [2., 5.]]));
}

#[test]
fn permute_keeps_batch_axis() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 2, 3] } ],
        "nodes": [ { "name": "t", "op_type": "Transpose", "inputs": ["x"], "outputs": ["y"],
                     "attributes": [ { "name": "perm", "ints": [0, 2, 1] } ] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    assert!(translation.advisories.is_empty());
    assert_eq!(op_name(&translation, "t"), "Permute");
    let y = translation.run(tvec!(range(&[1, 2, 3]))).unwrap();
    assert_eq!(y[0].shape(), &[1, 3, 2]);
    assert_eq!(y[0].as_slice::<f32>().unwrap(), &[0., 3., 1., 4., 2., 5.]);
}

#[test]
fn unsupported_operator_names_the_node() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 3] } ],
        "nodes": [ { "name": "conv", "op_type": "Conv", "inputs": ["x"], "outputs": ["y"] } ],
        "outputs": ["y"]
    }));
    let err = Translator::default().translate(&g).unwrap_err();
    assert!(format!("{err:?}").contains("conv"), "{err:?}");
}

#[test]
fn constant_data_folds_through_unsqueeze_and_reshape() {
    let data: Vec<i32> = (0..144).collect();
    let g = graph(json!({
        "initializers": [
            { "name": "a", "datum_type": "f32", "shape": [1, 4, 6, 6], "data": data },
            { "name": "s", "datum_type": "i64", "shape": [2], "data": [1, -1] }
        ],
        "nodes": [
            { "op_type": "Unsqueeze", "inputs": ["a"], "outputs": ["u"],
              "attributes": [ { "name": "axes", "ints": [0] } ] },
            { "op_type": "Reshape", "inputs": ["u", "s"], "outputs": ["y"] }
        ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    assert_eq!(translation.value("u").unwrap().shape().to_string(), "1x1x4x6x6");
    let Some(y) = translation.value("y").unwrap().as_const().cloned() else { panic!("expected a folded output") };
    assert_eq!(*y, range(&[1, 144]));
    assert_eq!(translation.model.nodes().len(), 1);
    assert_eq!(*translation.run(tvec!()).unwrap()[0], range(&[1, 144]));
}

#[test]
fn unsqueeze_of_graph_tensor_takes_one_axis() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 3] } ],
        "nodes": [ { "op_type": "Unsqueeze", "inputs": ["x"], "outputs": ["y"],
                     "attributes": [ { "name": "axes", "ints": [0, 1] } ] } ],
        "outputs": ["y"]
    }));
    let err = Translator::default().translate(&g).unwrap_err();
    assert!(format!("{err:?}").contains("Number of axes is not equal 1"), "{err:?}");
}

#[test]
fn squeeze_given_axis() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 1, 3] } ],
        "nodes": [ { "name": "sq", "op_type": "Squeeze", "inputs": ["x"], "outputs": ["y"],
                     "attributes": [ { "name": "axes", "ints": [1] } ] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    assert_eq!(op_name(&translation, "sq"), "Squeeze");
    let y = translation.run(tvec!(range(&[2, 1, 3]))).unwrap();
    assert_eq!(*y[0], range(&[2, 3]));
}

#[test]
fn squeeze_without_axes_keeps_unknown_dims() {
    setup_test_logger();
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 1, 3] } ],
        "nodes": [ { "name": "sq", "op_type": "Squeeze", "inputs": ["x"], "outputs": ["y"] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    let fact = translation.model.outlet_fact(translation.model.output_outlets()[0]).unwrap();
    assert_eq!(fact.shape.dims(), &[None, Some(3)]);
    let y = translation.run(tvec!(range(&[1, 1, 3]))).unwrap();
    assert_eq!(y[0].shape(), &[1, 3]);
}

#[test]
fn squeeze_without_axes_removes_every_known_unit_axis() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [2, 1, 1, 3] } ],
        "nodes": [ { "name": "sq", "op_type": "Squeeze", "inputs": ["x"], "outputs": ["y"] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    assert_eq!(op_name(&translation, "sq_2"), "Squeeze");
    let y = translation.run(tvec!(range(&[2, 1, 1, 3]))).unwrap();
    assert_eq!(*y[0], range(&[2, 3]));
}

#[test]
fn flatten_keeps_batch_axis() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 2, 3] } ],
        "nodes": [ { "name": "flat", "op_type": "Flatten", "inputs": ["x"], "outputs": ["y"] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    assert_eq!(op_name(&translation, "flat"), "Flatten");
    let y = translation.run(tvec!(range(&[1, 2, 3]))).unwrap();
    assert_eq!(*y[0], range(&[1, 6]));
}

#[test]
fn channel_last_flatten_restores_source_order() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 2, 3, 3] } ],
        "nodes": [ { "name": "flat", "op_type": "Flatten", "inputs": ["x"], "outputs": ["y"] } ],
        "outputs": ["y"]
    }));
    let translator = Translator::new(LoweringContext::new(AxisOrdering::ChannelLast));
    let translation = translator.translate(&g).unwrap();
    assert_eq!(op_name(&translation, "flat_permute"), "Permute");
    let y = translation.run(tvec!(range(&[1, 2, 3, 3]))).unwrap();
    assert_eq!(*y[0], range(&[1, 18]));
}

#[test]
fn expand_broadcasts_rows() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [1, 3] } ],
        "initializers": [ { "name": "shape", "datum_type": "i64", "shape": [2], "data": [2, 3] } ],
        "nodes": [ { "name": "e", "op_type": "Expand", "inputs": ["x", "shape"], "outputs": ["y"] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    assert_eq!(op_name(&translation, "e"), "Mul");
    assert_eq!(op_name(&translation, "e_ones"), "Const");
    let y = translation.run(tvec!(range(&[1, 3]))).unwrap();
    assert_eq!(*y[0], tensor2(&[[0f32, 1., 2.], [0., 1., 2.]]));
}

#[test]
fn tile_by_constant_repeats() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [2, 2] } ],
        "initializers": [ { "name": "repeats", "datum_type": "i64", "shape": [2], "data": [1, 2] } ],
        "nodes": [ { "name": "t", "op_type": "Tile", "inputs": ["x", "repeats"], "outputs": ["y"] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    assert_eq!(op_name(&translation, "t"), "Tile");
    let y = translation.run(tvec!(range(&[2, 2]))).unwrap();
    assert_eq!(*y[0], tensor2(&[[0f32, 1., 0., 1.], [2., 3., 2., 3.]]));
}

#[test]
fn gathered_shape_entries_become_ints_when_known() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 3, 4] } ],
        "initializers": [
            { "name": "zero", "datum_type": "i64", "shape": [1], "data": [0] },
            { "name": "one", "datum_type": "i64", "shape": [1], "data": [1] }
        ],
        "nodes": [
            { "op_type": "Shape", "inputs": ["x"], "outputs": ["shape"] },
            { "op_type": "Gather", "inputs": ["shape", "one"], "outputs": ["channels"] },
            { "op_type": "Gather", "inputs": ["shape", "zero"], "outputs": ["batch"] }
        ],
        "outputs": ["channels"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    let channels = translation.value("channels").unwrap();
    assert_eq!(channels.datum_type(), DatumType::I32);
    assert_eq!(channels.as_const().map(|t| &**t), Some(&tensor1(&[3i32])));
    let batch = translation.value("batch").unwrap();
    assert_eq!(batch.as_const().map(|t| &**t), Some(&tensor1(&[TDim::Unknown])));
}

#[test]
fn slice_of_partial_shape_array_folds() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 3, 4] } ],
        "nodes": [
            { "op_type": "Shape", "inputs": ["x"], "outputs": ["shape"] },
            { "op_type": "Slice", "inputs": ["shape"], "outputs": ["y"],
              "attributes": [ { "name": "axes", "ints": [0] }, { "name": "starts", "ints": [1] },
                              { "name": "ends", "ints": [3] } ] }
        ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    let y = translation.value("y").unwrap();
    assert_eq!(y.as_const().map(|t| &**t), Some(&tensor1(&[TDim::Val(3), TDim::Val(4)])));
}

#[test]
fn concat_of_mixed_types_is_typed() {
    let g = graph(json!({
        "inputs": [
            { "name": "a", "datum_type": "i32", "shape": [null, 2] },
            { "name": "b", "datum_type": "i64", "shape": [null, 1] }
        ],
        "nodes": [ { "name": "cat", "op_type": "Concat", "inputs": ["a", "b"], "outputs": ["y"],
                     "attributes": [ { "name": "axis", "int": 1 } ] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    assert_eq!(op_name(&translation, "cat"), "TypedConcat");
    assert_eq!(translation.value("y").unwrap().datum_type(), DatumType::I64);
    let a = Tensor::from_shape(&[1, 2], &[1i32, 2]).unwrap();
    let b = Tensor::from_shape(&[1, 1], &[3i64]).unwrap();
    let y = translation.run(tvec!(a, b)).unwrap();
    assert_eq!(*y[0], tensor2(&[[1i64, 2, 3]]));
}

#[test]
fn concat_of_single_input_is_identity() {
    let g = graph(json!({
        "inputs": [ { "name": "x", "shape": [null, 2] } ],
        "nodes": [ { "op_type": "Concat", "inputs": ["x"], "outputs": ["y"],
                     "attributes": [ { "name": "axis", "int": 1 } ] } ],
        "outputs": ["y"]
    }));
    let translation = Translator::default().translate(&g).unwrap();
    assert_eq!(translation.value("y").unwrap(), translation.value("x").unwrap());
    assert_eq!(translation.model.nodes().len(), 1);
}
