use crate::pb::*;
use serde_json::Value as Json;
use tessera_core::internal::*;

fn json_i64(v: &Json) -> TesseraResult<i64> {
    match v {
        Json::Bool(b) => Ok(*b as i64),
        Json::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .with_context(|| format!("Expected an integer, got {n}")),
        _ => bail!("Expected an integer, got {}", v),
    }
}

fn json_f64(v: &Json) -> TesseraResult<f64> {
    v.as_f64().with_context(|| format!("Expected a number, got {v}"))
}

fn json_dim(v: &Json) -> TesseraResult<TDim> {
    if v.is_null() { Ok(TDim::Unknown) } else { Ok(TDim::Val(json_i64(v)?)) }
}

impl TryFrom<&TensorProto> for Tensor {
    type Error = TesseraError;

    fn try_from(t: &TensorProto) -> TesseraResult<Tensor> {
        let dt: DatumType = t.datum_type.parse()?;
        let shape = &t.shape;
        let len = shape.iter().product::<usize>();
        ensure!(
            t.data.len() == len,
            "Tensor {}: shape {:?} needs {} values, got {}",
            t.name,
            shape,
            len,
            t.data.len()
        );
        let tensor = match dt {
            DatumType::Bool => {
                let data = t.data.iter().map(|v| Ok(json_i64(v)? != 0)).collect::<TesseraResult<Vec<_>>>()?;
                Tensor::from_shape(shape, &data)?
            }
            DatumType::I32 => {
                let data = t
                    .data
                    .iter()
                    .map(|v| Ok(i32::try_from(json_i64(v)?)?))
                    .collect::<TesseraResult<Vec<i32>>>()?;
                Tensor::from_shape(shape, &data)?
            }
            DatumType::I64 => {
                let data = t.data.iter().map(json_i64).collect::<TesseraResult<Vec<_>>>()?;
                Tensor::from_shape(shape, &data)?
            }
            DatumType::F32 => {
                let data = t.data.iter().map(|v| Ok(json_f64(v)? as f32)).collect::<TesseraResult<Vec<_>>>()?;
                Tensor::from_shape(shape, &data)?
            }
            DatumType::F64 => {
                let data = t.data.iter().map(json_f64).collect::<TesseraResult<Vec<_>>>()?;
                Tensor::from_shape(shape, &data)?
            }
            DatumType::TDim => {
                let data = t.data.iter().map(json_dim).collect::<TesseraResult<Vec<_>>>()?;
                Tensor::from_shape(shape, &data)?
            }
        };
        Ok(tensor)
    }
}

impl TensorProto {
    /// Serializable form of a tensor.
    pub fn from_tensor(name: impl Into<String>, t: &Tensor) -> TesseraResult<TensorProto> {
        fn values<T: Datum>(t: &Tensor, f: impl Fn(&T) -> Json) -> TesseraResult<Vec<Json>> {
            Ok(t.to_array_view::<T>()?.iter().map(f).collect())
        }
        let data = match t.datum_type() {
            DatumType::Bool => values::<bool>(t, |&b| Json::from(b))?,
            DatumType::I32 => values::<i32>(t, |&x| Json::from(x))?,
            DatumType::I64 => values::<i64>(t, |&x| Json::from(x))?,
            DatumType::F32 => values::<f32>(t, |&x| Json::from(x as f64))?,
            DatumType::F64 => values::<f64>(t, |&x| Json::from(x))?,
            DatumType::TDim => values::<TDim>(t, |d| d.as_option().map(Json::from).unwrap_or(Json::Null))?,
        };
        Ok(TensorProto {
            name: name.into(),
            datum_type: t.datum_type().to_string(),
            shape: t.shape().to_vec(),
            data,
        })
    }
}

impl TryFrom<&ValueInfoProto> for TypedFact {
    type Error = TesseraError;

    fn try_from(v: &ValueInfoProto) -> TesseraResult<TypedFact> {
        let dt: DatumType = v.datum_type.parse()?;
        ensure!(dt != DatumType::TDim, "Graph input {} can not be a shape array", v.name);
        Ok(TypedFact::shape(dt, &v.shape[..]))
    }
}
