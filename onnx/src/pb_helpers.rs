use crate::pb::*;
use tessera_core::internal::*;

use num_traits::{AsPrimitive, Bounded};

use std::fmt::Display;

pub trait Reason {
    fn reason(&self) -> Cow<'_, str>;
}

impl Reason for &str {
    fn reason(&self) -> Cow<'_, str> {
        (*self).into()
    }
}

impl<F> Reason for F
where
    F: Fn() -> String,
{
    fn reason(&self) -> Cow<'_, str> {
        self().into()
    }
}

pub trait OptionExt {
    type Item;

    fn and_try<F, T>(self, f: F) -> TesseraResult<Option<T>>
    where
        F: Fn(Self::Item) -> TesseraResult<T>;

    fn and_ok<F, T>(self, f: F) -> TesseraResult<Option<T>>
    where
        F: Fn(Self::Item) -> T;
}

impl<A> OptionExt for Option<A> {
    type Item = A;

    fn and_try<F, T>(self, f: F) -> TesseraResult<Option<T>>
    where
        F: Fn(Self::Item) -> TesseraResult<T>,
    {
        match self {
            Some(attr) => f(attr).map(Some),
            None => Ok(None),
        }
    }

    fn and_ok<F, T>(self, f: F) -> TesseraResult<Option<T>>
    where
        F: Fn(Self::Item) -> T,
    {
        Ok(self.map(f))
    }
}

pub trait AttrScalarType<'a>: 'a + Sized {
    fn get_attr_opt_scalar(node: &'a NodeProto, name: &str) -> TesseraResult<Option<Self>>;
}

impl<'a> AttrScalarType<'a> for Tensor {
    fn get_attr_opt_scalar(node: &'a NodeProto, name: &str) -> TesseraResult<Option<Self>> {
        match node.get_attr_opt_with_type(name, AttributeType::Tensor)? {
            Some(AttributeValue::Tensor(t)) => Ok(Some(t.try_into()?)),
            _ => Ok(None),
        }
    }
}

impl<'a> AttrScalarType<'a> for &'a str {
    fn get_attr_opt_scalar(node: &'a NodeProto, name: &str) -> TesseraResult<Option<Self>> {
        match node.get_attr_opt_with_type(name, AttributeType::String)? {
            Some(AttributeValue::String(s)) => Ok(Some(s)),
            _ => Ok(None),
        }
    }
}

impl<'a> AttrScalarType<'a> for String {
    fn get_attr_opt_scalar(node: &'a NodeProto, name: &str) -> TesseraResult<Option<Self>> {
        let string: Option<&'a str> = AttrScalarType::get_attr_opt_scalar(node, name)?;
        string.and_ok(Into::into)
    }
}

impl<'a> AttrScalarType<'a> for i64 {
    fn get_attr_opt_scalar(node: &'a NodeProto, name: &str) -> TesseraResult<Option<Self>> {
        match node.get_attr_opt_with_type(name, AttributeType::Int)? {
            Some(AttributeValue::Int(i)) => Ok(Some(*i)),
            _ => Ok(None),
        }
    }
}

impl<'a> AttrScalarType<'a> for bool {
    fn get_attr_opt_scalar(node: &'a NodeProto, name: &str) -> TesseraResult<Option<Self>> {
        let int: Option<i64> = AttrScalarType::get_attr_opt_scalar(node, name)?;
        int.and_try(|int| {
            node.expect_attr(name, int == 0 || int == 1, "boolean (0 or 1)")?;
            Ok(int == 1)
        })
    }
}

impl<'a> AttrScalarType<'a> for usize {
    fn get_attr_opt_scalar(node: &'a NodeProto, name: &str) -> TesseraResult<Option<Self>> {
        let int: Option<i64> = AttrScalarType::get_attr_opt_scalar(node, name)?;
        int.and_try(|int| {
            node.expect_attr(name, int >= 0, "non-negative int")?;
            Ok(int as _)
        })
    }
}

fn check_int<T>(node: &NodeProto, attr: &str, int: i64, is_list: bool) -> TesseraResult<T>
where
    T: AsPrimitive<i64> + Bounded + Display,
    i64: AsPrimitive<T>,
{
    let desc = if is_list { "list of ints" } else { "int" };
    node.expect_attr(attr, int <= T::max_value().as_(), || {
        format!("{} <= {}, got {}", desc, T::max_value(), int)
    })?;
    node.expect_attr(attr, int >= T::min_value().as_(), || {
        format!("{} >= {}, got {}", desc, T::min_value(), int)
    })?;
    Ok(int.as_())
}

macro_rules! impl_attr_scalar_type_int {
    ($ty:ident) => {
        impl<'a> AttrScalarType<'a> for $ty {
            fn get_attr_opt_scalar(node: &'a NodeProto, name: &str) -> TesseraResult<Option<Self>> {
                let int: Option<i64> = AttrScalarType::get_attr_opt_scalar(node, name)?;
                int.and_try(|int| check_int(node, name, int, false))
            }
        }

        impl<'a> AttrTVecType<'a> for $ty {
            fn get_attr_opt_tvec(
                node: &'a NodeProto,
                name: &str,
            ) -> TesseraResult<Option<TVec<Self>>> {
                let ints: Option<TVec<i64>> = AttrTVecType::get_attr_opt_tvec(node, name)?;
                ints.and_try(|ints| {
                    ints.into_iter().map(|int| check_int(node, name, int, true)).collect()
                })
            }
        }
    };
}

impl_attr_scalar_type_int!(isize);

pub trait AttrTVecType<'a>: 'a + Sized {
    fn get_attr_opt_tvec(node: &'a NodeProto, name: &str) -> TesseraResult<Option<TVec<Self>>>;
}

impl<'a> AttrTVecType<'a> for i64 {
    fn get_attr_opt_tvec(node: &'a NodeProto, name: &str) -> TesseraResult<Option<TVec<Self>>> {
        match node.get_attr_opt_with_type(name, AttributeType::Ints)? {
            Some(AttributeValue::Ints(ints)) => Ok(Some(ints.iter().copied().collect())),
            _ => Ok(None),
        }
    }
}

impl<'a> AttrTVecType<'a> for usize {
    fn get_attr_opt_tvec(node: &'a NodeProto, name: &str) -> TesseraResult<Option<TVec<Self>>> {
        let ints: Option<TVec<i64>> = AttrTVecType::get_attr_opt_tvec(node, name)?;
        ints.and_try(|ints| {
            for int in ints.iter() {
                node.expect_attr(name, *int >= 0, "list of non-negative ints")?;
            }
            Ok(ints.iter().map(|&x| x as _).collect())
        })
    }
}

impl NodeProto {
    pub fn bail<T>(&self, msg: &str) -> TesseraResult<T> {
        bail!("Node {} ({}): {}", self.name, self.op_type, msg)
    }

    pub fn bail_attr<T>(&self, attr: &str, msg: &str) -> TesseraResult<T> {
        bail!("Node {} ({}), attribute '{}': {}", self.name, self.op_type, attr, msg)
    }

    pub fn expect<R: Reason>(&self, cond: bool, what: R) -> TesseraResult<()> {
        if !cond { self.bail(&format!("expected {}", what.reason())) } else { Ok(()) }
    }

    pub fn expect_attr<R: Reason>(&self, attr: &str, cond: bool, what: R) -> TesseraResult<()> {
        if !cond { self.bail_attr(attr, &format!("expected {}", what.reason())) } else { Ok(()) }
    }

    pub fn expect_ok_or_else<T, R: Reason>(&self, result: Option<T>, what: R) -> TesseraResult<T> {
        match result {
            Some(v) => Ok(v),
            None => self.bail(&format!("expected {}", what.reason())),
        }
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    fn get_attr_opt_with_type(
        &self,
        name: &str,
        ty: AttributeType,
    ) -> TesseraResult<Option<&AttributeValue>> {
        let attr = match self.attributes.iter().find(|a| a.name == name) {
            Some(attr) => attr,
            _ => return Ok(None),
        };
        self.expect_attr(name, attr.value.attribute_type() == ty, || {
            format!("{}, got {}", ty, attr.value.attribute_type())
        })?;
        Ok(Some(&attr.value))
    }

    pub fn get_attr_opt<'a, T>(&'a self, name: &str) -> TesseraResult<Option<T>>
    where
        T: AttrScalarType<'a>,
    {
        T::get_attr_opt_scalar(self, name)
    }

    pub fn get_attr<'a, T>(&'a self, name: &str) -> TesseraResult<T>
    where
        T: AttrScalarType<'a>,
    {
        self.expect_ok_or_else(self.get_attr_opt(name)?, || format!("attribute '{name}'"))
    }

    pub fn get_attr_opt_tvec<'a, T>(&'a self, name: &str) -> TesseraResult<Option<TVec<T>>>
    where
        T: AttrTVecType<'a>,
    {
        T::get_attr_opt_tvec(self, name)
    }

    pub fn get_attr_tvec<'a, T>(&'a self, name: &str) -> TesseraResult<TVec<T>>
    where
        T: AttrTVecType<'a>,
    {
        self.expect_ok_or_else(self.get_attr_opt_tvec(name)?, || format!("attribute '{name}'"))
    }

    pub fn get_attr_vec<'a, T>(&'a self, name: &str) -> TesseraResult<Vec<T>>
    where
        T: AttrTVecType<'a>,
    {
        self.get_attr_tvec(name).map(TVec::into_vec)
    }

    /// Name of the `ix`-th input, `None` when it is absent or left empty.
    pub fn input_opt(&self, ix: usize) -> Option<&str> {
        self.inputs.get(ix).map(|s| s.as_str()).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(attributes: &str) -> NodeProto {
        serde_json::from_str(&format!(
            r#"{{ "name": "n", "op_type": "Test", "outputs": ["y"], "attributes": {attributes} }}"#
        ))
        .unwrap()
    }

    #[test]
    fn typed_attributes() {
        let node = node(
            r#"[ { "name": "axis", "int": -1 }, { "name": "perm", "ints": [0, 2, 1] },
                 { "name": "mode", "string": "nearest" } ]"#,
        );
        assert_eq!(node.get_attr::<i64>("axis").unwrap(), -1);
        assert_eq!(node.get_attr::<isize>("axis").unwrap(), -1);
        assert_eq!(node.get_attr_vec::<usize>("perm").unwrap(), vec![0, 2, 1]);
        assert_eq!(node.get_attr::<&str>("mode").unwrap(), "nearest");
        assert_eq!(node.get_attr_opt::<i64>("missing").unwrap(), None);
        assert!(node.has_attr("perm"));
    }

    #[test]
    fn wrong_attribute_type_is_reported() {
        let node = node(r#"[ { "name": "axis", "ints": [1] } ]"#);
        let err = node.get_attr::<i64>("axis").unwrap_err();
        assert!(err.to_string().contains("expected int, got list of ints"), "{err}");
        assert!(node.get_attr::<usize>("missing").is_err());
    }

    #[test]
    fn negative_ints_refused_as_usize() {
        let node = node(r#"[ { "name": "perm", "ints": [0, -1] } ]"#);
        assert!(node.get_attr_vec::<usize>("perm").is_err());
        assert_eq!(node.get_attr_vec::<isize>("perm").unwrap(), vec![0, -1]);
    }
}
