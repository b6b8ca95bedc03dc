#[macro_export]
macro_rules! args_1 {
    ($inputs:expr) => {{
        let [a]: [_; 1] = $inputs.into_vec().try_into().map_err(|v: Vec<_>| {
            $crate::internal::format_err!("Expected 1 arg, got {}", v.len())
        })?;
        a
    }};
}

#[macro_export]
macro_rules! args_2 {
    ($inputs:expr) => {{
        let [a, b]: [_; 2] = $inputs.into_vec().try_into().map_err(|v: Vec<_>| {
            $crate::internal::format_err!("Expected 2 args, got {}", v.len())
        })?;
        (a, b)
    }};
}
