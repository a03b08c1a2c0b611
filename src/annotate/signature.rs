//! Method signature keys.

/// Build the lookup key `name(T1,T2,...)` from a method name and its
/// parameter types as spelled in source.
pub fn build<S: AsRef<str>>(name: &str, param_types: &[S]) -> String {
    let params: Vec<&str> = param_types.iter().map(AsRef::as_ref).collect();
    format!("{}({})", name, params.join(","))
}
