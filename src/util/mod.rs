pub mod logging;
pub mod text;

#[cfg(test)]
pub(crate) mod test_support;
