pub mod eval;
pub mod host;

#[cfg(test)]
pub mod test_support;
