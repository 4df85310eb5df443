/// Number parsing.
pub mod number;

#[cfg(test)]
pub(crate) mod test;
