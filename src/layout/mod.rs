pub(crate) mod grid;
pub(crate) mod resolve;
pub(crate) mod rules;
