pub(crate) mod engine;
pub(crate) mod font;
pub(crate) mod wrap;
