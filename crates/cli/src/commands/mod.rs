pub(crate) mod check;
pub(crate) mod complete;
pub(crate) mod compile;
pub(crate) mod format;
pub(crate) mod generate;
