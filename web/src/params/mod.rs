pub(crate) mod behavior;
pub(crate) mod call;
