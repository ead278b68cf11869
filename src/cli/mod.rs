pub(crate) mod curves;
pub(crate) mod scatter;
pub(crate) mod summary;
