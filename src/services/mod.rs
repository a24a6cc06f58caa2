pub(crate) mod reporting;
pub(crate) mod risk;
pub(crate) mod scoring;
