// Pipeline processing: column normalization and joins

pub mod join;
pub mod normalize;
