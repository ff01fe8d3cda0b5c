//! Closed-form arithmetic cost model for coded computing schemes.

mod cost;
mod delay;
mod map;

pub use cost::{
    block_diagonal_decoding_complexity, block_diagonal_encoding_complexity,
    encoding_complexity_from_density, matrix_vector_complexity, rs_decoding_complexity, CostModel,
};
pub use delay::{
    partitioned_encode_delay, partitioned_reduce_complexity, partitioned_reduce_delay,
    stragglerc_encode_delay, stragglerc_reduce_delay,
};
pub use map::{
    map_complexity_cmapred, map_complexity_stragglerc, map_complexity_uncoded,
    map_complexity_unified,
};
