//! Helpers shared by the factotum rpc client.

pub mod io;
pub mod length_prefix_encoding;
pub mod result;
