//! Stream operators over table streams.

mod aggregate;
mod join;
mod publish;

pub use aggregate::aggregate;
pub use join::left_join;
pub use publish::publish;
