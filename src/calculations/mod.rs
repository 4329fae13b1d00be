pub mod fields;
pub mod link;
pub mod propagation;

pub use fields::{FieldResolver, Origin, TimeField};
pub use link::LinkPhase;
pub use propagation::{Propagation, PropagationOptions};
