pub mod gate;
pub mod position;

pub use gate::*;
pub use position::*;
