pub mod latest1_queue;

pub use latest1_queue::*;
