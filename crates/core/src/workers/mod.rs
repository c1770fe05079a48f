pub mod session_worker;
pub mod worker;

pub use session_worker::*;
pub use worker::*;
