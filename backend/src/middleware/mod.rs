pub mod logging;
pub mod request_id;

pub use logging::*;
pub use request_id::*;
