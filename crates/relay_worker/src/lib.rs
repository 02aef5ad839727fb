pub mod nats;
pub mod relay_worker;

pub use nats::*;
pub use relay_worker::*;
