//! Embassy async tasks
//!
//! Each task runs independently and communicates via the statics in
//! [`crate::channels`].

pub mod display;
pub mod engine;
pub mod modem;
pub mod sensor;

pub use display::display_task;
pub use engine::engine_task;
pub use modem::{modem_driver_task, modem_rx_task};
pub use sensor::{sensor_task, Producer};
