mod controller;
mod display;
mod driver;
mod haptics;

pub use controller::{SessionController, SessionState, SessionStatus};
pub use display::{DisplayChannel, DisplayFrame, IDENTITY_SCALE, IDLE_INSTRUCTION};
pub use driver::SessionDriver;
pub use haptics::{HapticPort, NoHaptics, TracingHaptics};
