pub mod calibration;
pub mod frame_clock;
pub mod pacer;
pub mod timer;

pub use calibration::{CalibrationStats, FrameTimes};
pub use frame_clock::FrameClock;
pub use pacer::FramePacer;
pub use timer::{HighPrecisionTimer, Timer};
