//! Testing utilities for Trellis
//!
//! Scriptable canvas objects, a painter that records every call, and a clock
//! harness for driving cache expiry on a timeline.

pub mod fixtures;
pub mod painter;
pub mod timeline;

pub use fixtures::*;
pub use painter::{PaintLog, PaintOp, RecordingPainter};
pub use timeline::{mins, secs, Timeline};

/// Routes `log` output through the test harness. Safe to call from every test.
pub fn init_test_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}

pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::init_test_logging;
    pub use crate::painter::{PaintLog, PaintOp, RecordingPainter};
    pub use crate::timeline::{mins, secs, Timeline};
}
