//! Core primitives for the Trellis scene graph: time, expiry bookkeeping,
//! hash-map aliases and the cross-thread refresh and event queues.

pub mod clock;
pub mod collections;
pub mod event_queue;
pub mod expiring;
pub mod refresh;

pub use clock::{Clock, ManualClock, SystemClock};
pub use event_queue::{Event, EventQueue, QueueError};
pub use expiring::{Expiring, SharedExpiring};
pub use refresh::{DirtyFlag, RefreshQueue};
pub use web_time::{Duration, Instant};
