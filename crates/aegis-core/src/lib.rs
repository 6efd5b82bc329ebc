//! # aegis-core
//!
//! Infrastructure the governance components share: a single time source
//! with one-shot timers, the incremental hashing wrapper, and the typed
//! event fan-out dispatcher.
//!
//! Nothing here makes governance decisions. The point of the crate is
//! that expiry timers, escalation timers, and every hashed timestamp all
//! flow through one injectable `Clock`, so a test harness can drive the
//! whole kernel on virtual time.

pub mod clock;
pub mod events;
pub mod hash;

pub use clock::{canonical_timestamp, Clock, ManualClock, SystemClock};
pub use events::{EventDispatcher, EventSubscription};
pub use hash::{digest_hex, ChainHasher};
