//! Lumen Core Runtime
//!
//! Foundational primitives shared by the Lumen UI crates:
//!
//! - **Listener Lists**: Ordered callback registries keyed by opaque handles
//! - **Snapshot Notification**: Listeners added or removed while a pass is
//!   running only take effect on the next pass
//!
//! Everything here is single-threaded: the UI thread owns the lists and
//! callbacks are plain `Rc<dyn Fn>` values.

pub mod listenable;

pub use listenable::{ListenerId, ListenerList, StatusListenerId};
