//! Reactive Primitives
//!
//! Everything the renderer reacts to is built from four pieces:
//!
//! - [`Signal`]: a writable cell. Reading it inside a computation subscribes
//!   that computation.
//! - [`Memo`]: a cached derivation. It only recomputes when something it read
//!   changed, and only wakes its readers when its own value changed.
//! - [`Effect`]: a computation run for its side effects, such as patching DOM
//!   nodes. It runs once on creation and again after every relevant write.
//! - [`Scope`]: an owner for effects and cleanups, disposed as a unit when a
//!   region of output is replaced.
//!
//! Subscriptions are discovered at run time. Each computation pushes an entry
//! on a thread-local stack, reads register against the top entry, and the
//! collected set replaces the previous edges once the run finishes.
//! [`untrack`] hides reads from the enclosing computation.
//!
//! All state is per thread. Handles are `Rc`-based and not `Send`.

mod context;
mod effect;
mod memo;
mod read;
mod runtime;
mod scope;
mod signal;

pub use context::{suspend_tracking, untrack, ReactiveContext, TrackingSuspension};
pub use effect::{effect_once, Effect};
pub use memo::Memo;
pub use read::ReadSignal;
pub use runtime::{batch, Runtime};
pub use scope::{on_cleanup, Scope};
pub use signal::Signal;
