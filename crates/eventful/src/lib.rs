//! Typed in-process events and signals.
//!
//! Two primitives, each owned by a single producer:
//!
//! - [`Event`]: `trigger` runs every subscription on the caller's task, one
//!   after another, and returns the first error a subscription reports.
//! - [`Signal`]: `emit` hands the value to every listener's own channel and
//!   returns immediately; listeners read at their own pace.
//!
//! Owners keep the `Event`/`Signal` to themselves and hand out
//! [`Subscriptions`] or [`Listeners`], which can register participants but
//! cannot fire. Participants can only close themselves.
//!
//! ```no_run
//! use eventful::{Event, Signal};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let event: Event<String> = Event::new();
//! let sub = event.subscriptions().subscribe(|_cx, name: String| async move {
//!     println!("hello {name}");
//!     Ok(())
//! });
//! event.trigger(&CancellationToken::new(), "world".to_string()).await?;
//! sub.close();
//!
//! let signal = Signal::new();
//! let mut listener = signal.listeners().listen();
//! signal.emit("hello");
//! assert_eq!(listener.recv().await, Some("hello"));
//! # Ok(())
//! # }
//! ```

mod error;
mod event;
mod options;
mod participant;
mod signal;

pub use error::EmitError;
pub use event::{Event, Handler, Subscription, Subscriptions};
pub use options::{ListenerOptions, SignalOptions, DEFAULT_BUFFER_SIZE};
pub use participant::{ListenerId, SubscriptionId};
pub use signal::{Listener, ListenerCloser, Listeners, Signal};
