//! Connects EndoGrid instances to the notebook kernel.
//!
//! Grid effects are dispatched to a [`KernelTransport`] on background tasks.
//! Results, kernel pushes and failures come back to the owning instance as
//! [`ShellEvent`]s through the [`GridRegistry`].

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod summary;
pub mod telemetry;
pub mod transport;

pub use config::BridgeConfig;
pub use dispatcher::EffectDispatcher;
pub use error::{BridgeError, ErrorReport};
pub use registry::{GridCallbacks, GridRegistry, RegistrationGuard, ShellEvent};
pub use summary::{fetch_summary_graph, GraphPayload};
pub use transport::{FormulaEdit, KernelReply, KernelTransport, TransportFuture};
