use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

use endogrid_core::{ColumnId, SheetData};

use crate::error::{BridgeError, ErrorReport};
use crate::summary::GraphPayload;

/// Something the shell hosting a grid instance has to act on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ShellEvent {
    /// New sheets pushed by the kernel
    #[serde(rename_all = "camelCase")]
    Dataset {
        sheets: Vec<SheetData>,
        sheet_index: usize,
    },
    #[serde(rename_all = "camelCase")]
    PivotParams {
        sheet_index: usize,
        params: serde_json::Value,
    },
    #[serde(rename_all = "camelCase")]
    SummaryGraph {
        sheet_index: usize,
        column_id: ColumnId,
        graph: GraphPayload,
    },
    CloseControlPanel,
    Error(ErrorReport),
}

/// Per-instance callbacks: one channel carrying every shell event
#[derive(Debug, Clone)]
pub struct GridCallbacks {
    events: mpsc::Sender<ShellEvent>,
}

impl GridCallbacks {
    pub fn new(events: mpsc::Sender<ShellEvent>) -> Self {
        Self { events }
    }
}

type Instances = RwLock<HashMap<Uuid, GridCallbacks>>;

/// Registry of live grid instances.
///
/// Kernel results are routed to an instance by id. Results for an instance
/// that was torn down are dropped.
#[derive(Debug, Default)]
pub struct GridRegistry {
    instances: Arc<Instances>,
}

impl GridRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new instance, returning its id, a guard that unregisters
    /// it on drop, and the receiving end of its event channel
    pub fn register(&self, capacity: usize) -> (RegistrationGuard, mpsc::Receiver<ShellEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let instance_id = Uuid::new_v4();
        self.instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(instance_id, GridCallbacks::new(sender));
        debug!(%instance_id, "registered grid instance");

        let guard = RegistrationGuard {
            instance_id,
            instances: Arc::clone(&self.instances),
        };
        (guard, receiver)
    }

    pub fn contains(&self, instance_id: Uuid) -> bool {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&instance_id)
    }

    /// Number of live instances
    pub fn count(&self) -> usize {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn callbacks(&self, instance_id: Uuid) -> Option<GridCallbacks> {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&instance_id)
            .cloned()
    }

    /// Deliver an event to an instance.
    ///
    /// Never waits: when the shell has stopped draining its channel the
    /// event is dropped.
    pub fn route(&self, instance_id: Uuid, event: ShellEvent) -> Result<(), BridgeError> {
        let Some(callbacks) = self.callbacks(instance_id) else {
            warn!(%instance_id, "dropping event for unknown grid instance");
            return Err(BridgeError::UnknownInstance(instance_id));
        };
        match callbacks.events.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!(%instance_id, "grid instance event channel is full, dropping event");
                Err(BridgeError::ShellBacklog(instance_id))
            }
            Err(TrySendError::Closed(_)) => {
                warn!(%instance_id, "grid instance stopped listening, dropping event");
                Err(BridgeError::UnknownInstance(instance_id))
            }
        }
    }

    /// Push new sheets from the kernel to an instance
    pub fn set_dataset(
        &self,
        instance_id: Uuid,
        sheets: Vec<SheetData>,
        sheet_index: usize,
    ) -> Result<(), BridgeError> {
        self.route(instance_id, ShellEvent::Dataset { sheets, sheet_index })
    }
}

/// Keeps an instance registered; dropping it unregisters the instance
#[derive(Debug)]
pub struct RegistrationGuard {
    instance_id: Uuid,
    instances: Arc<Instances>,
}

impl RegistrationGuard {
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.instance_id);
        debug!(instance_id = %self.instance_id, "unregistered grid instance");
    }
}
