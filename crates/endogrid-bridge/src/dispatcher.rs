use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use uuid::Uuid;

use endogrid_core::{ColumnId, GridEffect, GridResponse};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, ErrorReport};
use crate::registry::{GridRegistry, RegistrationGuard, ShellEvent};
use crate::summary::fetch_summary_graph;
use crate::telemetry;
use crate::transport::{FormulaEdit, KernelReply, KernelTransport};

/// Sends grid effects to the kernel.
///
/// Every effect runs as its own task and nothing waits for it: edits are
/// optimistic, and results arrive in whatever order the kernel answers.
/// Failures are logged and reported to the instance that caused them.
pub struct EffectDispatcher<T: KernelTransport + ?Sized> {
    transport: Arc<T>,
    registry: Arc<GridRegistry>,
    config: BridgeConfig,
}

impl<T: KernelTransport + ?Sized> EffectDispatcher<T> {
    pub fn new(transport: Arc<T>, registry: Arc<GridRegistry>, config: BridgeConfig) -> Self {
        Self {
            transport,
            registry,
            config,
        }
    }

    /// Build a dispatcher from environment configuration and install logging
    pub fn from_env(transport: Arc<T>, registry: Arc<GridRegistry>) -> Result<Self, BridgeError> {
        let config = BridgeConfig::from_env()?;
        telemetry::init(&config.log_filter);
        Ok(Self::new(transport, registry, config))
    }

    /// Register a grid instance with the configured channel capacity
    pub fn register(&self) -> (RegistrationGuard, mpsc::Receiver<ShellEvent>) {
        self.registry.register(self.config.report_channel_capacity)
    }

    pub fn registry(&self) -> &Arc<GridRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Spawn one task per effect of a grid response
    pub fn dispatch(&self, instance_id: Uuid, response: GridResponse) -> Vec<JoinHandle<()>> {
        response
            .effects
            .into_iter()
            .map(|effect| {
                let transport = Arc::clone(&self.transport);
                let registry = Arc::clone(&self.registry);
                let timeout = self.config.commit_timeout;
                tokio::spawn(async move {
                    run_effect(&*transport, &registry, timeout, instance_id, effect).await;
                })
            })
            .collect()
    }

    /// Fetch a column's summary graph and hand it to the instance
    pub fn request_summary_graph(
        &self,
        instance_id: Uuid,
        sheet_index: usize,
        column_id: ColumnId,
    ) -> JoinHandle<()> {
        let transport = Arc::clone(&self.transport);
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            let graph = fetch_summary_graph(&*transport, sheet_index, column_id.clone()).await;
            let event = ShellEvent::SummaryGraph {
                sheet_index,
                column_id,
                graph,
            };
            // Routing failures are already logged by the registry
            let _ = registry.route(instance_id, event);
        })
    }
}

async fn run_effect<T: KernelTransport + ?Sized>(
    transport: &T,
    registry: &GridRegistry,
    timeout: Duration,
    instance_id: Uuid,
    effect: GridEffect,
) {
    let call = execute(transport, registry, instance_id, &effect);
    tokio::pin!(call);

    // The deadline only reports; the call itself is never cancelled
    let result = match tokio::time::timeout(timeout, &mut call).await {
        Ok(result) => result,
        Err(_) => {
            report_failure(registry, instance_id, &effect, BridgeError::Timeout(timeout));
            let late = call.await;
            debug!(%instance_id, ok = late.is_ok(), "grid effect resolved after its deadline");
            late
        }
    };

    match result {
        Ok(()) => debug!(%instance_id, ?effect, "grid effect completed"),
        Err(e) => report_failure(registry, instance_id, &effect, e),
    }
}

fn report_failure(registry: &GridRegistry, instance_id: Uuid, effect: &GridEffect, e: BridgeError) {
    // Routing failures were already logged by the registry
    if matches!(e, BridgeError::UnknownInstance(_) | BridgeError::ShellBacklog(_)) {
        return;
    }
    error!(%instance_id, code = e.code(), error = %e, "grid effect failed");
    let report = ErrorReport::new(instance_id, effect.clone(), &e);
    let _ = registry.route(instance_id, ShellEvent::Error(report));
}

async fn execute<T: KernelTransport + ?Sized>(
    transport: &T,
    registry: &GridRegistry,
    instance_id: Uuid,
    effect: &GridEffect,
) -> Result<(), BridgeError> {
    match effect.clone() {
        GridEffect::SubmitFormula {
            sheet_index,
            row_index,
            column_id,
            formula,
            ..
        } => {
            let edit = FormulaEdit {
                sheet_index,
                row_index,
                column_id,
                formula,
            };
            accepted(transport.submit_formula(edit).await?)
        }
        GridEffect::RenameColumnHeader {
            sheet_index,
            column_id,
            new_header,
        } => accepted(
            transport
                .rename_column_header(sheet_index, column_id, new_header)
                .await?,
        ),
        GridEffect::DeleteColumns {
            sheet_index,
            column_ids,
        } => accepted(
            transport
                .submit_delete_columns(sheet_index, column_ids)
                .await?,
        ),
        GridEffect::FetchPivotParams { sheet_index } => {
            let params = transport.fetch_pivot_params(sheet_index).await?;
            registry.route(instance_id, ShellEvent::PivotParams { sheet_index, params })
        }
        GridEffect::CloseControlPanel => registry.route(instance_id, ShellEvent::CloseControlPanel),
    }
}

fn accepted(reply: KernelReply) -> Result<(), BridgeError> {
    match reply {
        KernelReply::Accepted => Ok(()),
        KernelReply::Rejected { message } => Err(BridgeError::Rejected(message)),
    }
}
