use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use endogrid_core::ColumnId;

/// Future returned by every kernel call
pub type TransportFuture<'a, T> = BoxFuture<'a, anyhow::Result<T>>;

/// The kernel's answer to an edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum KernelReply {
    Accepted,
    Rejected { message: String },
}

/// A cell edit to send to the kernel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaEdit {
    pub sheet_index: usize,
    pub row_index: isize,
    pub column_id: ColumnId,
    pub formula: String,
}

/// Messages the grid sends to the notebook kernel.
///
/// Failures to reach the kernel come back as `Err`; the kernel refusing an
/// edit comes back as [`KernelReply::Rejected`].
pub trait KernelTransport: Send + Sync + 'static {
    /// Parameters of the pivot table shown in a sheet
    fn fetch_pivot_params(&self, sheet_index: usize) -> TransportFuture<'_, serde_json::Value>;

    fn submit_formula(&self, edit: FormulaEdit) -> TransportFuture<'_, KernelReply>;

    fn rename_column_header(
        &self,
        sheet_index: usize,
        column_id: ColumnId,
        new_header: String,
    ) -> TransportFuture<'_, KernelReply>;

    fn submit_delete_columns(
        &self,
        sheet_index: usize,
        column_ids: Vec<ColumnId>,
    ) -> TransportFuture<'_, KernelReply>;

    /// Render instructions for a column's summary graph
    fn get_summary_graph(
        &self,
        sheet_index: usize,
        column_id: ColumnId,
    ) -> TransportFuture<'_, serde_json::Value>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use futures::FutureExt;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory kernel that records every call
    #[derive(Default)]
    pub struct MockKernel {
        pub calls: Mutex<Vec<String>>,
        /// Calls that ran to completion
        pub applied: Mutex<Vec<String>>,
        pub reject_with: Option<String>,
        pub fail_with: Option<String>,
        pub delay: Option<Duration>,
        pub graph: Option<serde_json::Value>,
    }

    impl MockKernel {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn applied(&self) -> Vec<String> {
            self.applied.lock().unwrap().clone()
        }

        fn reply(&self, call: String) -> TransportFuture<'_, KernelReply> {
            self.calls.lock().unwrap().push(call.clone());
            async move {
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                self.applied.lock().unwrap().push(call);
                if let Some(message) = &self.fail_with {
                    return Err(anyhow::anyhow!(message.clone()));
                }
                Ok(match &self.reject_with {
                    Some(message) => KernelReply::Rejected {
                        message: message.clone(),
                    },
                    None => KernelReply::Accepted,
                })
            }
            .boxed()
        }
    }

    impl KernelTransport for MockKernel {
        fn fetch_pivot_params(&self, sheet_index: usize) -> TransportFuture<'_, serde_json::Value> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("pivot {}", sheet_index));
            async move { Ok(serde_json::json!({ "sheetIndex": sheet_index })) }.boxed()
        }

        fn submit_formula(&self, edit: FormulaEdit) -> TransportFuture<'_, KernelReply> {
            self.reply(format!(
                "formula {} {} {} {}",
                edit.sheet_index, edit.row_index, edit.column_id, edit.formula
            ))
        }

        fn rename_column_header(
            &self,
            sheet_index: usize,
            column_id: ColumnId,
            new_header: String,
        ) -> TransportFuture<'_, KernelReply> {
            self.reply(format!("rename {} {} {}", sheet_index, column_id, new_header))
        }

        fn submit_delete_columns(
            &self,
            sheet_index: usize,
            column_ids: Vec<ColumnId>,
        ) -> TransportFuture<'_, KernelReply> {
            let ids: Vec<&str> = column_ids.iter().map(ColumnId::as_str).collect();
            self.reply(format!("delete {} {}", sheet_index, ids.join(",")))
        }

        fn get_summary_graph(
            &self,
            sheet_index: usize,
            column_id: ColumnId,
        ) -> TransportFuture<'_, serde_json::Value> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("graph {} {}", sheet_index, column_id));
            let graph = self.graph.clone();
            let failure = self.fail_with.clone();
            async move {
                match (graph, failure) {
                    (_, Some(message)) => Err(anyhow::anyhow!(message)),
                    (Some(graph), None) => Ok(graph),
                    (None, None) => Ok(serde_json::Value::Null),
                }
            }
            .boxed()
        }
    }
}
