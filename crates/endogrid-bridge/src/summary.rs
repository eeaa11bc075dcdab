use serde::{Deserialize, Serialize};
use tracing::warn;

use endogrid_core::ColumnId;

use crate::transport::KernelTransport;

/// Declarative render instructions for a column summary graph.
///
/// The shell draws these with its own charting code; nothing received from
/// the kernel is ever executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GraphPayload {
    /// A bar chart with one bar per label
    #[serde(rename_all = "camelCase")]
    Bar {
        #[serde(default)]
        title: String,
        labels: Vec<String>,
        values: Vec<f64>,
    },
    /// Text shown instead of a chart, e.g. for columns with no numeric data
    Message { text: String },
    /// Shown while loading, or when the payload could not be used
    Placeholder,
}

impl GraphPayload {
    /// Interpret a payload from the kernel, degrading to a placeholder
    pub fn from_json(value: serde_json::Value) -> Self {
        match serde_json::from_value::<GraphPayload>(value) {
            Ok(GraphPayload::Bar { labels, values, .. }) if labels.len() != values.len() => {
                warn!(
                    labels = labels.len(),
                    values = values.len(),
                    "bar graph labels and values differ in length"
                );
                GraphPayload::Placeholder
            }
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "unusable summary graph payload");
                GraphPayload::Placeholder
            }
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, GraphPayload::Placeholder)
    }
}

/// Ask the kernel for a column's summary graph
pub async fn fetch_summary_graph<T: KernelTransport + ?Sized>(
    transport: &T,
    sheet_index: usize,
    column_id: ColumnId,
) -> GraphPayload {
    match transport.get_summary_graph(sheet_index, column_id.clone()).await {
        Ok(value) => GraphPayload::from_json(value),
        Err(e) => {
            warn!(sheet_index, %column_id, error = %e, "failed to fetch summary graph");
            GraphPayload::Placeholder
        }
    }
}
