//! `Chain`: fans out a list of follow-up entries.
//!
//! Children are submitted in order through the dispatch handle the
//! processor was invoked with, so they travel on the same transport as the
//! parent. A child without metadata inherits the parent's.

use anyhow::{Context, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use taskrail_core::{DispatchHandle, FieldKind, ObjectSchema, ProcessorDescriptor, TaskEntry, TaskHandler};

pub const CHAIN: &str = "Chain";
pub const CHAIN_SCHEMA: &str = "ChainRequest";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRequest {
    pub entries: Vec<ChainStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStep {
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub data: JsonValue,
    #[serde(default)]
    pub metadata: JsonValue,
}

pub fn chain_schema() -> ObjectSchema {
    ObjectSchema::new().required("entries", FieldKind::Array)
}

pub fn chain_processor() -> ProcessorDescriptor {
    ProcessorDescriptor::new(CHAIN, ChainHandler).with_data_schema(CHAIN_SCHEMA)
}

struct ChainHandler;

#[async_trait]
impl TaskHandler for ChainHandler {
    async fn handle(
        &self,
        data: JsonValue,
        metadata: JsonValue,
        dispatch: DispatchHandle<'_>,
    ) -> anyhow::Result<()> {
        let request: ChainRequest =
            serde_json::from_value(data).context("malformed chain request")?;

        let children: Vec<TaskEntry> = request
            .entries
            .into_iter()
            .map(|step| {
                let meta = if step.metadata.is_null() {
                    metadata.clone()
                } else {
                    step.metadata
                };
                TaskEntry::new(step.task_type, step.data, meta)
            })
            .collect();

        let slots = dispatch.submit_batch(&children).await;
        let rejected: Vec<String> = slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().err().map(|e| format!("#{i}: {e}")))
            .collect();
        if !rejected.is_empty() {
            bail!(
                "{} of {} chained entries were not accepted ({})",
                rejected.len(),
                slots.len(),
                rejected.join(", ")
            );
        }

        debug!(children = slots.len(), "chain fanned out");
        Ok(())
    }
}
