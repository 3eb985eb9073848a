//! Program counter heatmap

use async_trait::async_trait;
use evm_tracer::ExecutionStep;
use script_runner::{Script, ScriptContext, View, ViewType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const ID: &str = "core.heatmap";

const PC_HITS: &str = "pcHits";

/// Published result of [`HeatmapScript`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heatmap {
    pub total_steps: usize,
    /// Visits per pc
    pub pc_hits: BTreeMap<u64, u64>,
}

impl Heatmap {
    /// Most visited pc and its hit count; ties go to the lowest pc
    pub fn hottest(&self) -> Option<(u64, u64)> {
        self.pc_hits
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(&pc, &hits)| (pc, hits))
    }
}

/// Counts how often each pc executes
pub struct HeatmapScript;

#[async_trait]
impl Script for HeatmapScript {
    fn id(&self) -> &str {
        ID
    }

    async fn on_start(&self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        ctx.store().insert(PC_HITS, BTreeMap::<u64, u64>::new());
        Ok(())
    }

    async fn on_step(
        &self,
        ctx: &mut ScriptContext<'_>,
        step: &ExecutionStep,
    ) -> anyhow::Result<()> {
        *ctx.store()
            .get_or_insert_with(PC_HITS, BTreeMap::<u64, u64>::new)?
            .entry(step.pc)
            .or_default() += 1;
        Ok(())
    }

    async fn on_finish(&self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<Option<Value>> {
        let heatmap = Heatmap {
            total_steps: ctx.trace().len(),
            pc_hits: ctx
                .store()
                .get::<BTreeMap<u64, u64>>(PC_HITS)
                .cloned()
                .unwrap_or_default(),
        };
        let data = serde_json::to_value(&heatmap)?;

        ctx.register_view(View::new(ID, ViewType::Heatmap, data.clone()).with_title("PC Heatmap"));
        Ok(Some(data))
    }
}
