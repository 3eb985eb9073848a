//! Hottest program counter, derived from the heatmap result

use super::heatmap::{self, Heatmap};
use async_trait::async_trait;
use script_runner::{MarkKind, Script, ScriptContext};
use serde_json::{json, Value};

pub const ID: &str = "core.hotspot";

/// Marks the most executed pc
pub struct HotspotScript;

#[async_trait]
impl Script for HotspotScript {
    fn id(&self) -> &str {
        ID
    }

    fn depends_on(&self) -> Vec<String> {
        vec![heatmap::ID.to_string()]
    }

    async fn on_finish(&self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<Option<Value>> {
        let Some(heatmap) = ctx.result_as::<Heatmap>(heatmap::ID)? else {
            ctx.warn("no heatmap result");
            return Ok(None);
        };
        let Some((pc, hits)) = heatmap.hottest() else {
            return Ok(None);
        };

        ctx.log(format!("hotspot at pc {pc} ({hits} of {} steps)", heatmap.total_steps));
        ctx.mark_pc(pc, MarkKind::Info, Some(&format!("hotspot: {hits} hits")));
        Ok(Some(json!({ "maxPc": pc, "hits": hits })))
    }
}
