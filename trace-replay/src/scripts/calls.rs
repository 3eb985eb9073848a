//! Call sites and abnormal terminations

use async_trait::async_trait;
use evm_tracer::ExecutionStep;
use script_runner::{MarkKind, Script, ScriptContext, View, ViewType};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const ID: &str = "core.calls";

const CALL_SITES: &str = "callSites";
const FAULTS: &str = "faults";

/// Opcodes that end execution abnormally or destroy the contract
const FAULT_OPCODES: [&str; 3] = ["REVERT", "INVALID", "SELFDESTRUCT"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSite {
    pub pc: u64,
    pub opcode: String,
    pub count: u64,
}

pub fn is_fault(opcode: &str) -> bool {
    FAULT_OPCODES
        .iter()
        .any(|fault| fault.eq_ignore_ascii_case(opcode))
}

/// Marks every call site (`warn`) and fault site (`danger`) once
pub struct CallsScript;

#[async_trait]
impl Script for CallsScript {
    fn id(&self) -> &str {
        ID
    }

    async fn on_step(
        &self,
        ctx: &mut ScriptContext<'_>,
        step: &ExecutionStep,
    ) -> anyhow::Result<()> {
        let opcode = step.opcode.to_ascii_uppercase();

        if ctx.is_call() {
            let sites = ctx
                .store()
                .get_or_insert_with(CALL_SITES, BTreeMap::<u64, CallSite>::new)?;
            let first = !sites.contains_key(&step.pc);
            sites
                .entry(step.pc)
                .or_insert_with(|| CallSite {
                    pc: step.pc,
                    opcode: opcode.clone(),
                    count: 0,
                })
                .count += 1;
            if first {
                ctx.mark_pc(step.pc, MarkKind::Warn, Some(&opcode));
            }
        } else if is_fault(&opcode) {
            let faults = ctx
                .store()
                .get_or_insert_with(FAULTS, BTreeMap::<u64, String>::new)?;
            if faults.insert(step.pc, opcode.clone()).is_none() {
                ctx.warn(format!("{opcode} at pc {}", step.pc));
                ctx.mark_pc(step.pc, MarkKind::Danger, Some(&opcode));
            }
        }
        Ok(())
    }

    async fn on_finish(&self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<Option<Value>> {
        let sites: Vec<CallSite> = ctx
            .store()
            .get::<BTreeMap<u64, CallSite>>(CALL_SITES)
            .map(|sites| sites.values().cloned().collect())
            .unwrap_or_default();
        let faults = ctx
            .store()
            .get::<BTreeMap<u64, String>>(FAULTS)
            .cloned()
            .unwrap_or_default();

        let rows: Vec<Value> = sites
            .iter()
            .map(|site| json!([site.pc, site.opcode, site.count]))
            .collect();
        ctx.register_view(
            View::new(
                ID,
                ViewType::Table,
                json!({ "columns": ["pc", "opcode", "count"], "rows": rows }),
            )
            .with_title("Call sites"),
        );

        Ok(Some(json!({ "callSites": sites, "faults": faults })))
    }
}
