//! Deployed code summary

use async_trait::async_trait;
use evm_tracer::Disassembly;
use script_runner::{Script, ScriptContext, View, ViewType};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

pub const ID: &str = "core.bytecode";

/// Published result of [`BytecodeScript`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeReport {
    pub address: String,
    pub runtime_size: usize,
    pub creation_size: usize,
    /// SHA-256 of the runtime code, `0x` hex
    pub runtime_sha256: String,
    pub redeploy: bool,
}

impl CodeReport {
    pub fn new(
        address: &str,
        runtime: &Disassembly,
        creation: &Disassembly,
        redeploy: bool,
    ) -> Self {
        Self {
            address: address.to_string(),
            runtime_size: runtime.len(),
            creation_size: creation.len(),
            runtime_sha256: format!("0x{}", hex::encode(Sha256::digest(runtime.as_bytes()))),
            redeploy,
        }
    }
}

/// Reports code sizes and the runtime code digest at (re)deploy time
pub struct BytecodeScript;

impl BytecodeScript {
    fn report(ctx: &mut ScriptContext<'_>, redeploy: bool) -> anyhow::Result<()> {
        let report = CodeReport::new(
            ctx.contract_address(),
            ctx.runtime_disasm(),
            ctx.creation_disasm(),
            redeploy,
        );
        ctx.log(format!(
            "{} bytes of runtime code at {} ({})",
            report.runtime_size, report.address, report.runtime_sha256
        ));

        ctx.register_view(
            View::new(
                ID,
                ViewType::List,
                json!([
                    { "label": "Runtime size", "value": report.runtime_size },
                    { "label": "Creation size", "value": report.creation_size },
                    { "label": "Runtime SHA-256", "value": report.runtime_sha256 },
                ]),
            )
            .with_title("Bytecode"),
        );
        ctx.set_result(&report)?;
        Ok(())
    }
}

#[async_trait]
impl Script for BytecodeScript {
    fn id(&self) -> &str {
        ID
    }

    async fn on_deploy(&self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        Self::report(ctx, false)
    }

    async fn on_redeploy(&self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        Self::report(ctx, true)
    }
}
