//! Built-in analysis scripts
//!
//! The registry is static: every script is compiled in and selected by id.

pub mod bytecode;
pub mod calls;
pub mod heatmap;
pub mod hotspot;

pub use bytecode::{BytecodeScript, CodeReport};
pub use calls::{CallSite, CallsScript};
pub use heatmap::{Heatmap, HeatmapScript};
pub use hotspot::HotspotScript;

use anyhow::{bail, Result};
use script_runner::ScriptDescriptor;
use std::collections::BTreeSet;

/// Every built-in script, in registry order
pub fn builtin() -> Vec<ScriptDescriptor> {
    vec![
        ScriptDescriptor::from_script(HeatmapScript),
        ScriptDescriptor::from_script(HotspotScript),
        ScriptDescriptor::from_script(CallsScript),
        ScriptDescriptor::from_script(BytecodeScript),
    ]
}

/// Built-in scripts named by `ids`, plus everything they depend on
///
/// An empty selection enables every script. Unknown ids are rejected.
pub fn select(ids: &[String]) -> Result<Vec<ScriptDescriptor>> {
    let registry = builtin();
    if ids.is_empty() {
        return Ok(registry);
    }

    for id in ids {
        if !registry.iter().any(|script| script.id() == id) {
            let known: Vec<&str> = registry.iter().map(ScriptDescriptor::id).collect();
            bail!("Unknown script {:?} (available: {})", id, known.join(", "));
        }
    }

    let mut wanted: BTreeSet<&str> = ids.iter().map(String::as_str).collect();
    loop {
        let missing: Vec<&str> = registry
            .iter()
            .filter(|script| wanted.contains(script.id()))
            .flat_map(|script| script.depends_on().iter().map(String::as_str))
            .filter(|dependency| !wanted.contains(dependency))
            .collect();
        if missing.is_empty() {
            break;
        }
        tracing::debug!("Enabling dependencies {:?}", missing);
        wanted.extend(missing);
    }

    Ok(registry
        .iter()
        .filter(|script| wanted.contains(script.id()))
        .cloned()
        .collect())
}
