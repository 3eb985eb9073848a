//! Run artifacts: results, marks, views and the aggregated output

use crate::Snapshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a pc mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkKind {
    Danger,
    Info,
    Warn,
}

/// Annotation on one program counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    pub pc: u64,
    pub kind: MarkKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Script that placed the mark
    pub script_id: String,
}

/// How the viewer should render a view's data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewType {
    Heatmap,
    Table,
    List,
    Graph,
    Timeline,
    StorageDiff,
    Custom,
}

/// Opaque presentation payload contributed by a script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    /// Unique within one run
    pub id: String,
    /// Owning script; always overwritten with the registering script's id
    #[serde(default)]
    pub script_id: String,
    #[serde(rename = "type")]
    pub view_type: ViewType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub data: Value,
}

impl View {
    pub fn new(id: impl Into<String>, view_type: ViewType, data: Value) -> Self {
        Self {
            id: id.into(),
            script_id: String::new(),
            view_type,
            title: None,
            data,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Value a script returned from its finishing hook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptResult {
    pub script_id: String,
    pub data: Value,
}

/// Everything one successful run produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    /// Random hex id of the run
    pub run_id: String,
    /// Results in resolved script order
    pub scripts: Vec<ScriptResult>,
    pub marks: Vec<Mark>,
    pub views: Vec<View>,
    pub snapshots: Vec<Snapshot>,
}

impl RunOutput {
    /// Result published by `script_id`, if any
    pub fn result(&self, script_id: &str) -> Option<&Value> {
        self.scripts
            .iter()
            .find(|result| result.script_id == script_id)
            .map(|result| &result.data)
    }

    /// Snapshots recorded for `script_id`, in recording order
    pub fn snapshots_for<'a>(
        &'a self,
        script_id: &'a str,
    ) -> impl Iterator<Item = &'a Snapshot> + 'a {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.script_id == script_id)
    }
}
