//! Snapshot recorder
//!
//! After every hook invocation the runner records an owned copy of the
//! invoking script's store, the shared bus and (when bound) the current step.
//! Nothing in a [`Snapshot`] refers back to live state.

use crate::store::{SharedBus, Store};
use crate::Phase;
use evm_tracer::ExecutionStep;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Audit record of one hook invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub script_id: String,
    pub phase: Phase,
    /// `None` for deploy-time runs
    pub step_index: Option<usize>,
    /// The bound step, stack words as decimal strings
    pub step: Option<Value>,
    pub store: BTreeMap<String, Value>,
    pub shared: BTreeMap<String, Value>,
}

impl Snapshot {
    /// Copy the state visible to `script_id` right after a hook returned
    pub fn capture(
        script_id: &str,
        phase: Phase,
        step_index: Option<usize>,
        step: Option<&ExecutionStep>,
        store: &Store,
        shared: &SharedBus,
    ) -> Self {
        Self {
            script_id: script_id.to_string(),
            phase,
            step_index,
            step: step.and_then(|step| serde_json::to_value(step).ok()),
            store: store.snapshot(),
            shared: shared.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evm_tracer::Word;
    use serde_json::json;

    #[test]
    fn test_capture_copies_step_store_and_bus() {
        let step = ExecutionStep::new(4, "ADD").with_stack(vec![Word::from(1), Word::from(2)]);
        let mut store = Store::new();
        store.insert("seen", vec![4u64]);
        let mut shared = SharedBus::new();
        shared.publish("other", json!(true));

        let snapshot =
            Snapshot::capture("me", Phase::OnStep, Some(3), Some(&step), &store, &shared);

        store.get_mut::<Vec<u64>>("seen").unwrap().push(5);
        shared.publish("other", json!(false));

        assert_eq!(snapshot.step_index, Some(3));
        assert_eq!(snapshot.step.as_ref().unwrap()["stack"], json!(["1", "2"]));
        assert_eq!(snapshot.store.get("seen"), Some(&json!([4])));
        assert_eq!(snapshot.shared.get("other"), Some(&json!(true)));
    }

    #[test]
    fn test_capture_without_step() {
        let snapshot = Snapshot::capture(
            "me",
            Phase::OnDeploy,
            None,
            None,
            &Store::new(),
            &SharedBus::new(),
        );
        assert!(snapshot.step.is_none());
        assert!(snapshot.store.is_empty());
        assert_eq!(serde_json::to_value(&snapshot).unwrap()["phase"], json!("onDeploy"));
    }
}
