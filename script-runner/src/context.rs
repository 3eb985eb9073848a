//! Execution context handed to one script for one hook invocation
//!
//! The context borrows the run environment, the invoking script's store, the
//! shared bus and the run's mark/view accumulators. It lives only for the
//! duration of a single hook call; its writes are the only lasting effects.

use crate::output::{Mark, MarkKind, View};
use crate::store::{SharedBus, Store};
use crate::Phase;
use evm_tracer::{
    classify, Disassembly, ExecutionStep, OpcodeFlags, RunEnvironment, TxMeta, Word,
    INVALID_OPCODE, UNKNOWN_BYTE,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Marks and views accumulated over a run, in contribution order
#[derive(Debug, Default)]
pub(crate) struct Channels {
    pub(crate) marks: Vec<Mark>,
    pub(crate) views: Vec<View>,
}

/// Per-invocation view of the run for one script
pub struct ScriptContext<'a> {
    script_id: &'a str,
    phase: Phase,
    env: &'a RunEnvironment,
    step_index: Option<usize>,
    step: Option<&'a ExecutionStep>,
    opcode_name: &'a str,
    opcode_byte: u8,
    flags: OpcodeFlags,
    store: &'a mut Store,
    shared: &'a mut SharedBus,
    channels: &'a mut Channels,
}

/// Builds contexts over one borrowed environment
pub(crate) struct ContextBuilder<'e> {
    env: &'e RunEnvironment,
}

impl<'e> ContextBuilder<'e> {
    pub(crate) fn new(env: &'e RunEnvironment) -> Self {
        Self { env }
    }

    /// Assemble the context for `script_id` in `phase`
    ///
    /// One-shot phases bind no step: opcode name `""`, byte 0 and no flags.
    /// Other phases bind the step at `step_index` when the trace has one, and
    /// fall back to pc 0 / `INVALID` / `0xFF` otherwise.
    pub(crate) fn build<'a>(
        &self,
        script_id: &'a str,
        phase: Phase,
        step_index: Option<usize>,
        store: &'a mut Store,
        shared: &'a mut SharedBus,
        channels: &'a mut Channels,
    ) -> ScriptContext<'a>
    where
        'e: 'a,
    {
        let env: &'a RunEnvironment = self.env;
        let step = step_index.and_then(|index| env.step(index));

        let (opcode_name, opcode_byte, flags) = if phase.is_one_shot() {
            ("", 0, OpcodeFlags::default())
        } else {
            let pc = step.map_or(0, |s| s.pc);
            let opcode = step.map_or(INVALID_OPCODE, |s| s.opcode.as_str());
            (
                opcode,
                env.runtime_disasm.byte_at(pc).unwrap_or(UNKNOWN_BYTE),
                classify(opcode),
            )
        };

        ScriptContext {
            script_id,
            phase,
            env,
            step_index,
            step,
            opcode_name,
            opcode_byte,
            flags,
            store,
            shared,
            channels,
        }
    }
}

impl<'a> ScriptContext<'a> {
    pub fn script_id(&self) -> &str {
        self.script_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whole run environment
    pub fn env(&self) -> &RunEnvironment {
        self.env
    }

    pub fn contract_address(&self) -> &str {
        &self.env.contract_address
    }

    pub fn runtime_bytecode(&self) -> &str {
        &self.env.runtime_bytecode
    }

    pub fn creation_bytecode(&self) -> Option<&str> {
        self.env.creation_bytecode.as_deref()
    }

    pub fn runtime_disasm(&self) -> &Disassembly {
        &self.env.runtime_disasm
    }

    pub fn creation_disasm(&self) -> &Disassembly {
        &self.env.creation_disasm
    }

    /// Full trace of the transaction
    pub fn trace(&self) -> &[ExecutionStep] {
        &self.env.trace
    }

    pub fn tx(&self) -> &TxMeta {
        &self.env.tx
    }

    pub fn is_creation_phase(&self) -> bool {
        self.env.is_creation_phase
    }

    /// Index of the bound step; `None` in deploy-time runs
    pub fn step_index(&self) -> Option<usize> {
        self.step_index
    }

    pub fn step(&self) -> Option<&ExecutionStep> {
        self.step
    }

    pub fn pc(&self) -> u64 {
        self.step.map_or(0, |step| step.pc)
    }

    /// Mnemonic of the bound step; `INVALID` without one, `""` in deploy-time runs
    pub fn opcode_name(&self) -> &str {
        self.opcode_name
    }

    /// Runtime code byte at the current pc (`0xFF` when out of range, 0 in
    /// deploy-time runs)
    pub fn opcode_byte(&self) -> u8 {
        self.opcode_byte
    }

    pub fn stack(&self) -> &[Word] {
        self.step.map(|step| step.stack.as_slice()).unwrap_or(&[])
    }

    pub fn storage(&self) -> Option<&BTreeMap<String, String>> {
        self.step.and_then(|step| step.raw_storage.as_ref())
    }

    pub fn flags(&self) -> OpcodeFlags {
        self.flags
    }

    pub fn is_jump(&self) -> bool {
        self.flags.is_jump
    }

    pub fn is_call(&self) -> bool {
        self.flags.is_call
    }

    pub fn is_terminator(&self) -> bool {
        self.flags.is_terminator
    }

    pub fn is_push(&self) -> bool {
        self.flags.is_push
    }

    pub fn is_dup(&self) -> bool {
        self.flags.is_dup
    }

    pub fn is_swap(&self) -> bool {
        self.flags.is_swap
    }

    /// This script's private store
    pub fn store(&mut self) -> &mut Store {
        &mut *self.store
    }

    /// Read-only view of the shared bus
    pub fn shared(&self) -> &SharedBus {
        &*self.shared
    }

    /// Last result published by `script_id`
    pub fn result(&self, script_id: &str) -> Option<&Value> {
        self.shared.get(script_id)
    }

    /// Last result published by `script_id`, decoded into `T`
    pub fn result_as<T: DeserializeOwned>(
        &self,
        script_id: &str,
    ) -> serde_json::Result<Option<T>> {
        self.shared
            .get(script_id)
            .map(|value| T::deserialize(value))
            .transpose()
    }

    /// Publish a result under this script's id
    pub fn set_result<T: Serialize>(&mut self, value: &T) -> serde_json::Result<()> {
        let value = serde_json::to_value(value)?;
        self.shared.publish(self.script_id, value);
        Ok(())
    }

    /// Annotate a program counter
    pub fn mark_pc(&mut self, pc: u64, kind: MarkKind, label: Option<&str>) {
        self.channels.marks.push(Mark {
            pc,
            kind,
            label: label.map(str::to_string),
            script_id: self.script_id.to_string(),
        });
    }

    /// Contribute a view; its owner is always this script
    pub fn register_view(&mut self, mut view: View) {
        view.script_id = self.script_id.to_string();
        self.channels.views.push(view);
    }

    pub fn log(&self, msg: impl AsRef<str>) {
        tracing::info!(script = self.script_id, "{}", msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        tracing::warn!(script = self.script_id, "{}", msg.as_ref());
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        tracing::error!(script = self.script_id, "{}", msg.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ViewType;
    use serde_json::json;

    fn env() -> RunEnvironment {
        // PUSH1 0x00 JUMP
        RunEnvironment::new("0xc0ffee", "0x600056")
            .unwrap()
            .with_trace(vec![
                ExecutionStep::new(0, "PUSH1"),
                ExecutionStep::new(2, "jump").with_stack(vec![Word::from(0)]),
                ExecutionStep::new(9, "STOP"),
            ])
    }

    struct Parts {
        store: Store,
        shared: SharedBus,
        channels: Channels,
    }

    impl Parts {
        fn new() -> Self {
            Self {
                store: Store::new(),
                shared: SharedBus::new(),
                channels: Channels::default(),
            }
        }
    }

    #[test]
    fn test_step_fields_and_flags() {
        let env = env();
        let builder = ContextBuilder::new(&env);
        let mut parts = Parts::new();
        let ctx = builder.build(
            "s",
            Phase::OnStep,
            Some(1),
            &mut parts.store,
            &mut parts.shared,
            &mut parts.channels,
        );

        assert_eq!(ctx.pc(), 2);
        assert_eq!(ctx.opcode_name(), "jump");
        assert_eq!(ctx.opcode_byte(), 0x56);
        assert!(ctx.is_jump());
        assert!(!ctx.is_push() && !ctx.is_dup() && !ctx.is_swap());
        assert!(!ctx.is_terminator());
        assert_eq!(ctx.stack(), &[Word::from(0)]);
        assert_eq!(ctx.trace().len(), 3);
        assert_eq!(ctx.contract_address(), "0xc0ffee");
    }

    #[test]
    fn test_stack_family_accessors() {
        let env = env();
        let builder = ContextBuilder::new(&env);
        let mut parts = Parts::new();
        let ctx = builder.build(
            "s",
            Phase::OnStep,
            Some(0),
            &mut parts.store,
            &mut parts.shared,
            &mut parts.channels,
        );
        assert!(ctx.is_push());
        assert!(!ctx.is_dup());
        assert!(!ctx.is_swap());
        assert_eq!(ctx.opcode_byte(), 0x60);
    }

    #[test]
    fn test_pc_outside_runtime_table_reads_ff() {
        let env = env();
        let builder = ContextBuilder::new(&env);
        let mut parts = Parts::new();
        let ctx = builder.build(
            "s",
            Phase::OnStep,
            Some(2),
            &mut parts.store,
            &mut parts.shared,
            &mut parts.channels,
        );
        assert_eq!(ctx.pc(), 9);
        assert_eq!(ctx.opcode_byte(), UNKNOWN_BYTE);
        assert!(ctx.is_terminator());
    }

    #[test]
    fn test_empty_trace_defaults() {
        let env = RunEnvironment::new("0x1", "0x00").unwrap();
        let builder = ContextBuilder::new(&env);
        let mut parts = Parts::new();
        let ctx = builder.build(
            "s",
            Phase::OnTxStart,
            Some(0),
            &mut parts.store,
            &mut parts.shared,
            &mut parts.channels,
        );
        assert!(ctx.step().is_none());
        assert_eq!(ctx.pc(), 0);
        assert_eq!(ctx.opcode_name(), INVALID_OPCODE);
        assert!(ctx.stack().is_empty());
        assert!(ctx.is_terminator());
    }

    #[test]
    fn test_one_shot_context_has_no_step() {
        let env = env();
        let builder = ContextBuilder::new(&env);
        let mut parts = Parts::new();
        let ctx = builder.build(
            "s",
            Phase::OnDeploy,
            None,
            &mut parts.store,
            &mut parts.shared,
            &mut parts.channels,
        );
        assert_eq!(ctx.step_index(), None);
        assert_eq!(ctx.pc(), 0);
        assert_eq!(ctx.opcode_name(), "");
        assert_eq!(ctx.opcode_byte(), 0);
        assert_eq!(ctx.flags(), OpcodeFlags::default());
        assert!(!ctx.is_terminator());
    }

    #[test]
    fn test_side_channels_are_owned_by_invoker() {
        let env = env();
        let builder = ContextBuilder::new(&env);
        let mut parts = Parts::new();
        parts.shared.publish("other", json!({"x": 5}));
        {
            let mut ctx = builder.build(
                "me",
                Phase::OnFinish,
                Some(2),
                &mut parts.store,
                &mut parts.shared,
                &mut parts.channels,
            );
            ctx.mark_pc(2, MarkKind::Warn, Some("jump"));
            ctx.mark_pc(2, MarkKind::Warn, None);

            let mut view = View::new("v", ViewType::List, json!([]));
            view.script_id = "someone-else".into();
            ctx.register_view(view);

            #[derive(serde::Deserialize)]
            struct Other {
                x: u64,
            }
            let other: Other = ctx.result_as("other").unwrap().unwrap();
            assert_eq!(other.x, 5);
            assert!(ctx.result_as::<Other>("missing").unwrap().is_none());

            ctx.set_result(&json!({"done": true})).unwrap();
            ctx.store().insert("k", 1u8);
        }

        assert_eq!(parts.channels.marks.len(), 2, "marks are never deduplicated");
        assert_eq!(parts.channels.marks[0].script_id, "me");
        assert_eq!(parts.channels.views[0].script_id, "me");
        assert_eq!(parts.shared.get("me"), Some(&json!({"done": true})));
        assert_eq!(parts.store.get::<u8>("k"), Some(&1));
    }
}
