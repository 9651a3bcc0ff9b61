//! The action pipeline engine.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{Debug, Write as _};
use std::hash::Hash;
use std::rc::Rc;

use pulse_types::{ArgTuple, Payload, PayloadFn, Signature};
use tracing::debug;

use crate::container::{
    HandlerRecord, ListenerFn, ProcessorFn, StageContainer, ValidatorFn,
};
use crate::{ActionError, ActionHandle, ActionResult, HandlerKind, ProcessError};

type Sink = Rc<dyn Fn(&str)>;
type GlobalFn<K> = Rc<RefCell<dyn FnMut(&K, &ActionResult)>>;

struct GlobalRecord<K> {
    id: u64,
    priority: i32,
    description: String,
    func: GlobalFn<K>,
}

struct PipelineState<K> {
    actions: HashMap<K, Vec<StageContainer>>,
    handle_index: HashMap<u64, K>,
    next_handle_id: u64,
    globals: Vec<GlobalRecord<K>>,
    next_global_id: u64,
}

impl<K> Default for PipelineState<K> {
    fn default() -> Self {
        Self {
            actions: HashMap::new(),
            handle_index: HashMap::new(),
            next_handle_id: 1,
            globals: Vec::new(),
            next_global_id: 1,
        }
    }
}

enum StageFn {
    Listener(ListenerFn),
    Validator(ValidatorFn),
    Processor(ProcessorFn),
}

/// Staged execution runtime keyed by an arbitrary key type.
///
/// For each key, handlers register into one of six stages; `execute`
/// runs the stages in order (trigger listeners, validators,
/// validation listeners, sequential processors, the final processor,
/// completion listeners) with ascending-priority ordering inside
/// each stage and per-stage accounting in the returned
/// [`ActionResult`].
///
/// # Registry modes
///
/// - Default (non-overload): the first registration under a key fixes
///   the key's signature; registrations with a different signature
///   are refused with [`ActionError::SignatureConflict`].
/// - [`with_overloads`](Self::with_overloads): a key carries one
///   container per distinct signature, and `execute` routes by the
///   argument types.
///
/// # Re-entrancy
///
/// As with the other pulse engines, methods take `&self`, stage
/// dispatch iterates id snapshots and re-resolves each handler just
/// before running it, and no internal borrow is held while user code
/// runs.
///
/// # Example
///
/// ```
/// use pulse_action::ActionPipeline;
///
/// let pipeline: ActionPipeline<&str> = ActionPipeline::new();
/// pipeline
///     .add_validator("resize", |w: &mut i32| *w > 0, "positive width", 0)
///     .unwrap();
/// pipeline
///     .add_sequential_processor("resize", |w: &mut i32| {
///         println!("resizing to {w}");
///         Ok(())
///     }, "apply", 0)
///     .unwrap();
///
/// assert!(pipeline.execute(&"resize", (800,)).success);
/// assert!(!pipeline.execute(&"resize", (-1,)).validation_passed);
/// ```
pub struct ActionPipeline<K = String>
where
    K: Eq + Hash + Clone + Debug,
{
    state: RefCell<PipelineState<K>>,
    sink: RefCell<Sink>,
    overload: bool,
}

impl<K: Eq + Hash + Clone + Debug> Default for ActionPipeline<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone + Debug> ActionPipeline<K> {
    /// Creates a pipeline in non-overload mode: one fixed signature
    /// per key.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RefCell::new(PipelineState::default()),
            sink: RefCell::new(Rc::new(|msg: &str| eprintln!("ActionPipeline error: {msg}"))),
            overload: false,
        }
    }

    /// Creates a pipeline in overload mode: a key may carry handler
    /// containers for several distinct signatures, routed by the
    /// execute arguments.
    #[must_use]
    pub fn with_overloads() -> Self {
        Self {
            overload: true,
            ..Self::new()
        }
    }

    /// Replaces the diagnostic sink.
    pub fn set_error_sink(&self, sink: impl Fn(&str) + 'static) {
        *self.sink.borrow_mut() = Rc::new(sink);
    }

    fn report(&self, err: &ActionError) {
        use pulse_types::ErrorCode;
        debug!(code = err.code(), "{err}");
        let sink = self.sink.borrow().clone();
        sink(&err.to_string());
    }

    // ---- registration ---------------------------------------------

    fn register(
        &self,
        key: K,
        kind: HandlerKind,
        signature: Signature,
        func: StageFn,
        description: String,
        priority: i32,
    ) -> Result<ActionHandle<K>, ActionError> {
        let mut state = self.state.borrow_mut();
        let id = state.next_handle_id;

        let containers = state.actions.entry(key.clone()).or_default();
        let index = match containers.iter().position(|c| *c.signature() == signature) {
            Some(found) => found,
            None if containers.is_empty() || self.overload => {
                containers.push(StageContainer::new(signature.clone()));
                containers.len() - 1
            }
            None => {
                let err = ActionError::SignatureConflict {
                    key: format!("{key:?}"),
                    existing: containers[0].signature().to_string(),
                    requested: signature.to_string(),
                };
                drop(state);
                self.report(&err);
                return Err(err);
            }
        };

        let container = &mut containers[index];
        let mut replaced_final: Option<u64> = None;
        match func {
            StageFn::Listener(func) => container.add_listener(
                kind,
                HandlerRecord {
                    id,
                    description,
                    priority,
                    func,
                },
            ),
            StageFn::Validator(func) => container.add_validator(HandlerRecord {
                id,
                description,
                priority,
                func,
            }),
            StageFn::Processor(func) => {
                let record = HandlerRecord {
                    id,
                    description,
                    priority,
                    func,
                };
                if kind == HandlerKind::FinalProcessor {
                    replaced_final = container.set_final_processor(record);
                } else {
                    container.add_sequential_processor(record);
                }
            }
        }
        state.next_handle_id += 1;
        if let Some(old) = replaced_final {
            state.handle_index.remove(&old);
        }
        state.handle_index.insert(id, key.clone());
        debug!(key = ?key, id, %kind, priority, "handler registered");
        Ok(ActionHandle::new(id, key, kind))
    }

    /// Registers a stage-1 trigger listener.
    ///
    /// # Errors
    ///
    /// [`ActionError::SignatureConflict`] in non-overload mode when
    /// the key is fixed to a different signature. All the other
    /// registration methods share this contract.
    pub fn add_trigger_listener<A, F>(
        &self,
        key: K,
        listener: F,
        description: impl Into<String>,
        priority: i32,
    ) -> Result<ActionHandle<K>, ActionError>
    where
        A: ArgTuple,
        F: PayloadFn<A, ()> + 'static,
    {
        let mut listener = listener;
        let func: ListenerFn = Rc::new(RefCell::new(move |payload: &mut Payload| {
            listener.invoke(payload).is_some()
        }));
        self.register(
            key,
            HandlerKind::TriggerListener,
            A::signature(),
            StageFn::Listener(func),
            description.into(),
            priority,
        )
    }

    /// Registers a validator. The first validator to return `false`
    /// aborts the execution.
    pub fn add_validator<A, F>(
        &self,
        key: K,
        validator: F,
        description: impl Into<String>,
        priority: i32,
    ) -> Result<ActionHandle<K>, ActionError>
    where
        A: ArgTuple,
        F: PayloadFn<A, bool> + 'static,
    {
        let mut validator = validator;
        let func: ValidatorFn = Rc::new(RefCell::new(move |payload: &mut Payload| {
            validator.invoke(payload)
        }));
        self.register(
            key,
            HandlerKind::Validator,
            A::signature(),
            StageFn::Validator(func),
            description.into(),
            priority,
        )
    }

    /// Registers a stage-3 listener, run only when validation passed.
    pub fn add_validation_listener<A, F>(
        &self,
        key: K,
        listener: F,
        description: impl Into<String>,
        priority: i32,
    ) -> Result<ActionHandle<K>, ActionError>
    where
        A: ArgTuple,
        F: PayloadFn<A, ()> + 'static,
    {
        let mut listener = listener;
        let func: ListenerFn = Rc::new(RefCell::new(move |payload: &mut Payload| {
            listener.invoke(payload).is_some()
        }));
        self.register(
            key,
            HandlerKind::ValidationListener,
            A::signature(),
            StageFn::Listener(func),
            description.into(),
            priority,
        )
    }

    /// Registers an ordered processor. An `Err` return aborts the
    /// pipeline: later processors and completion listeners do not
    /// run.
    pub fn add_sequential_processor<A, F>(
        &self,
        key: K,
        processor: F,
        description: impl Into<String>,
        priority: i32,
    ) -> Result<ActionHandle<K>, ActionError>
    where
        A: ArgTuple,
        F: PayloadFn<A, Result<(), ProcessError>> + 'static,
    {
        let mut processor = processor;
        let func: ProcessorFn = Rc::new(RefCell::new(move |payload: &mut Payload| {
            processor.invoke(payload)
        }));
        self.register(
            key,
            HandlerKind::SequentialProcessor,
            A::signature(),
            StageFn::Processor(func),
            description.into(),
            priority,
        )
    }

    /// Installs the terminal processor for the key (and signature, in
    /// overload mode), replacing any previous one.
    pub fn set_final_processor<A, F>(
        &self,
        key: K,
        processor: F,
        description: impl Into<String>,
        priority: i32,
    ) -> Result<ActionHandle<K>, ActionError>
    where
        A: ArgTuple,
        F: PayloadFn<A, Result<(), ProcessError>> + 'static,
    {
        let mut processor = processor;
        let func: ProcessorFn = Rc::new(RefCell::new(move |payload: &mut Payload| {
            processor.invoke(payload)
        }));
        self.register(
            key,
            HandlerKind::FinalProcessor,
            A::signature(),
            StageFn::Processor(func),
            description.into(),
            priority,
        )
    }

    /// Registers a stage-6 listener, run after processing completed.
    pub fn add_completion_listener<A, F>(
        &self,
        key: K,
        listener: F,
        description: impl Into<String>,
        priority: i32,
    ) -> Result<ActionHandle<K>, ActionError>
    where
        A: ArgTuple,
        F: PayloadFn<A, ()> + 'static,
    {
        let mut listener = listener;
        let func: ListenerFn = Rc::new(RefCell::new(move |payload: &mut Payload| {
            listener.invoke(payload).is_some()
        }));
        self.register(
            key,
            HandlerKind::CompletionListener,
            A::signature(),
            StageFn::Listener(func),
            description.into(),
            priority,
        )
    }

    /// Generic registration of a void handler into any stage. A void
    /// handler registered as a [`HandlerKind::Validator`] is wrapped
    /// to accept unconditionally, so rejection requires an explicit
    /// bool-returning validator via
    /// [`add_validator`](Self::add_validator).
    pub fn add_handler<A, F>(
        &self,
        key: K,
        kind: HandlerKind,
        handler: F,
        description: impl Into<String>,
        priority: i32,
    ) -> Result<ActionHandle<K>, ActionError>
    where
        A: ArgTuple,
        F: PayloadFn<A, ()> + 'static,
    {
        let mut handler = handler;
        let func = match kind {
            HandlerKind::Validator => {
                StageFn::Validator(Rc::new(RefCell::new(move |payload: &mut Payload| {
                    handler.invoke(payload).map(|()| true)
                })))
            }
            HandlerKind::SequentialProcessor | HandlerKind::FinalProcessor => {
                StageFn::Processor(Rc::new(RefCell::new(move |payload: &mut Payload| {
                    handler.invoke(payload).map(Ok)
                })))
            }
            HandlerKind::TriggerListener
            | HandlerKind::ValidationListener
            | HandlerKind::CompletionListener => {
                StageFn::Listener(Rc::new(RefCell::new(move |payload: &mut Payload| {
                    handler.invoke(payload).is_some()
                })))
            }
        };
        self.register(key, kind, A::signature(), func, description.into(), priority)
    }

    /// Removes the handler behind `handle`. In overload mode,
    /// containers left without handlers are pruned.
    pub fn remove_handler(&self, handle: &ActionHandle<K>) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(key) = state.handle_index.get(&handle.id()).cloned() else {
            return false;
        };
        let Some(containers) = state.actions.get_mut(&key) else {
            return false;
        };
        let removed = containers
            .iter_mut()
            .any(|container| container.remove(handle.id(), handle.kind()));
        if !removed {
            return false;
        }
        if self.overload {
            containers.retain(|c| c.total_handlers() > 0);
            if containers.is_empty() {
                state.actions.remove(&key);
            }
        }
        state.handle_index.remove(&handle.id());
        debug!(key = ?key, id = handle.id(), kind = %handle.kind(), "handler removed");
        true
    }

    /// Drops every registration and resets id counters.
    pub fn clear(&self) {
        *self.state.borrow_mut() = PipelineState::default();
    }

    // ---- global completion listeners ------------------------------

    /// Registers a listener invoked with `(key, result)` after every
    /// execute, whatever its outcome.
    pub fn add_global_completion_listener(
        &self,
        listener: impl FnMut(&K, &ActionResult) + 'static,
        description: impl Into<String>,
        priority: i32,
    ) -> u64 {
        let mut state = self.state.borrow_mut();
        let id = state.next_global_id;
        state.next_global_id += 1;
        state.globals.push(GlobalRecord {
            id,
            priority,
            description: description.into(),
            func: Rc::new(RefCell::new(listener)),
        });
        state.globals.sort_by_key(|g| g.priority);
        id
    }

    /// Removes a global completion listener by id.
    pub fn remove_global_completion_listener(&self, id: u64) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(index) = state.globals.iter().position(|g| g.id == id) else {
            return false;
        };
        state.globals.remove(index);
        true
    }

    /// Number of global completion listeners.
    #[must_use]
    pub fn global_completion_listener_count(&self) -> usize {
        self.state.borrow().globals.len()
    }

    /// Removes all global completion listeners.
    pub fn clear_global_completion_listeners(&self) {
        self.state.borrow_mut().globals.clear();
    }

    fn notify_globals(&self, key: &K, result: &ActionResult) {
        let ids: Vec<u64> = self.state.borrow().globals.iter().map(|g| g.id).collect();
        for id in ids {
            let func = self
                .state
                .borrow()
                .globals
                .iter()
                .find(|g| g.id == id)
                .map(|g| Rc::clone(&g.func));
            if let Some(func) = func {
                (func.borrow_mut())(key, result);
            }
        }
    }

    // ---- execution ------------------------------------------------

    /// Runs the pipeline for `key` with `args`.
    ///
    /// Key misses and signature mismatches produce a failure
    /// [`ActionResult`]; global completion listeners are notified in
    /// every case.
    pub fn execute<A: ArgTuple>(&self, key: &K, args: A) -> ActionResult {
        let signature = A::signature();
        let mut payload = args.into_payload();

        let resolution: Result<(), ActionError> = {
            let state = self.state.borrow();
            match state.actions.get(key) {
                None => Err(ActionError::KeyAbsent {
                    key: format!("{key:?}"),
                }),
                Some(containers) => {
                    if containers.iter().any(|c| *c.signature() == signature) {
                        Ok(())
                    } else if self.overload {
                        Err(ActionError::NoMatchingOverload {
                            key: format!("{key:?}"),
                            got: signature.to_string(),
                        })
                    } else {
                        Err(ActionError::SignatureMismatch {
                            expected: containers
                                .first()
                                .map(|c| c.signature().to_string())
                                .unwrap_or_default(),
                            got: signature.to_string(),
                        })
                    }
                }
            }
        };

        let result = match resolution {
            Ok(()) => self.run_stages(key, &signature, &mut payload),
            Err(err) => {
                self.report(&err);
                ActionResult::failure(err.to_string())
            }
        };
        self.notify_globals(key, &result);
        result
    }

    fn with_container<R>(
        &self,
        key: &K,
        signature: &Signature,
        f: impl FnOnce(&StageContainer) -> R,
    ) -> Option<R> {
        let state = self.state.borrow();
        let container = state
            .actions
            .get(key)?
            .iter()
            .find(|c| c.signature() == signature)?;
        Some(f(container))
    }

    fn run_listener_stage(
        &self,
        key: &K,
        signature: &Signature,
        kind: HandlerKind,
        payload: &mut Payload,
        result: &mut ActionResult,
    ) {
        let ids = self
            .with_container(key, signature, |c| c.listener_ids(kind))
            .unwrap_or_default();
        result.total_listeners += ids.len();
        for id in ids {
            let func = self
                .with_container(key, signature, |c| c.listener(kind, id))
                .flatten();
            if let Some(func) = func {
                if (func.borrow_mut())(payload) {
                    result.executed_listeners += 1;
                }
            }
        }
    }

    fn run_stages(&self, key: &K, signature: &Signature, payload: &mut Payload) -> ActionResult {
        let mut result = ActionResult::default();

        // Stage 1: trigger listeners.
        self.run_listener_stage(key, signature, HandlerKind::TriggerListener, payload, &mut result);

        // Stage 2: validators; first rejection aborts.
        let validator_ids = self
            .with_container(key, signature, StageContainer::validator_ids)
            .unwrap_or_default();
        result.total_validators = validator_ids.len();
        for id in validator_ids {
            let entry = self
                .with_container(key, signature, |c| c.validator(id))
                .flatten();
            let Some((func, description)) = entry else {
                continue;
            };
            let outcome = (func.borrow_mut())(payload);
            match outcome {
                Some(true) => result.passed_validators += 1,
                Some(false) => {
                    result.validation_passed = false;
                    result.error_message = format!("validation failed by: {description}");
                    return result;
                }
                None => {
                    result.validation_passed = false;
                    result.error_message =
                        format!("validator could not read payload: {description}");
                    return result;
                }
            }
        }
        result.validation_passed = true;

        // Stage 3: validation listeners.
        self.run_listener_stage(
            key,
            signature,
            HandlerKind::ValidationListener,
            payload,
            &mut result,
        );

        // Stages 4+5 accounting is fixed up front, so an abort still
        // reports a symmetric executed/total.
        let sequential_ids = self
            .with_container(key, signature, StageContainer::sequential_ids)
            .unwrap_or_default();
        let final_id = self
            .with_container(key, signature, StageContainer::final_processor_id)
            .flatten();
        result.total_processors = sequential_ids.len() + usize::from(final_id.is_some());

        // Stage 4: sequential processors; a failure aborts.
        for id in sequential_ids {
            let func = self
                .with_container(key, signature, |c| {
                    c.processor(HandlerKind::SequentialProcessor, id)
                })
                .flatten();
            let Some(func) = func else {
                continue;
            };
            let outcome = (func.borrow_mut())(payload);
            match outcome {
                Some(Ok(())) => result.executed_processors += 1,
                Some(Err(err)) => {
                    result.error_message = format!("sequential processor error: {err}");
                    result.success = false;
                    return result;
                }
                None => {
                    result.error_message = "sequential processor could not read payload".into();
                    result.success = false;
                    return result;
                }
            }
        }

        // Stage 5: final processor.
        if let Some(id) = final_id {
            let func = self
                .with_container(key, signature, |c| {
                    c.processor(HandlerKind::FinalProcessor, id)
                })
                .flatten();
            if let Some(func) = func {
                match (func.borrow_mut())(payload) {
                    Some(Ok(())) => result.executed_processors += 1,
                    Some(Err(err)) => {
                        result.error_message = format!("final processor error: {err}");
                        result.success = false;
                        return result;
                    }
                    None => {
                        result.error_message = "final processor could not read payload".into();
                        result.success = false;
                        return result;
                    }
                }
            }
        }

        // Stage 6: completion listeners.
        self.run_listener_stage(
            key,
            signature,
            HandlerKind::CompletionListener,
            payload,
            &mut result,
        );

        result.success = true;
        result
    }

    // ---- queries --------------------------------------------------

    /// Whether any handler container exists for `key`.
    #[must_use]
    pub fn has_action(&self, key: &K) -> bool {
        self.state.borrow().actions.contains_key(key)
    }

    /// Number of registered handlers across all keys.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.state.borrow().handle_index.len()
    }

    /// Per-key, per-stage summary of the registry.
    #[must_use]
    pub fn statistics(&self) -> String {
        let state = self.state.borrow();
        let mut out = String::from("ActionPipeline statistics:\n");
        let _ = writeln!(out, "actions: {}", state.actions.len());
        let _ = writeln!(out, "handlers: {}", state.handle_index.len());
        let _ = writeln!(out, "global completion listeners: {}", state.globals.len());

        let mut sections: Vec<String> = state
            .actions
            .iter()
            .map(|(key, containers)| {
                let mut section = format!("action {key:?}:\n");
                for container in containers {
                    let counts = container.counts();
                    let _ = writeln!(section, "  signature ({})", container.signature());
                    let _ = writeln!(section, "    trigger listeners: {}", counts.trigger_listeners);
                    let _ = writeln!(section, "    validators: {}", counts.validators);
                    let _ = writeln!(
                        section,
                        "    validation listeners: {}",
                        counts.validation_listeners
                    );
                    let _ = writeln!(
                        section,
                        "    sequential processors: {}",
                        counts.sequential_processors
                    );
                    let _ = writeln!(
                        section,
                        "    final processor: {}",
                        if counts.has_final_processor { "yes" } else { "no" }
                    );
                    let _ = writeln!(
                        section,
                        "    completion listeners: {}",
                        counts.completion_listeners
                    );
                }
                section
            })
            .collect();
        sections.sort();
        out.push_str(&sections.concat());
        out
    }
}
