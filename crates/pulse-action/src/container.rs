//! Per-signature handler container.
//!
//! A container holds the six handler sets for one `(key, signature)`
//! pair. Sets are kept sorted by ascending priority, insertion order
//! breaking ties, so execution can walk them front to back.

use std::cell::RefCell;
use std::rc::Rc;

use pulse_types::{Payload, Signature};

use crate::{HandlerKind, ProcessError};

/// Erased listener: returns whether the payload re-typed cleanly.
pub(crate) type ListenerFn = Rc<RefCell<dyn FnMut(&mut Payload) -> bool>>;
/// Erased validator: `None` on a payload re-type failure.
pub(crate) type ValidatorFn = Rc<RefCell<dyn FnMut(&mut Payload) -> Option<bool>>>;
/// Erased processor: `None` on a payload re-type failure.
pub(crate) type ProcessorFn =
    Rc<RefCell<dyn FnMut(&mut Payload) -> Option<Result<(), ProcessError>>>>;

pub(crate) struct HandlerRecord<F> {
    pub(crate) id: u64,
    pub(crate) description: String,
    pub(crate) priority: i32,
    pub(crate) func: F,
}

fn insert_sorted<F>(records: &mut Vec<HandlerRecord<F>>, record: HandlerRecord<F>) {
    records.push(record);
    records.sort_by_key(|r| r.priority);
}

fn remove_by_id<F>(records: &mut Vec<HandlerRecord<F>>, id: u64) -> bool {
    let Some(index) = records.iter().position(|r| r.id == id) else {
        return false;
    };
    records.remove(index);
    true
}

pub(crate) struct StageContainer {
    signature: Signature,
    trigger_listeners: Vec<HandlerRecord<ListenerFn>>,
    validators: Vec<HandlerRecord<ValidatorFn>>,
    validation_listeners: Vec<HandlerRecord<ListenerFn>>,
    sequential_processors: Vec<HandlerRecord<ProcessorFn>>,
    final_processor: Option<HandlerRecord<ProcessorFn>>,
    completion_listeners: Vec<HandlerRecord<ListenerFn>>,
}

impl StageContainer {
    pub(crate) fn new(signature: Signature) -> Self {
        Self {
            signature,
            trigger_listeners: Vec::new(),
            validators: Vec::new(),
            validation_listeners: Vec::new(),
            sequential_processors: Vec::new(),
            final_processor: None,
            completion_listeners: Vec::new(),
        }
    }

    pub(crate) fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn add_listener(&mut self, kind: HandlerKind, record: HandlerRecord<ListenerFn>) {
        match kind {
            HandlerKind::TriggerListener => insert_sorted(&mut self.trigger_listeners, record),
            HandlerKind::ValidationListener => {
                insert_sorted(&mut self.validation_listeners, record);
            }
            HandlerKind::CompletionListener => {
                insert_sorted(&mut self.completion_listeners, record);
            }
            _ => debug_assert!(false, "not a listener kind: {kind}"),
        }
    }

    pub(crate) fn add_validator(&mut self, record: HandlerRecord<ValidatorFn>) {
        insert_sorted(&mut self.validators, record);
    }

    pub(crate) fn add_sequential_processor(&mut self, record: HandlerRecord<ProcessorFn>) {
        insert_sorted(&mut self.sequential_processors, record);
    }

    /// Installs the final processor, returning the id of the one it
    /// replaced, if any.
    pub(crate) fn set_final_processor(&mut self, record: HandlerRecord<ProcessorFn>) -> Option<u64> {
        self.final_processor.replace(record).map(|old| old.id)
    }

    pub(crate) fn remove(&mut self, id: u64, kind: HandlerKind) -> bool {
        match kind {
            HandlerKind::TriggerListener => remove_by_id(&mut self.trigger_listeners, id),
            HandlerKind::Validator => remove_by_id(&mut self.validators, id),
            HandlerKind::ValidationListener => remove_by_id(&mut self.validation_listeners, id),
            HandlerKind::SequentialProcessor => {
                remove_by_id(&mut self.sequential_processors, id)
            }
            HandlerKind::FinalProcessor => {
                if self.final_processor.as_ref().is_some_and(|r| r.id == id) {
                    self.final_processor = None;
                    true
                } else {
                    false
                }
            }
            HandlerKind::CompletionListener => remove_by_id(&mut self.completion_listeners, id),
        }
    }

    /// Priority-ordered ids of one listener stage.
    pub(crate) fn listener_ids(&self, kind: HandlerKind) -> Vec<u64> {
        let records = match kind {
            HandlerKind::TriggerListener => &self.trigger_listeners,
            HandlerKind::ValidationListener => &self.validation_listeners,
            HandlerKind::CompletionListener => &self.completion_listeners,
            _ => return Vec::new(),
        };
        records.iter().map(|r| r.id).collect()
    }

    pub(crate) fn validator_ids(&self) -> Vec<u64> {
        self.validators.iter().map(|r| r.id).collect()
    }

    pub(crate) fn sequential_ids(&self) -> Vec<u64> {
        self.sequential_processors.iter().map(|r| r.id).collect()
    }

    pub(crate) fn final_processor_id(&self) -> Option<u64> {
        self.final_processor.as_ref().map(|r| r.id)
    }

    pub(crate) fn listener(&self, kind: HandlerKind, id: u64) -> Option<ListenerFn> {
        let records = match kind {
            HandlerKind::TriggerListener => &self.trigger_listeners,
            HandlerKind::ValidationListener => &self.validation_listeners,
            HandlerKind::CompletionListener => &self.completion_listeners,
            _ => return None,
        };
        records
            .iter()
            .find(|r| r.id == id)
            .map(|r| Rc::clone(&r.func))
    }

    pub(crate) fn validator(&self, id: u64) -> Option<(ValidatorFn, String)> {
        self.validators
            .iter()
            .find(|r| r.id == id)
            .map(|r| (Rc::clone(&r.func), r.description.clone()))
    }

    pub(crate) fn processor(&self, kind: HandlerKind, id: u64) -> Option<ProcessorFn> {
        match kind {
            HandlerKind::SequentialProcessor => self
                .sequential_processors
                .iter()
                .find(|r| r.id == id)
                .map(|r| Rc::clone(&r.func)),
            HandlerKind::FinalProcessor => self
                .final_processor
                .as_ref()
                .filter(|r| r.id == id)
                .map(|r| Rc::clone(&r.func)),
            _ => None,
        }
    }

    pub(crate) fn total_handlers(&self) -> usize {
        self.trigger_listeners.len()
            + self.validators.len()
            + self.validation_listeners.len()
            + self.sequential_processors.len()
            + usize::from(self.final_processor.is_some())
            + self.completion_listeners.len()
    }

    pub(crate) fn counts(&self) -> StageCounts {
        StageCounts {
            trigger_listeners: self.trigger_listeners.len(),
            validators: self.validators.len(),
            validation_listeners: self.validation_listeners.len(),
            sequential_processors: self.sequential_processors.len(),
            has_final_processor: self.final_processor.is_some(),
            completion_listeners: self.completion_listeners.len(),
        }
    }
}

/// Per-stage handler counts, for statistics output.
pub(crate) struct StageCounts {
    pub(crate) trigger_listeners: usize,
    pub(crate) validators: usize,
    pub(crate) validation_listeners: usize,
    pub(crate) sequential_processors: usize,
    pub(crate) has_final_processor: bool,
    pub(crate) completion_listeners: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_types::ArgTuple;

    fn listener(id: u64, priority: i32) -> HandlerRecord<ListenerFn> {
        HandlerRecord {
            id,
            description: String::new(),
            priority,
            func: Rc::new(RefCell::new(|_: &mut Payload| true)),
        }
    }

    fn container() -> StageContainer {
        StageContainer::new(<(i32,)>::signature())
    }

    #[test]
    fn priority_orders_ascending_with_stable_ties() {
        let mut c = container();
        c.add_listener(HandlerKind::TriggerListener, listener(1, 5));
        c.add_listener(HandlerKind::TriggerListener, listener(2, 1));
        c.add_listener(HandlerKind::TriggerListener, listener(3, 5));
        assert_eq!(c.listener_ids(HandlerKind::TriggerListener), vec![2, 1, 3]);
    }

    #[test]
    fn final_processor_replacement_reports_old_id() {
        let mut c = container();
        let processor = |id| HandlerRecord {
            id,
            description: String::new(),
            priority: 0,
            func: Rc::new(RefCell::new(|_: &mut Payload| Some(Ok(())))) as ProcessorFn,
        };
        assert_eq!(c.set_final_processor(processor(7)), None);
        assert_eq!(c.set_final_processor(processor(8)), Some(7));
        assert_eq!(c.final_processor_id(), Some(8));
    }

    #[test]
    fn remove_targets_the_right_stage() {
        let mut c = container();
        c.add_listener(HandlerKind::TriggerListener, listener(1, 0));
        c.add_listener(HandlerKind::CompletionListener, listener(2, 0));

        assert!(!c.remove(1, HandlerKind::CompletionListener));
        assert!(c.remove(1, HandlerKind::TriggerListener));
        assert!(c.remove(2, HandlerKind::CompletionListener));
        assert_eq!(c.total_handlers(), 0);
    }

    #[test]
    fn lookup_by_id_after_mutation() {
        let mut c = container();
        c.add_listener(HandlerKind::TriggerListener, listener(1, 0));
        assert!(c.listener(HandlerKind::TriggerListener, 1).is_some());
        assert!(c.listener(HandlerKind::TriggerListener, 2).is_none());
        c.remove(1, HandlerKind::TriggerListener);
        assert!(c.listener(HandlerKind::TriggerListener, 1).is_none());
    }
}
