//! The event bus engine.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{Debug, Write as _};
use std::hash::Hash;
use std::rc::Rc;

use pulse_types::{ArgTuple, Payload, PayloadFn, Signature};
use tracing::debug;

use crate::{BusError, PublishResult, SubscriberId, SubscriptionMode};

type ErasedHandler = Rc<RefCell<dyn FnMut(&mut Payload) -> bool>>;
type Sink = Rc<dyn Fn(&str)>;

struct HandlerEntry {
    token: SubscriberId,
    description: String,
    signature: Signature,
    func: ErasedHandler,
}

struct BusState<K> {
    multicast: HashMap<K, Vec<HandlerEntry>>,
    unicast: HashMap<K, HandlerEntry>,
    multicast_once: HashMap<K, Vec<SubscriberId>>,
    unicast_once: HashMap<K, SubscriberId>,
    token_index: HashMap<SubscriberId, K>,
}

impl<K> Default for BusState<K> {
    fn default() -> Self {
        Self {
            multicast: HashMap::new(),
            unicast: HashMap::new(),
            multicast_once: HashMap::new(),
            unicast_once: HashMap::new(),
            token_index: HashMap::new(),
        }
    }
}

/// Publish/subscribe router keyed by an arbitrary key type.
///
/// Handlers are typed closures taking `&mut` references to the
/// published tuple's elements; arity and element types are verified
/// at publish time against each candidate handler's [`Signature`].
/// Payload mutations made by one handler are visible to the handlers
/// after it.
///
/// # Re-entrancy
///
/// All methods take `&self`. Dispatch iterates a snapshot of tokens
/// and re-resolves each just before invoking it, so a handler may
/// subscribe, unsubscribe, or publish on the same bus; handlers
/// removed mid-dispatch are silently skipped, and `once` removals
/// apply after the publish completes. A handler must not recursively
/// trigger itself.
///
/// # Example
///
/// ```
/// use pulse_bus::EventBus;
///
/// let bus: EventBus<&str> = EventBus::new();
/// bus.subscribe("scored", |points: &mut i32| {
///     println!("scored {points}");
/// }, "score logger");
///
/// let result = bus.publish(&"scored", (10,));
/// assert!(result.success);
/// assert_eq!(result.successful, 1);
/// ```
pub struct EventBus<K = String>
where
    K: Eq + Hash + Clone + Debug,
{
    state: RefCell<BusState<K>>,
    sink: RefCell<Sink>,
}

impl<K: Eq + Hash + Clone + Debug> Default for EventBus<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone + Debug> EventBus<K> {
    /// Creates an empty bus with the default stderr sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RefCell::new(BusState::default()),
            sink: RefCell::new(Rc::new(|msg: &str| eprintln!("EventBus error: {msg}"))),
        }
    }

    /// Replaces the diagnostic sink.
    pub fn set_error_sink(&self, sink: impl Fn(&str) + 'static) {
        *self.sink.borrow_mut() = Rc::new(sink);
    }

    fn report(&self, err: &BusError) {
        use pulse_types::ErrorCode;
        debug!(code = err.code(), "{err}");
        let sink = self.sink.borrow().clone();
        sink(&err.to_string());
    }

    // ---- subscription ---------------------------------------------

    /// Registers a multicast handler for `key`.
    pub fn subscribe<A, F>(&self, key: K, handler: F, description: impl Into<String>) -> SubscriberId
    where
        A: ArgTuple,
        F: PayloadFn<A, ()> + 'static,
    {
        self.subscribe_impl::<A, F>(key, handler, description.into(), false, SubscriptionMode::Multicast)
    }

    /// Registers a multicast handler that is removed after its first
    /// successful delivery.
    pub fn subscribe_once<A, F>(
        &self,
        key: K,
        handler: F,
        description: impl Into<String>,
    ) -> SubscriberId
    where
        A: ArgTuple,
        F: PayloadFn<A, ()> + 'static,
    {
        self.subscribe_impl::<A, F>(key, handler, description.into(), true, SubscriptionMode::Multicast)
    }

    /// Registers the unicast handler for `key`, evicting any prior
    /// unicast handler on the same key (including its once flag).
    pub fn subscribe_unicast<A, F>(
        &self,
        key: K,
        handler: F,
        description: impl Into<String>,
    ) -> SubscriberId
    where
        A: ArgTuple,
        F: PayloadFn<A, ()> + 'static,
    {
        self.subscribe_impl::<A, F>(key, handler, description.into(), false, SubscriptionMode::Unicast)
    }

    /// Unicast subscription removed after its first successful
    /// delivery.
    pub fn subscribe_unicast_once<A, F>(
        &self,
        key: K,
        handler: F,
        description: impl Into<String>,
    ) -> SubscriberId
    where
        A: ArgTuple,
        F: PayloadFn<A, ()> + 'static,
    {
        self.subscribe_impl::<A, F>(key, handler, description.into(), true, SubscriptionMode::Unicast)
    }

    fn subscribe_impl<A, F>(
        &self,
        key: K,
        handler: F,
        description: String,
        once: bool,
        mode: SubscriptionMode,
    ) -> SubscriberId
    where
        A: ArgTuple,
        F: PayloadFn<A, ()> + 'static,
    {
        let token = SubscriberId::generate();
        let mut handler = handler;
        let func: ErasedHandler =
            Rc::new(RefCell::new(move |payload: &mut Payload| {
                handler.invoke(payload).is_some()
            }));
        let entry = HandlerEntry {
            token,
            description,
            signature: A::signature(),
            func,
        };

        let mut state = self.state.borrow_mut();
        match mode {
            SubscriptionMode::Unicast => {
                if let Some(previous) = state.unicast.insert(key.clone(), entry) {
                    state.unicast_once.remove(&key);
                    state.token_index.remove(&previous.token);
                }
                if once {
                    state.unicast_once.insert(key.clone(), token);
                }
            }
            SubscriptionMode::Multicast => {
                state.multicast.entry(key.clone()).or_default().push(entry);
                if once {
                    state
                        .multicast_once
                        .entry(key.clone())
                        .or_default()
                        .push(token);
                }
            }
        }
        state.token_index.insert(token, key.clone());
        debug!(key = ?key, %token, ?mode, once, "handler subscribed");
        token
    }

    /// Removes the subscription behind `token` from whichever store
    /// holds it. Returns whether the token was known.
    pub fn unsubscribe(&self, token: SubscriberId) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(key) = state.token_index.remove(&token) else {
            return false;
        };

        if let Some(handlers) = state.multicast.get_mut(&key) {
            if let Some(position) = handlers.iter().position(|e| e.token == token) {
                handlers.remove(position);
            }
            if handlers.is_empty() {
                state.multicast.remove(&key);
            }
        }
        if state.unicast.get(&key).is_some_and(|e| e.token == token) {
            state.unicast.remove(&key);
        }
        if let Some(tokens) = state.multicast_once.get_mut(&key) {
            tokens.retain(|t| *t != token);
            if tokens.is_empty() {
                state.multicast_once.remove(&key);
            }
        }
        if state.unicast_once.get(&key) == Some(&token) {
            state.unicast_once.remove(&key);
        }
        debug!(key = ?key, %token, "handler unsubscribed");
        true
    }

    // ---- publishing -----------------------------------------------

    /// Publishes `args` to the multicast handlers of `key`.
    pub fn publish<A: ArgTuple>(&self, key: &K, args: A) -> PublishResult {
        self.publish_with_mode(key, SubscriptionMode::Multicast, args)
    }

    /// Publishes `args` to the unicast handler of `key`.
    pub fn publish_unicast<A: ArgTuple>(&self, key: &K, args: A) -> PublishResult {
        self.publish_with_mode(key, SubscriptionMode::Unicast, args)
    }

    /// Publishes `args` in an explicit mode.
    pub fn publish_with_mode<A: ArgTuple>(
        &self,
        key: &K,
        mode: SubscriptionMode,
        args: A,
    ) -> PublishResult {
        let signature = A::signature();
        let mut payload = args.into_payload();
        let mut result = PublishResult::new(signature.to_string(), mode);
        match mode {
            SubscriptionMode::Unicast => {
                self.run_unicast(key, &signature, &mut payload, &mut result);
            }
            SubscriptionMode::Multicast => {
                self.run_multicast(key, &signature, &mut payload, &mut result);
            }
        }
        result
    }

    fn run_unicast(
        &self,
        key: &K,
        signature: &Signature,
        payload: &mut Payload,
        result: &mut PublishResult,
    ) {
        let snapshot = self
            .state
            .borrow()
            .unicast
            .get(key)
            .map(|e| (e.token, e.signature.clone(), Rc::clone(&e.func)));
        let Some((token, handler_sig, func)) = snapshot else {
            let err = BusError::KeyAbsent {
                key: format!("{key:?}"),
                mode: SubscriptionMode::Unicast,
            };
            result.success = false;
            result.error_message = err.to_string();
            self.report(&err);
            return;
        };

        if handler_sig != *signature {
            let err = BusError::SignatureMismatch {
                published: signature.to_string(),
                expected: handler_sig.to_string(),
            };
            result.add_failure(handler_sig.to_string());
            result.error_message = err.to_string();
            self.report(&err);
            return;
        }

        if (func.borrow_mut())(payload) {
            result.add_success();
            let once_token = self.state.borrow().unicast_once.get(key).copied();
            if once_token == Some(token) {
                self.unsubscribe(token);
            }
        } else {
            result.add_failure(handler_sig.to_string());
            result.error_message = "unicast handler rejected payload".to_string();
        }
    }

    fn run_multicast(
        &self,
        key: &K,
        signature: &Signature,
        payload: &mut Payload,
        result: &mut PublishResult,
    ) {
        let tokens: Option<Vec<SubscriberId>> = self
            .state
            .borrow()
            .multicast
            .get(key)
            .map(|handlers| handlers.iter().map(|e| e.token).collect());
        let Some(tokens) = tokens else {
            let err = BusError::KeyAbsent {
                key: format!("{key:?}"),
                mode: SubscriptionMode::Multicast,
            };
            result.success = false;
            result.error_message = err.to_string();
            self.report(&err);
            return;
        };

        let mut once_removals: Vec<SubscriberId> = Vec::new();
        for token in tokens {
            // Re-resolve: an earlier handler may have unsubscribed
            // this one during the same publish.
            let entry = self
                .state
                .borrow()
                .multicast
                .get(key)
                .and_then(|handlers| handlers.iter().find(|e| e.token == token))
                .map(|e| (e.signature.clone(), Rc::clone(&e.func)));
            let Some((handler_sig, func)) = entry else {
                continue;
            };

            if handler_sig != *signature {
                result.add_failure(handler_sig.to_string());
                continue;
            }

            if (func.borrow_mut())(payload) {
                result.add_success();
                let is_once = self
                    .state
                    .borrow()
                    .multicast_once
                    .get(key)
                    .is_some_and(|once| once.contains(&token));
                if is_once {
                    once_removals.push(token);
                }
            } else {
                result.add_failure(handler_sig.to_string());
            }
        }

        if !result.success && result.failed > 0 {
            let err = BusError::AllHandlersFailed {
                total: result.total_subscribers,
                published: signature.to_string(),
                expected: result.expected_types.clone(),
            };
            result.error_message = err.to_string();
            self.report(&err);
        }

        // Once-subscriptions are removed by token after the dispatch,
        // so a handler re-subscribing mid-publish under a fresh token
        // is unaffected.
        for token in once_removals {
            self.unsubscribe(token);
        }
    }

    /// Drops every subscription in both modes, including pending
    /// once-records and the token index.
    pub fn clear(&self) {
        *self.state.borrow_mut() = BusState::default();
    }

    // ---- queries --------------------------------------------------

    /// Whether `key` has at least one multicast handler.
    #[must_use]
    pub fn has_subscribers(&self, key: &K) -> bool {
        self.state
            .borrow()
            .multicast
            .get(key)
            .is_some_and(|handlers| !handlers.is_empty())
    }

    /// Whether `key` has a unicast handler.
    #[must_use]
    pub fn has_unicast_subscriber(&self, key: &K) -> bool {
        self.state.borrow().unicast.contains_key(key)
    }

    /// Multicast handler count for `key`.
    #[must_use]
    pub fn subscriber_count(&self, key: &K) -> usize {
        self.state
            .borrow()
            .multicast
            .get(key)
            .map_or(0, Vec::len)
    }

    /// Unicast handler count for `key` (zero or one).
    #[must_use]
    pub fn unicast_subscriber_count(&self, key: &K) -> usize {
        usize::from(self.has_unicast_subscriber(key))
    }

    /// Whether any handler (either mode) exists for `key`.
    #[must_use]
    pub fn has_event(&self, key: &K) -> bool {
        self.has_subscribers(key) || self.has_unicast_subscriber(key)
    }

    /// The mode `key` currently dispatches in: unicast if a unicast
    /// handler exists, multicast otherwise.
    #[must_use]
    pub fn event_mode(&self, key: &K) -> SubscriptionMode {
        if self.has_unicast_subscriber(key) {
            SubscriptionMode::Unicast
        } else {
            SubscriptionMode::Multicast
        }
    }

    /// Aggregate subscriber counts per key.
    #[must_use]
    pub fn statistics(&self) -> String {
        let state = self.state.borrow();
        let mut out = String::from("EventBus statistics:\n");
        let _ = writeln!(out, "multicast event keys: {}", state.multicast.len());
        let _ = writeln!(out, "unicast event keys: {}", state.unicast.len());

        let mut total_multicast = 0;
        let mut lines: Vec<String> = state
            .multicast
            .iter()
            .map(|(key, handlers)| {
                total_multicast += handlers.len();
                format!("multicast {key:?}: {} subscribers", handlers.len())
            })
            .collect();
        lines.sort();
        for line in lines {
            let _ = writeln!(out, "{line}");
        }
        let _ = writeln!(out, "total multicast subscribers: {total_multicast}");
        let _ = write!(out, "total unicast subscribers: {}", state.unicast.len());
        out
    }

    /// Detailed listing of every subscription: token, signature, and
    /// description per handler.
    #[must_use]
    pub fn describe_events(&self) -> String {
        let state = self.state.borrow();
        let mut sections: Vec<String> = Vec::new();
        for (key, handlers) in &state.multicast {
            let mut section = format!("[multicast] {key:?} ({} handlers)\n", handlers.len());
            for entry in handlers {
                let _ = writeln!(
                    section,
                    "  {} ({}) {}",
                    entry.token, entry.signature, entry.description
                );
            }
            sections.push(section);
        }
        for (key, entry) in &state.unicast {
            sections.push(format!(
                "[unicast] {key:?}\n  {} ({}) {}\n",
                entry.token, entry.signature, entry.description
            ));
        }
        sections.sort();
        sections.concat()
    }
}
