//! Scripted collaborators for simulation.
//!
//! [`ScriptedTransport`] answers alerts from a queue of scripted outcomes and
//! falls back to a fixed behaviour once the queue runs dry.
//! [`SimLocation`] reports whatever fix the test sets.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use safeline_app::{LocationProvider, MessagingTransport};
use safeline_core::{Coordinates, DeliveryOutcome, DeliveryReport, DeliveryStatus, DispatchError};

/// How the transport answers when nothing is scripted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertPolicy {
    /// Every message is handed to the carrier.
    Deliver,
    /// Every message fails with this error.
    Fail(DispatchError),
}

#[derive(Debug)]
struct TransportState {
    scripted: VecDeque<Result<DeliveryStatus, DispatchError>>,
    fallback: AlertPolicy,
    deliveries: Vec<(Vec<String>, String)>,
}

/// Messaging transport with scripted outcomes. Clones share state.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    state: Arc<Mutex<TransportState>>,
}

impl ScriptedTransport {
    /// Transport that answers every message with `policy`.
    pub fn new(policy: AlertPolicy) -> Self {
        Self {
            state: Arc::new(Mutex::new(TransportState {
                scripted: VecDeque::new(),
                fallback: policy,
                deliveries: Vec::new(),
            })),
        }
    }

    /// Transport that always delivers.
    pub fn delivering() -> Self {
        Self::new(AlertPolicy::Deliver)
    }

    /// Transport that always fails with `error`.
    pub fn failing(error: DispatchError) -> Self {
        Self::new(AlertPolicy::Fail(error))
    }

    /// Queue outcomes for the next messages, in order.
    #[must_use]
    pub fn then(self, outcomes: impl IntoIterator<Item = Result<DeliveryStatus, DispatchError>>) -> Self {
        self.lock().scripted.extend(outcomes);
        self
    }

    /// Every `(recipients, message)` pair the transport was asked to send.
    pub fn deliveries(&self) -> Vec<(Vec<String>, String)> {
        self.lock().deliveries.clone()
    }

    fn answer(&self, recipients: &[String], message: &str) -> DeliveryOutcome {
        let mut state = self.lock();
        state.deliveries.push((recipients.to_vec(), message.to_string()));
        let next = match state.scripted.pop_front() {
            Some(scripted) => scripted,
            None => match &state.fallback {
                AlertPolicy::Deliver => Ok(DeliveryStatus::Sent),
                AlertPolicy::Fail(error) => Err(error.clone()),
            },
        };
        next.map(|status| DeliveryReport { recipients: recipients.len(), status })
    }

    #[allow(clippy::expect_used)]
    fn lock(&self) -> std::sync::MutexGuard<'_, TransportState> {
        self.state.lock().expect("transport mutex poisoned")
    }
}

impl MessagingTransport for ScriptedTransport {
    fn send_alert(
        &self,
        recipients: &[String],
        message: &str,
    ) -> impl Future<Output = DeliveryOutcome> + Send {
        std::future::ready(self.answer(recipients, message))
    }
}

/// Location provider whose fix is set by the test. Clones share the fix.
#[derive(Debug, Clone, Default)]
pub struct SimLocation {
    fix: Arc<Mutex<Option<Coordinates>>>,
}

impl SimLocation {
    /// Provider starting with `fix`.
    pub fn new(fix: Option<Coordinates>) -> Self {
        Self { fix: Arc::new(Mutex::new(fix)) }
    }

    /// Change the reported fix.
    #[allow(clippy::expect_used)]
    pub fn set(&self, fix: Option<Coordinates>) {
        *self.fix.lock().expect("location mutex poisoned") = fix;
    }
}

impl LocationProvider for SimLocation {
    #[allow(clippy::expect_used)]
    fn current_coordinates(&self) -> impl Future<Output = Option<Coordinates>> + Send {
        std::future::ready(*self.fix.lock().expect("location mutex poisoned"))
    }
}
