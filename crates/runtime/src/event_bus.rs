use foundation::time::Millis;

/// One recorded event together with the event-loop time it was raised at.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped<E> {
    pub at: Millis,
    pub event: E,
}

/// Append-only outbox of events for the host to consume.
///
/// Components never call back into the UI directly; they emit events and the
/// host drains them after each entry point returns.
#[derive(Debug)]
pub struct EventBus<E> {
    events: Vec<Stamped<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, at: Millis, event: E) {
        self.events.push(Stamped { at, event });
    }

    pub fn events(&self) -> &[Stamped<E>] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Stamped<E>> {
        std::mem::take(&mut self.events)
    }
}
