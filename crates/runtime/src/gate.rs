/// Readiness of one backend's style, as last signalled by the host.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    Loading,
    Ready,
}

/// A continuation that can be parked on a [`StyleGate`].
///
/// Continuations with equal keys supersede each other: registering a second
/// one replaces the first, so at most one continuation per concern is ever
/// pending on a gate.
pub trait Continuation {
    type Key: PartialEq;

    fn key(&self) -> Self::Key;
}

/// Two-state future for one backend's style: `Loading` -> `Ready`, with
/// one-shot continuations.
///
/// The gate never calls anything itself. `when_ready` hands the continuation
/// straight back when the style is already usable; otherwise it is parked
/// until `signal_ready` returns it. Continuations parked against a backend
/// that is later detached are simply never returned.
#[derive(Debug)]
pub struct StyleGate<T> {
    readiness: Readiness,
    pending: Vec<T>,
}

impl<T> Default for StyleGate<T> {
    fn default() -> Self {
        Self {
            readiness: Readiness::Loading,
            pending: Vec::new(),
        }
    }
}

impl<T: Continuation> StyleGate<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// The backend started loading a new style.
    pub fn mark_loading(&mut self) {
        self.readiness = Readiness::Loading;
    }

    /// Run now (`Some`) or park (`None`).
    ///
    /// `style_loaded` is the backend's own answer; it wins over the last
    /// signal because hosts may miss the ready event of a fast style.
    pub fn when_ready(&mut self, style_loaded: bool, continuation: T) -> Option<T> {
        if style_loaded {
            self.readiness = Readiness::Ready;
            return Some(continuation);
        }
        self.readiness = Readiness::Loading;
        let key = continuation.key();
        self.pending.retain(|c| c.key() != key);
        self.pending.push(continuation);
        None
    }

    /// The backend signalled style-ready / idle. Returns the parked
    /// continuations in registration order; each fires exactly once.
    pub fn signal_ready(&mut self) -> Vec<T> {
        self.readiness = Readiness::Ready;
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[T] {
        &self.pending
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{Continuation, Readiness, StyleGate};

    #[derive(Debug, PartialEq)]
    struct Task(&'static str, u32);

    impl Continuation for Task {
        type Key = &'static str;

        fn key(&self) -> &'static str {
            self.0
        }
    }

    #[test]
    fn ready_style_runs_immediately() {
        let mut gate = StyleGate::new();
        assert_eq!(gate.when_ready(true, Task("a", 1)), Some(Task("a", 1)));
        assert_eq!(gate.readiness(), Readiness::Ready);
        assert!(gate.pending().is_empty());
    }

    #[test]
    fn parked_continuations_fire_once_in_order() {
        let mut gate = StyleGate::new();
        assert_eq!(gate.when_ready(false, Task("a", 1)), None);
        assert_eq!(gate.when_ready(false, Task("b", 2)), None);

        assert_eq!(gate.signal_ready(), vec![Task("a", 1), Task("b", 2)]);
        assert!(gate.signal_ready().is_empty());
    }

    #[test]
    fn same_key_supersedes() {
        let mut gate = StyleGate::new();
        gate.when_ready(false, Task("inject", 1));
        gate.when_ready(false, Task("other", 7));
        gate.when_ready(false, Task("inject", 2));

        assert_eq!(gate.signal_ready(), vec![Task("other", 7), Task("inject", 2)]);
    }
}
