//! Readiness barrier gating first render of the game board.
//!
//! The board screen can only be initialized once two independent things have
//! happened, in either order:
//!
//! 1. the GUI component has mounted and handed over its init callback
//! 2. the board topology has arrived from the network
//!
//! The barrier is a one-shot latch: the callback runs exactly once, on the
//! signal that completes the pair, and never again for the session.

use std::fmt;

/// Callback supplied by the GUI source, run when both sources are ready.
pub type InitCallback = Box<dyn FnOnce()>;

/// The two sources the barrier waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadySource {
    /// Board topology received from the server.
    Network,
    /// Board component mounted.
    Gui,
}

impl ReadySource {
    pub const ALL: [ReadySource; 2] = [ReadySource::Network, ReadySource::Gui];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network-ready",
            Self::Gui => "gui-ready",
        }
    }
}

impl fmt::Display for ReadySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-source one-shot latch.
#[derive(Default)]
pub struct ReadinessBarrier {
    network_ready: bool,
    gui_ready: bool,
    callback: Option<InitCallback>,
    fired: bool,
}

impl ReadinessBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `source` as ready, firing the init callback if this completes
    /// the pair.
    ///
    /// Only the GUI source may supply the callback; one passed alongside the
    /// network source is dropped. Returns `true` if this call fired it.
    pub fn signal_ready(&mut self, source: ReadySource, on_ready: Option<InitCallback>) -> bool {
        match source {
            ReadySource::Gui => {
                if let Some(callback) = on_ready {
                    self.callback = Some(callback);
                }
                self.gui_ready = true;
            }
            ReadySource::Network => {
                if on_ready.is_some() {
                    tracing::debug!(%source, "ignoring init callback from non-GUI source");
                }
                self.network_ready = true;
            }
        }

        if self.fired || !self.all_ready() {
            return false;
        }

        match self.callback.take() {
            Some(callback) => {
                self.fired = true;
                tracing::info!(%source, "readiness barrier complete, initializing board");
                callback();
                true
            }
            None => false,
        }
    }

    pub fn is_ready(&self, source: ReadySource) -> bool {
        match source {
            ReadySource::Network => self.network_ready,
            ReadySource::Gui => self.gui_ready,
        }
    }

    pub fn all_ready(&self) -> bool {
        ReadySource::ALL.iter().all(|s| self.is_ready(*s))
    }

    /// Whether the init callback has run.
    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

impl fmt::Debug for ReadinessBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessBarrier")
            .field("network_ready", &self.network_ready)
            .field("gui_ready", &self.gui_ready)
            .field("has_callback", &self.callback.is_some())
            .field("fired", &self.fired)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_callback(counter: &Rc<Cell<u32>>) -> InitCallback {
        let counter = Rc::clone(counter);
        Box::new(move || counter.set(counter.get() + 1))
    }

    #[test]
    fn test_gui_then_network() {
        let fired = Rc::new(Cell::new(0));
        let mut barrier = ReadinessBarrier::new();

        assert!(!barrier.signal_ready(ReadySource::Gui, Some(counting_callback(&fired))));
        assert_eq!(fired.get(), 0);

        assert!(barrier.signal_ready(ReadySource::Network, None));
        assert_eq!(fired.get(), 1);
        assert!(barrier.has_fired());
    }

    #[test]
    fn test_network_then_gui() {
        let fired = Rc::new(Cell::new(0));
        let mut barrier = ReadinessBarrier::new();

        assert!(!barrier.signal_ready(ReadySource::Network, None));
        assert_eq!(fired.get(), 0);

        assert!(barrier.signal_ready(ReadySource::Gui, Some(counting_callback(&fired))));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_network_callback_is_ignored() {
        let from_network = Rc::new(Cell::new(0));
        let from_gui = Rc::new(Cell::new(0));
        let mut barrier = ReadinessBarrier::new();

        barrier.signal_ready(ReadySource::Network, Some(counting_callback(&from_network)));
        barrier.signal_ready(ReadySource::Gui, Some(counting_callback(&from_gui)));

        assert_eq!(from_network.get(), 0);
        assert_eq!(from_gui.get(), 1);
    }

    #[test]
    fn test_never_fires_twice() {
        let fired = Rc::new(Cell::new(0));
        let mut barrier = ReadinessBarrier::new();

        barrier.signal_ready(ReadySource::Gui, Some(counting_callback(&fired)));
        barrier.signal_ready(ReadySource::Network, None);

        // Topology reload and a remounted GUI
        barrier.signal_ready(ReadySource::Network, None);
        barrier.signal_ready(ReadySource::Gui, Some(counting_callback(&fired)));
        barrier.signal_ready(ReadySource::Network, None);

        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_both_ready_without_callback_waits() {
        let fired = Rc::new(Cell::new(0));
        let mut barrier = ReadinessBarrier::new();

        barrier.signal_ready(ReadySource::Gui, None);
        barrier.signal_ready(ReadySource::Network, None);
        assert!(barrier.all_ready());
        assert!(!barrier.has_fired());

        barrier.signal_ready(ReadySource::Gui, Some(counting_callback(&fired)));
        assert_eq!(fired.get(), 1);
    }

    fn source_strategy() -> impl Strategy<Value = ReadySource> {
        prop_oneof![Just(ReadySource::Network), Just(ReadySource::Gui)]
    }

    proptest! {
        #[test]
        fn prop_fires_once_after_both_sources(signals in prop::collection::vec(source_strategy(), 0..12)) {
            let fired = Rc::new(Cell::new(0));
            let mut barrier = ReadinessBarrier::new();
            let mut seen_network = false;
            let mut seen_gui = false;

            for source in signals {
                match source {
                    ReadySource::Network => seen_network = true,
                    ReadySource::Gui => seen_gui = true,
                }
                let callback = (source == ReadySource::Gui).then(|| counting_callback(&fired));
                barrier.signal_ready(source, callback);

                let expected = u32::from(seen_network && seen_gui);
                prop_assert_eq!(fired.get(), expected);
            }
        }
    }
}
