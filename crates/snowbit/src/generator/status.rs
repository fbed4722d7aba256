/// The outcome of a single non-blocking attempt to issue an identifier.
///
/// Only engines running [`Policy::Strict`] ever return
/// [`Poll::Pending`]; a resilient engine always has an identifier ready.
///
/// # Example
///
/// ```
/// use snowbit::{EngineConfig, Poll, Snowbit};
///
/// let engine = Snowbit::<u64>::new(EngineConfig::classic(0, 1)).unwrap();
/// let id = loop {
///     match engine.try_poll_id().unwrap() {
///         Poll::Ready { id } => break id,
///         Poll::Pending { yield_for } => {
///             std::thread::sleep(std::time::Duration::from_millis(yield_for));
///         }
///     }
/// };
/// assert_eq!(engine.location_b_of(id), 1);
/// ```
///
/// [`Policy::Strict`]: crate::Policy::Strict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Poll<W> {
    /// A unique identifier was issued.
    Ready { id: W },
    /// The current slot is exhausted. Retry after `yield_for` milliseconds;
    /// the engine state was not touched.
    Pending { yield_for: u64 },
}

impl<W> Poll<W> {
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}
