use core::{future::Future, time::Duration};
use std::time::Instant;

use super::SleepProvider;
use crate::{
    error::Result,
    generator::{Poll, Snowbit},
    time::TimeSource,
    word::Word,
};

impl<W: Word, T: TimeSource> Snowbit<W, T> {
    /// Returns a future that resolves to the next identifier.
    ///
    /// Where [`Self::next_id`] spins, this sleeps through `S` for the time
    /// left in the exhausted slot, clipped to what is left of
    /// [`EngineConfig::wait_timeout`]. Dropping the future is safe at any
    /// point: a pending attempt never touches the engine state.
    ///
    /// # Errors
    ///
    /// See [`Self::next_id`].
    ///
    /// [`EngineConfig::wait_timeout`]: crate::EngineConfig::wait_timeout
    pub fn next_id_async<S>(&self) -> impl Future<Output = Result<W>>
    where
        S: SleepProvider,
    {
        async move {
            let started = Instant::now();
            loop {
                let yield_for = match self.try_poll_id()? {
                    Poll::Ready { id } => return Ok(id),
                    Poll::Pending { yield_for } => Duration::from_millis(yield_for),
                };
                let dur = match self.remaining_wait(started)? {
                    Some(remaining) => yield_for.min(remaining),
                    None => yield_for,
                };
                S::sleep_for(dur).await;
            }
        }
    }
}
