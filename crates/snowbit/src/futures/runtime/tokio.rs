use core::{future::Future, time::Duration};

use crate::{
    error::Result, futures::SleepProvider, generator::Snowbit, time::TimeSource, word::Word,
};

/// A [`SleepProvider`] backed by Tokio's timer.
///
/// This is the default provider for applications built on Tokio.
pub struct TokioSleep;
impl SleepProvider for TokioSleep {
    async fn sleep_for(dur: Duration) {
        tokio::time::sleep(dur).await;
    }
}

/// A [`SleepProvider`] that yields to the Tokio scheduler instead of sleeping.
///
/// More responsive when few tasks compete for the engine, at the cost of a
/// tighter polling loop. Under heavy concurrency [`TokioSleep`] usually burns
/// less CPU.
pub struct TokioYield;
impl SleepProvider for TokioYield {
    async fn sleep_for(_dur: Duration) {
        tokio::task::yield_now().await;
    }
}

impl<W: Word, T: TimeSource> Snowbit<W, T> {
    /// [`Self::next_id_async`] with [`TokioSleep`].
    ///
    /// # Errors
    ///
    /// See [`Self::next_id`].
    pub fn next_id_tokio(&self) -> impl Future<Output = Result<W>> {
        self.next_id_async::<TokioSleep>()
    }
}
