use core::{future::Future, time::Duration};

use smol::Timer;

use crate::{
    error::Result, futures::SleepProvider, generator::Snowbit, time::TimeSource, word::Word,
};

/// A [`SleepProvider`] backed by Smol's timer.
///
/// This is the default provider for applications built on Smol.
pub struct SmolSleep;
impl SleepProvider for SmolSleep {
    async fn sleep_for(dur: Duration) {
        Timer::after(dur).await;
    }
}

/// A [`SleepProvider`] that yields to the Smol executor instead of sleeping.
///
/// More responsive when few tasks compete for the engine, at the cost of a
/// tighter polling loop. Under heavy concurrency [`SmolSleep`] usually burns
/// less CPU.
pub struct SmolYield;
impl SleepProvider for SmolYield {
    async fn sleep_for(_dur: Duration) {
        smol::future::yield_now().await;
    }
}

impl<W: Word, T: TimeSource> Snowbit<W, T> {
    /// [`Self::next_id_async`] with [`SmolSleep`].
    ///
    /// # Errors
    ///
    /// See [`Self::next_id`].
    pub fn next_id_smol(&self) -> impl Future<Output = Result<W>> {
        self.next_id_async::<SmolSleep>()
    }
}
