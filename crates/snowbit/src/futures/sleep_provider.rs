use core::{future::Future, time::Duration};

/// Abstracts over how an async wait for the next time slot sleeps.
///
/// Lets [`Snowbit::next_id_async`] stay generic over runtimes like `Tokio` or
/// `Smol`.
///
/// [`Snowbit::next_id_async`]: crate::Snowbit::next_id_async
pub trait SleepProvider {
    /// The future must be `Send` so the caller's task can move across threads.
    fn sleep_for(dur: Duration) -> impl Future<Output = ()> + Send;
}
