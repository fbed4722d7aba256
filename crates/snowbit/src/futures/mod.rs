#[cfg(any(feature = "async-tokio", feature = "async-smol"))]
mod runtime;
mod sleep_provider;
mod snowbit;

#[cfg_attr(docsrs, doc(cfg(any(feature = "async-tokio", feature = "async-smol"))))]
#[cfg(any(feature = "async-tokio", feature = "async-smol"))]
pub use runtime::*;
pub use sleep_provider::*;
