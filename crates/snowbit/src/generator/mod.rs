mod engine;
mod mutex;
mod state;
mod status;
#[cfg(test)]
pub(crate) mod tests;

pub use engine::*;
pub use mutex::*;
pub(crate) use state::*;
pub use status::*;
