pub mod delivery;
pub mod dispatcher;
pub mod grouper;
pub mod resolver;
pub mod retry;
pub mod store;

pub use dispatcher::{CycleSummary, Dispatcher};
pub use retry::{DispatchError, RetryPolicy};
