pub mod utils;

pub use utils::{test_client, test_db};

mod admin;
mod completeness;
mod interests;
mod notifications;
mod poll;
mod profiles;
mod search;
