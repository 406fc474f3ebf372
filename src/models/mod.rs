pub mod discussion;
pub mod messaging;
pub mod notification;
pub mod profile;
pub mod school;
pub mod search;

pub use discussion::*;
pub use messaging::*;
pub use notification::*;
pub use profile::*;
pub use school::*;
pub use search::*;
