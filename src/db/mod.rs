pub mod discussions;
pub mod messaging;
pub mod notifications;
pub mod profiles;
pub mod schools;
pub mod search;
pub mod shortlist;
pub mod users;

pub use discussions::*;
pub use messaging::*;
pub use notifications::*;
pub use profiles::*;
pub use schools::*;
pub use search::*;
pub use shortlist::*;
pub use users::*;
