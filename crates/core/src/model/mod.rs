mod ratings;
mod selection;
mod session;

pub use ratings::{RatingError, RatingKind, Ratings};
pub use selection::SelectionStore;
pub use session::{Advance, InterfaceSession, Navigation, default_window};
