//! Core of the EMR study viewer: keeps a bank of small charts synchronized on
//! one time window, manages the shared marker annotation and the user's row
//! selection, and builds the declarative chart configurations the page renders.
//!
//! Nothing here performs I/O. Hosts (the browser bridge, the terminal preview)
//! implement [`sync::ChartHandle`] and [`sync::PageView`] and drive an
//! [`model::InterfaceSession`] with page events.

pub mod charts;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod request;
pub mod sync;
pub mod testing;

pub use config::ViewerConfig;
pub use error::ViewerError;
