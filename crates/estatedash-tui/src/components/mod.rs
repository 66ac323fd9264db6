//! Reusable UI components

pub mod filter_bar;
pub mod spinner;
pub mod toast;

pub use filter_bar::FilterBar;
pub use spinner::Spinner;
pub use toast::{Toast, ToastKind, ToastManager};
