pub mod photo_library;
pub mod photo_provider;

pub use photo_library::{ImageRecord, PhotoLibrary};
pub use photo_provider::{PhotoProvider, UiEvent};
