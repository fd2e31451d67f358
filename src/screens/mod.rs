pub mod alert;
pub mod map_screen;
pub mod photo_browser;

pub use alert::{Alert, RetryAction};
pub use map_screen::{Annotation, MapAction, MapMode, MapScreen};
pub use photo_browser::{Cell, PhotoBrowser, PrimaryAction, TapOutcome};
