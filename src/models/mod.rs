pub mod flickr_photo;
pub mod photo;
pub mod pin;
pub mod region;

pub use flickr_photo::*;
pub use photo::*;
pub use pin::*;
pub use region::*;
