pub mod enums;
pub mod profile;
pub mod request;
pub mod result;

pub use enums::*;
pub use profile::*;
pub use request::*;
pub use result::*;
