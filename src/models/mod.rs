pub mod index;
pub mod quote;
pub mod response;

pub use index::*;
pub use quote::*;
pub use response::*;
