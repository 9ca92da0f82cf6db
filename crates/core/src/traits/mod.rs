pub mod delivery;
pub mod registry;
pub mod token;
pub mod wallet;

pub use delivery::*;
pub use registry::*;
pub use token::*;
pub use wallet::*;
