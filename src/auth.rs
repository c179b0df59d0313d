//! Token model, audience validation, and the cookie token gate.

pub mod audience;
pub mod gate;
pub mod token;

pub use audience::*;
pub use gate::*;
pub use token::*;
