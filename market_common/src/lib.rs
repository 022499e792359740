mod secret;
mod won;

pub use secret::Secret;
pub use won::Won;
