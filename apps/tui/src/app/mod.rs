// App module for the dashboard binary
// Holds application state and key handling

pub mod input;
pub mod state;
#[cfg(test)]
pub mod test_support;

pub use input::handle_input;
pub use state::{App, DateField, Focus, Overlay};
