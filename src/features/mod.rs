//! Built-in leaf features

mod greetings;
mod logging;

pub use greetings::GreetingsFeature;
pub use logging::LoggingFeature;
