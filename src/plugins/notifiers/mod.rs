pub mod console;
pub mod discord;

pub use console::ConsoleNotifier;
pub use discord::{DiscordNotifier, DiscordTarget};
