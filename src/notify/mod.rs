pub mod console;
pub mod message;
pub mod telegram;

pub use console::ConsoleDelivery;
pub use message::build_message;
pub use telegram::TelegramDelivery;

/// Channel delivery. Failures are reported as `false`, never as errors.
#[async_trait::async_trait]
pub trait MessageDelivery: Send + Sync {
    async fn deliver(&self, text: &str, image_url: Option<&str>) -> bool;
    fn name(&self) -> &'static str;
}
