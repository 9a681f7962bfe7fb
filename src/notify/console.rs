use super::MessageDelivery;

/// Dry-run delivery: prints the message to stdout and reports success.
pub struct ConsoleDelivery;

#[async_trait::async_trait]
impl MessageDelivery for ConsoleDelivery {
    async fn deliver(&self, text: &str, image_url: Option<&str>) -> bool {
        println!("----- dry run -----");
        if let Some(url) = image_url {
            println!("[image] {url}");
        }
        println!("{text}\n");
        true
    }

    fn name(&self) -> &'static str {
        "console"
    }
}
