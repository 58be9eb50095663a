use async_trait::async_trait;

#[async_trait]
pub trait DeliveryStrategy: Send + Sync {
    async fn deliver(&self, text: &str) -> anyhow::Result<()>;
}
