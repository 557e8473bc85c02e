//! The `ModelGateway` trait -- the single I/O boundary of the pipeline.
//!
//! The trait is object-safe so the service can hold an
//! `Arc<dyn ModelGateway>` and tests can swap in a scripted fake.

use async_trait::async_trait;

use super::types::GatewayError;
use crate::prompt::ComposedPrompt;

/// Adapter interface for a generative model provider.
///
/// Implementations must not retry: a failed call surfaces immediately so
/// that retry policy stays with the caller.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Human-readable provider name, used in logs.
    fn name(&self) -> &str;

    /// Send the composed instruction text and return the raw reply text.
    async fn generate(&self, prompt: &ComposedPrompt) -> Result<String, GatewayError>;
}

// Compile-time assertion: ModelGateway must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn ModelGateway) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoGateway;

    #[async_trait]
    impl ModelGateway for EchoGateway {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &ComposedPrompt) -> Result<String, GatewayError> {
            Ok(prompt.user_instruction.clone())
        }
    }

    #[tokio::test]
    async fn gateway_is_usable_as_trait_object() {
        let gateway: Box<dyn ModelGateway> = Box::new(EchoGateway);
        let prompt = ComposedPrompt {
            system_instruction: "sys".into(),
            user_instruction: "user".into(),
        };
        assert_eq!(gateway.name(), "echo");
        assert_eq!(gateway.generate(&prompt).await.unwrap(), "user");
    }
}
