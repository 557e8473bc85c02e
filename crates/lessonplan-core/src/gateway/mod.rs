//! Model gateway: the adapter boundary to the generative model provider.
//!
//! ```text
//! LessonPlanService
//!     |
//!     v
//! Arc<dyn ModelGateway> --generate(prompt)--> raw reply text
//!     |
//!     +-- GeminiGateway (reqwest, x-goog-api-key)
//!     +-- test fakes
//! ```

pub mod gemini;
pub mod trait_def;
pub mod types;

pub use gemini::GeminiGateway;
pub use trait_def::ModelGateway;
pub use types::{GatewayConfig, GatewayError, GenerationConfig};
