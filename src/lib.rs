//! # Antigate
//!
//! A blocking client for the anti-captcha image recognition service.
//! Images are uploaded to the service, human workers read them and the
//! client polls until the recognised text is available.
//!
//! ## Features
//!
//! - **Solving**: upload an image and wait for its text, with a bounded
//!   retry when the service has no free workers
//! - **Cancellation**: stop waiting through a [`CancellationToken`] or a
//!   configured solve timeout
//! - **Account queries**: balance and service load statistics
//! - **Error Handling**: service tokens are surfaced verbatim, with
//!   error codes and suggestions
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use antigate::{api::ApiClient, config::ClientConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(ClientConfig::new("your-api-key")?)?;
//!
//! let image = std::fs::read("captcha.png")?;
//! let text = client.solve(&image)?;
//! println!("Captcha says: {text}");
//!
//! println!("Balance: {}", client.get_balance()?);
//! # Ok(())
//! # }
//! ```

/// API client, response classification and the solve workflow
pub mod api;

/// Client settings and their defaults
pub mod config;

/// Transport level failures
pub mod errors;

pub use tokio_util::sync::CancellationToken;
