//! # vkapi - VK API client for Rust
//!
//! A thin blocking client for the VK social network API. It builds method
//! URLs, signs them when an application secret is configured, performs GET
//! and multipart POST requests (including file uploads), and decodes JSON
//! or XML responses into caller types.
//!
//! ## Features
//!
//! - Generic method calls: a method name plus a parameter set
//! - MD5 request signing (`sig` parameter) for secret-holding applications
//! - Client-credentials and password OAuth grants
//! - File uploads from disk, from any reader, or from memory
//! - Error envelopes surfaced as typed errors
//!
//! ## Basic Usage
//!
//! ```no_run
//! use vkapi::{Params, VkClient};
//!
//! fn main() -> Result<(), vkapi::VkError> {
//!     let vk = VkClient::new("1234567")?.with_access_token("token");
//!
//!     let mut params = Params::new();
//!     params.insert("user_ids".to_string(), 1.into());
//!     params.insert("v".to_string(), "5.131".into());
//!
//!     let response = vk.call("users.get", &params)?;
//!     println!("{:?}", response.get("response"));
//!     Ok(())
//! }
//! ```
//!
//! In XML mode prefer [`VkClient::apply`] with a typed target: the untyped
//! map returned by [`VkClient::call`] keeps quick-xml's `@attribute` and
//! `$text` keys.
//!
//! ## Authentication
//!
//! ```no_run
//! use vkapi::VkClient;
//!
//! let mut vk = VkClient::new("1234567")?.with_secret("app_secret");
//! let token = vk.acquire_client_token()?;
//! assert_eq!(vk.access_token(), Some(token.access_token.as_str()));
//! # Ok::<(), vkapi::VkError>(())
//! ```
//!
//! ## Uploads
//!
//! ```no_run
//! use vkapi::{FileSource, Params, VkClient};
//!
//! let vk = VkClient::new("1234567")?;
//! let uploaded = vk.raw_post_file(
//!     "https://pu.vk.com/c1/upload.php",
//!     FileSource::path("photo.jpg"),
//!     &Params::new(),
//! )?;
//! # Ok::<(), vkapi::VkError>(())
//! ```

pub mod client;
pub mod error;
pub mod params;
pub mod query;
pub mod request;
pub mod response;
pub mod signer;
pub mod token;
pub mod vk;

// Re-export main types for convenience
pub use client::{Config, API_URL, DEFAULT_API_VERSION, OAUTH_URL};
pub use error::{Result, VkError};
pub use params::{merge_params, params_from_json, ParamValue, Params};
pub use query::encode_query;
pub use request::{FileSource, RequestBody, RequestIntent, FILE_FIELD};
pub use response::{ApiErrorBody, Response, ResponseFormat};
pub use signer::sign;
pub use token::TokenResponse;
pub use vk::VkClient;
