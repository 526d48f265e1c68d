//! The request/response pipeline.
//!
//! - [`config`]: per-request configuration and the defaults merge
//! - [`request`]: URL assembly, body encoding, auth / XSRF / cookie headers
//! - [`interceptor`]: request and response interceptor chains
//! - [`abort`]: cancellation signals and timeouts
//! - [`response`] / [`responsebody`]: content-type driven body decoding
//! - [`errormessage`]: message extraction for failed responses
//! - [`transport`]: the fetch primitive and its default hyper implementation

pub mod abort;
pub mod config;
pub mod errormessage;
pub mod interceptor;
pub mod multipart;
pub mod orderedheaders;
pub mod params;
pub mod request;
pub mod requestbody;
pub mod response;
pub mod responsebody;
pub mod transport;

// Re-exports for convenience
pub use abort::{AbortController, AbortSignal};
pub use config::{CacheMode, Credentials, RequestConfig, ResponseType};
pub use errormessage::{ErrorMessage, ExtractStrategy};
pub use interceptor::{InterceptorHandle, Interceptors};
pub use multipart::{FormData, Part};
pub use orderedheaders::OrderedHeaderMap;
pub use params::{Params, ParamsSerializer};
pub use request::RequestDescriptor;
pub use requestbody::RequestBody;
pub use response::Response;
pub use responsebody::ResponseData;
pub use transport::{HyperTransport, RawResponse, Transport};
