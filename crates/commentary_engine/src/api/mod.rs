/* 📖 # The HTTP API

`ApiService` implements the PAL's `HttpService`, so the same service runs on
the tiny_http server of `RealPal` and under `MockPal::simulate_request` in
tests. Request bodies are parsed here: `multipart` for browser uploads and
`query` for the query string.
*/

mod multipart;
mod query;
mod service;

pub use multipart::{MultipartPart, boundary_from_content_type, parse_multipart};
pub use query::query_param;
pub use service::ApiService;
