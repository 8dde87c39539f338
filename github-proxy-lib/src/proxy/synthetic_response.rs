use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderName, HeaderValue};
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Bytes;
use hyper::Response;

use crate::content::mime::DEFAULT_CONTENT_TYPE;
use crate::content::FetchedContent;
use crate::proxy::http_result::HttpError;

pub type RespBody = BoxBody<Bytes, hyper::Error>;

pub const RATE_LIMIT_SCOPE_HEADER: &str = "x-ratelimit-scope";

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Build the 4xx/5xx response for a pipeline rejection.
pub(crate) fn synthetic_error_response(error: &HttpError) -> Response<RespBody> {
    let reason = error.reason();
    let mut resp = Response::new(full_body(Bytes::from_static(reason.as_bytes())));
    *resp.status_mut() = error.status();

    let headers = resp.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF8));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(reason.len()));
    if let HttpError::RateLimited(result) = error {
        headers.insert(
            HeaderName::from_static(RATE_LIMIT_SCOPE_HEADER),
            HeaderValue::from_static(result.scope()),
        );
    }

    resp
}

/// Build the 200 response carrying a file's raw bytes.
pub(crate) fn file_response(content: FetchedContent) -> Response<RespBody> {
    let content_type = HeaderValue::from_str(&content.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let length = content.bytes.len();

    let mut resp = Response::new(full_body(content.bytes));
    let headers = resp.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    resp
}

fn full_body(bytes: Bytes) -> RespBody {
    Full::new(bytes).map_err(|never| match never {}).boxed()
}
