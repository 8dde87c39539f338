use http::{Method, Request, Response, StatusCode};
use std::net::SocketAddr;
use tokio::time::Instant;
use tracing::{error, info};

use crate::content::FetchedContent;
use crate::proxy::context::ProxyContext;
use crate::proxy::handler::rate_limit_validation::check_admission;
use crate::proxy::http_result::{HttpError, HttpResult};
use crate::proxy::synthetic_response::{file_response, synthetic_error_response, RespBody};
use crate::security::parse_content_path;

/// Serve one `GET /{owner}/{repo}/{path}` request.
///
/// Checks run in a fixed order and the first failure decides the response:
/// liveness, admission, method, credential, path shape, hidden segments,
/// then the upstream fetch. The request body is never read.
pub async fn handle_request<B>(
    req: &Request<B>,
    peer: SocketAddr,
    ctx: &ProxyContext,
) -> Response<RespBody> {
    let start = Instant::now();

    let response = match process(req, peer, ctx).await {
        Ok(content) => {
            if let Some(m) = &ctx.metrics {
                m.record_bytes_sent(content.bytes.len() as u64);
            }
            file_response(content)
        }
        Err(e) => {
            let status = e.status();
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                error!(?peer, path = %req.uri().path(), status = status.as_u16(), error = %e, "request rejected");
            } else {
                info!(?peer, path = %req.uri().path(), status = status.as_u16(), error = %e, "request rejected");
            }
            if let Some(m) = &ctx.metrics {
                m.record_error(e.error_type());
            }
            synthetic_error_response(&e)
        }
    };

    if let Some(m) = &ctx.metrics {
        m.record_request(
            req.method().as_str(),
            response.status().as_u16(),
            start.elapsed().as_secs_f64(),
        );
    }

    response
}

async fn process<B>(
    req: &Request<B>,
    peer: SocketAddr,
    ctx: &ProxyContext,
) -> HttpResult<FetchedContent> {
    if ctx.shutdown.is_cancelled() {
        return Err(HttpError::ShuttingDown);
    }

    check_admission(&ctx.gate, req.headers(), peer, ctx.metrics.as_ref())?;

    if req.method() != Method::GET {
        return Err(HttpError::MethodNotAllowed(req.method().clone()));
    }

    let token = ctx
        .credentials
        .get()
        .await
        .map_err(HttpError::CredentialUnavailable)?;

    let target = parse_content_path(req.uri().path())?;
    target.ensure_visible()?;

    let content = ctx
        .fetcher
        .fetch(target.owner, target.repo, target.path, &token)
        .await?;
    Ok(content)
}
