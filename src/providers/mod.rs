pub mod api;
pub mod inference;

use futures::stream::BoxStream;
use reqwest::{Response, StatusCode};

use crate::core::errors::{AppError, AppResult};

/// Raw response body delivered chunk by chunk, in arrival order.
pub type ByteStream = BoxStream<'static, AppResult<Vec<u8>>>;

pub use api::{DocumentApi, HttpDocumentApi};
pub use inference::{GuideRequest, HttpInferenceClient, InferenceClient, InsightRequest, PodcastRequest};

pub(crate) async fn ensure_success(response: Response) -> AppResult<Response> {
    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::Authentication),
        StatusCode::NOT_FOUND => Err(AppError::NotFound(response.url().path().to_string())),
        StatusCode::TOO_MANY_REQUESTS => Err(AppError::RateLimited),
        status if !status.is_success() => {
            let body = response.text().await.unwrap_or_default();
            Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            })
        }
        _ => Ok(response),
    }
}

pub(crate) fn into_byte_stream(response: Response) -> ByteStream {
    use futures::StreamExt;

    response
        .bytes_stream()
        .map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|err| AppError::StreamTransport(err.to_string()))
        })
        .boxed()
}
