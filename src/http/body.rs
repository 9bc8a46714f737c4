//! Response body wrapper that reports when the response is finished with.

use axum::body::{Body, Bytes};
use http_body::{Body as HttpBody, Frame, SizeHint};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::http::middleware::request_log::CompletionGuard;

/// Passes frames through untouched and holds a [`CompletionGuard`].
///
/// The server drops the body once the last frame is written or the
/// connection goes away, which is when the guard fires.
pub struct ObservedBody {
    inner: Body,
    _guard: CompletionGuard,
}

impl ObservedBody {
    pub(crate) fn new(inner: Body, guard: CompletionGuard) -> Self {
        Self {
            inner,
            _guard: guard,
        }
    }
}

impl HttpBody for ObservedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Pin::new(&mut self.inner).poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
