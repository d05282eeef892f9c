//! Response body module
//!
//! A single boxed body type covers buffered responses (static files, HTML
//! proxy, errors) and streamed ones (image proxy relay).

use futures_util::stream::{self, Stream, TryStreamExt};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Body type returned by every handler
pub type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

/// Fully buffered body
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Streamed body relaying `upstream` in pieces of at most `chunk_size` bytes.
///
/// Dropping the body (client went away) drops `upstream` with it, so no more
/// data is read from the origin.
pub fn relay<S, E>(upstream: S, chunk_size: usize) -> ResponseBody
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    let frames = rechunk(upstream, chunk_size)
        .map_ok(Frame::data)
        .map_err(|err: E| -> BoxError { err.into() });
    StreamBody::new(frames).boxed_unsync()
}

/// Split every upstream chunk into non-empty pieces no larger than `chunk_size`
pub fn rechunk<S, E>(upstream: S, chunk_size: usize) -> impl Stream<Item = Result<Bytes, E>>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    let chunk_size = chunk_size.max(1);
    upstream
        .map_ok(move |bytes| {
            stream::iter(split_bytes(bytes, chunk_size).into_iter().map(Ok::<Bytes, E>))
        })
        .try_flatten()
}

fn split_bytes(mut bytes: Bytes, chunk_size: usize) -> Vec<Bytes> {
    let mut pieces = Vec::with_capacity(bytes.len().div_ceil(chunk_size));
    while !bytes.is_empty() {
        let take = bytes.len().min(chunk_size);
        pieces.push(bytes.split_to(take));
    }
    pieces
}
