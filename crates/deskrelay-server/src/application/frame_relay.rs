//! Frame relay: the `multipart/x-mixed-replace` stream viewers watch.
//!
//! Browsers render a `multipart/x-mixed-replace` response in an `<img>` tag
//! by replacing the picture with each new part.  Every tick the relay reads
//! the session's latest image and, if there is one, writes it as a part:
//!
//! ```text
//! --frame\r\n
//! Content-Type: image/png\r\n
//! Content-Length: 1234\r\n
//! \r\n
//! <1234 bytes>\r\n
//! ```
//!
//! The first tick fires immediately so a new viewer sees the current frame
//! without waiting a full interval.  The stream ends when the viewer
//! disconnects (the response body is dropped) or when the relay shuts down.

use std::convert::Infallible;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use futures_util::stream::{self, Stream};
use tokio::time::{interval, MissedTickBehavior};

use super::registry::SessionRegistry;
use crate::domain::sniff_content_type;

/// Multipart boundary token.
pub const BOUNDARY: &str = "frame";

/// `Content-Type` header value of the stream response.
pub fn stream_content_type() -> String {
    format!("multipart/x-mixed-replace; boundary={BOUNDARY}")
}

/// Encodes one image as a complete multipart part, trailing CRLF included.
pub fn encode_part(image: &[u8]) -> Bytes {
    let header = format!(
        "--{BOUNDARY}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        sniff_content_type(image),
        image.len()
    );
    let mut part = BytesMut::with_capacity(header.len() + image.len() + 2);
    part.put_slice(header.as_bytes());
    part.put_slice(image);
    part.put_slice(b"\r\n");
    part.freeze()
}

/// Stream of parts for `session_id`, one per `period` while the session has
/// an image, ending once `running` is cleared.
///
/// The session is looked up through the registry on every tick, so an image
/// uploaded after eviction and re-creation is still picked up.
pub fn frame_stream(
    registry: Arc<SessionRegistry>,
    session_id: String,
    period: Duration,
    running: Arc<AtomicBool>,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    stream::unfold(
        (registry, session_id, ticker, running),
        |(registry, session_id, mut ticker, running)| async move {
            loop {
                ticker.tick().await;
                if !running.load(Ordering::Relaxed) {
                    return None;
                }
                if let Some(image) = registry.latest_image(&session_id) {
                    let part = encode_part(&image);
                    return Some((Ok(part), (registry, session_id, ticker, running)));
                }
            }
        },
    )
}
