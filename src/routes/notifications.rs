//! Live notification stream
//!
//! `GET /api/v1/notifications` holds a server-sent-events response open for
//! the caller. Each frame is one serialized `NotificationEvent`:
//!
//! ```text
//! data: {"type":"match","recipientId":"...","payload":{...}}
//!
//! ```
//!
//! Missed events are not replayed on reconnect.

use crate::routes::{AppState, CallerIdentity};
use crate::services::{Frame, Subscription};
use actix_web::{http::header, web, HttpResponse};
use futures_util::stream;
use std::convert::Infallible;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

const KEEP_ALIVE_FRAME: &[u8] = b": keep-alive\n\n";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/notifications", web::get().to(subscribe));
}

fn sse_frame(frame: &Frame) -> web::Bytes {
    web::Bytes::from(format!("data: {}\n\n", frame))
}

async fn subscribe(state: web::Data<AppState>, caller: CallerIdentity) -> HttpResponse {
    let subscription = state.registry.subscribe(caller.user_id());
    tracing::info!("Notification stream opened for {} ({:?})", caller.user_id(), subscription.handle());

    let mut ticker = interval_at(Instant::now() + state.keep_alive, state.keep_alive);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Dropping the stream (client gone) drops the subscription, which unsubscribes
    let events = stream::unfold((subscription, ticker), next_chunk);

    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .insert_header((header::CONTENT_ENCODING, "identity"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(events)
}

async fn next_chunk(
    (mut subscription, mut ticker): (Subscription, Interval),
) -> Option<(Result<web::Bytes, Infallible>, (Subscription, Interval))> {
    let chunk = tokio::select! {
        frame = subscription.recv() => frame.map(|frame| sse_frame(&frame)),
        _ = ticker.tick() => Some(web::Bytes::from_static(KEEP_ALIVE_FRAME)),
    };

    match chunk {
        Some(bytes) => Some((Ok(bytes), (subscription, ticker))),
        None => {
            tracing::debug!("Channel for {} closed by registry", subscription.user_id());
            None
        }
    }
}
