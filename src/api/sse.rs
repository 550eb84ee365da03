//! Turns a [`SubscriberHandle`] into an axum SSE response, spec.md §4.5/§6:
//! `Snapshot`/`Update` become `data: <json>\n\n` frames, `RefreshRequired`
//! becomes an `event: error\ndata: {...}\n\n` frame telling the client its
//! local view is stale (the per-subscriber queue dropped at least one
//! update) and it should resubscribe.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use serde::Serialize;

use crate::broadcast::{BroadcastEvent, SubscriberHandle};

pub fn sse_response<T>(handle: SubscriberHandle<T>) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    let stream = futures::stream::unfold(handle, |handle| async move {
        let event = handle.recv().await;
        let sse_event = match event {
            BroadcastEvent::Snapshot(payload) | BroadcastEvent::Update(payload) => {
                Event::default().json_data(payload).unwrap_or_else(|_| Event::default().data("null"))
            }
            BroadcastEvent::RefreshRequired => Event::default()
                .event("error")
                .data(serde_json::json!({ "error": "refresh_required" }).to_string()),
        };
        Some((Ok(sse_event), handle))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
