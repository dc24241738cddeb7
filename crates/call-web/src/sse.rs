//! 显示端实时流
//!
//! 每个连接独享一份状态订阅和一台提醒检测器：快照到达时推送`view`事件，
//! 检测到新呼叫时在其之前额外推送一条`calling`事件。断线重连即建立新连接，
//! 订阅会立即送达最新快照，检测器基准集合从空开始，不会漏掉重连期间的呼叫。

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use call_engine::{DisplayView, NotificationDetector};
use chrono::Utc;
use futures::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use uuid::Uuid;

use crate::service::AppState;

/// 显示端SSE流处理器
pub async fn display_stream(
    State(app): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let client_id = Uuid::new_v4();
    tracing::info!("Display client {} connected", client_id);

    let subscription = app.service.subscribe();
    let detector = NotificationDetector::new();

    let events = stream::unfold(
        (subscription, detector),
        move |(mut subscription, mut detector)| async move {
            let snapshot = match subscription.next().await {
                Some(snapshot) => snapshot,
                None => {
                    tracing::info!("Display client {} stream closed", client_id);
                    return None;
                }
            };

            let alert = detector.observe(&snapshot);
            let view = DisplayView::project(&snapshot, Utc::now());

            let mut batch = Vec::with_capacity(2);
            if let Some(alert) = alert {
                match Event::default().event("calling").json_data(alert) {
                    Ok(event) => batch.push(event),
                    Err(e) => tracing::warn!("Failed to encode calling event: {}", e),
                }
            }
            match Event::default().event("view").json_data(&view) {
                Ok(event) => batch.push(event),
                Err(e) => tracing::warn!("Failed to encode view event: {}", e),
            }

            Some((stream::iter(batch), (subscription, detector)))
        },
    )
    .flatten()
    .map(Ok);

    Sse::new(events).keep_alive(KeepAlive::default())
}
