//! Where a session's starting completion state comes from.
//!
//! The backend is authoritative. The local acknowledgment flag is only a cache
//! hint, consulted when the watched-status call itself fails.

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    api::ApiService,
    storage::{KeyValueStore, acknowledgment_key, is_acknowledged, set_acknowledged},
    types::VideoDetail,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    Remote,
    LocalFlag,
    VideoRecord,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitialStatus {
    pub completed: bool,
    pub source: StatusSource,
    pub completed_at: Option<String>,
}

pub async fn resolve_initial_status<A, S>(api: &A, store: &S, detail: &VideoDetail) -> InitialStatus
where
    A: ApiService + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let video = detail.id;

    match api.watched_status(video).await {
        Ok(status) => {
            // Keep the cache in line with the backend so the two never drift apart.
            let cache_result = if status.is_completed {
                set_acknowledged(store, video).await
            } else {
                store.remove(&acknowledgment_key(video)).await
            };
            if let Err(e) = cache_result {
                warn!(%video, error = %e, "could not refresh acknowledgment cache");
            }
            info!(%video, completed = status.is_completed, "watched status from backend");
            InitialStatus {
                completed: status.is_completed,
                source: StatusSource::Remote,
                completed_at: status.completed_at,
            }
        }
        Err(e) => {
            warn!(%video, error = %e, "watched status unavailable, using local state");
            if is_acknowledged(store, video).await {
                InitialStatus {
                    completed: true,
                    source: StatusSource::LocalFlag,
                    completed_at: None,
                }
            } else if detail.is_completed {
                InitialStatus {
                    completed: true,
                    source: StatusSource::VideoRecord,
                    completed_at: None,
                }
            } else {
                InitialStatus {
                    completed: false,
                    source: StatusSource::Unknown,
                    completed_at: None,
                }
            }
        }
    }
}
