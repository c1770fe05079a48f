use std::sync::Arc;

use serde::Serialize;
use tokio::{
    sync::{Notify, broadcast, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    api::ApiService,
    config::GateConfig,
    error::Result,
    events::{EnrichedEvent, EventBus, SessionEvent, UserAction},
    player::{PlayerCommand, PlayerEvent, PlayerSource},
    queues::Latest1Queue,
    session::{Effect, Notice, ReportOutcome, SessionSnapshot, WatchSession},
    status::{InitialStatus, resolve_initial_status},
    storage::{KeyValueStore, set_acknowledged},
    tracker::{GateError, KEYWORD_HINT},
    types::{VideoDetail, VideoId},
    workers::{Worker, run_worker},
};

/// What the session asks of the outside world.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionOutput {
    Player(PlayerCommand),
    Notice(Notice),
}

/// Report completion, then cache the acknowledgment locally.
pub async fn report_completion<A, S>(api: &A, store: &S, video: VideoId) -> ReportOutcome
where
    A: ApiService + ?Sized,
    S: KeyValueStore + ?Sized,
{
    match api.report_watched(video).await {
        Ok(_) => {
            if let Err(e) = set_acknowledged(store, video).await {
                warn!(%video, error = %e, "completion reported but local flag not written");
            }
            ReportOutcome::Confirmed
        }
        Err(e) if e.requires_reauth() => ReportOutcome::Unauthenticated {
            message: e.to_string(),
        },
        Err(e) => ReportOutcome::Failed {
            retryable: e.is_retryable(),
            message: e.to_string(),
        },
    }
}

/// Owns one [`WatchSession`] and applies the session bus to it in order.
pub struct SessionWorker<A: ?Sized, S: ?Sized> {
    session: WatchSession,
    api: Arc<A>,
    store: Arc<S>,
    outputs: mpsc::UnboundedSender<SessionOutput>,
    snapshots: Arc<Latest1Queue<SessionSnapshot>>,
}

impl<A, S> SessionWorker<A, S>
where
    A: ApiService + ?Sized + 'static,
    S: KeyValueStore + ?Sized + 'static,
{
    pub fn new(
        session: WatchSession,
        api: Arc<A>,
        store: Arc<S>,
        outputs: mpsc::UnboundedSender<SessionOutput>,
        snapshots: Arc<Latest1Queue<SessionSnapshot>>,
    ) -> Self {
        Self {
            session,
            api,
            store,
            outputs,
            snapshots,
        }
    }

    fn emit(&self, output: SessionOutput) {
        if self.outputs.send(output).is_err() {
            debug!(video = %self.session.video(), "session output dropped, receiver gone");
        }
    }

    fn dispatch(&self, effects: Vec<Effect>, bus: &EventBus) {
        for effect in effects {
            match effect {
                Effect::Player(command) => self.emit(SessionOutput::Player(command)),
                Effect::Notice(notice) => self.emit(SessionOutput::Notice(notice)),
                Effect::ReportCompletion { video, version } => {
                    let api = Arc::clone(&self.api);
                    let store = Arc::clone(&self.store);
                    let bus = bus.clone();
                    tokio::spawn(async move {
                        let outcome = report_completion(&*api, &*store, video).await;
                        if !bus.publish(SessionEvent::ReportSettled { version, outcome }) {
                            debug!(%video, version, "session closed before completion report settled");
                        }
                    });
                }
            }
        }
    }

    fn apply_user(&mut self, action: &UserAction) -> std::result::Result<Vec<Effect>, GateError> {
        match action {
            UserAction::SubmitKeyword(input) => self.session.submit_keyword(input),
            UserAction::AnswerUnderstanding(understood) => {
                self.session.answer_understanding(*understood)
            }
            UserAction::WatchAgain => Ok(self.session.restart()),
        }
    }

    fn publish_snapshot(&self) {
        self.snapshots.set(self.session.snapshot());
    }
}

impl<A, S> Worker for SessionWorker<A, S>
where
    A: ApiService + ?Sized + 'static,
    S: KeyValueStore + ?Sized + 'static,
{
    const WORKER_ID: &'static str = "session.watch";

    async fn handle(&mut self, event: Arc<EnrichedEvent>, bus: &EventBus) -> anyhow::Result<()> {
        let effects = match &event.event {
            SessionEvent::Player(player_event) => self.session.handle_player(player_event.clone()),
            SessionEvent::ReportSettled { version, outcome } => {
                self.session.settle_report(*version, outcome.clone())
            }
            SessionEvent::User(action) => match self.apply_user(action) {
                Ok(effects) => effects,
                Err(GateError::KeywordMismatch) => {
                    vec![Effect::Notice(Notice::KeywordRejected {
                        message: KEYWORD_HINT.to_string(),
                    })]
                }
                Err(GateError::BelowThreshold { watched, threshold }) => {
                    vec![Effect::Notice(Notice::NotEnoughWatched { watched, threshold })]
                }
                Err(e) => {
                    self.publish_snapshot();
                    return Err(anyhow::anyhow!(e));
                }
            },
        };

        self.dispatch(effects, bus);
        self.publish_snapshot();
        Ok(())
    }
}

/// Caller's side of a running session.
pub struct SessionHandle {
    bus: EventBus,
    outputs: mpsc::UnboundedReceiver<SessionOutput>,
    snapshots: Arc<Latest1Queue<SessionSnapshot>>,
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<anyhow::Result<()>>,
    detail: VideoDetail,
    initial_status: InitialStatus,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session_id", &self.bus.session_id())
            .field("video", &self.detail.id)
            .finish()
    }
}

impl SessionHandle {
    pub fn session_id(&self) -> Uuid {
        self.bus.session_id()
    }

    pub fn detail(&self) -> &VideoDetail {
        &self.detail
    }

    pub fn initial_status(&self) -> &InitialStatus {
        &self.initial_status
    }

    pub fn player_event(&self, event: PlayerEvent) -> bool {
        self.bus.publish(SessionEvent::Player(event))
    }

    pub fn user_action(&self, action: UserAction) -> bool {
        self.bus.publish(SessionEvent::User(action))
    }

    pub async fn next_output(&mut self) -> Option<SessionOutput> {
        self.outputs.recv().await
    }

    pub fn try_next_output(&mut self) -> Option<SessionOutput> {
        self.outputs.try_recv().ok()
    }

    /// Newest snapshot published since the last call, if any.
    pub fn poll_snapshot(&self) -> Option<SessionSnapshot> {
        self.snapshots.try_recv()
    }

    pub async fn next_snapshot(&self) -> SessionSnapshot {
        self.snapshots.recv().await
    }

    /// Tear the session down. Reports still in flight finish but cannot touch it.
    pub async fn close(self) -> anyhow::Result<()> {
        let _ = self.shutdown.send(());
        self.task.await??;
        info!(session_id = %self.bus.session_id(), "session closed");
        Ok(())
    }
}

/// Fetch the video, resolve its completion status and start the session worker.
pub async fn open_session<A, S>(
    api: Arc<A>,
    store: Arc<S>,
    video: VideoId,
    config: &GateConfig,
) -> Result<SessionHandle>
where
    A: ApiService + ?Sized + 'static,
    S: KeyValueStore + ?Sized + 'static,
{
    let detail = api.video_detail(video).await?;
    let initial_status = resolve_initial_status(&*api, &*store, &detail).await;
    let source = PlayerSource::from_url(detail.url.as_str());

    let session = if initial_status.completed {
        WatchSession::completed(video, source, config)
    } else {
        WatchSession::new(video, source, config)
    };

    let (bus, inbox) = EventBus::new(Uuid::new_v4());
    let (outputs_tx, outputs_rx) = mpsc::unbounded_channel();
    let snapshots = Arc::new(Latest1Queue::new(Arc::new(Notify::new())));
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

    let start = session.start();
    let worker = SessionWorker::new(
        session,
        api,
        store,
        outputs_tx,
        Arc::clone(&snapshots),
    );
    worker.dispatch(start, &bus);
    worker.publish_snapshot();

    info!(
        session_id = %bus.session_id(),
        %video,
        completed = initial_status.completed,
        source = ?initial_status.source,
        "watch session opened"
    );

    let task = tokio::spawn(run_worker(worker, inbox, bus.clone(), shutdown_rx));

    Ok(SessionHandle {
        bus,
        outputs: outputs_rx,
        snapshots,
        shutdown: shutdown_tx,
        task,
        detail,
        initial_status,
    })
}
