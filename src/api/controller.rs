//! Sharing controller
//!
//! The controller is split into a cheap handle and a session actor running on
//! the tokio runtime. Every handle operation returns immediately: it checks
//! preconditions where the caller needs a synchronous answer and posts a
//! command. The actor is the single owner of the session; fixes, submission
//! outcomes and authentication changes are all serialized through its loop,
//! which is what keeps at most one submission in flight.
//!
//! ```text
//!   LocationSource ──► handle.on_fix ──┐
//!   UI ──► start / stop / toggle ──────┤ commands
//!                                      ▼
//!   AuthGate status ───────────► SessionActor ──► LocationSubmitter (spawned)
//!                                  │    ▲                │
//!                                  │    └── completions ─┘
//!                                  ▼
//!                          Observable<SharingStatus>
//! ```

use crate::algorithms::{UpdateDecision, UpdateDecisionPolicy, UpdatePolicyConfig};
use crate::api::observable::Observable;
use crate::api::session::{CompletionAction, FixAction, SharingSession};
use crate::api::types::{ApiResult, PreconditionError, SharingError, SharingStatus};
use crate::auth::{AuthGate, AuthSession};
use crate::core::LocationFix;
use crate::source::SourceEvent;
use crate::transport::{LocationSubmitter, SubmissionError, SubmissionResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Commands posted from the handle to the actor
#[derive(Debug)]
enum Command {
    Start,
    Stop,
    Fix(LocationFix),
    Permission(bool),
    MapReady,
    ClearError,
    Flush(oneshot::Sender<()>),
}

/// Outcome of a spawned submission, tagged with the session epoch it belongs to
#[derive(Debug)]
struct Completion {
    epoch: u64,
    fix: LocationFix,
    result: SubmissionResult<()>,
}

/// Handle to a running sharing controller.
///
/// Must be created inside a tokio runtime. Dropping the handle tears the actor
/// down and cancels any in-flight submission.
pub struct SharingController {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SharingStatus>,
    auth: Arc<dyn AuthGate>,
    permission: Arc<AtomicBool>,
    shutdown: CancellationToken,
    actor: Option<JoinHandle<()>>,
}

impl SharingController {
    pub fn new(
        policy: UpdatePolicyConfig,
        auth: Arc<dyn AuthGate>,
        submitter: Arc<dyn LocationSubmitter>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let status = Observable::new(SharingStatus::default());
        let status_rx = status.subscribe();
        let auth_rx = auth.subscribe();
        let shutdown = CancellationToken::new();

        let actor = SessionActor {
            policy: UpdateDecisionPolicy::new(policy),
            auth: Arc::clone(&auth),
            submitter,
            status,
            session: SharingSession::new(),
            in_flight_task: None,
            completions_tx,
            last_error: None,
            last_observed_fix: None,
            permission_granted: false,
            map_ready: false,
            auth_generation: 0,
        };

        let actor_shutdown = shutdown.clone();
        let handle = tokio::spawn(actor.run(commands_rx, completions_rx, auth_rx, actor_shutdown));

        Self {
            commands: commands_tx,
            status: status_rx,
            auth,
            permission: Arc::new(AtomicBool::new(false)),
            shutdown,
            actor: Some(handle),
        }
    }

    /// Turn sharing on.
    ///
    /// Fails synchronously, without any state change, when the session is not
    /// authenticated or location permission has not been granted.
    pub fn start(&self) -> ApiResult<()> {
        if !self.auth.is_authenticated() {
            return Err(PreconditionError::NotAuthenticated);
        }
        if !self.permission.load(Ordering::Acquire) {
            return Err(PreconditionError::PermissionNotGranted);
        }
        self.send(Command::Start)
    }

    /// Turn sharing off, discarding any in-flight submission. Idempotent.
    pub fn stop(&self) {
        // A closed actor has nothing left to stop
        let _ = self.send(Command::Stop);
    }

    /// Flip sharing based on the last published status
    pub fn toggle(&self) -> ApiResult<()> {
        if self.status.borrow().is_active() {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }

    /// Feed a fix from the location source
    pub fn on_fix(&self, fix: LocationFix) {
        let _ = self.send(Command::Fix(fix));
    }

    /// Record a permission grant or denial. Denial stops an active session.
    pub fn set_location_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::Release);
        let _ = self.send(Command::Permission(granted));
    }

    /// The map is displayed; sharing starts automatically if it can
    pub fn on_map_ready(&self) {
        let _ = self.send(Command::MapReady);
    }

    /// Dismiss the transient error
    pub fn clear_error(&self) {
        let _ = self.send(Command::ClearError);
    }

    /// Snapshot of the current status
    pub fn status(&self) -> SharingStatus {
        self.status.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.status.borrow().is_active()
    }

    /// Observable status for the UI layer
    pub fn subscribe(&self) -> watch::Receiver<SharingStatus> {
        self.status.clone()
    }

    /// Resolves once every command issued before this call has been processed
    pub async fn flush(&self) -> ApiResult<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Flush(tx))?;
        rx.await.map_err(|_| PreconditionError::ControllerClosed)
    }

    /// Forward events from a location source until it closes.
    ///
    /// The forwarding task holds only the command channel, so it never keeps the
    /// actor alive past the handle.
    pub fn attach_source(&self, mut events: mpsc::Receiver<SourceEvent>) -> JoinHandle<()> {
        let commands = self.commands.clone();
        let permission = Arc::clone(&self.permission);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let command = match event {
                    SourceEvent::Fix(fix) => Command::Fix(fix),
                    SourceEvent::PermissionGranted => {
                        permission.store(true, Ordering::Release);
                        Command::Permission(true)
                    }
                    SourceEvent::PermissionDenied => {
                        permission.store(false, Ordering::Release);
                        Command::Permission(false)
                    }
                };
                if commands.send(command).is_err() {
                    break;
                }
            }
            debug!("location source detached");
        })
    }

    /// Stop sharing and wait for the actor to exit
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(actor) = self.actor.take() {
            if let Err(e) = actor.await {
                warn!(error = %e, "sharing actor ended abnormally");
            }
        }
    }

    fn send(&self, command: Command) -> ApiResult<()> {
        self.commands
            .send(command)
            .map_err(|_| PreconditionError::ControllerClosed)
    }
}

impl Drop for SharingController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Single owner of the sharing session
struct SessionActor {
    policy: UpdateDecisionPolicy,
    auth: Arc<dyn AuthGate>,
    submitter: Arc<dyn LocationSubmitter>,
    status: Observable<SharingStatus>,
    session: SharingSession,
    in_flight_task: Option<JoinHandle<()>>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    last_error: Option<SharingError>,
    last_observed_fix: Option<LocationFix>,
    permission_granted: bool,
    map_ready: bool,
    /// Auth generation the active session started under
    auth_generation: u64,
}

impl SessionActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
        mut auth: watch::Receiver<AuthSession>,
        shutdown: CancellationToken,
    ) {
        let mut auth_open = true;

        loop {
            // Session loss outranks everything else, outcomes outrank new commands
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                changed = auth.changed(), if auth_open => {
                    let session = match changed {
                        Ok(()) => auth.borrow_and_update().clone(),
                        Err(_) => {
                            auth_open = false;
                            AuthSession::default()
                        }
                    };
                    self.on_auth_session(session);
                }

                Some(completion) = completions.recv() => self.on_completion(completion),

                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
        }

        self.teardown();
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Start => self.start(),
            Command::Stop => self.stop(None),
            Command::Fix(fix) => self.on_fix(fix),
            Command::Permission(granted) => self.on_permission(granted),
            Command::MapReady => self.on_map_ready(),
            Command::ClearError => {
                self.last_error = None;
                self.publish();
            }
            Command::Flush(reply) => {
                let _ = reply.send(());
            }
        }
    }

    fn start(&mut self) {
        // Re-checked here: either may have changed since the handle looked
        let auth = self.auth.session();
        let precondition = if !auth.allows_sharing() {
            Some(PreconditionError::NotAuthenticated)
        } else if !self.permission_granted {
            Some(PreconditionError::PermissionNotGranted)
        } else {
            None
        };
        if let Some(error) = precondition {
            warn!(%error, "start rejected");
            self.last_error = Some(error.into());
            self.publish();
            return;
        }

        if !self.session.activate() {
            debug!("sharing already active");
            return;
        }
        self.auth_generation = auth.generation;
        info!(epoch = self.session.epoch(), "location sharing started");
        self.publish();

        // Share the position we already know instead of waiting for the next fix
        if let Some(fix) = self.last_observed_fix {
            self.evaluate(fix);
        }
    }

    fn stop(&mut self, reason: Option<SharingError>) {
        if let Some(task) = self.in_flight_task.take() {
            task.abort();
        }
        let was_active = self.session.deactivate();
        if was_active {
            info!(epoch = self.session.epoch(), "location sharing stopped");
            if let Some(reason) = reason {
                self.last_error = Some(reason);
            }
        }
        self.publish();
    }

    fn on_fix(&mut self, fix: LocationFix) {
        if !fix.is_finite() {
            warn!(lat = fix.latitude, lon = fix.longitude, "dropping non-finite fix");
            return;
        }
        self.last_observed_fix = Some(fix);
        self.evaluate(fix);
    }

    fn evaluate(&mut self, fix: LocationFix) {
        match self.session.on_fix(fix, &self.policy) {
            FixAction::Ignored => trace!("sharing inactive, fix not evaluated"),
            FixAction::Suppressed(decision) => log_decision(&decision, "fix suppressed"),
            FixAction::Coalesced { decision, replaced } => {
                log_decision(&decision, "fix queued behind in-flight submission");
                if replaced {
                    trace!("older queued fix replaced");
                }
            }
            FixAction::Submit { fix, decision } => {
                log_decision(&decision, "submitting fix");
                self.dispatch(fix);
            }
        }
        self.publish();
    }

    /// Launch the submission for the session's in-flight fix
    fn dispatch(&mut self, fix: LocationFix) {
        let mut fix = fix;
        loop {
            // Token and generation come from one snapshot, so a token from a
            // later sign-in is never sent for this session
            let auth = self.auth.session();
            if !auth.allows_sharing() || auth.generation != self.auth_generation {
                self.stop(Some(SharingError::SessionLost));
                return;
            }

            let epoch = self.session.epoch();
            let token = match auth.access_token {
                Some(token) => token,
                None => {
                    // Counts as a failed attempt; the next qualifying fix retries
                    let error = SubmissionError::MissingToken;
                    warn!(%error, "cannot submit location");
                    let action = self.session.complete(epoch, &Err(error.clone()), now_ms(), &self.policy);
                    self.last_error = Some(error.into());
                    match action {
                        CompletionAction::Applied { next: Some(next) } => {
                            fix = next;
                            continue;
                        }
                        _ => return,
                    }
                }
            };

            debug!(lat = fix.latitude, lon = fix.longitude, epoch, "dispatching location");
            let submitter = Arc::clone(&self.submitter);
            let completions = self.completions_tx.clone();
            self.in_flight_task = Some(tokio::spawn(async move {
                let result = submitter.submit(&fix, &token).await;
                // The actor may be gone after shutdown; nothing left to inform
                let _ = completions.send(Completion { epoch, fix, result });
            }));
            return;
        }
    }

    fn on_completion(&mut self, completion: Completion) {
        let Completion { epoch, fix, result } = completion;
        match self.session.complete(epoch, &result, now_ms(), &self.policy) {
            CompletionAction::Stale => {
                debug!(epoch, "discarding outcome from a previous session");
            }
            CompletionAction::Applied { next } => {
                self.in_flight_task = None;
                match result {
                    Ok(()) => {
                        debug!(lat = fix.latitude, lon = fix.longitude, "location sent");
                        if matches!(self.last_error, Some(SharingError::Submission(_))) {
                            self.last_error = None;
                        }
                    }
                    Err(error) => {
                        warn!(%error, "location submission failed");
                        self.last_error = Some(error.into());
                    }
                }
                if let Some(next) = next {
                    self.dispatch(next);
                }
            }
        }
        self.publish();
    }

    fn on_auth_session(&mut self, auth: AuthSession) {
        if auth.allows_sharing() {
            // Signed out and back in before this loop looked: still a new session
            if self.session.is_active() && auth.generation != self.auth_generation {
                info!(generation = auth.generation, "authentication session replaced, forcing stop");
                self.stop(Some(SharingError::SessionLost));
            }
            return;
        }
        if self.session.is_active() {
            info!(status = ?auth.status, "authentication lost, forcing stop");
        }
        self.stop(Some(SharingError::SessionLost));
    }

    fn on_permission(&mut self, granted: bool) {
        self.permission_granted = granted;
        if granted {
            if self.last_error == Some(SharingError::PermissionDenied) {
                self.last_error = None;
            }
            self.auto_start();
            self.publish();
        } else {
            info!("location permission denied");
            self.last_error = Some(SharingError::PermissionDenied);
            self.stop(None);
        }
    }

    fn on_map_ready(&mut self) {
        self.map_ready = true;
        self.auto_start();
        self.publish();
    }

    /// Start once the map is shown, permission is granted and a session exists
    fn auto_start(&mut self) {
        if self.map_ready
            && self.permission_granted
            && !self.session.is_active()
            && self.auth.is_authenticated()
        {
            debug!("map ready, starting location sharing");
            self.start();
        }
    }

    fn teardown(&mut self) {
        self.stop(None);
        debug!("sharing actor exited");
    }

    fn publish(&self) {
        let snapshot = SharingStatus {
            state: self.session.state(),
            last_sent_fix: self.session.last_sent_fix().copied(),
            last_sent_at_ms: self.session.last_sent_at_ms(),
            last_error: self.last_error.clone(),
            last_observed_fix: self.last_observed_fix,
            permission_granted: self.permission_granted,
            map_ready: self.map_ready,
            sent_count: self.session.sent_count(),
            failed_count: self.session.failed_count(),
        };
        self.status.update(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}

fn log_decision(decision: &UpdateDecision, message: &str) {
    match *decision {
        UpdateDecision::FirstFix => debug!(reason = "first fix", "{}", message),
        UpdateDecision::Moved { distance_m } => debug!(distance_m, "{}", message),
        UpdateDecision::IntervalElapsed { elapsed_ms } => debug!(elapsed_ms, "{}", message),
        UpdateDecision::Suppressed { distance_m, elapsed_ms } => {
            trace!(distance_m, elapsed_ms, "{}", message)
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
