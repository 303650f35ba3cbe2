//! Channel entity and its execution unit
//!
//! A [`Channel`] owns one remote session. The session lives inside a
//! dedicated tokio task (the execution unit) so that a slow, hung, or
//! crashing remote command never blocks the registry or any other channel.
//! Callers talk to the unit over a private single-slot link: one command
//! in, one [`Reply`] out.
//!
//! # States
//!
//! ```text
//! Connecting ──ok──▶ Ready ──command──▶ Executing ──ok──▶ Ready
//!     │                │                    │
//!     └──fail──────────┴──interrupt─────────┴──drop/interrupt──▶ Terminated
//! ```
//!
//! `Terminated` is absorbing. Whatever path ends the loop, the session is
//! closed in one cleanup step before the state is published.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::dsn::Dsn;
use crate::error::{ConnectError, DsnError, ExecError, TransportError};
use crate::record::{CommandOutput, ErrorRecord, Reply};
use crate::time::{current_time_secs, elapsed_secs};
use crate::transport::{Connector, RemoteShell};

/// Capacity of each direction of the private link.
///
/// One slot: a caller must consume the reply before sending again.
const LINK_CAPACITY: usize = 1;

/// Lifecycle state of a channel's execution unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    /// Handshake in progress (or not started yet)
    Connecting,
    /// Connected and waiting for a command
    Ready,
    /// Running a command
    Executing,
    /// Unit has exited; no further commands are accepted
    Terminated,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Ready => write!(f, "ready"),
            ChannelState::Executing => write!(f, "executing"),
            ChannelState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Metadata snapshot returned by [`Channel::info`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub username: String,
    pub password: Option<String>,
    pub hostname: String,
    pub port: u16,
    /// Whether the execution unit is still running
    pub is_alive: bool,
    /// Seconds since the channel was created or respawned
    pub uptime_seconds: u64,
    pub state: ChannelState,
    /// Unix timestamp of creation
    pub created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<ErrorRecord>,
}

/// Inner end of the link, owned by the execution unit once started
struct InnerLink {
    commands: mpsc::Receiver<String>,
    replies: mpsc::Sender<Reply>,
}

/// Why the serve loop returned
enum Exit {
    Interrupted,
    Dropped(TransportError),
    LinkClosed,
    Panicked(String),
}

/// One managed remote-command-execution session bound to an alias
pub struct Channel {
    dsn: Dsn,
    connector: Arc<dyn Connector>,
    created_at: u64,
    started: Instant,

    /// Outer end of the link
    commands: mpsc::Sender<String>,
    replies: AsyncMutex<mpsc::Receiver<Reply>>,
    /// Serializes send/recv pairs issued through `execute`
    in_flight: AsyncMutex<()>,

    /// Inner end, held here until the unit starts
    inner: Mutex<Option<InnerLink>>,
    unit: Mutex<Option<JoinHandle<()>>>,
    state: watch::Sender<ChannelState>,
    last_error: Mutex<Option<ErrorRecord>>,
    handshake_error: Mutex<Option<ConnectError>>,
    cancel: CancellationToken,
}

impl Channel {
    /// Parse a descriptor into a channel that is neither connected nor started
    pub(crate) fn new(
        descriptor: &str,
        connector: Arc<dyn Connector>,
        cancel: CancellationToken,
    ) -> Result<Self, DsnError> {
        let dsn = Dsn::parse(descriptor)?;
        Ok(Self::from_dsn(dsn, connector, cancel))
    }

    pub(crate) fn from_dsn(
        dsn: Dsn,
        connector: Arc<dyn Connector>,
        cancel: CancellationToken,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(LINK_CAPACITY);
        let (reply_tx, reply_rx) = mpsc::channel(LINK_CAPACITY);
        let (state, _) = watch::channel(ChannelState::Connecting);

        Self {
            dsn,
            connector,
            created_at: current_time_secs(),
            started: Instant::now(),
            commands: command_tx,
            replies: AsyncMutex::new(reply_rx),
            in_flight: AsyncMutex::new(()),
            inner: Mutex::new(Some(InnerLink {
                commands: command_rx,
                replies: reply_tx,
            })),
            unit: Mutex::new(None),
            state,
            last_error: Mutex::new(None),
            handshake_error: Mutex::new(None),
            cancel,
        }
    }

    pub fn alias(&self) -> &str {
        &self.dsn.alias
    }

    pub fn dsn(&self) -> &Dsn {
        &self.dsn
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Whether the execution unit's task is still running.
    ///
    /// This is not the same as "the last command succeeded".
    pub fn is_alive(&self) -> bool {
        lock(&self.unit)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Non-blocking metadata snapshot
    pub fn info(&self) -> ChannelInfo {
        ChannelInfo {
            username: self.dsn.username.clone(),
            password: self.dsn.password.clone(),
            hostname: self.dsn.hostname.clone(),
            port: self.dsn.port,
            is_alive: self.is_alive(),
            uptime_seconds: elapsed_secs(self.started),
            state: self.state(),
            created_at: self.created_at,
            last_error: lock(&self.last_error).clone(),
        }
    }

    /// Spawn the execution unit on the given tracker.
    ///
    /// Returns false if the unit was already started.
    pub(crate) fn start(self: &Arc<Self>, tracker: &TaskTracker) -> bool {
        let mut unit = lock(&self.unit);
        let Some(link) = lock(&self.inner).take() else {
            tracing::warn!(alias = %self.alias(), "Execution unit already started");
            return false;
        };
        *unit = Some(tracker.spawn(Arc::clone(self).run(link)));
        true
    }

    /// Ask the execution unit to terminate.
    ///
    /// Any in-flight command is abandoned; the unit pushes an `interrupted`
    /// record to a waiting caller and closes its session.
    pub fn stop(&self) {
        tracing::info!(channel = %self.dsn.redacted(), "Stopping channel");
        self.cancel.cancel();
    }

    /// Perform the handshake, logging any failure before returning it
    pub async fn connect(&self) -> Result<Box<dyn RemoteShell>, ConnectError> {
        let channel = self.dsn.redacted();
        tracing::info!(%channel, "Connecting");

        match self.connector.connect(&self.dsn).await {
            Ok(shell) => {
                tracing::info!(%channel, "Connected");
                Ok(shell)
            }
            Err(e) => {
                match &e {
                    ConnectError::HostResolution { .. } => tracing::error!(
                        severity = "critical",
                        %channel,
                        "Connection failed because host is not known"
                    ),
                    ConnectError::UnsupportedAuth { allowed } => tracing::error!(
                        severity = "critical",
                        %channel,
                        allowed = %allowed.join(","),
                        "Connection failed due to unsupported authentication type"
                    ),
                    ConnectError::Authentication { .. } => tracing::error!(
                        severity = "critical",
                        %channel,
                        "Connection failed due to authentication failure"
                    ),
                    ConnectError::Transport(reason) => tracing::error!(
                        severity = "critical",
                        %channel,
                        %reason,
                        "Connection failed"
                    ),
                }
                Err(e)
            }
        }
    }

    /// Run one command to completion on an established session
    async fn exec_command(
        &self,
        shell: &mut dyn RemoteShell,
        command: &str,
    ) -> Result<CommandOutput, TransportError> {
        tracing::debug!(alias = %self.alias(), command, "Executing command");
        let output = shell.exec(command).await?;
        tracing::debug!(
            alias = %self.alias(),
            exit_code = output.exit_code,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "Command finished"
        );
        Ok(output)
    }

    /// Enqueue a command on the outer end of the link
    pub async fn send(&self, command: impl Into<String>) -> Result<(), ExecError> {
        let command = command.into();
        tracing::debug!(alias = %self.alias(), %command, "Sending command");
        self.commands
            .send(command)
            .await
            .map_err(|_| ExecError::Terminated(self.alias().to_string()))
    }

    /// Wait for the next reply.
    ///
    /// Yields a `terminated` record instead of hanging once the unit is gone.
    pub async fn recv(&self) -> Reply {
        let mut replies = self.replies.lock().await;
        let reply = replies
            .recv()
            .await
            .unwrap_or_else(|| Err(ErrorRecord::terminated(self.alias())));
        match &reply {
            Ok(output) => tracing::debug!(
                alias = %self.alias(),
                exit_code = output.exit_code,
                "Received response"
            ),
            Err(record) => tracing::debug!(alias = %self.alias(), %record, "Received error record"),
        }
        reply
    }

    /// `send` followed by its matching `recv`, serialized per channel.
    ///
    /// The pair runs on its own task. A caller that stops waiting does not
    /// split it, so its reply is consumed there and never reaches the next
    /// command.
    pub async fn execute(
        self: &Arc<Self>,
        command: impl Into<String>,
    ) -> Result<CommandOutput, ExecError> {
        let command = command.into();
        let channel = Arc::clone(self);
        let exchange = tokio::spawn(async move {
            let _in_flight = channel.in_flight.lock().await;
            channel.send(command).await?;
            channel.recv().await.map_err(ExecError::from)
        });

        match exchange.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(alias = %self.alias(), error = %e, "Command exchange failed");
                Err(ExecError::Terminated(self.alias().to_string()))
            }
        }
    }

    /// Wait until the handshake has succeeded or the unit has terminated
    pub async fn wait_ready(&self) -> Result<(), ConnectError> {
        let mut state = self.state.subscribe();
        loop {
            let current = *state.borrow_and_update();
            match current {
                ChannelState::Ready | ChannelState::Executing => return Ok(()),
                ChannelState::Terminated => {
                    return Err(lock(&self.handshake_error).clone().unwrap_or_else(|| {
                        ConnectError::Transport(format!(
                            "channel {} terminated before becoming ready",
                            self.alias()
                        ))
                    }))
                }
                ChannelState::Connecting => {}
            }
            if state.changed().await.is_err() {
                return Err(ConnectError::Transport("channel dropped".into()));
            }
        }
    }

    /// Wait until the execution unit has finished its cleanup.
    ///
    /// Returns immediately for a channel that was never started.
    pub async fn wait_terminated(&self) {
        if lock(&self.unit).is_none() {
            return;
        }
        let mut state = self.state.subscribe();
        while *state.borrow_and_update() != ChannelState::Terminated {
            if state.changed().await.is_err() {
                return;
            }
        }
    }

    fn set_state(&self, state: ChannelState) {
        self.state.send_replace(state);
    }

    /// Record an error and push it to whoever waits on `recv`
    fn report(&self, link: &InnerLink, record: ErrorRecord) {
        *lock(&self.last_error) = Some(record.clone());
        if link.replies.try_send(Err(record)).is_err() {
            tracing::debug!(alias = %self.alias(), "Reply slot occupied, error record not queued");
        }
    }

    async fn run(self: Arc<Self>, link: InnerLink) {
        if let Err(panic) = AssertUnwindSafe(self.lifecycle(link)).catch_unwind().await {
            tracing::error!(
                severity = "critical",
                channel = %self.dsn.redacted(),
                "Execution unit panicked: {}",
                panic_message(panic.as_ref())
            );
            *lock(&self.last_error) = Some(ErrorRecord::terminated(self.alias()));
        }
        self.set_state(ChannelState::Terminated);
    }

    async fn lifecycle(&self, mut link: InnerLink) {
        self.set_state(ChannelState::Connecting);

        let handshake = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = self.connect() => Some(result),
        };

        let mut shell = match handshake {
            Some(Ok(shell)) => shell,
            Some(Err(e)) => {
                *lock(&self.handshake_error) = Some(e.clone());
                self.report(&link, ErrorRecord::from(&e));
                return;
            }
            None => {
                tracing::info!(
                    channel = %self.dsn.redacted(),
                    "Interrupted before the connection was established"
                );
                self.report(&link, ErrorRecord::interrupted());
                return;
            }
        };

        self.set_state(ChannelState::Ready);

        let exit = match AssertUnwindSafe(self.serve(shell.as_mut(), &mut link))
            .catch_unwind()
            .await
        {
            Ok(exit) => exit,
            Err(panic) => Exit::Panicked(panic_message(panic.as_ref())),
        };

        let channel = self.dsn.redacted();
        match exit {
            Exit::Interrupted => {
                tracing::info!(%channel, "Caught interrupt, stopping");
                self.report(&link, ErrorRecord::interrupted());
            }
            Exit::Dropped(e) => {
                tracing::error!(severity = "critical", %channel, error = %e, "Connection dropped");
                self.report(&link, ErrorRecord::dropped(&e));
            }
            Exit::Panicked(message) => {
                tracing::error!(
                    severity = "critical",
                    %channel,
                    "Execution unit panicked: {}",
                    message
                );
                self.report(&link, ErrorRecord::terminated(self.alias()));
            }
            Exit::LinkClosed => {
                tracing::debug!(%channel, "Link closed");
            }
        }

        tracing::info!(%channel, "Closing connection");
        shell.close().await;
    }

    async fn serve(&self, shell: &mut dyn RemoteShell, link: &mut InnerLink) -> Exit {
        loop {
            let command = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Exit::Interrupted,
                command = link.commands.recv() => match command {
                    Some(command) => command,
                    None => return Exit::LinkClosed,
                },
            };

            self.set_state(ChannelState::Executing);
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Exit::Interrupted,
                result = self.exec_command(&mut *shell, &command) => result,
            };

            let output = match result {
                Ok(output) => output,
                Err(e) => return Exit::Dropped(e),
            };

            self.set_state(ChannelState::Ready);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Exit::Interrupted,
                sent = link.replies.send(Ok(output)) => {
                    if sent.is_err() {
                        return Exit::LinkClosed;
                    }
                }
            }
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("dsn", &self.dsn.redacted().to_string())
            .field("state", &self.state())
            .field("alive", &self.is_alive())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
