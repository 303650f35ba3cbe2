//! russh-backed [`Connector`] and [`RemoteShell`]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use russh::client::{self, Config, Handle};
use russh::{ChannelMsg, Disconnect};
use russh_keys::key::{KeyPair, PublicKey};

use sshpool_core::config::{expand_home, DaemonConfig};
use sshpool_core::{CommandOutput, ConnectError, Connector, Dsn, RemoteShell, TransportError};

/// Private keys tried when the descriptor carries no password, or the
/// password is rejected
const DEFAULT_IDENTITIES: &[&str] = &[".ssh/id_ed25519", ".ssh/id_ecdsa", ".ssh/id_rsa"];

/// Authentication methods this client knows how to offer
const CLIENT_AUTH_METHODS: &[&str] = &["password", "publickey"];

/// Exit code reported when the remote side closes without an exit status
const NO_EXIT_STATUS: i32 = -1;

/// Opens one russh session per channel
pub struct RusshConnector {
    config: Arc<Config>,
    connect_timeout: Duration,
    identity_files: Vec<PathBuf>,
    known_hosts: Option<PathBuf>,
}

impl RusshConnector {
    pub fn new(daemon: &DaemonConfig) -> Self {
        let mut identity_files: Vec<PathBuf> = dirs::home_dir()
            .map(|home| DEFAULT_IDENTITIES.iter().map(|p| home.join(p)).collect())
            .unwrap_or_default();
        identity_files.extend(daemon.identity_files.iter().map(|p| expand_home(p)));

        Self {
            config: Arc::new(Config::default()),
            connect_timeout: daemon.connect_timeout,
            identity_files,
            known_hosts: daemon.known_hosts_path.as_deref().map(expand_home),
        }
    }

    async fn resolve(&self, target: &Dsn) -> Result<SocketAddr, ConnectError> {
        let (host, port) = target.address();
        let not_known = |reason: String| ConnectError::HostResolution {
            host: host.clone(),
            reason,
        };
        let addr = tokio::net::lookup_host((host.as_str(), port))
            .await
            .map_err(|e| not_known(e.to_string()))?
            .next()
            .ok_or_else(|| not_known("no addresses returned".to_string()));
        addr
    }

    /// Keys that exist on disk and load without a passphrase
    fn load_identities(&self) -> Vec<Arc<KeyPair>> {
        self.identity_files
            .iter()
            .filter(|path| path.exists())
            .filter_map(|path| match russh_keys::load_secret_key(path, None) {
                Ok(key) => Some(Arc::new(key)),
                Err(e) => {
                    tracing::debug!("Skipping identity {}: {}", path.display(), e);
                    None
                }
            })
            .collect()
    }

    async fn authenticate(
        &self,
        session: &mut Handle<ClientHandler>,
        target: &Dsn,
    ) -> Result<(), ConnectError> {
        let user = target.username.as_str();
        let transport = |e: russh::Error| ConnectError::Transport(format!("authentication error: {}", e));
        let mut offered = false;

        if let Some(password) = &target.password {
            offered = true;
            tracing::debug!(%user, "Trying password authentication");
            if session
                .authenticate_password(user, password)
                .await
                .map_err(transport)?
            {
                return Ok(());
            }
        }

        for key in self.load_identities() {
            offered = true;
            tracing::debug!(%user, fingerprint = %key.clone_public_key().map(|k| k.fingerprint()).unwrap_or_default(), "Trying public key authentication");
            if session
                .authenticate_publickey(user, key)
                .await
                .map_err(transport)?
            {
                return Ok(());
            }
        }

        if offered {
            Err(ConnectError::Authentication {
                username: user.to_string(),
            })
        } else {
            Err(ConnectError::UnsupportedAuth {
                allowed: CLIENT_AUTH_METHODS.iter().map(|m| m.to_string()).collect(),
            })
        }
    }
}

#[async_trait]
impl Connector for RusshConnector {
    async fn connect(&self, target: &Dsn) -> Result<Box<dyn RemoteShell>, ConnectError> {
        let addr = self.resolve(target).await?;
        let handler = ClientHandler {
            host: target.hostname.clone(),
            port: target.port,
            known_hosts: self.known_hosts.clone(),
        };

        tracing::debug!(%addr, "Opening SSH connection");
        let mut session = tokio::time::timeout(
            self.connect_timeout,
            client::connect(Arc::clone(&self.config), addr, handler),
        )
        .await
        .map_err(|_| ConnectError::Transport(format!("connection to {} timed out", addr)))?
        .map_err(|e| ConnectError::Transport(format!("failed to connect to {}: {}", addr, e)))?;

        self.authenticate(&mut session, target).await?;
        tracing::debug!(user = %target.username, %addr, "Authenticated");

        Ok(Box::new(RusshShell { session }))
    }
}

/// An authenticated russh session
pub struct RusshShell {
    session: Handle<ClientHandler>,
}

#[async_trait]
impl RemoteShell for RusshShell {
    async fn exec(&mut self, command: &str) -> Result<CommandOutput, TransportError> {
        let mut channel = self
            .session
            .channel_open_session()
            .await
            .map_err(|e| TransportError::new(format!("failed to open session channel: {}", e)))?;
        channel
            .exec(true, command)
            .await
            .map_err(|e| TransportError::new(format!("failed to start command: {}", e)))?;

        let mut stdout = BytesMut::new();
        let mut stderr = BytesMut::new();
        let mut exit_code = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext: 1 } => stderr.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status } => {
                    exit_code = Some(i32::try_from(exit_status).unwrap_or(i32::MAX))
                }
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    tracing::debug!(?signal_name, "Remote command killed by signal");
                }
                _ => {}
            }
        }

        if self.session.is_closed() {
            return Err(TransportError::new("session closed by remote host"));
        }

        Ok(CommandOutput::new(
            stdout.freeze(),
            stderr.freeze(),
            exit_code.unwrap_or(NO_EXIT_STATUS),
        ))
    }

    async fn close(&mut self) {
        if let Err(e) = self
            .session
            .disconnect(Disconnect::ByApplication, "closing", "en")
            .await
        {
            tracing::debug!("Disconnect failed: {}", e);
        }
    }
}

/// Host key policy: known keys must match, unknown keys are accepted
struct ClientHandler {
    host: String,
    port: u16,
    known_hosts: Option<PathBuf>,
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = anyhow::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint();
        let checked = match &self.known_hosts {
            Some(path) => russh_keys::check_known_hosts_path(&self.host, self.port, server_public_key, path),
            None => russh_keys::check_known_hosts(&self.host, self.port, server_public_key),
        };

        match checked {
            Ok(true) => {
                tracing::debug!(host = %self.host, %fingerprint, "Host key verified");
                Ok(true)
            }
            Ok(false) => {
                tracing::warn!(host = %self.host, %fingerprint, "Host key not in known_hosts, accepting");
                Ok(true)
            }
            Err(russh_keys::Error::KeyChanged { line }) => Err(anyhow::anyhow!(
                "host key for {} changed (known_hosts line {}), refusing to connect",
                self.host,
                line
            )),
            Err(e) => {
                tracing::warn!(host = %self.host, %fingerprint, "Could not read known_hosts ({}), accepting", e);
                Ok(true)
            }
        }
    }
}
