//! Connection descriptors
//!
//! A descriptor has the form `alias://[username[:password]@]hostname[:port]`.
//! The URI scheme is reinterpreted as the channel alias.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt;
use std::str::FromStr;
use url::{Host, Url};

use crate::error::DsnError;

/// Port used when a descriptor does not name one
pub const DEFAULT_PORT: u16 = 22;

/// Characters escaped in the userinfo part when a descriptor is rendered
const USERINFO: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Parsed connection descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    pub alias: String,
    pub username: String,
    pub password: Option<String>,
    pub hostname: String,
    pub port: u16,
}

impl Dsn {
    /// Parse a descriptor, defaulting the username to the current OS user
    pub fn parse(input: &str) -> Result<Self, DsnError> {
        Self::parse_with_user(input, whoami::username)
    }

    fn parse_with_user(input: &str, default_user: impl FnOnce() -> String) -> Result<Self, DsnError> {
        let trimmed = input.trim();
        let url = Url::parse(trimmed).map_err(|e| {
            // `://host` is rejected by the URL parser before we can see the scheme
            if trimmed.starts_with("://") {
                DsnError::EmptyAlias(input.to_string())
            } else {
                DsnError::Malformed {
                    input: input.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let alias = url.scheme().to_string();
        if alias.is_empty() {
            return Err(DsnError::EmptyAlias(input.to_string()));
        }

        let hostname = match url.host() {
            Some(Host::Domain(d)) if !d.is_empty() => d.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => return Err(DsnError::MissingHost(input.to_string())),
        };

        let username = match decode(url.username(), input)? {
            user if user.is_empty() => default_user(),
            user => user,
        };
        let password = match url.password() {
            Some(raw) => Some(decode(raw, input)?),
            None if has_empty_password(trimmed) => Some(String::new()),
            None => None,
        };

        Ok(Self {
            alias,
            username,
            password,
            hostname,
            port: url.port().unwrap_or(DEFAULT_PORT),
        })
    }

    /// `host:port` pair suitable for address resolution
    pub fn address(&self) -> (String, u16) {
        (self.hostname.clone(), self.port)
    }

    /// Render the descriptor with the password masked, for logs
    pub fn redacted(&self) -> Redacted<'_> {
        Redacted(self)
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, mask: bool) -> fmt::Result {
        write!(
            f,
            "{}://{}",
            self.alias,
            utf8_percent_encode(&self.username, USERINFO)
        )?;
        if let Some(password) = &self.password {
            if mask {
                write!(f, ":***")?;
            } else {
                write!(f, ":{}", utf8_percent_encode(password, USERINFO))?;
            }
        }
        if self.hostname.contains(':') {
            write!(f, "@[{}]:{}", self.hostname, self.port)
        } else {
            write!(f, "@{}:{}", self.hostname, self.port)
        }
    }
}

/// Whether the userinfo is `user:` with nothing after the colon.
///
/// The URL parser drops an empty password, so the raw authority is checked.
fn has_empty_password(input: &str) -> bool {
    let Some((_, rest)) = input.split_once("://") else {
        return false;
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    authority
        .rsplit_once('@')
        .is_some_and(|(userinfo, _)| userinfo.contains(':'))
}

fn decode(raw: &str, input: &str) -> Result<String, DsnError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| DsnError::Malformed {
            input: input.to_string(),
            reason: e.to_string(),
        })
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, false)
    }
}

impl FromStr for Dsn {
    type Err = DsnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Display adapter returned by [`Dsn::redacted`]
pub struct Redacted<'a>(&'a Dsn);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.write(f, true)
    }
}
