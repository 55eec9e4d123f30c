use serde::Serialize;
use vax_types::{Role, Username};

use crate::error::{SchedulerError, SchedulerResult};

/// An authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "username", rename_all = "lowercase")]
pub enum Identity {
    Provider(Username),
    Recipient(Username),
}

impl Identity {
    pub fn new(role: Role, username: Username) -> Self {
        match role {
            Role::Provider => Self::Provider(username),
            Role::Recipient => Self::Recipient(username),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Provider(_) => Role::Provider,
            Self::Recipient(_) => Role::Recipient,
        }
    }

    pub fn username(&self) -> &Username {
        match self {
            Self::Provider(u) | Self::Recipient(u) => u,
        }
    }
}

/// The caller-owned login context passed to every scheduler operation.
///
/// Holds at most one identity. The scheduler never stores sessions, so a
/// service can keep one `Session` per connection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// The logged-in identity, if any.
    pub fn current(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.identity.is_some()
    }

    pub(crate) fn ensure_inactive(&self) -> SchedulerResult<()> {
        if self.is_active() {
            return Err(SchedulerError::AlreadyLoggedIn);
        }
        Ok(())
    }

    pub(crate) fn begin(&mut self, identity: Identity) -> SchedulerResult<()> {
        self.ensure_inactive()?;
        self.identity = Some(identity);
        Ok(())
    }

    pub(crate) fn end(&mut self) -> SchedulerResult<Identity> {
        self.identity.take().ok_or(SchedulerError::NoActiveSession)
    }

    pub(crate) fn require_any(&self) -> SchedulerResult<&Identity> {
        self.identity.as_ref().ok_or(SchedulerError::NotLoggedIn)
    }

    pub(crate) fn require(&self, required: Role) -> SchedulerResult<&Username> {
        let identity = self.require_any()?;
        if identity.role() != required {
            return Err(SchedulerError::WrongRole { required });
        }
        Ok(identity.username())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> Identity {
        Identity::Provider(Username::new("p1").unwrap())
    }

    #[test]
    fn starts_empty() {
        let s = Session::new();
        assert!(s.current().is_none());
        assert!(matches!(s.require_any(), Err(SchedulerError::NotLoggedIn)));
    }

    #[test]
    fn second_login_rejected() {
        let mut s = Session::new();
        s.begin(provider()).unwrap();
        let again = s.begin(Identity::Recipient(Username::new("r1").unwrap()));
        assert!(matches!(again, Err(SchedulerError::AlreadyLoggedIn)));
        assert_eq!(s.current(), Some(&provider()));
    }

    #[test]
    fn role_gate() {
        let mut s = Session::new();
        s.begin(provider()).unwrap();
        assert_eq!(s.require(Role::Provider).unwrap().as_str(), "p1");
        assert!(matches!(
            s.require(Role::Recipient),
            Err(SchedulerError::WrongRole { required: Role::Recipient })
        ));
    }

    #[test]
    fn end_twice_fails() {
        let mut s = Session::new();
        s.begin(provider()).unwrap();
        assert_eq!(s.end().unwrap(), provider());
        assert!(matches!(s.end(), Err(SchedulerError::NoActiveSession)));
    }
}
