//! Connection registry for session and group membership tracking.
//!
//! The registry maintains bidirectional mappings: group → sessions (for
//! broadcast), session → groups (for cleanup on disconnect), and principal →
//! sessions (for direct sends). This gives O(1) lookups in every direction.
//!
//! A principal may hold several concurrent sessions (several devices). A
//! direct send fans out to all of them; presence side-effects fire only when
//! the *last* session leaves, which [`leave`](ConnectionRegistry::leave)
//! reports on its result.
//!
//! The registry is a process-wide instance constructed once at bootstrap and
//! handed to consumers by cloned handle - there is no ambient global.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, RwLock},
};

use ridehail_proto::{Group, PrincipalId, Role, SessionId};
use tokio::sync::mpsc;

/// Outbound channel for one session's serialized messages.
///
/// Unbounded so a send never blocks the coordinator; the writer task on the
/// other end drains into the socket at its own pace.
pub type OutboundSender = mpsc::UnboundedSender<String>;

/// Receiving half handed to the session's writer task.
pub type OutboundReceiver = mpsc::UnboundedReceiver<String>;

/// Metadata for one registered session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    /// The authenticated principal behind this session.
    pub principal_id: PrincipalId,
    /// The principal's role at admission time.
    pub role: Role,
}

/// Result of removing a session.
#[derive(Debug, Clone)]
pub struct LeftSession {
    /// Who the session belonged to.
    pub info: SessionInfo,
    /// Groups the session was in.
    pub groups: HashSet<Group>,
    /// Whether this was the principal's last live session.
    pub last_session: bool,
}

struct RegistryInner {
    /// Session id → session info.
    sessions: HashMap<SessionId, SessionInfo>,
    /// Session id → outbound channel.
    senders: HashMap<SessionId, OutboundSender>,
    /// Group → member sessions.
    group_members: HashMap<Group, HashSet<SessionId>>,
    /// Session id → joined groups.
    session_groups: HashMap<SessionId, HashSet<Group>>,
    /// Principal id → live sessions (multi-device).
    principal_sessions: HashMap<PrincipalId, HashSet<SessionId>>,
}

/// Registry of live sessions, their groups, and their outbound channels.
///
/// Clone-able handle over shared state. All lock scopes are short and never
/// held across an await point; sends are non-blocking channel pushes.
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner {
                sessions: HashMap::new(),
                senders: HashMap::new(),
                group_members: HashMap::new(),
                session_groups: HashMap::new(),
                principal_sessions: HashMap::new(),
            })),
        }
    }

    /// Register a session for an authenticated principal.
    ///
    /// Returns `false` if the session id is already taken.
    #[allow(clippy::expect_used)]
    pub fn join(&self, session_id: SessionId, info: SessionInfo, sender: OutboundSender) -> bool {
        let mut inner = self.inner.write().expect("registry lock poisoned");

        if inner.sessions.contains_key(&session_id) {
            return false;
        }

        inner.sessions.insert(session_id, info);
        inner.senders.insert(session_id, sender);
        inner.session_groups.insert(session_id, HashSet::new());
        inner.principal_sessions.entry(info.principal_id).or_default().insert(session_id);
        true
    }

    /// Remove a session and all its group memberships.
    ///
    /// Idempotent: removing an unknown (or already removed) session returns
    /// `None` and changes nothing, so duplicate disconnect signals are safe.
    #[allow(clippy::expect_used)]
    pub fn leave(&self, session_id: SessionId) -> Option<LeftSession> {
        let mut inner = self.inner.write().expect("registry lock poisoned");

        let info = inner.sessions.remove(&session_id)?;
        inner.senders.remove(&session_id);
        let groups = inner.session_groups.remove(&session_id).unwrap_or_default();

        for group in &groups {
            if let Some(members) = inner.group_members.get_mut(group) {
                members.remove(&session_id);
                if members.is_empty() {
                    inner.group_members.remove(group);
                }
            }
        }

        let last_session = match inner.principal_sessions.get_mut(&info.principal_id) {
            Some(sessions) => {
                sessions.remove(&session_id);
                if sessions.is_empty() {
                    inner.principal_sessions.remove(&info.principal_id);
                    true
                } else {
                    false
                }
            }
            None => true,
        };

        Some(LeftSession { info, groups, last_session })
    }

    /// Add a session to a group. Returns `false` if the session is unknown.
    #[allow(clippy::expect_used)]
    pub fn join_group(&self, session_id: SessionId, group: Group) -> bool {
        let mut inner = self.inner.write().expect("registry lock poisoned");

        if !inner.sessions.contains_key(&session_id) {
            return false;
        }

        inner.group_members.entry(group).or_default().insert(session_id);
        inner.session_groups.entry(session_id).or_default().insert(group);
        true
    }

    /// Remove a session from a group.
    ///
    /// Returns `true` if the session was a member and is no longer.
    #[allow(clippy::expect_used)]
    pub fn leave_group(&self, session_id: SessionId, group: Group) -> bool {
        let mut inner = self.inner.write().expect("registry lock poisoned");

        let removed =
            inner.group_members.get_mut(&group).is_some_and(|members| members.remove(&session_id));
        if let Some(groups) = inner.session_groups.get_mut(&session_id) {
            groups.remove(&group);
        }

        if inner.group_members.get(&group).is_some_and(HashSet::is_empty) {
            inner.group_members.remove(&group);
        }

        removed
    }

    /// Groups a session currently belongs to.
    #[allow(clippy::expect_used)]
    pub fn groups(&self, session_id: SessionId) -> HashSet<Group> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.session_groups.get(&session_id).cloned().unwrap_or_default()
    }

    /// Live sessions of one principal.
    #[allow(clippy::expect_used)]
    pub fn sessions_for_principal(&self, principal_id: PrincipalId) -> Vec<SessionId> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner
            .principal_sessions
            .get(&principal_id)
            .map(|sessions| sessions.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Send `text` to every member of `group`.
    ///
    /// Sessions whose channel has closed are skipped silently; delivery is
    /// best-effort and never blocks. Returns the number of channel pushes
    /// that succeeded.
    #[allow(clippy::expect_used)]
    pub fn group_send(&self, group: Group, text: &str) -> usize {
        let inner = self.inner.read().expect("registry lock poisoned");

        let Some(members) = inner.group_members.get(&group) else {
            return 0;
        };

        members
            .iter()
            .filter_map(|session_id| inner.senders.get(session_id))
            .filter(|sender| sender.send(text.to_string()).is_ok())
            .count()
    }

    /// Send `text` to every live session of `principal_id`.
    ///
    /// A principal with no live session is silently dropped - ride state is
    /// the durable source of truth, not the event stream.
    #[allow(clippy::expect_used)]
    pub fn direct_send(&self, principal_id: PrincipalId, text: &str) -> usize {
        let inner = self.inner.read().expect("registry lock poisoned");

        let Some(sessions) = inner.principal_sessions.get(&principal_id) else {
            return 0;
        };

        sessions
            .iter()
            .filter_map(|session_id| inner.senders.get(session_id))
            .filter(|sender| sender.send(text.to_string()).is_ok())
            .count()
    }

    /// Whether a session is registered.
    #[allow(clippy::expect_used)]
    pub fn has_session(&self, session_id: SessionId) -> bool {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.sessions.contains_key(&session_id)
    }

    /// Total number of registered sessions.
    #[allow(clippy::expect_used)]
    pub fn session_count(&self) -> usize {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.sessions.len()
    }

    /// Number of sessions in a group.
    #[allow(clippy::expect_used)]
    pub fn group_size(&self, group: Group) -> usize {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.group_members.get(&group).map_or(0, HashSet::len)
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry").field("session_count", &self.session_count()).finish()
    }
}
