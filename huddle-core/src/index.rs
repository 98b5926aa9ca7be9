//! Global state index.
//!
//! Group channels never own the users they list. Each user record is shared
//! by every channel the user is in and lives in the global index for as long
//! as at least one channel holds a reference to it. Channels acquire a
//! reference when they construct a member and release it when the member
//! leaves; the index forgets a user once the count drops to zero.
//!
//! [`StateIndex`] is the seam. [`ClientState`] is the in-memory index a
//! client session keeps.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use huddle_types::{ChannelId, ChannelKind, UserId, UserModel};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Profile record for a user, shared across channels.
#[derive(Debug)]
pub struct GlobalUser {
    id: UserId,
    username: String,
    discriminator: Option<String>,
    avatar: Option<String>,
    bot: bool,
    /// References held by channel members. Only mutated by the index.
    refs: AtomicU32,
}

impl GlobalUser {
    /// Build a record from a payload with no references held yet.
    pub fn from_model(model: &UserModel) -> Self {
        Self {
            id: model.id,
            username: model.username.clone(),
            discriminator: model.discriminator.clone(),
            avatar: model.avatar.clone(),
            bot: model.bot,
            refs: AtomicU32::new(0),
        }
    }

    /// User identity.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Account name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Legacy tag, if any.
    pub fn discriminator(&self) -> Option<&str> {
        self.discriminator.as_deref()
    }

    /// Avatar hash, if any.
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    /// Automated account.
    pub fn is_bot(&self) -> bool {
        self.bot
    }

    /// Number of channel members currently referencing this user.
    pub fn ref_count(&self) -> u32 {
        self.refs.load(Ordering::Acquire)
    }

    fn add_ref(&self) -> u32 {
        self.refs.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn remove_ref(&self) -> u32 {
        // Callers hold the index entry lock, so load/store cannot interleave.
        let next = self.refs.load(Ordering::Acquire).saturating_sub(1);
        self.refs.store(next, Ordering::Release);
        next
    }
}

impl fmt::Display for GlobalUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.discriminator {
            Some(tag) => write!(f, "{}#{}", self.username, tag),
            None => write!(f, "{}", self.username),
        }
    }
}

/// Lookups and shared-reference bookkeeping a channel needs from its session.
pub trait StateIndex: Send + Sync {
    /// Kind of a channel the session knows about.
    fn resolve_channel(&self, id: ChannelId) -> Option<ChannelKind>;

    /// Get or create the shared record for `model.id` and take one reference.
    fn acquire_user(&self, model: &UserModel) -> Arc<GlobalUser>;

    /// Drop one reference taken by [`StateIndex::acquire_user`].
    fn release_user(&self, id: UserId);

    /// The logged-in user, once known.
    fn current_user_id(&self) -> Option<UserId>;
}

/// In-memory global index for one client session.
#[derive(Debug, Default)]
pub struct ClientState {
    users: DashMap<UserId, Arc<GlobalUser>>,
    channels: DashMap<ChannelId, ChannelKind>,
    current_user: Option<UserId>,
}

impl ClientState {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index for the given logged-in user.
    pub fn with_current_user(id: UserId) -> Self {
        Self {
            current_user: Some(id),
            ..Self::default()
        }
    }

    /// Record a channel so voice states can resolve it.
    pub fn insert_channel(&self, id: ChannelId, kind: ChannelKind) {
        self.channels.insert(id, kind);
    }

    /// Forget a channel.
    pub fn remove_channel(&self, id: ChannelId) -> Option<ChannelKind> {
        self.channels.remove(&id).map(|(_, kind)| kind)
    }

    /// Shared record for a user still referenced by some channel.
    pub fn user(&self, id: UserId) -> Option<Arc<GlobalUser>> {
        self.users.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of users with at least one reference.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

impl StateIndex for ClientState {
    fn resolve_channel(&self, id: ChannelId) -> Option<ChannelKind> {
        self.channels.get(&id).map(|entry| *entry.value())
    }

    fn acquire_user(&self, model: &UserModel) -> Arc<GlobalUser> {
        let entry = self
            .users
            .entry(model.id)
            .or_insert_with(|| Arc::new(GlobalUser::from_model(model)));
        let refs = entry.add_ref();
        tracing::trace!(user_id = %model.id, refs, "acquired user reference");
        Arc::clone(entry.value())
    }

    fn release_user(&self, id: UserId) {
        match self.users.entry(id) {
            Entry::Occupied(entry) => {
                let refs = entry.get().remove_ref();
                tracing::trace!(user_id = %id, refs, "released user reference");
                if refs == 0 {
                    entry.remove();
                }
            }
            Entry::Vacant(_) => {
                tracing::warn!(user_id = %id, "release of untracked user reference");
            }
        }
    }

    fn current_user_id(&self) -> Option<UserId> {
        self.current_user
    }
}
