//! Member table for a group channel.
//!
//! The live table sits behind an [`ArcSwap`]. Point operations (`get`,
//! `add_or_get`, `remove`) work on whichever table is current; they are
//! individually atomic because the table is a [`DashMap`]. A snapshot
//! replace builds a whole new table off to the side and publishes it with a
//! single pointer swap, so a reader holding a [`MemberSnapshot`] sees either
//! the complete old set or the complete new set.
//!
//! Every [`GroupMember`] owns exactly one reference on its shared
//! [`GlobalUser`]: taken when the member is constructed, released when the
//! member leaves the table (point removal, snapshot replace, or teardown).

use arc_swap::ArcSwap;
use dashmap::DashMap;
use huddle_types::{ChannelId, UserId, UserModel};
use std::sync::Arc;

use crate::index::{GlobalUser, StateIndex};

/// Initial table capacity before the first snapshot arrives.
const INITIAL_CAPACITY: usize = 5;

type Table = DashMap<UserId, Arc<GroupMember>>;

/// A user's membership in one group channel.
#[derive(Debug)]
pub struct GroupMember {
    channel_id: ChannelId,
    user: Arc<GlobalUser>,
}

impl GroupMember {
    fn new(channel_id: ChannelId, user: Arc<GlobalUser>) -> Self {
        Self { channel_id, user }
    }

    /// Member identity (the user id).
    pub fn id(&self) -> UserId {
        self.user.id()
    }

    /// Channel this membership belongs to.
    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Shared profile record.
    pub fn user(&self) -> &Arc<GlobalUser> {
        &self.user
    }

    /// Account name.
    pub fn username(&self) -> &str {
        self.user.username()
    }
}

/// A consistent view of the member table at one instant.
#[derive(Debug, Clone)]
pub struct MemberSnapshot(Arc<Table>);

impl MemberSnapshot {
    /// Look up a member.
    pub fn get(&self, id: UserId) -> Option<Arc<GroupMember>> {
        self.0.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Whether the member is in this snapshot.
    pub fn contains(&self, id: UserId) -> bool {
        self.0.contains_key(&id)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no members.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Member ids, ascending.
    pub fn ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.0.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Members, ordered by id.
    pub fn members(&self) -> Vec<Arc<GroupMember>> {
        let mut members: Vec<Arc<GroupMember>> = self
            .0
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        members.sort_unstable_by_key(|member| member.id());
        members
    }
}

/// Concurrent member table with copy-then-publish snapshot replace.
pub struct MemberTable {
    channel_id: ChannelId,
    table: ArcSwap<Table>,
    index: Arc<dyn StateIndex>,
}

impl std::fmt::Debug for MemberTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberTable")
            .field("channel_id", &self.channel_id)
            .field("members", &self.len())
            .finish_non_exhaustive()
    }
}

impl MemberTable {
    /// Create an empty table for `channel_id`.
    pub fn new(channel_id: ChannelId, index: Arc<dyn StateIndex>) -> Self {
        Self {
            channel_id,
            table: ArcSwap::from_pointee(DashMap::with_capacity(INITIAL_CAPACITY)),
            index,
        }
    }

    /// Look up a member. Never blocks on writers of other shards.
    pub fn get(&self, id: UserId) -> Option<Arc<GroupMember>> {
        self.table
            .load()
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Return the existing member for `model.id`, or construct and insert one.
    ///
    /// A shared-user reference is only acquired when a new member is built.
    pub fn add_or_get(&self, model: &UserModel) -> Arc<GroupMember> {
        let table = self.table.load();
        let entry = table.entry(model.id).or_insert_with(|| {
            tracing::trace!(channel_id = %self.channel_id, user_id = %model.id, "adding member");
            Arc::new(GroupMember::new(
                self.channel_id,
                self.index.acquire_user(model),
            ))
        });
        Arc::clone(entry.value())
    }

    /// Remove a member, releasing its shared-user reference.
    pub fn remove(&self, id: UserId) -> Option<Arc<GroupMember>> {
        let removed = self.table.load().remove(&id).map(|(_, member)| member);
        if let Some(member) = &removed {
            self.index.release_user(member.id());
        }
        removed
    }

    /// Replace the whole table with a fresh one built from `models`.
    ///
    /// New members acquire their references before the swap; members of the
    /// retired table release theirs after it, so a user present on both
    /// sides never drops to zero references in between.
    pub fn bulk_replace(&self, models: &[UserModel]) {
        // ~5% headroom over the incoming count.
        let capacity = models.len() + models.len().div_ceil(20);
        let next: Table = DashMap::with_capacity(capacity);
        // Walked in reverse so duplicate ids collapse to the last occurrence
        // and acquire once.
        for model in models.iter().rev() {
            next.entry(model.id).or_insert_with(|| {
                Arc::new(GroupMember::new(
                    self.channel_id,
                    self.index.acquire_user(model),
                ))
            });
        }
        let count = next.len();

        let retired = self.table.swap(Arc::new(next));
        self.release_all(&retired);

        tracing::debug!(
            channel_id = %self.channel_id,
            members = count,
            retired = retired.len(),
            "replaced member table"
        );
    }

    /// Empty the table, releasing every member's reference.
    pub fn clear(&self) {
        let retired = self
            .table
            .swap(Arc::new(DashMap::with_capacity(INITIAL_CAPACITY)));
        self.release_all(&retired);
    }

    /// Consistent view of the current table.
    pub fn snapshot(&self) -> MemberSnapshot {
        MemberSnapshot(self.table.load_full())
    }

    /// Members, ordered by id.
    pub fn members(&self) -> Vec<Arc<GroupMember>> {
        self.snapshot().members()
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: UserId) -> bool {
        self.table.load().contains_key(&id)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.table.load().len()
    }

    /// True if there are no members.
    pub fn is_empty(&self) -> bool {
        self.table.load().is_empty()
    }

    fn release_all(&self, retired: &Table) {
        for entry in retired.iter() {
            self.index.release_user(*entry.key());
        }
    }
}
