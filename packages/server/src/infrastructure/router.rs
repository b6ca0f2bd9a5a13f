//! Room Router.
//!
//! Maps a conversation to its live member connections and performs fan-out.
//!
//! ## Locking
//!
//! Every conversation has its own `Mutex<Room>`; membership changes, typing
//! updates and broadcast iteration for a conversation all happen under it, so
//! a broadcast never observes a half-updated member set. The outer map is only
//! locked briefly to find or create a room, never while a room lock is being
//! acquired. Rooms hold `Weak` references: the registry owns connections.
//!
//! An emptied room is marked `discarded` under its own lock before it is
//! removed from the map, and lookups skip discarded rooms, so a late joiner
//! can never land in a room that is about to disappear.

use std::{
    collections::HashMap,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::{ConnectionId, ConversationId, RelayEvent, TypingKey, TypingTracker, UserId};

use super::{connection::Connection, dto::websocket::encode_event, registry::ConnectionRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("connection '{0}' is not registered")]
    UnknownConnection(ConnectionId),
}

/// Outcome of one fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Members that failed and were removed from the room
    pub dropped: Vec<ConnectionId>,
}

/// Outcome of a leave
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Departure {
    pub was_member: bool,
    /// An implicit `stop_typing` was broadcast for the leaving user
    pub stopped_typing: bool,
}

#[derive(Debug, Default)]
struct Room {
    members: HashMap<ConnectionId, Weak<Connection>>,
    typing: TypingTracker,
}

#[derive(Debug)]
struct RoomSlot {
    conversation_id: ConversationId,
    room: Arc<Mutex<Room>>,
    discarded: AtomicBool,
}

impl RoomSlot {
    fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            room: Arc::new(Mutex::new(Room::default())),
            discarded: AtomicBool::new(false),
        }
    }

    fn is_discarded(&self) -> bool {
        self.discarded.load(Ordering::Acquire)
    }
}

pub struct RoomRouter {
    registry: Arc<ConnectionRegistry>,
    rooms: RwLock<HashMap<ConversationId, Arc<RoomSlot>>>,
}

impl RoomRouter {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection to a conversation.
    ///
    /// Returns `false` when it was already a member (no-op).
    pub async fn join(
        &self,
        conversation_id: &ConversationId,
        connection_id: ConnectionId,
    ) -> Result<bool, RouterError> {
        let connection = self
            .registry
            .lookup(&connection_id)
            .await
            .ok_or(RouterError::UnknownConnection(connection_id))?;

        loop {
            let slot = self.slot_or_create(conversation_id).await;
            let mut room = Arc::clone(&slot.room).lock_owned().await;
            if slot.is_discarded() {
                // emptied and dropped while we waited; take a fresh slot
                continue;
            }

            let added = !room.members.contains_key(&connection_id);
            if added {
                room.members
                    .insert(connection_id, Arc::downgrade(&connection));
            }
            connection.track_join(conversation_id.clone()).await;

            tracing::debug!(
                conversation_id = %conversation_id,
                connection_id = %connection_id,
                room_size = room.members.len(),
                added,
                "Connection joined conversation"
            );
            return Ok(added);
        }
    }

    /// Remove a connection from a conversation.
    ///
    /// Clears the leaving user's typing entry and tells the remaining members
    /// with an implicit `stop_typing`. Idempotent.
    pub async fn leave(
        &self,
        conversation_id: &ConversationId,
        connection_id: &ConnectionId,
    ) -> Departure {
        let registered = self.registry.lookup(connection_id).await;
        if let Some(connection) = &registered {
            connection.track_leave(conversation_id).await;
        }

        let Some(mut room) = self.lock(conversation_id).await else {
            return Departure::default();
        };

        let member = room.room.members.remove(connection_id);
        let was_member = member.is_some();
        let leaving = registered.or_else(|| member.and_then(|weak| weak.upgrade()));
        let user_id = leaving
            .as_ref()
            .and_then(|connection| connection.identity())
            .map(|identity| identity.user_id.clone());

        let mut stopped_typing = false;
        if let Some(user_id) = user_id
            && room.set_typing(&user_id, false)
        {
            let event = RelayEvent::StopTyping {
                conversation_id: conversation_id.clone(),
                sender_id: user_id,
            };
            room.broadcast(connection_id, &event);
            stopped_typing = true;
        }

        if was_member {
            tracing::debug!(
                conversation_id = %conversation_id,
                connection_id = %connection_id,
                room_size = room.member_count(),
                "Connection left conversation"
            );
        }
        room.finish().await;

        Departure {
            was_member,
            stopped_typing,
        }
    }

    /// Remove a connection from every conversation it joined and clear all of
    /// its typing entries. Returns the number of conversations left.
    pub async fn evict(&self, connection: &Connection) -> usize {
        let conversations = connection.joined_conversations().await;
        for conversation_id in &conversations {
            self.leave(conversation_id, &connection.id()).await;
        }
        conversations.len()
    }

    /// Deliver `event` to every member except `sender`. Best-effort per member.
    pub async fn broadcast(
        &self,
        conversation_id: &ConversationId,
        sender: &ConnectionId,
        event: &RelayEvent,
    ) -> BroadcastReport {
        match self.lock(conversation_id).await {
            Some(mut room) => {
                let report = room.broadcast(sender, event);
                room.finish().await;
                report
            }
            None => {
                tracing::debug!(
                    conversation_id = %conversation_id,
                    "No active room for conversation - no subscribers"
                );
                BroadcastReport::default()
            }
        }
    }

    /// Lock an existing conversation for a compound operation
    pub async fn lock(&self, conversation_id: &ConversationId) -> Option<RoomGuard<'_>> {
        let slot = self.rooms.read().await.get(conversation_id).cloned()?;
        let room = Arc::clone(&slot.room).lock_owned().await;
        if slot.is_discarded() {
            return None;
        }
        Some(RoomGuard {
            router: self,
            slot,
            room,
        })
    }

    pub async fn member_count(&self, conversation_id: &ConversationId) -> usize {
        match self.lock(conversation_id).await {
            Some(room) => room.member_count(),
            None => 0,
        }
    }

    pub async fn active_conversations(&self) -> usize {
        self.rooms
            .read()
            .await
            .values()
            .filter(|slot| !slot.is_discarded())
            .count()
    }

    async fn slot_or_create(&self, conversation_id: &ConversationId) -> Arc<RoomSlot> {
        if let Some(slot) = self.rooms.read().await.get(conversation_id)
            && !slot.is_discarded()
        {
            return Arc::clone(slot);
        }

        let mut rooms = self.rooms.write().await;
        match rooms.get(conversation_id) {
            Some(slot) if !slot.is_discarded() => Arc::clone(slot),
            _ => {
                let slot = Arc::new(RoomSlot::new(conversation_id.clone()));
                rooms.insert(conversation_id.clone(), Arc::clone(&slot));
                tracing::debug!(conversation_id = %conversation_id, "Created conversation room");
                slot
            }
        }
    }

    async fn discard(&self, slot: &Arc<RoomSlot>) {
        let mut rooms = self.rooms.write().await;
        if let Some(current) = rooms.get(&slot.conversation_id)
            && Arc::ptr_eq(current, slot)
        {
            rooms.remove(&slot.conversation_id);
            tracing::debug!(
                conversation_id = %slot.conversation_id,
                "Removed empty conversation room"
            );
        }
    }
}

/// Exclusive access to one conversation's members and typing state.
///
/// Call [`RoomGuard::finish`] when done so an emptied room is discarded.
pub struct RoomGuard<'a> {
    router: &'a RoomRouter,
    slot: Arc<RoomSlot>,
    room: OwnedMutexGuard<Room>,
}

impl RoomGuard<'_> {
    pub fn conversation_id(&self) -> &ConversationId {
        &self.slot.conversation_id
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.room.members.contains_key(connection_id)
    }

    pub fn member_count(&self) -> usize {
        self.room.members.len()
    }

    /// See [`TypingTracker::set_typing`]
    pub fn set_typing(&mut self, user_id: &UserId, typing: bool) -> bool {
        let key = TypingKey::new(self.slot.conversation_id.clone(), user_id.clone());
        self.room.typing.set_typing(key, typing)
    }

    pub fn typing_users(&self) -> Vec<UserId> {
        self.room.typing.typing_users(&self.slot.conversation_id)
    }

    /// Fan `event` out to every member except `sender`.
    ///
    /// Push failures are isolated: the failed member is logged, dropped from
    /// the room and kicked, and the remaining members still receive it.
    pub fn broadcast(&mut self, sender: &ConnectionId, event: &RelayEvent) -> BroadcastReport {
        let payload = match encode_event(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize relay event");
                return BroadcastReport::default();
            }
        };

        let mut report = BroadcastReport::default();
        for (connection_id, member) in &self.room.members {
            if connection_id == sender {
                continue;
            }
            let Some(connection) = member.upgrade() else {
                tracing::warn!(
                    connection_id = %connection_id,
                    "Member connection already gone, dropping from room"
                );
                report.dropped.push(*connection_id);
                continue;
            };
            match connection.push(payload.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        conversation_id = %self.slot.conversation_id,
                        connection_id = %connection_id,
                        error = %e,
                        "Failed to deliver event, dropping member from room"
                    );
                    connection.kick();
                    report.dropped.push(*connection_id);
                }
            }
        }

        for connection_id in &report.dropped {
            self.room.members.remove(connection_id);
        }

        tracing::debug!(
            conversation_id = %self.slot.conversation_id,
            recipients = report.delivered,
            failed = report.dropped.len(),
            "Broadcast event to conversation"
        );
        report
    }

    pub async fn finish(self) {
        if !self.room.members.is_empty() {
            return;
        }
        self.slot.discarded.store(true, Ordering::Release);
        let RoomGuard { router, slot, room } = self;
        drop(room);
        router.discard(&slot).await;
    }
}
