//! Local mirrors of backend state
//!
//! [`LocalCollection`] keeps a list fetched from the backend and applies the
//! results of later calls to it. [`AttendingSet`] tracks which events the
//! signed-in user takes part in.

use crate::endpoints::{Participant, ParticipantsApi};
use crate::error::ApiResult;
use std::collections::BTreeSet;
use tracing::debug;

/// Records identified by a backend id
pub trait Keyed {
    /// The backend id, if the record has one
    fn key(&self) -> Option<i64>;
}

/// In-memory copy of a backend list, newest first
#[derive(Debug, Clone)]
pub struct LocalCollection<T> {
    items: Vec<T>,
}

impl<T> Default for LocalCollection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed> LocalCollection<T> {
    /// Empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection holding `items` in order
    pub fn from_items(items: Vec<T>) -> Self {
        Self { items }
    }

    fn position(&self, key: i64) -> Option<usize> {
        self.items.iter().position(|item| item.key() == Some(key))
    }

    /// Insert a new item at the front
    ///
    /// An item whose id is already present replaces it in place. Returns
    /// whether the item was new.
    pub fn prepend(&mut self, item: T) -> bool {
        match item.key().and_then(|key| self.position(key)) {
            Some(index) => {
                self.items[index] = item;
                false
            }
            None => {
                self.items.insert(0, item);
                true
            }
        }
    }

    /// Prepend the outcome of a create call, leaving the collection untouched on error
    pub fn prepend_result(&mut self, result: ApiResult<T>) -> ApiResult<()> {
        let item = result?;
        self.prepend(item);
        Ok(())
    }

    /// Replace the item with the same id, or append it
    pub fn upsert(&mut self, item: T) {
        match item.key().and_then(|key| self.position(key)) {
            Some(index) => self.items[index] = item,
            None => self.items.push(item),
        }
    }

    /// Remove the item with this id
    pub fn remove(&mut self, key: i64) -> Option<T> {
        self.position(key).map(|index| self.items.remove(index))
    }

    /// Replace the whole contents with a fresh listing
    pub fn replace_all(&mut self, items: Vec<T>) {
        debug!(previous = self.items.len(), current = items.len(), "Replacing local collection");
        self.items = items;
    }

    /// Item with this id
    pub fn get(&self, key: i64) -> Option<&T> {
        self.position(key).map(|index| &self.items[index])
    }

    /// Whether an item with this id is present
    pub fn contains(&self, key: i64) -> bool {
        self.position(key).is_some()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection holds nothing
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in display order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Items in display order
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Take the items out
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<'a, T> IntoIterator for &'a LocalCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Ids of the events the current user attends
#[derive(Clone)]
pub struct AttendingSet {
    participants: ParticipantsApi,
    user_id: i64,
    events: BTreeSet<i64>,
}

impl AttendingSet {
    /// Empty set for `user_id`; call [`refresh`](Self::refresh) to load it
    pub fn new(participants: ParticipantsApi, user_id: i64) -> Self {
        Self {
            participants,
            user_id,
            events: BTreeSet::new(),
        }
    }

    /// User whose attendance is tracked
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Join an event and record it
    ///
    /// The event id comes from the returned enrollment, or the requested id
    /// when the enrollment does not carry one.
    pub async fn join(&mut self, event_id: i64) -> ApiResult<Participant> {
        let participant = self.participants.join(self.user_id, event_id).await?;
        self.events.insert(participant.event_key().unwrap_or(event_id));
        Ok(participant)
    }

    /// Leave an event and forget it
    pub async fn leave(&mut self, event_id: i64) -> ApiResult<()> {
        self.participants.leave(self.user_id, event_id).await?;
        self.events.remove(&event_id);
        Ok(())
    }

    /// Rebuild the set from the user's events; returns the new size
    pub async fn refresh(&mut self) -> usize {
        let events = self.participants.user_events(self.user_id).await;
        self.events = events.iter().filter_map(Keyed::key).collect();
        self.events.len()
    }

    /// Whether the user attends this event
    pub fn contains(&self, event_id: i64) -> bool {
        self.events.contains(&event_id)
    }

    /// Number of attended events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the user attends nothing
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.events.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::scripted;
    use crate::endpoints::Comment;
    use crate::error::ApiError;
    use crate::testing::ScriptedTransport;
    use serde_json::json;

    fn comment(id: i64, content: &str) -> Comment {
        Comment {
            id: Some(id),
            content: content.to_string(),
            ..Comment::default()
        }
    }

    #[test]
    fn test_prepend_once() {
        let mut comments = LocalCollection::from_items(vec![comment(1, "premier")]);

        assert!(comments.prepend(comment(2, "second")));
        assert!(!comments.prepend(comment(2, "second, édité")));

        assert_eq!(comments.len(), 2);
        assert_eq!(comments.as_slice()[0].content, "second, édité");
        assert_eq!(comments.as_slice()[1].key(), Some(1));
    }

    #[test]
    fn test_prepend_result_error_leaves_collection() {
        let mut comments = LocalCollection::from_items(vec![comment(1, "premier")]);

        let result = comments.prepend_result(Err(ApiError::validation("too short")));
        assert!(result.is_err());
        assert_eq!(comments.len(), 1);

        comments.prepend_result(Ok(comment(3, "troisième"))).unwrap();
        assert_eq!(comments.iter().next().and_then(Keyed::key), Some(3));
    }

    #[test]
    fn test_upsert_and_remove() {
        let mut comments = LocalCollection::new();
        comments.upsert(comment(1, "a"));
        comments.upsert(comment(2, "b"));
        comments.upsert(comment(1, "a2"));

        assert_eq!(comments.len(), 2);
        assert_eq!(comments.get(1).map(|c| c.content.as_str()), Some("a2"));

        assert!(comments.remove(1).is_some());
        assert!(comments.remove(1).is_none());
        assert!(!comments.contains(1));

        comments.replace_all(Vec::new());
        assert!(comments.is_empty());
    }

    #[tokio::test]
    async fn test_join_records_event() {
        let (client, _) = scripted(ScriptedTransport::new().push_json(
            200,
            json!({"id": 1, "userId": 7, "eventId": 42, "status": "CONFIRMED"}),
        ));

        let mut attending = AttendingSet::new(client.participants(), 7);
        attending.join(42).await.unwrap();

        assert!(attending.contains(42));
        assert_eq!(attending.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_join_records_nothing() {
        let (client, _) = scripted(ScriptedTransport::new().push_text(400, "Déjà inscrit"));

        let mut attending = AttendingSet::new(client.participants(), 7);
        assert!(attending.join(42).await.is_err());
        assert!(attending.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_then_leave() {
        let (client, _) = scripted(
            ScriptedTransport::new()
                .push_json(200, json!([{"id": 42, "titre": "Gala"}, {"id": 43, "titre": "Hackathon"}]))
                .push_json(200, json!(null)),
        );

        let mut attending = AttendingSet::new(client.participants(), 7);
        assert_eq!(attending.refresh().await, 2);

        attending.leave(42).await.unwrap();
        assert_eq!(attending.iter().collect::<Vec<_>>(), vec![43]);
    }
}
