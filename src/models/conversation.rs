use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::turn::ConversationTurn;

/// Handle to one exchange of a [`Conversation`].
///
/// A handle names both the position and the id of its exchange, so once the
/// conversation is cleared a stale handle resolves to nothing instead of to
/// whichever exchange took its place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TurnId {
    index: usize,
    exchange: Uuid,
}

impl TurnId {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Id of the exchange this handle points at
    pub fn exchange_id(&self) -> Uuid {
        self.exchange
    }
}

/// A user query and the assistant turn answering it
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub id: Uuid,
    pub query: String,
    pub asked_at: DateTime<Utc>,
    pub turn: ConversationTurn,
}

/// Transcript of one chat against a knowledge base
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    exchanges: Vec<Exchange>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new query and open an empty turn for its answer.
    pub fn begin(&mut self, query: impl Into<String>) -> TurnId {
        self.open(query).0
    }

    /// Like [`Conversation::begin`], also lending out the new turn.
    pub fn open(&mut self, query: impl Into<String>) -> (TurnId, &mut ConversationTurn) {
        let id = TurnId {
            index: self.exchanges.len(),
            exchange: Uuid::new_v4(),
        };
        self.exchanges.push(Exchange {
            id: id.exchange,
            query: query.into(),
            asked_at: Utc::now(),
            turn: ConversationTurn::new(),
        });
        let exchange = &mut self.exchanges[id.index];
        (id, &mut exchange.turn)
    }

    pub fn turn(&self, id: TurnId) -> Option<&ConversationTurn> {
        self.exchange(id).map(|e| &e.turn)
    }

    pub fn turn_mut(&mut self, id: TurnId) -> Option<&mut ConversationTurn> {
        self.exchanges
            .get_mut(id.index)
            .filter(|e| e.id == id.exchange)
            .map(|e| &mut e.turn)
    }

    pub fn exchange(&self, id: TurnId) -> Option<&Exchange> {
        self.exchanges
            .get(id.index)
            .filter(|e| e.id == id.exchange)
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Number of turns still receiving tokens
    pub fn open_turn_count(&self) -> usize {
        self.exchanges
            .iter()
            .filter(|e| !e.turn.is_terminal())
            .count()
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Drop every exchange; handles issued earlier resolve to nothing.
    pub fn clear(&mut self) {
        self.exchanges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sse::StreamEvent;

    #[test]
    fn test_begin_opens_turn() {
        let mut conversation = Conversation::new();
        let id = conversation.begin("What is the emission factor?");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.open_turn_count(), 1);
        assert_eq!(
            conversation.exchange(id).unwrap().query,
            "What is the emission factor?"
        );
        assert_eq!(conversation.turn(id), Some(&ConversationTurn::new()));
    }

    #[test]
    fn test_handle_targets_its_own_turn() {
        let mut conversation = Conversation::new();
        let first = conversation.begin("first");
        conversation
            .turn_mut(first)
            .unwrap()
            .apply_mut(&StreamEvent::Done);
        let second = conversation.begin("second");

        conversation.turn_mut(second).unwrap().apply_mut(&StreamEvent::Token {
            content: "answer".to_string(),
        });

        assert_eq!(conversation.turn(first).unwrap().text, "");
        assert_eq!(conversation.turn(second).unwrap().text, "answer");
        assert_eq!(conversation.open_turn_count(), 1);
        assert_ne!(
            conversation.exchange(first).unwrap().id,
            conversation.exchange(second).unwrap().id
        );
    }

    #[test]
    fn test_stale_handle_after_clear() {
        let mut conversation = Conversation::new();
        let old = conversation.begin("old question");
        conversation.clear();
        let new = conversation.begin("new question");
        assert_eq!(old.index(), new.index());

        assert!(conversation.turn_mut(old).is_none());
        assert!(conversation.exchange(old).is_none());
        conversation.turn_mut(new).unwrap().apply_mut(&StreamEvent::Token {
            content: "answer".to_string(),
        });
        assert_eq!(conversation.turn(new).unwrap().text, "answer");
    }

    #[test]
    fn test_handle_from_other_conversation() {
        let mut first = Conversation::new();
        let mut second = Conversation::new();
        let id = first.begin("q");
        second.begin("q");
        assert!(second.turn(id).is_none());
    }

    #[test]
    fn test_open_lends_new_turn() {
        let mut conversation = Conversation::new();
        let (id, turn) = conversation.open("q");
        turn.apply_mut(&StreamEvent::Done);
        assert!(conversation.turn(id).unwrap().is_terminal());
        assert_eq!(conversation.exchange(id).unwrap().id, id.exchange_id());
    }

    #[test]
    fn test_unknown_handle() {
        let mut conversation = Conversation::new();
        let id = conversation.begin("q");
        conversation.clear();
        assert!(conversation.is_empty());
        assert!(conversation.turn(id).is_none());
        assert!(conversation.turn_mut(id).is_none());
    }
}
