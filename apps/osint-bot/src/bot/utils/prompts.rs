use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Total tries a user gets to type a valid number before falling back to
/// the menu.
pub const MAX_NUMBER_ATTEMPTS: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingNumber {
    pub attempt: u8,
}

impl PendingNumber {
    pub fn first() -> Self {
        Self { attempt: 1 }
    }

    /// The next attempt, or `None` once the budget is spent.
    pub fn next(self) -> Option<Self> {
        (self.attempt < MAX_NUMBER_ATTEMPTS).then(|| Self {
            attempt: self.attempt + 1,
        })
    }
}

/// Chats that were asked for a phone number and have not answered yet.
/// The next plain text message in such a chat is taken as the answer.
#[derive(Clone, Default)]
pub struct PromptRegistry {
    pending: Arc<RwLock<HashMap<i64, PendingNumber>>>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn expect_number(&self, chat_id: i64, pending: PendingNumber) {
        self.pending.write().await.insert(chat_id, pending);
    }

    /// Removes and returns the chat's pending prompt.
    pub async fn take(&self, chat_id: i64) -> Option<PendingNumber> {
        self.pending.write().await.remove(&chat_id)
    }

    pub async fn cancel(&self, chat_id: i64) {
        self.pending.write().await.remove(&chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempts_are_bounded() {
        let mut pending = PendingNumber::first();
        let mut tries = 1;
        while let Some(next) = pending.next() {
            pending = next;
            tries += 1;
        }
        assert_eq!(tries, MAX_NUMBER_ATTEMPTS);
    }

    #[tokio::test]
    async fn prompt_is_consumed_by_one_answer() {
        let prompts = PromptRegistry::new();
        prompts.expect_number(5, PendingNumber::first()).await;

        assert_eq!(prompts.take(6).await, None);
        assert_eq!(prompts.take(5).await, Some(PendingNumber::first()));
        assert_eq!(prompts.take(5).await, None);
    }

    #[tokio::test]
    async fn cancel_drops_the_prompt() {
        let prompts = PromptRegistry::new();
        prompts.expect_number(9, PendingNumber { attempt: 2 }).await;
        prompts.cancel(9).await;
        assert_eq!(prompts.take(9).await, None);
    }
}
