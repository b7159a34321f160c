use super::{clean_text, new_id, now, AppState};
use crate::error::PollError;
use crate::types::*;
use std::collections::HashMap;

/// Insert an option into an already locked option table, enforcing the
/// question's cap and text uniqueness.
pub(crate) fn insert_option(
    options: &mut HashMap<OptionId, PollOption>,
    question: &Question,
    text: &str,
    created_by: Option<String>,
) -> Result<PollOption, PollError> {
    let text = clean_text(text, "Option", MAX_TEXT_CHARS)?;

    let existing: Vec<&PollOption> = options
        .values()
        .filter(|o| o.question_id == question.id)
        .collect();

    if existing.len() as u32 >= question.max_options {
        return Err(PollError::OptionLimitReached(question.max_options));
    }
    let lowered = text.to_lowercase();
    if existing.iter().any(|o| o.text.to_lowercase() == lowered) {
        return Err(PollError::DuplicateOption);
    }

    let option = PollOption {
        id: new_id(),
        question_id: question.id.clone(),
        text,
        created_by,
        position: existing.len() as u32,
        created_at: now(),
    };
    options.insert(option.id.clone(), option.clone());
    Ok(option)
}

impl AppState {
    /// Options of a question in insertion order
    pub async fn list_options(&self, question_id: &str) -> Vec<PollOption> {
        let mut list: Vec<PollOption> = self
            .options
            .read()
            .await
            .values()
            .filter(|o| o.question_id == question_id)
            .cloned()
            .collect();
        list.sort_by_key(|o| o.position);
        list
    }

    /// Add an option without voting for it (host seeding)
    pub async fn add_option(
        &self,
        question_id: &str,
        text: &str,
        created_by: Option<String>,
    ) -> Result<PollOption, PollError> {
        let question = self
            .get_question(question_id)
            .await
            .ok_or(PollError::QuestionNotFound)?;

        let option = {
            let mut options = self.options.write().await;
            insert_option(&mut options, &question, text, created_by)?
        };

        self.broadcast_to_room(
            &question.room_id,
            crate::protocol::ServerMessage::OptionAdded {
                question_id: question.id.clone(),
                option: option.clone(),
            },
        );
        Ok(option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup(max_options: u32) -> (AppState, Question) {
        let state = AppState::new();
        let room = state.create_room("Quiz", "abcdefghij").await.unwrap();
        let question = state
            .add_question(&room.id, "Favourite colour?", max_options)
            .await
            .unwrap();
        (state, question)
    }

    #[tokio::test]
    async fn test_add_option_keeps_insertion_order() {
        let (state, question) = setup(10).await;

        for text in ["red", "green", "blue"] {
            state.add_option(&question.id, text, None).await.unwrap();
        }

        let options = state.list_options(&question.id).await;
        let texts: Vec<_> = options.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, vec!["red", "green", "blue"]);
        assert_eq!(options[2].position, 2);
    }

    #[tokio::test]
    async fn test_add_option_enforces_cap() {
        let (state, question) = setup(5).await;

        for i in 0..5 {
            state
                .add_option(&question.id, &format!("option {}", i), None)
                .await
                .unwrap();
        }

        let result = state.add_option(&question.id, "one too many", None).await;
        assert!(matches!(result, Err(PollError::OptionLimitReached(5))));
        assert_eq!(state.list_options(&question.id).await.len(), 5);
    }

    #[tokio::test]
    async fn test_add_option_rejects_duplicates_and_blanks() {
        let (state, question) = setup(10).await;
        state.add_option(&question.id, "Red", None).await.unwrap();

        assert!(matches!(
            state.add_option(&question.id, "  red ", None).await,
            Err(PollError::DuplicateOption)
        ));
        assert!(matches!(
            state.add_option(&question.id, "   ", None).await,
            Err(PollError::InvalidInput(_))
        ));
        assert!(matches!(
            state.add_option("missing", "Blue", None).await,
            Err(PollError::QuestionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_add_option_broadcasts_to_room() {
        let (state, question) = setup(10).await;
        let mut rx = state.broadcast.subscribe();

        state
            .add_option(&question.id, "Red", Some("Alice".to_string()))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.room_id, question.room_id);
        match event.msg {
            crate::protocol::ServerMessage::OptionAdded { option, .. } => {
                assert_eq!(option.text, "Red");
                assert_eq!(option.created_by.as_deref(), Some("Alice"));
            }
            other => panic!("Expected OptionAdded, got {:?}", other),
        }
    }
}
