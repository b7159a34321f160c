use super::{clean_text, new_id, now, AppState};
use crate::error::PollError;
use crate::types::*;

impl AppState {
    /// Append a question to a room. Allowed while the room is draft or live.
    pub async fn add_question(
        &self,
        room_id: &str,
        text: &str,
        max_options: u32,
    ) -> Result<Question, PollError> {
        let text = clean_text(text, "Question", MAX_TEXT_CHARS)?;
        if !ALLOWED_MAX_OPTIONS.contains(&max_options) {
            return Err(PollError::InvalidInput(format!(
                "Max options must be one of {:?}",
                ALLOWED_MAX_OPTIONS
            )));
        }

        let rooms = self.rooms.read().await;
        if !rooms.contains_key(room_id) {
            return Err(PollError::RoomNotFound);
        }

        let mut questions = self.questions.write().await;
        let order_index = questions.values().filter(|q| q.room_id == room_id).count() as u32 + 1;

        let question = Question {
            id: new_id(),
            room_id: room_id.to_string(),
            text,
            order_index,
            max_options,
            created_at: now(),
        };
        questions.insert(question.id.clone(), question.clone());

        tracing::info!(
            "Room {} got question #{}: {}",
            room_id,
            order_index,
            question.text
        );
        Ok(question)
    }

    /// Questions of a room ordered by `order_index`
    pub async fn list_questions(&self, room_id: &str) -> Vec<Question> {
        let mut list: Vec<Question> = self
            .questions
            .read()
            .await
            .values()
            .filter(|q| q.room_id == room_id)
            .cloned()
            .collect();
        list.sort_by_key(|q| q.order_index);
        list
    }

    pub async fn get_question(&self, question_id: &str) -> Option<Question> {
        self.questions.read().await.get(question_id).cloned()
    }
}
