use super::option::insert_option;
use super::{new_id, now, AppState};
use crate::error::PollError;
use crate::protocol::{QuestionView, ServerMessage};
use crate::types::*;
use std::collections::HashSet;

fn record_vote(
    votes: &mut Vec<Vote>,
    player: &Player,
    question: &Question,
    option_id: &str,
) -> Result<Vote, PollError> {
    if votes
        .iter()
        .any(|v| v.player_id == player.id && v.question_id == question.id)
    {
        return Err(PollError::AlreadyVoted);
    }

    let seq = votes.last().map(|v| v.seq + 1).unwrap_or(1);
    let vote = Vote {
        id: new_id(),
        room_id: question.room_id.clone(),
        question_id: question.id.clone(),
        option_id: option_id.to_string(),
        player_id: player.id.clone(),
        seq,
        ts: now(),
    };
    votes.push(vote.clone());
    Ok(vote)
}

impl AppState {
    /// Resolve the voter and the question they're voting on
    async fn voting_context(
        &self,
        room_id: &str,
        session_token: &str,
        question_id: &str,
    ) -> Result<(Player, Question), PollError> {
        self.require_live_room(room_id).await?;

        let player = self
            .player_by_token(room_id, session_token)
            .await
            .ok_or(PollError::UnknownSession)?;

        let question = self
            .get_question(question_id)
            .await
            .filter(|q| q.room_id == room_id)
            .ok_or(PollError::QuestionNotFound)?;

        Ok((player, question))
    }

    /// Vote for an existing option. One vote per player per question.
    pub async fn cast_vote(
        &self,
        room_id: &str,
        session_token: &str,
        question_id: &str,
        option_id: &str,
    ) -> Result<Vote, PollError> {
        let (player, question) = self
            .voting_context(room_id, session_token, question_id)
            .await?;

        let option_known = self
            .options
            .read()
            .await
            .get(option_id)
            .is_some_and(|o| o.question_id == question.id);
        if !option_known {
            return Err(PollError::OptionNotFound);
        }

        let vote = {
            let mut votes = self.votes.write().await;
            record_vote(&mut votes, &player, &question, option_id)?
        };

        tracing::debug!(
            "Player {} voted {} on question {}",
            player.id,
            option_id,
            question.id
        );
        self.mark_dirty(room_id).await;
        Ok(vote)
    }

    /// Create a custom option and vote for it. Either both happen or neither does.
    pub async fn add_option_and_vote(
        &self,
        room_id: &str,
        session_token: &str,
        question_id: &str,
        text: &str,
    ) -> Result<(PollOption, Vote), PollError> {
        let (player, question) = self
            .voting_context(room_id, session_token, question_id)
            .await?;

        let (option, vote) = {
            let mut options = self.options.write().await;
            let mut votes = self.votes.write().await;

            if votes
                .iter()
                .any(|v| v.player_id == player.id && v.question_id == question.id)
            {
                return Err(PollError::AlreadyVoted);
            }

            let option = insert_option(&mut options, &question, text, Some(player.name.clone()))?;
            let vote = record_vote(&mut votes, &player, &question, &option.id)?;
            (option, vote)
        };

        tracing::info!(
            "Player {} added option '{}' to question {}",
            player.id,
            option.text,
            question.id
        );

        self.broadcast_to_room(
            room_id,
            ServerMessage::OptionAdded {
                question_id: question.id.clone(),
                option: option.clone(),
            },
        );
        self.mark_dirty(room_id).await;
        Ok((option, vote))
    }

    /// First question (by order) the player hasn't voted on yet.
    /// `None` means the player is finished.
    pub async fn next_question(
        &self,
        room_id: &str,
        session_token: &str,
    ) -> Result<Option<QuestionView>, PollError> {
        let player = self
            .player_by_token(room_id, session_token)
            .await
            .ok_or(PollError::UnknownSession)?;

        let questions = self.list_questions(room_id).await;
        let answered: HashSet<QuestionId> = self
            .votes
            .read()
            .await
            .iter()
            .filter(|v| v.player_id == player.id)
            .map(|v| v.question_id.clone())
            .collect();

        let total = questions.len() as u32;
        let Some(question) = questions.into_iter().find(|q| !answered.contains(&q.id)) else {
            return Ok(None);
        };

        let options = self.list_options(&question.id).await;
        Ok(Some(QuestionView {
            can_add_option: (options.len() as u32) < question.max_options,
            position: question.order_index,
            total,
            question,
            options,
        }))
    }

    /// Votes of a room in cast order
    pub async fn list_votes(&self, room_id: &str) -> Vec<Vote> {
        self.votes
            .read()
            .await
            .iter()
            .filter(|v| v.room_id == room_id)
            .cloned()
            .collect()
    }
}
