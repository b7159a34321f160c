//! Admin results: votes joined against questions, options and players in memory.

use super::AppState;
use crate::error::PollError;
use crate::protocol::{QuestionResults, ResultRow, ResultSlice, RoomResults};
use crate::types::*;
use std::collections::HashMap;

/// File name offered for the CSV download
pub const CSV_FILE_NAME: &str = "hotshot_results.csv";

const CSV_HEADER: [&str; 3] = ["player", "question", "option"];

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render rows as CSV: header plus one line per row, CRLF separated, no
/// trailing newline. No rows renders as an empty string.
pub fn rows_to_csv(rows: &[ResultRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(CSV_HEADER.join(","));
    for row in rows {
        let fields = [
            csv_escape(&row.player),
            csv_escape(&row.question),
            csv_escape(&row.option),
        ];
        lines.push(fields.join(","));
    }
    lines.join("\r\n")
}

/// Everything the results views need, loaded once per request
struct Tables {
    room: RoomInfo,
    questions: Vec<Question>,
    votes: Vec<Vote>,
    options: HashMap<OptionId, PollOption>,
    players: HashMap<PlayerId, Player>,
}

impl AppState {
    async fn load_tables(&self, room_id: &str) -> Result<Tables, PollError> {
        let room = self
            .get_room_info(room_id)
            .await
            .ok_or(PollError::RoomNotFound)?;
        let questions = self.list_questions(room_id).await;
        let votes = self.list_votes(room_id).await;
        let options = self.options.read().await.clone();
        let players = self
            .players
            .read()
            .await
            .values()
            .filter(|p| p.room_id == room_id)
            .map(|p| (p.id.clone(), p.clone()))
            .collect();

        Ok(Tables {
            room,
            questions,
            votes,
            options,
            players,
        })
    }

    /// Per-question vote distributions, ready to chart
    pub async fn room_results(&self, room_id: &str) -> Result<RoomResults, PollError> {
        let tables = self.load_tables(room_id).await?;

        let questions = tables
            .questions
            .iter()
            .map(|q| {
                // Slices appear in the order their first vote arrived
                let mut slices: Vec<ResultSlice> = Vec::new();
                let mut slot: HashMap<Option<&str>, usize> = HashMap::new();
                let mut total_votes = 0u32;

                for vote in tables.votes.iter().filter(|v| v.question_id == q.id) {
                    total_votes += 1;
                    let option = tables
                        .options
                        .get(&vote.option_id)
                        .filter(|o| o.question_id == q.id);
                    let key = option.map(|o| o.id.as_str());
                    let index = *slot.entry(key).or_insert_with(|| {
                        slices.push(ResultSlice {
                            option_id: option.map(|o| o.id.clone()),
                            text: option.map_or_else(|| UNKNOWN_LABEL.to_string(), |o| o.text.clone()),
                            votes: 0,
                            color: String::new(),
                        });
                        slices.len() - 1
                    });
                    slices[index].votes += 1;
                }

                for (i, slice) in slices.iter_mut().enumerate() {
                    slice.color = CHART_COLORS[i % CHART_COLORS.len()].to_string();
                }

                QuestionResults {
                    question_id: q.id.clone(),
                    order_index: q.order_index,
                    text: q.text.clone(),
                    total_votes,
                    slices,
                }
            })
            .collect();

        Ok(RoomResults {
            room: tables.room,
            player_count: tables.players.len() as u32,
            total_votes: tables.votes.len() as u32,
            questions,
        })
    }

    /// One row per vote in cast order; missing references read `Unknown`
    pub async fn result_rows(&self, room_id: &str) -> Result<Vec<ResultRow>, PollError> {
        let tables = self.load_tables(room_id).await?;
        let questions: HashMap<&str, &Question> = tables
            .questions
            .iter()
            .map(|q| (q.id.as_str(), q))
            .collect();

        let unknown = || UNKNOWN_LABEL.to_string();
        Ok(tables
            .votes
            .iter()
            .map(|v| ResultRow {
                player: tables
                    .players
                    .get(&v.player_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(unknown),
                question: questions
                    .get(v.question_id.as_str())
                    .map(|q| q.text.clone())
                    .unwrap_or_else(unknown),
                option: tables
                    .options
                    .get(&v.option_id)
                    .map(|o| o.text.clone())
                    .unwrap_or_else(unknown),
            })
            .collect())
    }

    pub async fn results_csv(&self, room_id: &str) -> Result<String, PollError> {
        let rows = self.result_rows(room_id).await?;
        Ok(rows_to_csv(&rows))
    }
}
