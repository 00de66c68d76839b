use crate::commands::{self, Outcome};
use crate::errors::AppError;
use crate::llm::{ChatCompletion, ChatMessage};
use crate::models::ChatReply;
use crate::snapshot::HealthSnapshot;
use crate::storage::HealthStore;
use tracing::info;

const PERSONA: &str = "Anda adalah asisten kesehatan yang ramah dan membantu. Berikan saran kesehatan berdasarkan data pengguna. Gunakan bahasa Indonesia yang natural dan mudah dipahami. Jangan memberikan saran medis yang serius - hanya tips kesehatan umum.";

const GUIDANCE: &str = "Anda bisa memberikan saran tentang:
- Konsumsi air yang cukup (2-3 liter/hari)
- Tidur yang cukup (7-9 jam/hari)
- Aktivitas fisik (minimal 5000-10000 langkah/hari)
- Mood dan kesehatan mental

Jika pengguna bertanya tentang data mereka, gunakan informasi di atas.";

pub fn system_prompt(snapshot: &HealthSnapshot) -> String {
    format!("{PERSONA}\n\n{}\n{GUIDANCE}", snapshot.context())
}

/// Answers one chat message: a recognized command is recorded and confirmed,
/// anything else goes to the assistant with today's snapshot as context.
pub async fn respond(
    store: &dyn HealthStore,
    assistant: &dyn ChatCompletion,
    user_id: &str,
    message: &str,
) -> Result<ChatReply, AppError> {
    if let Outcome::Handled { response, action } = commands::interpret(store, message, user_id).await? {
        return Ok(ChatReply {
            response,
            action: Some(action),
        });
    }

    let snapshot = HealthSnapshot::today(store, user_id).await?;
    let messages = [
        ChatMessage::system(system_prompt(&snapshot)),
        ChatMessage::user(message),
    ];
    let response = assistant.complete(&messages).await?;
    info!(user_id, "assistant replied");

    Ok(ChatReply {
        response,
        action: None,
    })
}
