
use serde::Deserialize;
use std::sync::Arc;

use crate::Result;
use crate::chat::{ChatMessage, ChatModel};

const SYSTEM_PROMPT: &str = "You write short, warm, first-person affirmations for someone who has just written in their journal. Reflect what they wrote without repeating it back, stay grounded and specific, and never give medical or clinical advice.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AffirmationRequest {
    pub entry: String,
    pub mood: Option<String>,
}

#[inline]
pub fn build_prompt(request: &AffirmationRequest) -> String {
    let mut prompt = format!("Journal entry:\n{}\n", request.entry.trim());

    if let Some(mood) = request.mood.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        prompt.push_str(&format!("\nCurrent mood: {}\n", mood));
    }

    prompt.push_str("\nWrite one affirmation of two to three sentences for this person.");
    prompt
}

pub struct AffirmationGenerator {
    chat: Arc<dyn ChatModel>,
}

impl AffirmationGenerator {
    #[inline]
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    #[inline]
    pub async fn generate(&self, request: &AffirmationRequest) -> Result<Option<String>> {
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_prompt(request)),
        ];
        self.chat.complete(&messages).await
    }
}
