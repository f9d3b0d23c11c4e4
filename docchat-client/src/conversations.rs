//! Conversation endpoints.

use docchat_types::{
    ApiError, Conversation, ConversationDetail, ConversationTitle, DEFAULT_CONVERSATION_TITLE,
};

use crate::client::DocChat;

const CREATE_FAILED: &str = "Failed to create conversation";
const LIST_FAILED: &str = "Failed to list conversations";
const GET_FAILED: &str = "Conversation not found";
const RENAME_FAILED: &str = "Failed to rename conversation";
const DELETE_FAILED: &str = "Failed to delete conversation";

impl DocChat {
    /// Create a conversation. `None` uses the default title.
    pub async fn create_conversation(&self, title: Option<&str>) -> Result<Conversation, ApiError> {
        let url = self.api_url("/conversations");
        let body = ConversationTitle {
            title: title
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_CONVERSATION_TITLE)
                .to_string(),
        };
        tracing::debug!(url = %url, title = %body.title, "creating conversation");
        self.send_json(self.client.post(&url).json(&body), CREATE_FAILED)
            .await
    }

    /// List conversations.
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        let url = self.api_url("/conversations");
        self.send_json(self.client.get(&url), LIST_FAILED).await
    }

    /// Fetch a conversation with its stored messages.
    pub async fn get_conversation(&self, id: &str) -> Result<ConversationDetail, ApiError> {
        let url = self.api_url(&format!("/conversations/{id}"));
        self.send_json(self.client.get(&url), GET_FAILED).await
    }

    /// Change a conversation's title.
    pub async fn rename_conversation(
        &self,
        id: &str,
        title: impl Into<String>,
    ) -> Result<Conversation, ApiError> {
        let url = self.api_url(&format!("/conversations/{id}"));
        let body = ConversationTitle {
            title: title.into(),
        };
        tracing::debug!(url = %url, title = %body.title, "renaming conversation");
        self.send_json(self.client.patch(&url).json(&body), RENAME_FAILED)
            .await
    }

    /// Delete a conversation and its messages.
    pub async fn delete_conversation(&self, id: &str) -> Result<(), ApiError> {
        let url = self.api_url(&format!("/conversations/{id}"));
        tracing::debug!(url = %url, "deleting conversation");
        self.send_checked(self.client.delete(&url), DELETE_FAILED)
            .await
            .map(drop)
    }
}
