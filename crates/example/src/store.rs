//! In-memory message store.

use std::sync::atomic::{AtomicU64, Ordering};

use quill_service::{BoxFuture, Id, Params, Service, ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::RwLock;

/// A stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Identifier assigned on create.
    pub id: u64,
    /// Message body.
    pub text: String,
    /// Author, when the caller was authenticated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewMessage {
    text: String,
    #[serde(default)]
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagePatch {
    text: Option<String>,
}

/// Message service backed by a vector.
///
/// Supports `find`, `get`, `create`, `patch`, `remove` and the custom
/// `count` method. `find` honours `query.user` and `query.$limit`.
#[derive(Debug, Default)]
pub struct MessageService {
    messages: RwLock<Vec<Message>>,
    next_id: AtomicU64,
}

impl MessageService {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn message_id(id: Option<&Id>) -> Result<u64, ServiceError> {
        id.and_then(Id::as_num)
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| ServiceError::bad_request("message id must be a non-negative number"))
    }

    fn missing(id: u64) -> ServiceError {
        ServiceError::not_found(format!("no message with id {id}"))
    }
}

fn to_value(message: &Message) -> ServiceResult {
    Ok(serde_json::to_value(message)?)
}

impl Service for MessageService {
    fn methods(&self) -> Vec<String> {
        ["find", "get", "create", "patch", "remove", "count"]
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    fn find(&self, params: Params) -> BoxFuture<'_, ServiceResult> {
        Box::pin(async move {
            let query = params.query();
            let user = query
                .and_then(|q| q.get("user"))
                .and_then(Value::as_str);
            let limit = query
                .and_then(|q| q.get("$limit"))
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(usize::MAX);

            let messages = self.messages.read().await;
            let found: Vec<&Message> = messages
                .iter()
                .filter(|m| user.is_none_or(|u| m.user.as_deref() == Some(u)))
                .take(limit)
                .collect();
            Ok(serde_json::to_value(found)?)
        })
    }

    fn get(&self, id: Option<Id>, _params: Params) -> BoxFuture<'_, ServiceResult> {
        Box::pin(async move {
            let id = Self::message_id(id.as_ref())?;
            let messages = self.messages.read().await;
            let message = messages
                .iter()
                .find(|m| m.id == id)
                .ok_or_else(|| Self::missing(id))?;
            to_value(message)
        })
    }

    fn create(&self, data: Option<Value>, _params: Params) -> BoxFuture<'_, ServiceResult> {
        Box::pin(async move {
            let data = data.ok_or_else(|| ServiceError::bad_request("message data required"))?;
            let new: NewMessage = serde_json::from_value(data)?;
            let message = Message {
                id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
                text: new.text,
                user: new.user,
            };
            let value = to_value(&message)?;
            self.messages.write().await.push(message);
            Ok(value)
        })
    }

    fn patch(
        &self,
        id: Option<Id>,
        data: Option<Value>,
        _params: Params,
    ) -> BoxFuture<'_, ServiceResult> {
        Box::pin(async move {
            let id = Self::message_id(id.as_ref())?;
            let patch: MessagePatch = serde_json::from_value(data.unwrap_or_else(|| json!({})))?;
            let mut messages = self.messages.write().await;
            let message = messages
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| Self::missing(id))?;
            if let Some(text) = patch.text {
                message.text = text;
            }
            to_value(message)
        })
    }

    fn remove(&self, id: Option<Id>, _params: Params) -> BoxFuture<'_, ServiceResult> {
        Box::pin(async move {
            let id = Self::message_id(id.as_ref())?;
            let mut messages = self.messages.write().await;
            let index = messages
                .iter()
                .position(|m| m.id == id)
                .ok_or_else(|| Self::missing(id))?;
            to_value(&messages.remove(index))
        })
    }

    fn custom<'a>(
        &'a self,
        method: &'a str,
        _id: Option<Id>,
        _data: Option<Value>,
        _params: Params,
    ) -> BoxFuture<'a, ServiceResult> {
        Box::pin(async move {
            match method {
                "count" => Ok(json!(self.messages.read().await.len())),
                other => Err(ServiceError::method_not_found(other)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_assigns_ids() {
        let store = MessageService::new();
        let first = store
            .create(Some(json!({"text": "one"})), Params::new())
            .await
            .unwrap();
        let second = store
            .create(Some(json!({"text": "two", "user": "ann"})), Params::new())
            .await
            .unwrap();

        assert_eq!(first, json!({"id": 1, "text": "one"}));
        assert_eq!(second, json!({"id": 2, "text": "two", "user": "ann"}));
    }

    #[tokio::test]
    async fn create_rejects_malformed_data() {
        let store = MessageService::new();
        let err = store
            .create(Some(json!({"body": "no text"})), Params::new())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn find_filters_by_user_and_limit() {
        let store = MessageService::new();
        for (text, user) in [("a", "ann"), ("b", "bob"), ("c", "ann")] {
            store
                .create(Some(json!({"text": text, "user": user})), Params::new())
                .await
                .unwrap();
        }

        let query = serde_json::Map::from_iter([
            ("user".to_owned(), json!("ann")),
            ("$limit".to_owned(), json!(1)),
        ]);
        let found = store
            .find(Params::new().with_query(query))
            .await
            .unwrap();

        assert_eq!(found, json!([{"id": 1, "text": "a", "user": "ann"}]));
    }

    #[tokio::test]
    async fn patch_and_remove_missing_message() {
        let store = MessageService::new();
        let err = store
            .patch(Some(Id::from(3)), Some(json!({"text": "x"})), Params::new())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::not_found("no message with id 3"));

        let err = store.remove(Some(Id::from("x")), Params::new()).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn count_is_custom_method() {
        let store = MessageService::new();
        assert!(store.has_method("count"));
        assert!(!store.has_method("update"));
        assert_eq!(
            store.custom("count", None, None, Params::new()).await,
            Ok(json!(0))
        );
    }
}
