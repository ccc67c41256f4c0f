//! REST transport for the mutation API
//!
//! Synchronous HTTP (ureq) to stay executor-agnostic; hosts that need
//! off-thread dispatch wrap this behind their own executor. Every call
//! carries a bearer credential from the injected [`TokenProvider`].

use serde::Serialize;
use url::Url;

use crate::api::{MutationApi, MutationError, TokenProvider};
use crate::models::{LabelId, MessageId, ThreadId};

/// JSON body for batched message mutations
#[derive(Serialize)]
struct BatchBody<'a> {
    ids: Vec<&'a str>,
}

/// JSON body for single-item label mutations
#[derive(Serialize)]
struct LabelBody<'a> {
    label_id: &'a str,
}

/// [`MutationApi`] implementation over a REST backend.
///
/// Batched endpoints: `POST {base}/messages/{op}` with `{"ids": [...]}`.
/// Label endpoints: `POST {base}/threads/{id}/labels` and
/// `POST {base}/threads/{id}/labels/remove` with `{"label_id": ...}`.
pub struct RestMutationApi {
    base_url: Url,
    token: Box<dyn TokenProvider>,
}

impl RestMutationApi {
    pub fn new(base_url: Url, token: Box<dyn TokenProvider>) -> Self {
        Self { base_url, token }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, MutationError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| MutationError::validation("base URL cannot be a base"))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn post<B: Serialize>(&self, url: Url, body: &B) -> Result<(), MutationError> {
        let token = self.token.bearer_token()?;

        match ureq::post(url.as_str())
            .header("Authorization", &format!("Bearer {}", token))
            .send_json(body)
        {
            Ok(_) => Ok(()),
            Err(ureq::Error::StatusCode(401)) | Err(ureq::Error::StatusCode(403)) => {
                Err(MutationError::AuthRequired)
            }
            Err(e) => Err(MutationError::network(e.to_string())),
        }
    }

    fn post_batch(&self, op: &str, message_ids: &[MessageId]) -> Result<(), MutationError> {
        validate_ids(message_ids.iter().map(|m| m.as_str()))?;
        let url = self.endpoint(&["messages", op])?;
        let body = BatchBody {
            ids: message_ids.iter().map(|m| m.as_str()).collect(),
        };
        self.post(url, &body)
    }

    fn post_label(
        &self,
        thread_id: &ThreadId,
        label_id: &LabelId,
        remove: bool,
    ) -> Result<(), MutationError> {
        validate_ids([thread_id.as_str(), label_id.as_str()].into_iter())?;
        let segments: &[&str] = if remove {
            &["threads", thread_id.as_str(), "labels", "remove"]
        } else {
            &["threads", thread_id.as_str(), "labels"]
        };
        let url = self.endpoint(segments)?;
        let body = LabelBody {
            label_id: label_id.as_str(),
        };
        self.post(url, &body)
    }
}

impl MutationApi for RestMutationApi {
    fn mark_read(&self, message_ids: &[MessageId]) -> Result<(), MutationError> {
        self.post_batch("markRead", message_ids)
    }

    fn mark_unread(&self, message_ids: &[MessageId]) -> Result<(), MutationError> {
        self.post_batch("markUnread", message_ids)
    }

    fn mark_done(&self, message_ids: &[MessageId]) -> Result<(), MutationError> {
        self.post_batch("markDone", message_ids)
    }

    fn delete(&self, message_ids: &[MessageId]) -> Result<(), MutationError> {
        self.post_batch("delete", message_ids)
    }

    fn apply_label(
        &self,
        thread_id: &ThreadId,
        label_id: &LabelId,
    ) -> Result<(), MutationError> {
        self.post_label(thread_id, label_id, false)
    }

    fn remove_label(
        &self,
        thread_id: &ThreadId,
        label_id: &LabelId,
    ) -> Result<(), MutationError> {
        self.post_label(thread_id, label_id, true)
    }
}

/// Defensive identifier check. Identifiers are internally sourced, so a
/// malformed one is a bug upstream: reject it instead of sending it.
fn validate_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Result<(), MutationError> {
    let mut any = false;
    for id in ids {
        any = true;
        if id.is_empty() || id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(MutationError::validation(format!("malformed id: {:?}", id)));
        }
    }
    if !any {
        return Err(MutationError::validation("empty id list"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StaticToken;

    fn make_api() -> RestMutationApi {
        RestMutationApi::new(
            Url::parse("https://mail.example.com/api/v1").unwrap(),
            Box::new(StaticToken("tok".to_string())),
        )
    }

    #[test]
    fn test_endpoint_shaping() {
        let api = make_api();
        let url = api.endpoint(&["messages", "markRead"]).unwrap();
        assert_eq!(url.as_str(), "https://mail.example.com/api/v1/messages/markRead");

        let url = api.endpoint(&["threads", "t1", "labels", "remove"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://mail.example.com/api/v1/threads/t1/labels/remove"
        );
    }

    #[test]
    fn test_validate_rejects_malformed_ids() {
        assert!(validate_ids(["m1", "m2"].into_iter()).is_ok());
        assert!(validate_ids(["m 1"].into_iter()).is_err());
        assert!(validate_ids([""].into_iter()).is_err());
        assert!(validate_ids(["m\n1"].into_iter()).is_err());
        assert!(validate_ids(std::iter::empty()).is_err());
    }

    #[test]
    fn test_batch_call_rejects_malformed_before_network() {
        let api = make_api();
        // Fails in validation, so no network access is attempted
        let err = api.mark_read(&[MessageId::new("has space")]).unwrap_err();
        assert!(matches!(err, MutationError::Validation { .. }));
    }
}
