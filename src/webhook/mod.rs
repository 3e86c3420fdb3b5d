//! Webhook ingestion: signature verification, parsing, and trigger
//! classification for inbound issue-tracker events.

use hmac::{Hmac, Mac};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::types::{Actor, Comment, Issue};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WebhookAction {
    Create,
    Update,
    Delete,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum WebhookEntityType {
    Issue,
    Comment,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct WebhookEvent {
    pub action: WebhookAction,
    #[serde(rename = "type")]
    pub entity_type: WebhookEntityType,
    pub actor: Actor,
    pub data: serde_json::Value,
    #[serde(rename = "tenantId")]
    pub tenant_id: String,
    #[serde(rename = "webhookId", default)]
    pub webhook_id: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}


#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ProcessedEvent {
    #[serde(rename = "type")]
    pub entity_type: WebhookEntityType,
    pub action: WebhookAction,
    pub issue: Option<Issue>,
    pub comment: Option<Comment>,
    pub actor: Actor,
    pub should_trigger: bool,
    pub trigger_reason: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Wire shape of a Comment event's `data` field: the comment itself with
/// the parent issue nested inline, rather than referenced by a flat id.
#[derive(Debug, Clone, Deserialize)]
struct CommentData {
    id: String,
    body: String,
    #[serde(default)]
    issue: Option<IssueData>,
}

/// Wire shape of the issue nested inside a Comment event. The tracker
/// reports the creator as a nested `{id}` object here, unlike the flat
/// `creatorId` on a top-level Issue event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueData {
    id: String,
    identifier: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    creator_id: Option<String>,
    #[serde(default)]
    creator: Option<ActorRef>,
    #[serde(default)]
    assignee_id: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ActorRef {
    id: String,
}

impl IssueData {
    fn into_issue(self) -> Issue {
        Issue {
            id: self.id,
            identifier: self.identifier,
            title: self.title,
            description: self.description,
            creator_id: self.creator_id.or(self.creator.map(|c| c.id)).unwrap_or_default(),
            assignee_id: self.assignee_id,
            labels: self.labels,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookRejection {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

const EXPLICIT_MENTIONS: &[&str] = &["@claude", "@agent", "claude"];
const ACTION_VERBS: &[&str] = &["implement", "fix", "analyze", "optimize", "test", "debug", "review", "refactor"];
const HELP_PHRASES: &[&str] = &["help with", "work on", "check", "please"];
const PERFORMANCE_TOKENS: &[&str] = &["slow", "memory", "cpu", "bottleneck", "optimize"];

/// Verifies the raw body against a hex-encoded HMAC-SHA256 signature using
/// constant-time comparison.
pub fn verify_signature(raw_body: &[u8], signature_hex: &str, secret: &str) -> bool {
    let Ok(expected_bytes) = hex::decode(signature_hex) else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(raw_body);
    let computed = mac.finalize().into_bytes();

    computed.ct_eq(&expected_bytes).into()
}

/// Parses and classifies a raw inbound webhook request.
///
/// Signature verification and parsing happen before any field of the parsed
/// payload (including `tenantId`) is trusted.
pub fn handle(
    raw_body: &[u8],
    signature_header: Option<&str>,
    webhook_secret: Option<&str>,
    tenant_id: &str,
    agent_user_id: Option<&str>,
) -> Result<ProcessedEvent, WebhookRejection> {
    if let Some(secret) = webhook_secret {
        let signature = signature_header.ok_or(WebhookRejection::InvalidSignature)?;
        if !verify_signature(raw_body, signature, secret) {
            return Err(WebhookRejection::InvalidSignature);
        }
    } else {
        tracing::warn!("webhook secret not configured; accepting unsigned event");
    }

    let event: WebhookEvent = serde_json::from_slice(raw_body).map_err(|e| WebhookRejection::MalformedPayload(e.to_string()))?;

    let (issue, comment) = match event.entity_type {
        WebhookEntityType::Issue => (serde_json::from_value::<Issue>(event.data.clone()).ok(), None),
        WebhookEntityType::Comment => match serde_json::from_value::<CommentData>(event.data.clone()) {
            Ok(data) => {
                let issue = data.issue.map(IssueData::into_issue);
                let comment = Comment {
                    id: data.id,
                    body: data.body,
                    author_id: event.actor.id.clone(),
                    issue_id: issue.as_ref().map(|i| i.id.clone()).unwrap_or_default(),
                };
                (issue, Some(comment))
            }
            Err(_) => (None, None),
        },
        _ => (None, None),
    };

    let timestamp = chrono::Utc::now();

    if event.tenant_id != tenant_id {
        return Ok(ProcessedEvent {
            entity_type: event.entity_type,
            action: event.action,
            issue,
            comment,
            actor: event.actor,
            should_trigger: false,
            trigger_reason: "wrong tenant".to_string(),
            timestamp,
        });
    }

    if !matches!(event.entity_type, WebhookEntityType::Issue | WebhookEntityType::Comment) {
        return Ok(ProcessedEvent {
            entity_type: event.entity_type,
            action: event.action,
            issue,
            comment,
            actor: event.actor,
            should_trigger: false,
            trigger_reason: "unsupported event type".to_string(),
            timestamp,
        });
    }

    if let Some(agent_id) = agent_user_id {
        if event.actor.id == agent_id {
            return Ok(ProcessedEvent {
                entity_type: event.entity_type,
                action: event.action,
                issue,
                comment,
                actor: event.actor,
                should_trigger: false,
                trigger_reason: "actor is the agent".to_string(),
                timestamp,
            });
        }
    }

    let (should_trigger, trigger_reason) = classify_trigger(&event, issue.as_ref(), comment.as_ref(), agent_user_id);

    Ok(ProcessedEvent {
        entity_type: event.entity_type,
        action: event.action,
        issue,
        comment,
        actor: event.actor,
        should_trigger,
        trigger_reason,
        timestamp,
    })
}

fn classify_trigger(
    event: &WebhookEvent,
    issue: Option<&Issue>,
    comment: Option<&Comment>,
    agent_user_id: Option<&str>,
) -> (bool, String) {
    if matches!(event.entity_type, WebhookEntityType::Issue) {
        if let (Some(issue), Some(agent_id)) = (issue, agent_user_id) {
            if issue.assignee_id.as_deref() == Some(agent_id) {
                return (true, "issue assigned to agent".to_string());
            }
        }
    }

    if matches!(event.entity_type, WebhookEntityType::Comment) && matches!(event.action, WebhookAction::Create) {
        if let Some(comment) = comment {
            if let Some(token) = matching_trigger_token(&comment.body) {
                return (true, format!("comment mention: {token}"));
            }
        }
    }

    (false, "no trigger condition matched".to_string())
}

fn matching_trigger_token(body: &str) -> Option<&'static str> {
    let lower = body.to_lowercase();

    for &token in EXPLICIT_MENTIONS.iter().chain(ACTION_VERBS).chain(HELP_PHRASES).chain(PERFORMANCE_TOKENS) {
        if word_boundary_contains(&lower, token) {
            return Some(token);
        }
    }
    None
}

fn word_boundary_contains(haystack: &str, needle: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let abs = start + pos;
        let before_ok = haystack[..abs].chars().next_back().is_none_or(|c| !c.is_alphanumeric() && c != '@');
        let after_ok = haystack[abs + needle.len()..].chars().next().is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = abs + needle.len();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(body: &[u8], secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_verify_signature_roundtrip() {
        let body = br#"{"a":1}"#;
        let sig = sign(body, "secret");
        assert!(verify_signature(body, &sig, "secret"));
        assert!(!verify_signature(body, &sig, "wrong"));
    }

    #[test]
    fn test_verify_signature_rejects_malformed_hex() {
        assert!(!verify_signature(b"{}", "not-hex!!", "secret"));
    }

    #[test]
    fn test_word_boundary_matches_whole_word_only() {
        assert!(word_boundary_contains("please fix this", "fix"));
        assert!(!word_boundary_contains("prefix this", "fix"));
        assert!(word_boundary_contains("@claude take a look", "@claude"));
    }

    #[test]
    fn test_matching_trigger_token_finds_action_verb() {
        assert_eq!(matching_trigger_token("can you implement this?"), Some("implement"));
    }

    #[test]
    fn test_matching_trigger_token_none_for_unrelated_text() {
        assert_eq!(matching_trigger_token("thanks for the update"), None);
    }

    fn issue_webhook_body(tenant: &str, assignee: &str) -> Vec<u8> {
        serde_json::json!({
            "action": "update",
            "type": "Issue",
            "actor": {"id": "user-1", "name": "Alice"},
            "data": {
                "id": "i1", "identifier": "ENG-1", "title": "Do the thing",
                "description": "", "creatorId": "user-1", "assigneeId": assignee,
                "labels": []
            },
            "tenantId": tenant,
            "webhookId": "wh-1",
            "createdAt": "2024-01-01T00:00:00Z"
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_handle_rejects_bad_signature() {
        let body = issue_webhook_body("tenant-1", "agent-1");
        let result = handle(&body, Some("deadbeef"), Some("secret"), "tenant-1", Some("agent-1"));
        assert!(matches!(result, Err(WebhookRejection::InvalidSignature)));
    }

    #[test]
    fn test_handle_triggers_on_issue_assignment() {
        let body = issue_webhook_body("tenant-1", "agent-1");
        let processed = handle(&body, None, None, "tenant-1", Some("agent-1")).unwrap();
        assert!(processed.should_trigger);
        assert_eq!(processed.trigger_reason, "issue assigned to agent");
    }

    #[test]
    fn test_handle_wrong_tenant_is_non_trigger() {
        let body = issue_webhook_body("other-tenant", "agent-1");
        let processed = handle(&body, None, None, "tenant-1", Some("agent-1")).unwrap();
        assert!(!processed.should_trigger);
        assert_eq!(processed.trigger_reason, "wrong tenant");
    }

    #[test]
    fn test_handle_malformed_payload() {
        let result = handle(b"not json", None, None, "tenant-1", None);
        assert!(matches!(result, Err(WebhookRejection::MalformedPayload(_))));
    }

    fn comment_webhook_body(tenant: &str, actor_id: &str) -> Vec<u8> {
        serde_json::json!({
            "action": "create",
            "type": "Comment",
            "actor": {"id": actor_id},
            "data": {
                "id": "c-1",
                "body": "@claude please fix",
                "issue": {
                    "id": "iss-1",
                    "identifier": "DEV-1",
                    "title": "bug X",
                    "creator": {"id": "user-9"}
                }
            },
            "tenantId": tenant
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_handle_triggers_on_comment_mention_with_nested_issue() {
        let body = comment_webhook_body("org-1", "user-9");
        let processed = handle(&body, None, None, "org-1", Some("agent-1")).unwrap();

        assert!(processed.should_trigger);
        assert_eq!(processed.trigger_reason, "comment mention: @claude");

        let issue = processed.issue.expect("comment event should carry its parent issue");
        assert_eq!(issue.id, "iss-1");
        assert_eq!(issue.identifier, "DEV-1");
        assert_eq!(issue.creator_id, "user-9");

        let comment = processed.comment.expect("comment should be populated");
        assert_eq!(comment.issue_id, "iss-1");
        assert_eq!(comment.author_id, "user-9");
    }

    #[test]
    fn test_handle_comment_from_agent_is_bot_filtered() {
        let body = comment_webhook_body("org-1", "agent-1");
        let processed = handle(&body, None, None, "org-1", Some("agent-1")).unwrap();

        assert!(!processed.should_trigger);
        assert_eq!(processed.trigger_reason, "actor is the agent");
    }
}
