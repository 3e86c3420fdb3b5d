//! Linear GraphQL client implementing the tracker wrapper contract.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::errors::ApiError;
use crate::tracker::Tracker;
use crate::types::Issue;

const PROVIDER: &str = "linear";
const GRAPHQL_URL: &str = "https://api.linear.app/graphql";

pub struct LinearTracker {
    api_key: String,
    client: reqwest::Client,
}

impl LinearTracker {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: serde_json::Value) -> Result<T, ApiError> {
        let body = serde_json::json!({ "query": query, "variables": variables });

        let response = self
            .client
            .post(GRAPHQL_URL)
            .header("Authorization", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Network { provider: PROVIDER, message: e.to_string() })?;

        let status = response.status();
        match status.as_u16() {
            200 => {}
            401 => return Err(ApiError::Unauthorized { provider: PROVIDER }),
            403 => return Err(ApiError::Http { provider: PROVIDER, status: 403, message: "forbidden".to_string() }),
            429 => return Err(ApiError::Http { provider: PROVIDER, status: 429, message: "rate limited".to_string() }),
            other => {
                let text = response.text().await.unwrap_or_default();
                return Err(ApiError::Http { provider: PROVIDER, status: other, message: text });
            }
        }

        let parsed: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| ApiError::Network { provider: PROVIDER, message: e.to_string() })?;

        if let Some(errors) = parsed.errors {
            if let Some(first) = errors.into_iter().next() {
                return Err(ApiError::Http { provider: PROVIDER, status: 200, message: first.message });
            }
        }

        parsed
            .data
            .ok_or_else(|| ApiError::Http { provider: PROVIDER, status: 200, message: "empty response".to_string() })
    }
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct ViewerResponse {
    viewer: ViewerNode,
}

#[derive(Deserialize)]
struct ViewerNode {
    id: String,
}

#[derive(Serialize)]
struct CreateCommentInput<'a> {
    #[serde(rename = "issueId")]
    issue_id: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct CommentCreateResponse {
    #[serde(rename = "commentCreate")]
    comment_create: CommentCreatePayload,
}

#[derive(Deserialize)]
struct CommentCreatePayload {
    comment: CommentNode,
}

#[derive(Deserialize)]
struct CommentNode {
    id: String,
}

#[derive(Deserialize)]
struct CommentUpdateResponse {
    #[serde(rename = "commentUpdate")]
    comment_update: CommentUpdatePayload,
}

#[derive(Deserialize)]
struct CommentUpdatePayload {
    success: bool,
}

#[derive(Deserialize)]
struct IssueQueryResponse {
    issue: IssueNode,
}

#[derive(Deserialize)]
struct IssueNode {
    id: String,
    identifier: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    creator: Option<CreatorNode>,
    assignee: Option<AssigneeNode>,
    labels: LabelConnection,
}

#[derive(Deserialize)]
struct CreatorNode {
    id: String,
}

#[derive(Deserialize)]
struct AssigneeNode {
    id: String,
}

#[derive(Deserialize)]
struct LabelConnection {
    nodes: Vec<LabelNode>,
}

#[derive(Deserialize)]
struct LabelNode {
    name: String,
}

#[async_trait]
impl Tracker for LinearTracker {
    async fn get_current_user(&self) -> Result<String, ApiError> {
        let query = "query { viewer { id } }";
        let response: ViewerResponse = self.graphql(query, serde_json::Value::Null).await?;
        Ok(response.viewer.id)
    }

    async fn create_comment(&self, issue_id: &str, body: &str) -> Result<String, ApiError> {
        let query = r"
            mutation CreateComment($input: CommentCreateInput!) {
                commentCreate(input: $input) { comment { id } }
            }
        ";
        let variables = serde_json::json!({ "input": CreateCommentInput { issue_id, body } });
        let response: CommentCreateResponse = self.graphql(query, variables).await?;
        Ok(response.comment_create.comment.id)
    }

    async fn update_comment(&self, comment_id: &str, body: &str) -> Result<(), ApiError> {
        let query = r"
            mutation UpdateComment($id: String!, $body: String!) {
                commentUpdate(id: $id, input: { body: $body }) { success }
            }
        ";
        let variables = serde_json::json!({ "id": comment_id, "body": body });
        let response: CommentUpdateResponse = self.graphql(query, variables).await?;
        if response.comment_update.success {
            Ok(())
        } else {
            Err(ApiError::Http { provider: PROVIDER, status: 200, message: "commentUpdate reported failure".to_string() })
        }
    }

    async fn get_issue(&self, issue_id: &str) -> Result<Issue, ApiError> {
        let query = r"
            query GetIssue($id: String!) {
                issue(id: $id) {
                    id identifier title description
                    creator { id }
                    assignee { id }
                    labels { nodes { name } }
                }
            }
        ";
        let variables = serde_json::json!({ "id": issue_id });
        let response: IssueQueryResponse = self.graphql(query, variables).await?;
        let node = response.issue;

        Ok(Issue {
            id: node.id,
            identifier: node.identifier,
            title: node.title,
            description: node.description.unwrap_or_default(),
            creator_id: node.creator.map(|c| c.id).unwrap_or_else(|| "unknown".to_string()),
            assignee_id: node.assignee.map(|a| a.id),
            labels: node.labels.nodes.into_iter().map(|l| l.name).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_response_deserializes() {
        let raw = serde_json::json!({ "viewer": { "id": "user-1" } });
        let parsed: ViewerResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.viewer.id, "user-1");
    }

    #[test]
    fn test_issue_query_response_maps_missing_creator_and_assignee() {
        let raw = serde_json::json!({
            "issue": {
                "id": "i1",
                "identifier": "ENG-1",
                "title": "Fix it",
                "description": null,
                "creator": null,
                "assignee": null,
                "labels": { "nodes": [{ "name": "bug" }] }
            }
        });
        let parsed: IssueQueryResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.issue.id, "i1");
        assert!(parsed.issue.creator.is_none());
        assert_eq!(parsed.issue.labels.nodes.len(), 1);
    }

    #[test]
    fn test_graphql_response_surfaces_first_error() {
        let raw = serde_json::json!({
            "data": null,
            "errors": [{ "message": "not found" }, { "message": "second" }]
        });
        let parsed: GraphQlResponse<ViewerResponse> = serde_json::from_value(raw).unwrap();
        let errors = parsed.errors.unwrap();
        assert_eq!(errors[0].message, "not found");
    }

    #[test]
    fn test_create_comment_input_renames_issue_id() {
        let input = CreateCommentInput { issue_id: "i1", body: "hello" };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["issueId"], "i1");
        assert_eq!(value["body"], "hello");
    }
}
