//! Heuristic task classification: type, complexity, priority.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::{Comment, Issue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    BugFix,
    Feature,
    Refactor,
    Test,
    Docs,
    Review,
    Perf,
    Other,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::BugFix => "bug_fix",
            TaskType::Feature => "feature",
            TaskType::Refactor => "refactor",
            TaskType::Test => "test",
            TaskType::Docs => "docs",
            TaskType::Review => "review",
            TaskType::Perf => "perf",
            TaskType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Direct,
    Split,
    Parallel,
    Codegen,
    Selective,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Classification {
    pub task_type: TaskType,
    pub complexity: u8,
    pub priority: Priority,
}

const COMPLEXITY_KEYWORDS: &[&str] = &["auth", "migration", "concurrency", "perf", "security"];
const TRIVIAL_KEYWORDS: &[&str] = &["typo", "comment"];
const HIGH_PRIORITY_LABELS: &[&str] = &["urgent", "critical", "p0"];
const CRITICAL_PRIORITY_LABELS: &[&str] = &["critical", "p0", "outage"];

pub fn classify(issue: &Issue, comment: Option<&Comment>) -> Classification {
    let text = format!(
        "{} {} {}",
        issue.title,
        issue.description,
        comment.map(|c| c.body.as_str()).unwrap_or("")
    )
    .to_lowercase();

    Classification {
        task_type: classify_task_type(&text, &issue.labels),
        complexity: score_complexity(&text, issue),
        priority: score_priority(&text, &issue.labels),
    }
}

fn classify_task_type(text: &str, labels: &[String]) -> TaskType {
    let labels_lower: Vec<String> = labels.iter().map(|l| l.to_lowercase()).collect();

    let has_any = |needles: &[&str]| {
        needles.iter().any(|n| text.contains(n) || labels_lower.iter().any(|l| l == n))
    };

    if has_any(&["bug", "fix", "broken", "crash", "error"]) {
        TaskType::BugFix
    } else if has_any(&["perf", "performance", "slow", "optimize", "bottleneck"]) {
        TaskType::Perf
    } else if has_any(&["refactor", "cleanup", "restructure"]) {
        TaskType::Refactor
    } else if has_any(&["test", "coverage", "spec"]) {
        TaskType::Test
    } else if has_any(&["docs", "documentation", "readme"]) {
        TaskType::Docs
    } else if has_any(&["review", "pr review"]) {
        TaskType::Review
    } else if has_any(&["feature", "implement", "add support"]) {
        TaskType::Feature
    } else {
        TaskType::Other
    }
}

fn score_complexity(text: &str, issue: &Issue) -> u8 {
    let mut score: i32 = 5;

    score += COMPLEXITY_KEYWORDS.iter().filter(|kw| text.contains(*kw)).count() as i32;

    if issue.description.len() > 500 {
        score += 1;
    }

    if issue.labels.len() > 2 {
        score += 1;
    }

    score -= TRIVIAL_KEYWORDS.iter().filter(|kw| text.contains(*kw)).count() as i32;

    score.clamp(1, 10) as u8
}

fn score_priority(text: &str, labels: &[String]) -> Priority {
    let labels_lower: Vec<String> = labels.iter().map(|l| l.to_lowercase()).collect();

    let label_hit = |needles: &[&str]| needles.iter().any(|n| labels_lower.iter().any(|l| l == n));

    if label_hit(CRITICAL_PRIORITY_LABELS) || text.contains("critical") || text.contains("outage") {
        Priority::Critical
    } else if label_hit(HIGH_PRIORITY_LABELS) || text.contains("urgent") {
        Priority::High
    } else {
        Priority::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(title: &str, description: &str, labels: Vec<&str>) -> Issue {
        Issue {
            id: "i1".to_string(),
            identifier: "ENG-1".to_string(),
            title: title.to_string(),
            description: description.to_string(),
            creator_id: "u1".to_string(),
            assignee_id: None,
            labels: labels.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_classify_bug_fix() {
        let classification = classify(&issue("Fix crash on startup", "", vec![]), None);
        assert_eq!(classification.task_type, TaskType::BugFix);
    }

    #[test]
    fn test_classify_feature() {
        let classification = classify(&issue("Implement SSO login", "", vec![]), None);
        assert_eq!(classification.task_type, TaskType::Feature);
    }

    #[test]
    fn test_complexity_base_score() {
        let classification = classify(&issue("Minor UI tweak", "", vec![]), None);
        assert_eq!(classification.complexity, 5);
    }

    #[test]
    fn test_complexity_rises_with_keyword_clusters() {
        let classification = classify(
            &issue("Improve auth and migration flow", "touches concurrency and perf and security", vec![]),
            None,
        );
        assert_eq!(classification.complexity, 10);
    }

    #[test]
    fn test_complexity_clamped_to_max() {
        let classification = classify(
            &issue(
                "auth migration concurrency perf security",
                "auth migration concurrency perf security",
                vec!["a", "b", "c"],
            ),
            None,
        );
        assert_eq!(classification.complexity, 10);
    }

    #[test]
    fn test_trivial_keyword_lowers_score() {
        let classification = classify(&issue("Fix typo in comment", "", vec![]), None);
        assert_eq!(classification.complexity, 3);
    }

    #[test]
    fn test_priority_critical_label() {
        let classification = classify(&issue("Outage in prod", "", vec!["P0"]), None);
        assert_eq!(classification.priority, Priority::Critical);
    }

    #[test]
    fn test_priority_defaults_to_normal() {
        let classification = classify(&issue("Small tweak", "", vec![]), None);
        assert_eq!(classification.priority, Priority::Normal);
    }
}
