//! In-memory task list tool

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::Mutex;

use super::{ToolError, ToolTrait};

const USAGE: &str = "Unknown command. Use: add <title> | list | done <id> | remove <id>";

#[derive(Debug, Clone)]
struct Task {
    id: u32,
    title: String,
    done: bool,
}

#[derive(Debug, Default)]
struct TaskList {
    next_id: u32,
    tasks: Vec<Task>,
}

/// Manages a task list through `add`, `list`, `done` and `remove` commands
#[derive(Debug, Default)]
pub struct TaskManagerTool {
    list: Mutex<TaskList>,
}

impl TaskManagerTool {
    pub fn new() -> Self {
        Self::default()
    }
}

fn command_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)^\s*(add|list|done|complete|remove|delete)\b\s*(.*?)\s*$")
            .expect("valid task command regex")
    })
}

impl TaskList {
    fn add(&mut self, title: &str) -> String {
        if title.is_empty() {
            return "Task title is required.".to_string();
        }
        self.next_id += 1;
        self.tasks.push(Task {
            id: self.next_id,
            title: title.to_string(),
            done: false,
        });
        format!("Created task #{}: {}", self.next_id, title)
    }

    fn list(&self) -> String {
        if self.tasks.is_empty() {
            return "No tasks.".to_string();
        }
        self.tasks
            .iter()
            .map(|t| format!("#{} [{}] {}", t.id, if t.done { "x" } else { " " }, t.title))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn complete(&mut self, id: u32) -> String {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.done = true;
                format!("Completed task #{}: {}", id, task.title)
            }
            None => format!("Task #{} not found.", id),
        }
    }

    fn remove(&mut self, id: u32) -> String {
        match self.tasks.iter().position(|t| t.id == id) {
            Some(pos) => {
                let task = self.tasks.remove(pos);
                format!("Removed task #{}: {}", id, task.title)
            }
            None => format!("Task #{} not found.", id),
        }
    }
}

fn parse_id(arg: &str) -> Option<u32> {
    arg.trim_start_matches('#').parse().ok()
}

#[async_trait]
impl ToolTrait for TaskManagerTool {
    fn name(&self) -> &str {
        "task_manager"
    }

    fn description(&self) -> &str {
        "Manage a task list. Input is a command: 'add <title>', 'list', 'done <id>' or 'remove <id>'."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "input": { "type": "string", "description": "Task command" }
            },
            "required": ["input"]
        })
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let Some(caps) = command_pattern().captures(input) else {
            return Ok(USAGE.to_string());
        };
        let command = caps[1].to_lowercase();
        let arg = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

        let mut list = self.list.lock().await;
        Ok(match command.as_str() {
            "add" => list.add(arg),
            "list" => list.list(),
            "done" | "complete" => match parse_id(arg) {
                Some(id) => list.complete(id),
                None => USAGE.to_string(),
            },
            "remove" | "delete" => match parse_id(arg) {
                Some(id) => list.remove(id),
                None => USAGE.to_string(),
            },
            _ => USAGE.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_task_lifecycle() {
        let tool = TaskManagerTool::new();

        assert_eq!(tool.invoke("list").await.unwrap(), "No tasks.");
        assert_eq!(
            tool.invoke("add Design schema").await.unwrap(),
            "Created task #1: Design schema"
        );
        assert_eq!(
            tool.invoke("ADD Build API").await.unwrap(),
            "Created task #2: Build API"
        );
        assert_eq!(
            tool.invoke("done #1").await.unwrap(),
            "Completed task #1: Design schema"
        );
        assert_eq!(
            tool.invoke("list").await.unwrap(),
            "#1 [x] Design schema\n#2 [ ] Build API"
        );
        assert_eq!(
            tool.invoke("remove 2").await.unwrap(),
            "Removed task #2: Build API"
        );
        assert_eq!(tool.invoke("remove 2").await.unwrap(), "Task #2 not found.");
    }

    #[tokio::test]
    async fn test_bad_commands_return_usage() {
        let tool = TaskManagerTool::new();
        assert_eq!(tool.invoke("explode").await.unwrap(), USAGE);
        assert_eq!(tool.invoke("done soon").await.unwrap(), USAGE);
        assert_eq!(tool.invoke("add").await.unwrap(), "Task title is required.");
    }
}
