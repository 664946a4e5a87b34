//! Rendering of tasks and task list views

use chrono::{DateTime, Utc};
use serde::Serialize;

use hk_core::sync::{Freshness, TaskListView};
use hk_core::task::{CleaningTask, PageMeta};

#[derive(Debug, Serialize)]
struct TaskRow<'a> {
    id: u64,
    room: &'a str,
    floor: Option<i32>,
    room_type: Option<&'a str>,
    priority: Option<&'static str>,
    assignee: Option<&'a str>,
    status: &'static str,
    started_at: String,
    finished_at: Option<String>,
    notes: Option<&'a str>,
}

impl<'a> From<&'a CleaningTask> for TaskRow<'a> {
    fn from(task: &'a CleaningTask) -> Self {
        Self {
            id: task.id,
            room: &task.room.number,
            floor: task.room.floor,
            room_type: task.room.type_name.as_deref(),
            priority: task.priority.map(|p| p.as_str()),
            assignee: task.assignee.as_ref().map(|u| u.name.as_str()),
            status: task.status().name(),
            started_at: timestamp(&task.started_at),
            finished_at: task.finished_at.as_ref().map(timestamp),
            notes: task.notes.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ListOutput<'a> {
    data: Vec<TaskRow<'a>>,
    #[serde(flatten)]
    meta: Option<&'a PageMeta>,
}

fn timestamp(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

pub fn print_task(task: &CleaningTask, json: bool) -> anyhow::Result<()> {
    let row = TaskRow::from(task);
    if json {
        println!("{}", serde_json::to_string_pretty(&row)?);
    } else {
        println!("{}", format_row(&row));
    }
    Ok(())
}

pub fn print_view(view: &TaskListView, json: bool) -> anyhow::Result<()> {
    let rows: Vec<TaskRow<'_>> = view.records.iter().map(TaskRow::from).collect();
    if json {
        let out = ListOutput {
            data: rows,
            meta: view.meta.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{:>6}  {:<6} {:>5}  {:<8} {:<16} {:<7} {:<16} {:<16}",
        "ID", "ROOM", "FLOOR", "PRIORITY", "ASSIGNEE", "STATUS", "STARTED", "FINISHED"
    );
    for row in &rows {
        println!("{}", format_row(row));
    }
    if let Some(meta) = &view.meta {
        let range = match (meta.from, meta.to) {
            (Some(from), Some(to)) => format!("{from}-{to}"),
            _ => "0".to_string(),
        };
        println!(
            "page {}/{} ({} of {}){}",
            meta.current_page,
            meta.last_page,
            range,
            meta.total,
            if view.freshness == Freshness::Settled { "" } else { " loading" }
        );
    }
    Ok(())
}

fn format_row(row: &TaskRow<'_>) -> String {
    format!(
        "{:>6}  {:<6} {:>5}  {:<8} {:<16} {:<7} {:<16} {:<16}",
        row.id,
        row.room,
        row.floor.map(|f| f.to_string()).unwrap_or_default(),
        row.priority.unwrap_or("-"),
        row.assignee.unwrap_or("-"),
        row.status,
        row.started_at,
        row.finished_at.as_deref().unwrap_or("-"),
    )
}
