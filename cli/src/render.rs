//! Plain-text output

use std::fmt::Write;

use dotask_core::task::{Task, TaskFilter, TaskStats};

fn task_line(task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    let mut line = format!(
        "[{}] {:>4}  {:<6}  {}",
        mark,
        task.id,
        task.priority.as_str(),
        task.title
    );
    if let Some(due) = task.due_date {
        let _ = write!(line, "  (due {})", due.format("%Y-%m-%d"));
    }
    if let Some(done) = task.completed_at {
        let _ = write!(line, "  (done {})", done.format("%Y-%m-%d %H:%M"));
    }
    line
}

pub fn task_table(tasks: &[Task], filter: TaskFilter) -> String {
    if tasks.is_empty() {
        return format!("No {} tasks\n", filter);
    }
    let mut out = String::new();
    for task in tasks {
        out.push_str(&task_line(task));
        out.push('\n');
        if !task.description.is_empty() {
            let _ = writeln!(out, "          {}", task.description);
        }
    }
    out
}

pub fn dashboard(stats: &TaskStats) -> String {
    format!(
        "Total: {}  Pending: {}  Completed: {}  High priority: {}  Done: {}%\n",
        stats.total,
        stats.pending,
        stats.completed,
        stats.high_priority,
        stats.completion_percentage()
    )
}
