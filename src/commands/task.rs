use anyhow::{bail, Result};

use crate::board::Board;
use crate::client::{Client, TaskDraft, TaskPatch};
use crate::models::{Task, TaskStatus};
use crate::page::{PageInfo, Pager};
use crate::view::View;

use super::{confirm, surface, truncate};

/// Fills in the documented defaults for a new task: empty description,
/// NOT_STARTED, no label, and an order appended to the target column
/// (0 when the column is empty).
fn draft_for(
    tasks: &[Task],
    title: &str,
    description: Option<&str>,
    status: TaskStatus,
    assignees: Vec<i64>,
    label: Option<i64>,
) -> TaskDraft {
    let board = Board::new(tasks.to_vec());
    TaskDraft {
        title: title.to_string(),
        description: description.unwrap_or_default().to_string(),
        status,
        order: board.next_order(status),
        assignees,
        label,
    }
}

#[allow(clippy::too_many_arguments)]
pub fn create(
    client: &mut Client,
    project: i64,
    title: &str,
    description: Option<&str>,
    status: Option<&str>,
    assignees: Vec<i64>,
    label: Option<i64>,
) -> Result<()> {
    let status = match status {
        Some(s) => match TaskStatus::parse(s) {
            Some(status) => status,
            None => bail!(
                "Invalid status '{}'. Must be one of: not-started, ongoing, in-review",
                s
            ),
        },
        None => TaskStatus::NotStarted,
    };

    let mut view = View::new();
    let detail = match view.load(|| client.get_project(project)) {
        Ok(p) => p,
        Err(e) => return Err(surface(client, e)),
    };

    let draft = draft_for(&detail.tasks, title, description, status, assignees, label);
    match view.mutate(|| client.create_task(project, &draft)) {
        Ok(task) => {
            println!(
                "Created task #{} in {} (position {})",
                task.id,
                task.status.label(),
                task.order
            );
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

pub fn update(
    client: &mut Client,
    id: i64,
    title: Option<&str>,
    description: Option<&str>,
    label: Option<i64>,
    assignees: Option<Vec<i64>>,
) -> Result<()> {
    let patch = TaskPatch {
        title: title.map(str::to_string),
        description: description.map(str::to_string),
        label,
        assignees,
        ..TaskPatch::default()
    };
    if patch.is_empty() {
        bail!("Nothing to update. Use --title, --description, --label, or --assignee");
    }

    let mut view = View::new();
    match view.mutate(|| client.update_task(id, &patch)) {
        Ok(task) => {
            println!("Updated task #{}", task.id);
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

pub fn delete(client: &mut Client, id: i64, force: bool) -> Result<()> {
    if !force && !confirm(&format!("Delete task #{}?", id))? {
        println!("Aborted");
        return Ok(());
    }

    let mut view = View::new();
    match view.mutate(|| client.delete_task(id)) {
        Ok(()) => {
            println!("Deleted task #{}", id);
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

pub fn archive(client: &mut Client, id: i64) -> Result<()> {
    let mut view = View::new();
    match view.mutate(|| client.archive_task(id)) {
        Ok(task) => {
            println!("Archived task #{} ({})", task.id, truncate(&task.title, 40));
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

pub fn unarchive(client: &mut Client, id: i64) -> Result<()> {
    let mut view = View::new();
    match view.mutate(|| client.unarchive_task(id)) {
        Ok(task) => {
            println!(
                "Unarchived task #{} (back in {})",
                task.id,
                task.status.label()
            );
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

/// Archived tasks are not exposed as a server-side listing, so the page
/// is cut locally from the project's task set.
fn archived_page(tasks: &[Task], pager: Pager) -> (Vec<&Task>, PageInfo) {
    let mut archived: Vec<&Task> = tasks.iter().filter(|t| t.archived).collect();
    archived.sort_by_key(|t| t.id);
    let info = PageInfo::new(pager, archived.len() as u64);
    let page = info.slice(&archived).to_vec();
    (page, info)
}

pub fn archived(client: &mut Client, project: i64, page: u64, limit: u64) -> Result<()> {
    let pager = Pager::new(page, limit);
    let mut view = View::new();
    let detail = match view.load(|| client.get_project(project)) {
        Ok(p) => p,
        Err(e) => return Err(surface(client, e)),
    };

    let (items, info) = archived_page(&detail.tasks, pager);
    if info.total == 0 {
        println!("No archived tasks in project #{}.", project);
        return Ok(());
    }
    if items.is_empty() {
        println!("No archived tasks on page {}.", info.page);
    }
    for task in items {
        let date = task
            .created_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!("#{:<4} {:<40} {}", task.id, truncate(&task.title, 40), date);
    }
    println!();
    println!("Page {} of {} ({} archived)", info.page, info.total_pages, info.total);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, status: TaskStatus, order: i64, archived: bool) -> Task {
        Task {
            id,
            title: format!("task {}", id),
            description: String::new(),
            status,
            order,
            assignees: Vec::new(),
            label: None,
            project: 1,
            archived,
            created_at: None,
        }
    }

    #[test]
    fn test_first_task_in_empty_column_gets_order_zero() {
        let draft = draft_for(&[], "New", None, TaskStatus::NotStarted, vec![], None);
        assert_eq!(draft.order, 0);
        assert_eq!(draft.description, "");
        assert_eq!(draft.status, TaskStatus::NotStarted);
    }

    #[test]
    fn test_new_task_appends_past_max_order() {
        let tasks = vec![
            task(1, TaskStatus::NotStarted, 0, false),
            task(2, TaskStatus::NotStarted, 1, false),
            task(3, TaskStatus::Ongoing, 0, false),
        ];
        let draft = draft_for(&tasks, "New", None, TaskStatus::NotStarted, vec![], None);
        assert_eq!(draft.order, 2);
    }

    #[test]
    fn test_archived_tasks_do_not_count_toward_order() {
        let tasks = vec![
            task(1, TaskStatus::Ongoing, 0, false),
            task(2, TaskStatus::Ongoing, 5, true),
        ];
        let draft = draft_for(&tasks, "New", None, TaskStatus::Ongoing, vec![], None);
        assert_eq!(draft.order, 1);
    }

    #[test]
    fn test_archived_page_filters_and_slices() {
        let tasks = vec![
            task(1, TaskStatus::NotStarted, 0, true),
            task(2, TaskStatus::NotStarted, 1, false),
            task(3, TaskStatus::Ongoing, 0, true),
            task(4, TaskStatus::InReview, 0, true),
        ];
        let (items, info) = archived_page(&tasks, Pager::new(1, 2));
        assert_eq!(info.total, 3);
        assert_eq!(info.total_pages, 2);
        let ids: Vec<i64> = items.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_archived_page_past_end_is_empty_with_same_totals() {
        let tasks = vec![task(1, TaskStatus::NotStarted, 0, true)];
        let (items, info) = archived_page(&tasks, Pager::new(5, 10));
        assert!(items.is_empty());
        assert_eq!(info.total, 1);
        assert_eq!(info.total_pages, 1);
    }
}
