use anyhow::{bail, Result};

use crate::board::{apply_drop, Board, DropError, DropOutcome, DropTarget};
use crate::client::Client;
use crate::models::TaskStatus;
use crate::view::View;

use super::{surface, truncate};

pub fn show(client: &mut Client, project: i64) -> Result<()> {
    let mut view = View::new();
    let detail = match view.load(|| client.get_project(project)) {
        Ok(p) => p,
        Err(e) => return Err(surface(client, e)),
    };

    println!("Board: {}", detail.name);
    let board = Board::new(detail.tasks);
    for status in TaskStatus::ALL {
        let column = board.column(status);
        println!("\n{} ({})", status.label(), column.len());
        if column.is_empty() {
            println!("  (empty)");
        }
        for task in column {
            let label = task
                .label
                .map(|l| format!(" [label {}]", l))
                .unwrap_or_default();
            println!("  #{:<4} {}{}", task.id, truncate(&task.title, 48), label);
        }
    }

    Ok(())
}

/// Resolves the CLI flags into a drop target: a column name or another
/// task the card was released on.
fn parse_target(to: Option<&str>, onto: Option<i64>) -> Result<DropTarget> {
    match (to, onto) {
        (Some(_), Some(_)) => bail!("Use either --to or --onto, not both"),
        (None, None) => bail!("Specify a destination with --to <column> or --onto <task>"),
        (Some(column), None) => match TaskStatus::parse(column) {
            Some(status) => Ok(DropTarget::Column(status)),
            None => bail!(
                "Unknown column '{}'. Must be one of: not-started, ongoing, in-review",
                column
            ),
        },
        (None, Some(id)) => Ok(DropTarget::OnTask(id)),
    }
}

pub fn move_task(
    client: &mut Client,
    project: i64,
    task: i64,
    to: Option<&str>,
    onto: Option<i64>,
) -> Result<()> {
    let target = parse_target(to, onto)?;

    let mut view = View::new();
    let detail = match view.load(|| client.get_project(project)) {
        Ok(p) => p,
        Err(e) => return Err(surface(client, e)),
    };
    let mut board = Board::new(detail.tasks);

    match view.mutate(|| apply_drop(&mut board, &*client, task, target)) {
        Ok(DropOutcome::NoOp) => {
            println!("Task #{} is already in that column; nothing to do", task);
            Ok(())
        }
        Ok(DropOutcome::Moved(moved)) => {
            println!(
                "Moved task #{} to {} (position {})",
                moved.id,
                moved.status.label(),
                moved.order
            );
            Ok(())
        }
        Err(DropError::Api(e)) => Err(surface(client, e)),
        Err(DropError::Move(e)) => bail!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_column() {
        assert_eq!(
            parse_target(Some("ongoing"), None).unwrap(),
            DropTarget::Column(TaskStatus::Ongoing)
        );
        assert_eq!(
            parse_target(Some("in-review"), None).unwrap(),
            DropTarget::Column(TaskStatus::InReview)
        );
    }

    #[test]
    fn test_parse_target_on_task() {
        assert_eq!(parse_target(None, Some(7)).unwrap(), DropTarget::OnTask(7));
    }

    #[test]
    fn test_parse_target_rejects_both_and_neither() {
        assert!(parse_target(Some("ongoing"), Some(7)).is_err());
        assert!(parse_target(None, None).is_err());
    }

    #[test]
    fn test_parse_target_rejects_unknown_column() {
        let err = parse_target(Some("done"), None).unwrap_err();
        assert!(err.to_string().contains("Unknown column"));
    }
}
