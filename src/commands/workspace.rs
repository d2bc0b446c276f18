use anyhow::{bail, Result};

use crate::client::{Client, WorkspacePatch};
use crate::models::{Label, Role};
use crate::page::Pager;
use crate::view::View;

use super::{confirm, surface, truncate};

pub fn list(client: &mut Client, page: u64, limit: u64) -> Result<()> {
    let pager = Pager::new(page, limit);
    let mut view = View::new();
    let listing = match view.load(|| client.list_workspaces(pager)) {
        Ok(listing) => listing,
        Err(e) => return Err(surface(client, e)),
    };

    if listing.items.is_empty() {
        println!("No workspaces on page {}.", pager.page);
    } else {
        for ws in &listing.items {
            println!(
                "#{:<4} {:<30} {:>3} member(s) {:>3} project(s)",
                ws.id,
                truncate(&ws.name, 30),
                ws.member_count,
                ws.project_count
            );
        }
    }

    let info = listing.info;
    if info.total_pages > 1 {
        println!();
        println!("Page {} of {} ({} total)", info.page, info.total_pages, info.total);
        if info.has_next() {
            println!("More: --page {}", info.page + 1);
        }
    }

    Ok(())
}

pub fn show(client: &mut Client, id: i64) -> Result<()> {
    let mut view = View::new();
    let ws = match view.load(|| client.get_workspace(id)) {
        Ok(ws) => ws,
        Err(e) => return Err(surface(client, e)),
    };

    println!("Workspace #{}: {}", ws.id, ws.name);
    if !ws.description.is_empty() {
        println!("{}", ws.description);
    }
    if let Some(created) = ws.created_at {
        println!("Created: {}", created.format("%Y-%m-%d"));
    }

    println!("\nMembers ({}):", ws.memberships.len());
    for member in &ws.memberships {
        println!("  @{:<16} {:<8} {}", member.user_name, member.role, member.full_name);
    }

    println!("\nProjects ({}):", ws.projects.len());
    for project in &ws.projects {
        println!("  #{:<4} {}", project.id, truncate(&project.name, 40));
    }

    Ok(())
}

pub fn create(client: &mut Client, name: &str, description: Option<&str>) -> Result<()> {
    let mut view = View::new();
    match view.mutate(|| client.create_workspace(name, description.unwrap_or_default())) {
        Ok(ws) => {
            println!("Created workspace #{}: {}", ws.id, ws.name);
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

pub fn update(
    client: &mut Client,
    id: i64,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    if name.is_none() && description.is_none() {
        bail!("Nothing to update. Use --name or --description");
    }

    let patch = WorkspacePatch {
        name: name.map(str::to_string),
        description: description.map(str::to_string),
    };

    let mut view = View::new();
    match view.mutate(|| client.update_workspace(id, &patch)) {
        Ok(ws) => {
            println!("Updated workspace #{}", ws.id);
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

pub fn delete(client: &mut Client, id: i64, force: bool) -> Result<()> {
    if !force && !confirm(&format!("Delete workspace #{} and all of its projects?", id))? {
        println!("Aborted");
        return Ok(());
    }

    let mut view = View::new();
    match view.mutate(|| client.delete_workspace(id)) {
        Ok(()) => {
            println!("Deleted workspace #{}", id);
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

pub fn invite(client: &mut Client, id: i64, username: &str) -> Result<()> {
    let mut view = View::new();
    match view.mutate(|| client.invite(id, username)) {
        Ok(()) => {
            println!("Invited @{} to workspace #{}", username, id);
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

pub fn kick(client: &mut Client, id: i64, username: &str) -> Result<()> {
    let mut view = View::new();
    match view.mutate(|| client.kick(id, username)) {
        Ok(()) => {
            println!("Removed @{} from workspace #{}", username, id);
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

pub fn labels(client: &mut Client, id: i64) -> Result<()> {
    let mut view = View::new();
    let labels = match view.load(|| client.list_labels(id)) {
        Ok(labels) => labels,
        Err(e) => return Err(surface(client, e)),
    };

    if labels.is_empty() {
        println!("No labels in workspace #{}.", id);
        return Ok(());
    }
    for label in labels {
        println!("#{:<4} {:<16} {}", label.id, label.text, label.color);
    }
    Ok(())
}

pub fn add_label(client: &mut Client, id: i64, text: &str, color: &str) -> Result<()> {
    let mut view = View::new();
    match view.mutate(|| client.create_label(id, text, color)) {
        Ok(label) => {
            println!("Created label #{} ({})", label.id, label.text);
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

/// Labels update via PUT, which replaces, so unset fields are seeded
/// from the current record.
fn label_replacement(current: &Label, text: Option<&str>, color: Option<&str>) -> (String, String) {
    (
        text.unwrap_or(&current.text).to_string(),
        color.unwrap_or(&current.color).to_string(),
    )
}

pub fn edit_label(
    client: &mut Client,
    workspace: i64,
    label_id: i64,
    text: Option<&str>,
    color: Option<&str>,
) -> Result<()> {
    if text.is_none() && color.is_none() {
        bail!("Nothing to update. Use --text or --color");
    }

    let mut view = View::new();
    let labels = match view.load(|| client.list_labels(workspace)) {
        Ok(labels) => labels,
        Err(e) => return Err(surface(client, e)),
    };
    let Some(current) = labels.iter().find(|l| l.id == label_id) else {
        bail!("No label #{} in workspace #{}", label_id, workspace);
    };

    let (text, color) = label_replacement(current, text, color);
    match view.mutate(|| client.update_label(label_id, &text, &color)) {
        Ok(label) => {
            println!("Updated label #{} ({}, {})", label.id, label.text, label.color);
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

pub fn remove_label(client: &mut Client, label_id: i64) -> Result<()> {
    let mut view = View::new();
    match view.mutate(|| client.delete_label(label_id)) {
        Ok(()) => {
            println!("Deleted label #{}", label_id);
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

pub fn role(client: &mut Client, id: i64, username: &str, role: &str) -> Result<()> {
    let Some(parsed) = Role::parse(role) else {
        bail!(
            "Invalid role '{}'. Must be one of: owner, admin, editor, viewer",
            role
        );
    };

    let mut view = View::new();
    match view.mutate(|| client.change_role(id, username, parsed.as_str())) {
        Ok(()) => {
            println!("@{} is now {} in workspace #{}", username, parsed, id);
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}
