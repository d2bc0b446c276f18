use anyhow::{bail, Result};

use crate::client::{Client, ProjectPatch};
use crate::models::TaskStatus;
use crate::view::View;

use super::{confirm, surface};

pub fn show(client: &mut Client, id: i64) -> Result<()> {
    let mut view = View::new();
    let project = match view.load(|| client.get_project(id)) {
        Ok(p) => p,
        Err(e) => return Err(surface(client, e)),
    };

    println!("Project #{}: {}", project.id, project.name);
    if !project.description.is_empty() {
        println!("{}", project.description);
    }
    if !project.goal.is_empty() {
        println!("Goal: {}", project.goal);
    }

    let active = project.tasks.iter().filter(|t| !t.archived).count();
    let archived = project.tasks.len() - active;
    print!("Tasks: {} active", active);
    for status in TaskStatus::ALL {
        let n = project
            .tasks
            .iter()
            .filter(|t| !t.archived && t.status == status)
            .count();
        print!(", {} {}", n, status.label().to_lowercase());
    }
    println!(" ({} archived)", archived);

    Ok(())
}

pub fn create(
    client: &mut Client,
    workspace: i64,
    name: &str,
    description: Option<&str>,
    goal: Option<&str>,
) -> Result<()> {
    let mut view = View::new();
    match view.mutate(|| {
        client.add_project(
            workspace,
            name,
            description.unwrap_or_default(),
            goal.unwrap_or_default(),
        )
    }) {
        Ok(project) => {
            println!("Created project #{} in workspace #{}", project.id, workspace);
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
    goal: Option<&str>,
) -> Result<()> {
    if name.is_none() && description.is_none() && goal.is_none() {
        bail!("Nothing to update. Use --name, --description, or --goal");
    }

    let patch = ProjectPatch {
        name: name.map(str::to_string),
        description: description.map(str::to_string),
        goal: goal.map(str::to_string),
    };

    let mut view = View::new();
    match view.mutate(|| client.update_project(id, &patch)) {
        Ok(project) => {
            println!("Updated project #{}", project.id);
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

pub fn delete(client: &mut Client, id: i64, force: bool) -> Result<()> {
    if !force && !confirm(&format!("Delete project #{} and all of its tasks?", id))? {
        println!("Aborted");
        return Ok(());
    }

    let mut view = View::new();
    match view.mutate(|| client.delete_project(id)) {
        Ok(()) => {
            println!("Deleted project #{}", id);
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}
