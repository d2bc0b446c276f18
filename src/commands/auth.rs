use anyhow::{bail, Result};
use std::path::Path;

use crate::client::{ApiError, Client};
use crate::view::View;

use super::surface;

pub fn login(client: &mut Client, username: &str, password: &str) -> Result<()> {
    let mut view = View::new();
    match view.mutate(|| client.login(username, password)) {
        Ok(user) => {
            println!("Logged in as {} (@{})", user.full_name, user.username);
            Ok(())
        }
        Err(ApiError::Unauthenticated) => bail!("Invalid username or password"),
        Err(e) => Err(surface(client, e)),
    }
}

pub fn register(client: &mut Client, username: &str, full_name: &str, password: &str) -> Result<()> {
    let mut view = View::new();
    match view.mutate(|| client.register(username, full_name, password)) {
        Ok(user) => {
            println!("Registered @{}", user.username);
            println!("Next: taskdeck login {}", user.username);
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

/// Clears the stored session even when the backend is unreachable.
pub fn logout(client: &mut Client) -> Result<()> {
    let mut view = View::new();
    match view.mutate(|| client.logout()) {
        Ok(()) => {
            println!("Logged out");
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

pub fn whoami(client: &mut Client) -> Result<()> {
    let mut view = View::new();
    match view.load(|| client.me()) {
        Ok(user) => {
            println!("@{} ({})", user.username, user.full_name);
            if let Some(avatar) = &user.avatar_url {
                println!("avatar: {}", avatar);
            }
            Ok(())
        }
        Err(e) => Err(surface(client, e)),
    }
}

pub fn profile(client: &mut Client, name: Option<&str>, avatar: Option<&Path>) -> Result<()> {
    if name.is_none() && avatar.is_none() {
        bail!("Nothing to update. Use --name or --avatar");
    }

    let mut view = View::new();

    if let Some(name) = name {
        match view.mutate(|| client.update_profile(name)) {
            Ok(user) => println!("Display name is now '{}'", user.full_name),
            Err(e) => return Err(surface(client, e)),
        }
    }

    if let Some(path) = avatar {
        match view.mutate(|| client.upload_avatar(path)) {
            Ok(user) => match user.avatar_url {
                Some(url) => println!("Avatar updated: {}", url),
                None => println!("Avatar updated"),
            },
            Err(e) => return Err(surface(client, e)),
        }
    }

    Ok(())
}
