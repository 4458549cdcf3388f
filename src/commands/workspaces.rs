//! Workspace and membership commands

use crate::api::ApiClient;
use crate::error::Result;
use crate::format::format_relative_now;
use crate::models::{
    AddMemberInput, CreateWorkspaceInput, UpdateMemberInput, UpdateWorkspaceInput, Workspace,
    WorkspaceMember, WorkspaceQuery, WorkspaceRole,
};
use crate::validate::validate_workspace_name;
use tracing::info;

pub async fn cmd_list_workspaces(
    client: &ApiClient,
    search: Option<String>,
    limit: u32,
) -> Result<Vec<Workspace>> {
    let page = client
        .list_workspaces(&WorkspaceQuery {
            page: Some(1),
            limit: Some(limit),
            search,
            is_active: None,
        })
        .await?;
    Ok(page.items)
}

pub async fn cmd_show_workspace(client: &ApiClient, id: &str) -> Result<Workspace> {
    client.get_workspace(id).await
}

pub async fn cmd_create_workspace(
    client: &ApiClient,
    name: &str,
    description: Option<String>,
) -> Result<Workspace> {
    validate_workspace_name(name)?;
    client
        .create_workspace(&CreateWorkspaceInput {
            name: name.trim().to_string(),
            description: description.filter(|d| !d.trim().is_empty()),
            ..Default::default()
        })
        .await
}

pub async fn cmd_update_workspace(
    client: &ApiClient,
    id: &str,
    input: UpdateWorkspaceInput,
) -> Result<Workspace> {
    if let Some(name) = &input.name {
        validate_workspace_name(name)?;
    }
    client.update_workspace(id, &input).await
}

pub async fn cmd_delete_workspace(client: &ApiClient, id: &str) -> Result<()> {
    info!("Deleting workspace {}", id);
    client.delete_workspace(id).await
}

pub async fn cmd_list_members(client: &ApiClient, workspace_id: &str) -> Result<Vec<WorkspaceMember>> {
    client.list_members(workspace_id).await
}

pub async fn cmd_add_member(
    client: &ApiClient,
    workspace_id: &str,
    user_id: &str,
    role: WorkspaceRole,
) -> Result<WorkspaceMember> {
    client
        .add_member(
            workspace_id,
            &AddMemberInput {
                user_id: user_id.to_string(),
                role,
            },
        )
        .await
}

pub async fn cmd_update_member(
    client: &ApiClient,
    workspace_id: &str,
    member_id: &str,
    role: WorkspaceRole,
) -> Result<WorkspaceMember> {
    client
        .update_member(workspace_id, member_id, &UpdateMemberInput { role })
        .await
}

pub async fn cmd_remove_member(client: &ApiClient, workspace_id: &str, member_id: &str) -> Result<()> {
    client.remove_member(workspace_id, member_id).await
}

pub fn print_workspaces(workspaces: &[Workspace]) {
    println!("\n🗂  Workspaces\n");

    if workspaces.is_empty() {
        println!("No workspaces yet. Use 'lectern workspaces create' to add one.");
        return;
    }

    for ws in workspaces {
        let state = if ws.is_active { "active" } else { "inactive" };
        println!("• {} [{}]", ws.name, state);
        println!("  ID: {}", ws.id);
        println!("  Slug: {}", ws.slug);
        if let Some(description) = &ws.description {
            println!("  {}", description);
        }
    }
}

pub fn print_workspace(ws: &Workspace) {
    println!("\n🗂  {}\n", ws.name);
    println!("ID: {}", ws.id);
    println!("Slug: {}", ws.slug);
    println!("Active: {}", if ws.is_active { "yes" } else { "no" });
    if let Some(description) = &ws.description {
        println!("Description: {}", description);
    }
    println!("Created: {}", format_relative_now(Some(&ws.created_at)));
}

pub fn print_members(members: &[WorkspaceMember]) {
    println!("\n👥 Members\n");

    if members.is_empty() {
        println!("No members.");
        return;
    }

    for member in members {
        println!("• {} <{}> [{}]", member.user.display_name(), member.user.email, member.role);
        println!("  Member ID: {}", member.id);
        println!("  Joined: {}", format_relative_now(Some(&member.joined_at)));
    }
}
