use super::{cache_key, into_page, ApiClient, Empty};
use crate::cache::{Tag, TagKind};
use crate::error::{Error, Result};
use crate::models::{
    AddMemberInput, CreateWorkspaceInput, Page, UpdateMemberInput, UpdateWorkspaceInput,
    Workspace, WorkspaceMember, WorkspaceQuery,
};
use reqwest::Method;
use tracing::{debug, info};

fn member_tags(workspace_id: &str) -> [Tag; 2] {
    [
        Tag::id(TagKind::Workspaces, workspace_id),
        Tag::id(TagKind::WorkspaceMembers, workspace_id),
    ]
}

impl ApiClient {
    pub async fn list_workspaces(&self, query: &WorkspaceQuery) -> Result<Page<Workspace>> {
        let response = self
            .query::<Vec<Workspace>, _>(
                cache_key("workspaces", query),
                vec![Tag::all(TagKind::Workspaces)],
                &["workspaces"],
                Some(query),
            )
            .await?;
        Ok(into_page(response))
    }

    pub async fn get_workspace(&self, id: &str) -> Result<Workspace> {
        let response = self
            .query::<Workspace, ()>(
                format!("workspaces/{}", id),
                vec![Tag::id(TagKind::Workspaces, id)],
                &["workspaces", id],
                None,
            )
            .await?;
        Ok(response.data)
    }

    pub async fn create_workspace(&self, input: &CreateWorkspaceInput) -> Result<Workspace> {
        let response = self
            .mutate::<Workspace, _>(
                Method::POST,
                &["workspaces"],
                Some(input),
                &[Tag::all(TagKind::Workspaces)],
            )
            .await?;
        info!("Created workspace {} ({})", response.data.name, response.data.id);
        Ok(response.data)
    }

    pub async fn update_workspace(&self, id: &str, input: &UpdateWorkspaceInput) -> Result<Workspace> {
        let response = self
            .mutate::<Workspace, _>(
                Method::PATCH,
                &["workspaces", id],
                Some(input),
                &[Tag::id(TagKind::Workspaces, id), Tag::all(TagKind::Workspaces)],
            )
            .await?;
        Ok(response.data)
    }

    pub async fn delete_workspace(&self, id: &str) -> Result<()> {
        self.mutate::<Empty, ()>(
            Method::DELETE,
            &["workspaces", id],
            None,
            &[Tag::all(TagKind::Workspaces)],
        )
        .await?;
        info!("Deleted workspace {}", id);
        Ok(())
    }

    pub async fn list_members(&self, workspace_id: &str) -> Result<Vec<WorkspaceMember>> {
        let response = self
            .query::<Vec<WorkspaceMember>, ()>(
                format!("workspaces/{}/members", workspace_id),
                member_tags(workspace_id).to_vec(),
                &["workspaces", workspace_id, "members"],
                None,
            )
            .await?;
        Ok(response.data)
    }

    pub async fn add_member(&self, workspace_id: &str, input: &AddMemberInput) -> Result<WorkspaceMember> {
        let response = self
            .mutate::<WorkspaceMember, _>(
                Method::POST,
                &["workspaces", workspace_id, "members"],
                Some(input),
                &member_tags(workspace_id),
            )
            .await?;
        Ok(response.data)
    }

    pub async fn update_member(
        &self,
        workspace_id: &str,
        member_id: &str,
        input: &UpdateMemberInput,
    ) -> Result<WorkspaceMember> {
        let response = self
            .mutate::<WorkspaceMember, _>(
                Method::PATCH,
                &["workspaces", workspace_id, "members", member_id],
                Some(input),
                &member_tags(workspace_id),
            )
            .await?;
        Ok(response.data)
    }

    pub async fn remove_member(&self, workspace_id: &str, member_id: &str) -> Result<()> {
        self.mutate::<Empty, ()>(
            Method::DELETE,
            &["workspaces", workspace_id, "members", member_id],
            None,
            &member_tags(workspace_id),
        )
        .await?;
        Ok(())
    }

    /// Workspace to operate on: the explicit choice if given, otherwise the
    /// first workspace the user can see
    pub async fn resolve_workspace(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(id) = explicit.map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }

        let page = self
            .list_workspaces(&WorkspaceQuery {
                page: Some(1),
                limit: Some(1),
                ..Default::default()
            })
            .await?;
        let workspace = page.items.into_iter().next().ok_or(Error::NoWorkspace)?;
        debug!("Using workspace {} ({})", workspace.name, workspace.id);
        Ok(workspace.id)
    }
}
