use super::{cache_key, into_page, ApiClient, Empty};
use crate::cache::{Tag, TagKind};
use crate::error::Result;
use crate::models::{Page, UpdateUserInput, User, UserQuery};
use reqwest::Method;

impl ApiClient {
    pub async fn list_users(&self, query: &UserQuery) -> Result<Page<User>> {
        let response = self
            .query::<Vec<User>, _>(
                cache_key("users", query),
                vec![Tag::all(TagKind::Users)],
                &["users"],
                Some(query),
            )
            .await?;
        Ok(into_page(response))
    }

    pub async fn get_user(&self, id: &str) -> Result<User> {
        let response = self
            .query::<User, ()>(
                format!("users/{}", id),
                vec![Tag::id(TagKind::Users, id)],
                &["users", id],
                None,
            )
            .await?;
        Ok(response.data)
    }

    pub async fn update_user(&self, id: &str, input: &UpdateUserInput) -> Result<User> {
        let response = self
            .mutate::<User, _>(
                Method::PATCH,
                &["users", id],
                Some(input),
                &[Tag::id(TagKind::Users, id), Tag::all(TagKind::Users)],
            )
            .await?;
        Ok(response.data)
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        self.mutate::<Empty, ()>(Method::DELETE, &["users", id], None, &[Tag::all(TagKind::Users)])
            .await?;
        Ok(())
    }
}
