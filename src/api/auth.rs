use super::{ApiClient, Empty};
use crate::cache::{Tag, TagKind};
use crate::error::Result;
use crate::models::{AuthPayload, ChangePasswordInput, LoginInput, RegisterInput, User};
use crate::session::Session;
use reqwest::Method;
use tracing::{info, warn};

impl ApiClient {
    pub async fn register(&self, input: &RegisterInput) -> Result<AuthPayload> {
        let response = self
            .mutate::<AuthPayload, _>(
                Method::POST,
                &["auth", "register"],
                Some(input),
                &[Tag::all(TagKind::Auth)],
            )
            .await?;
        self.adopt_session(&response.data);
        Ok(response.data)
    }

    pub async fn login(&self, input: &LoginInput) -> Result<AuthPayload> {
        let response = self
            .mutate::<AuthPayload, _>(
                Method::POST,
                &["auth", "login"],
                Some(input),
                &[Tag::all(TagKind::Auth)],
            )
            .await?;
        self.adopt_session(&response.data);
        Ok(response.data)
    }

    pub async fn current_user(&self) -> Result<User> {
        let response = self
            .query::<User, ()>(
                "auth/me".to_string(),
                vec![Tag::all(TagKind::Auth)],
                &["auth", "me"],
                None,
            )
            .await?;
        Ok(response.data)
    }

    pub async fn change_password(&self, input: &ChangePasswordInput) -> Result<()> {
        self.mutate::<Empty, _>(Method::POST, &["auth", "change-password"], Some(input), &[])
            .await?;
        info!("Password changed");
        Ok(())
    }

    /// Forget the token locally and drop everything cached under it
    pub fn logout(&self) -> Result<()> {
        self.set_token(None);
        self.cache().clear();
        if let Some(session) = self.session() {
            session.clear()?;
        }
        Ok(())
    }

    /// Use the freshly issued token and persist it when a store is attached
    fn adopt_session(&self, payload: &AuthPayload) {
        self.set_token(Some(payload.token.clone()));
        if let Some(store) = self.session() {
            let session = Session::new(payload.token.clone(), Some(payload.user.email.clone()));
            if let Err(e) = store.save(&session) {
                warn!("Logged in but could not persist the session: {}", e);
            }
        }
    }
}
