//! Account commands

use crate::api::ApiClient;
use crate::error::Result;
use crate::format::format_relative_now;
use crate::models::{AuthPayload, ChangePasswordInput, LoginInput, UpdateUserInput, User};
use crate::validate::{validate_change_password, validate_login, validate_profile, RegisterForm};
use tracing::info;

pub async fn cmd_login(client: &ApiClient, email: &str, password: &str) -> Result<AuthPayload> {
    let input = LoginInput {
        email: email.trim().to_string(),
        password: password.to_string(),
    };
    validate_login(&input)?;
    info!("Signing in as {}", input.email);
    client.login(&input).await
}

pub async fn cmd_register(client: &ApiClient, form: RegisterForm) -> Result<AuthPayload> {
    let input = form.into_input()?;
    info!("Registering {}", input.email);
    client.register(&input).await
}

pub fn cmd_logout(client: &ApiClient) -> Result<()> {
    client.logout()
}

pub async fn cmd_whoami(client: &ApiClient) -> Result<User> {
    client.current_user().await
}

pub async fn cmd_change_password(client: &ApiClient, current: &str, new: &str) -> Result<()> {
    let input = ChangePasswordInput {
        current_password: current.to_string(),
        new_password: new.to_string(),
    };
    validate_change_password(&input)?;
    client.change_password(&input).await
}

/// Update the signed-in user's own profile
pub async fn cmd_update_profile(client: &ApiClient, input: UpdateUserInput) -> Result<User> {
    validate_profile(&input)?;
    let me = client.current_user().await?;
    let input = UpdateUserInput {
        avatar: input.avatar.map(|a| a.trim().to_string()),
        ..input
    };
    client.update_user(&me.id, &input).await
}

pub fn print_auth(payload: &AuthPayload) {
    println!("✓ Signed in as {}", payload.user.display_name());
    println!("  Email: {}", payload.user.email);
    println!("  Role: {}", payload.user.role);
}

pub fn print_user(user: &User) {
    println!("\n👤 {}\n", user.display_name());
    println!("ID: {}", user.id);
    println!("Email: {}", user.email);
    println!("Role: {}", user.role);
    println!(
        "Active: {} · Email verified: {}",
        if user.is_active { "yes" } else { "no" },
        if user.email_verified { "yes" } else { "no" }
    );
    if let Some(avatar) = &user.avatar {
        println!("Avatar: {}", avatar);
    }
    println!("Joined: {}", format_relative_now(Some(&user.created_at)));
}
