//! User administration commands

use crate::api::ApiClient;
use crate::error::Result;
use crate::listing::UserFilter;
use crate::models::{UpdateUserInput, User, UserQuery};

/// Users are fetched in one large page and filtered locally
const USER_FETCH_LIMIT: u32 = 1000;

pub async fn cmd_list_users(client: &ApiClient, filter: &UserFilter) -> Result<Vec<User>> {
    let page = client
        .list_users(&UserQuery {
            page: Some(1),
            limit: Some(USER_FETCH_LIMIT),
            ..Default::default()
        })
        .await?;
    Ok(filter.apply(&page.items).into_iter().cloned().collect())
}

pub async fn cmd_show_user(client: &ApiClient, id: &str) -> Result<User> {
    client.get_user(id).await
}

pub async fn cmd_set_user_active(client: &ApiClient, id: &str, active: bool) -> Result<User> {
    client
        .update_user(
            id,
            &UpdateUserInput {
                is_active: Some(active),
                ..Default::default()
            },
        )
        .await
}

pub async fn cmd_delete_user(client: &ApiClient, id: &str) -> Result<()> {
    client.delete_user(id).await
}

pub fn print_users(users: &[User]) {
    println!("\n👥 Users\n");

    if users.is_empty() {
        println!("No users match.");
        return;
    }

    for user in users {
        let state = if user.is_active { "active" } else { "inactive" };
        println!("• {} <{}> [{}, {}]", user.display_name(), user.email, user.role, state);
        println!("  ID: {}", user.id);
    }
    println!("\n{} user(s)", users.len());
}
