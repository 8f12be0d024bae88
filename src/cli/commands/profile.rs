//! Profile command.

use anyhow::Result;

use crate::session::{load, Session};

pub async fn run(session: &Session) -> Result<()> {
    let user = session.user_id()?;
    let mut binding = session.bind_user(|resources, user| resources.user_profile(user));
    let profile = load(&mut binding).await?;

    println!("User:                {}", user);
    println!("Subscription tier:   {}", profile.subscription_tier);
    Ok(())
}
