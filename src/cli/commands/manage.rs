//! Market membership commands.

use anyhow::{bail, Context, Result};
use lolmarket_core::types::SubscriptionTier;
use tracing::debug;

use crate::cli::{render, CreateArgs, DeleteArgs, JoinArgs, KickArgs};
use crate::session::{into_value, load, Session};

pub async fn create(args: CreateArgs, session: &Session) -> Result<()> {
    let user = session.user_id()?;
    let (tier, joined) = plan_usage(session, &user).await?;

    let created = session
        .actions
        .create_market(&user, &args.name, tier, joined)
        .await
        .context("Failed to create market")?;
    session.markets.settled().await;

    println!(
        "Created market {}",
        created.name.as_deref().unwrap_or(args.name.trim())
    );
    if let Some(code) = &created.invite_code {
        println!("Invite code: {}", code);
    }
    Ok(())
}

pub async fn join(args: JoinArgs, session: &Session) -> Result<()> {
    let user = session.user_id()?;
    let (tier, joined) = plan_usage(session, &user).await?;

    let ack = session
        .actions
        .join_market(&user, &args.invite_code, tier, joined)
        .await
        .context("Failed to join market")?;
    session.markets.settled().await;

    println!("{}", ack.message.as_deref().unwrap_or("Joined market"));
    Ok(())
}

pub async fn leave(session: &Session) -> Result<()> {
    let user = session.user_id()?;
    let market = session.market().await?;

    session
        .actions
        .leave_market(&user, market.id)
        .await
        .with_context(|| format!("Failed to leave {}", market.name))?;
    session.markets.settled().await;

    println!("Left market {}", market.name);
    Ok(())
}

pub async fn delete(args: DeleteArgs, session: &Session) -> Result<()> {
    let user = session.user_id()?;
    let market = session.market().await?;
    if !args.confirm {
        bail!(
            "Deleting {} removes it for every member. Re-run with --confirm",
            market.name
        );
    }

    session
        .actions
        .delete_market(&user, market.id)
        .await
        .with_context(|| format!("Failed to delete {}", market.name))?;
    session.markets.settled().await;

    println!("Deleted market {}", market.name);
    Ok(())
}

pub async fn members(session: &Session) -> Result<()> {
    let user = session.user_id()?;
    session.market().await?;
    let mut binding = session.bind_market(
        |resources, id| resources.market_members(id),
        session.options(),
    );
    let members = load(&mut binding).await?;

    print!("{}", render::members(&members, &user));
    Ok(())
}

pub async fn kick(args: KickArgs, session: &Session) -> Result<()> {
    let user = session.user_id()?;
    let market = session.market().await?;
    if args.member_id == user {
        bail!("Use `leave` or `delete-market` to remove yourself");
    }

    session
        .actions
        .kick_member(&user, market.id, &args.member_id)
        .await
        .with_context(|| format!("Failed to remove {}", args.member_id))?;

    println!("Removed {} from {}", args.member_id, market.name);
    Ok(())
}

/// The user's tier and how many markets they are already in.
async fn plan_usage(session: &Session, user: &str) -> Result<(SubscriptionTier, usize)> {
    let mut binding = session.bind_user(|resources, user| resources.user_profile(user));
    let profile = load(&mut binding).await?;

    session.markets.ready().await;
    let markets = into_value(session.markets.markets()).context("Failed to load your markets")?;
    debug!(user, tier = %profile.subscription_tier, joined = markets.len(), "plan usage");
    Ok((profile.subscription_tier, markets.len()))
}
