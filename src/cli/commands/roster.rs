//! Player roster commands.

use anyhow::{Context, Result};
use lolmarket_core::error::MarketError;
use lolmarket_core::types::MarketDetails;

use crate::cli::{PlayerArgs, PlayerCommand};
use crate::session::{load, Session};

pub async fn run(args: PlayerArgs, session: &Session) -> Result<()> {
    let user = session.user_id()?;
    let market = session.market().await?;
    let actions = &session.actions;

    let ack = match args.command {
        PlayerCommand::Add { tag, champion } => actions
            .add_player(&user, market.id, &tag, &champion)
            .await
            .with_context(|| format!("Failed to add {}", tag))?,
        PlayerCommand::Remove { tag } => {
            let player_id = player_id(session, &tag).await?;
            actions
                .remove_player(market.id, player_id)
                .await
                .with_context(|| format!("Failed to remove {}", tag))?
        }
        PlayerCommand::AddChampion { tag, champion } => {
            let player_id = player_id(session, &tag).await?;
            actions
                .add_champion(market.id, player_id, &champion)
                .await
                .with_context(|| format!("Failed to add {} to {}", champion, tag))?
        }
        PlayerCommand::RemoveChampion { tag, champion } => {
            let player_id = player_id(session, &tag).await?;
            actions
                .remove_champion(market.id, player_id, &champion)
                .await
                .with_context(|| format!("Failed to remove {} from {}", champion, tag))?
        }
    };

    println!("{}", ack.message.as_deref().unwrap_or("Roster updated"));
    Ok(())
}

/// Backend id of the player listed as `tag` in the selected market.
async fn player_id(session: &Session, tag: &str) -> Result<i64> {
    let mut binding = session.bind_market(
        |resources, id| resources.market_details(id),
        session.options(),
    );
    let details = load(&mut binding).await?;
    find_player(&details, tag).map_err(Into::into)
}

fn find_player(details: &MarketDetails, tag: &str) -> Result<i64, MarketError> {
    let tag = tag.trim();
    details
        .players
        .iter()
        .find(|player| player.player_tag.eq_ignore_ascii_case(tag))
        .map(|player| player.id)
        .ok_or_else(|| {
            MarketError::InvalidInput(format!("{} is not listed in {}", tag, details.name))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lolmarket_core::types::PlayerInMarket;

    fn details() -> MarketDetails {
        MarketDetails {
            id: 7,
            name: "Scrims".into(),
            invite_code: "X7K2QP".into(),
            creator_id: "u1".into(),
            tier: "free".into(),
            player_limit: 5,
            champions_per_player_limit: 3,
            players: vec![PlayerInMarket {
                id: 4,
                player_tag: "Faker#KR1".into(),
                champions: vec!["Ahri".into()],
            }],
        }
    }

    #[test]
    fn test_find_player_by_tag() {
        assert_eq!(find_player(&details(), " faker#kr1 ").unwrap(), 4);
        assert!(matches!(
            find_player(&details(), "Chovy#KR1"),
            Err(MarketError::InvalidInput(_))
        ));
    }
}
