//! Market details command.

use anyhow::Result;

use crate::cli::render;
use crate::session::{load, Session};

pub async fn run(session: &Session) -> Result<()> {
    let user = session.user_id()?;
    session.market().await?;
    let mut binding = session.bind_market(
        |resources, id| resources.market_details(id),
        session.options(),
    );
    let details = load(&mut binding).await?;

    print!("{}", render::details(&details, &user));
    if !details.has_player_capacity() {
        println!();
        println!("This market is full.");
    }
    Ok(())
}
