//! Performers command.

use anyhow::Result;

use crate::cli::{render, PerformersArgs};
use crate::session::{load, Session};

pub async fn run(args: PerformersArgs, session: &Session) -> Result<()> {
    let market = session.market().await?;
    let period = args.period;
    let mut binding = session.bind_market(
        move |resources, id| resources.performers(id, period),
        session.options(),
    );
    let performers = load(&mut binding).await?;

    print!("{}", render::header(&format!("{} {}", market.name.to_uppercase(), period)));
    println!();
    print!(
        "{}",
        render::performers(&performers.top_performers, &performers.bottom_performers)
    );
    Ok(())
}
