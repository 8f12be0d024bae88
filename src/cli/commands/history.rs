//! Price history command.

use anyhow::Result;
use lolmarket_stats::{HistorySummary, ScoreSummary};

use crate::cli::{render, HistoryArgs};
use crate::session::{load, Session};

pub async fn run(args: HistoryArgs, session: &Session) -> Result<()> {
    session.market().await?;

    let player = args.player.clone();
    let champion = args.champion.clone();
    let period = args.period;
    let mut history = session.bind_market(
        move |resources, id| resources.price_history(id, &player, champion.as_deref(), period),
        session.options(),
    );

    let mut scores = if args.scores {
        let player = args.player.clone();
        let champion = args.champion.clone();
        Some(session.bind_market(
            move |resources, id| resources.model_scores(id, &player, champion.as_deref()),
            session.options(),
        ))
    } else {
        None
    };

    let points = load(&mut history).await?;
    let title = match &args.champion {
        Some(champion) => format!("{} ({}) {}", args.player, champion, period),
        None => format!("{} {}", args.player, period),
    };
    print!("{}", render::header(&title));
    println!();
    print!(
        "{}",
        render::history(&points, HistorySummary::from_points(&points).as_ref())
    );

    if let Some(binding) = scores.as_mut() {
        let scores = load(binding).await?;
        println!();
        print!("{}", render::scores(ScoreSummary::from_scores(&scores).as_ref()));
    }

    Ok(())
}
