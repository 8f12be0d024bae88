//! Text rendering of views.

use chrono::{DateTime, Local, Utc};
use lolmarket_core::types::{Market, MarketDetails, MarketMember, Performer, PricePoint, Stock};
use lolmarket_stats::{HistorySummary, MarketStats, ScoreSummary};

const RULE: &str = "═══════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────";

/// Boxed title.
pub fn header(title: &str) -> String {
    format!("{RULE}\n{:^59}\n{RULE}\n", title)
}

/// Section title with an underline.
pub fn section(title: &str) -> String {
    format!("{}\n{THIN_RULE}\n", title.to_uppercase())
}

pub fn markets(markets: &[Market], selected: Option<i64>) -> String {
    let mut s = header("YOUR MARKETS");
    if markets.is_empty() {
        s.push_str("  You are not a member of any market.\n");
        return s;
    }
    for market in markets {
        let marker = if Some(market.id) == selected { "*" } else { " " };
        s.push_str(&format!("{} {:>5}  {}", marker, market.id, market.name));
        if let Some(members) = market.member_count {
            s.push_str(&format!(" ({} members)", members));
        }
        s.push('\n');
    }
    s
}

pub fn market_stats(stats: &MarketStats) -> String {
    let mut s = section("market");
    s.push_str(&format!("  Stocks:              {}\n", stats.stock_count));
    s.push_str(&format!("  Total Value:         ${:.2}\n", stats.total_value));
    s.push_str(&format!("  Average Price:       ${:.2}\n", stats.average_price));
    s.push_str(&format!(
        "  Gainers / Losers:    {} / {}\n",
        stats.gainers, stats.losers
    ));
    match &stats.top_gainer {
        Some(stock) => s.push_str(&format!(
            "  Top Gainer:          {} {:+.2}%\n",
            stock_label(stock),
            stock.price_change_percent_24h
        )),
        None => s.push_str("  Top Gainer:          -\n"),
    }
    s.push_str(&format!(
        "  Volatility:          {} ({:.1}% avg change, {:.1} dispersion)\n",
        stats.band, stats.volatility_index, stats.dispersion
    ));
    s
}

/// Stocks by descending price.
pub fn stock_table(stocks: &[Stock], top: Option<usize>) -> String {
    let mut sorted: Vec<&Stock> = stocks.iter().collect();
    sorted.sort_by(|a, b| b.current_price.total_cmp(&a.current_price));
    if let Some(top) = top {
        sorted.truncate(top);
    }

    let mut s = section("stocks");
    s.push_str(&format!(
        "  {:<28} {:>10} {:>9} {:>9}\n",
        "Player", "Price", "24h", "7d"
    ));
    for stock in sorted {
        s.push_str(&format!(
            "  {:<28} {:>10.2} {:>8.2}% {:>8.2}%\n",
            stock_label(stock),
            stock.current_price,
            stock.price_change_percent_24h,
            stock.price_change_percent_7d
        ));
    }
    s
}

pub fn performers(top: &[Performer], bottom: &[Performer]) -> String {
    let mut s = String::new();
    for (title, list) in [("top performers", top), ("bottom performers", bottom)] {
        s.push_str(&section(title));
        if list.is_empty() {
            s.push_str("  No data for this period.\n");
        }
        for (rank, performer) in list.iter().enumerate() {
            s.push_str(&format!(
                "  {:>2}. {:<24} {:>10.2} {:>+8.2}%\n",
                rank + 1,
                format!("{} ({})", performer.display_name(), performer.champion),
                performer.current_price,
                performer.price_change_percent
            ));
        }
        s.push('\n');
    }
    s
}

pub fn history(points: &[PricePoint], summary: Option<&HistorySummary>) -> String {
    let mut s = section("price history");
    let Some(summary) = summary else {
        s.push_str("  No price history for this period.\n");
        return s;
    };
    s.push_str(&format!(
        "  {:.2} -> {:.2} ({:+.2}, {:+.2}%)\n",
        summary.first, summary.last, summary.change, summary.change_pct
    ));
    s.push_str(&format!(
        "  High {:.2}  Low {:.2}  over {} points\n\n",
        summary.high, summary.low, summary.points
    ));
    for point in points {
        s.push_str(&format!("  {:<26} {:>10.2}", point.timestamp, point.stock_value));
        if let Some(champion) = &point.champion_played {
            s.push_str(&format!("  {}", champion));
        }
        s.push('\n');
    }
    s
}

pub fn scores(summary: Option<&ScoreSummary>) -> String {
    let mut s = section("model scores");
    match summary {
        Some(summary) => {
            s.push_str(&format!("  Games:               {}\n", summary.games));
            s.push_str(&format!("  Mean Score:          {:.1}\n", summary.mean_score));
            s.push_str(&format!(
                "  Best / Worst:        {:.1} / {:.1}\n",
                summary.best_score, summary.worst_score
            ));
            s.push_str(&format!("  Net Price Change:    {:+.2}\n", summary.net_change));
        }
        None => s.push_str("  No games scored yet.\n"),
    }
    s
}

pub fn details(details: &MarketDetails, user_id: &str) -> String {
    let mut s = header(&details.name.to_uppercase());
    s.push_str(&format!("  Invite Code:         {}\n", details.invite_code));
    s.push_str(&format!("  Tier:                {}\n", details.tier));
    s.push_str(&format!(
        "  Players:             {} / {}\n",
        details.players.len(),
        details.player_limit
    ));
    s.push_str(&format!(
        "  Champions / Player:  {}\n",
        details.champions_per_player_limit
    ));
    if details.is_creator(user_id) {
        s.push_str("  You created this market.\n");
    }
    s.push('\n');

    s.push_str(&section("roster"));
    for player in &details.players {
        s.push_str(&format!(
            "  {:<28} {}\n",
            player.player_tag,
            player.champions.join(", ")
        ));
    }
    s
}

pub fn members(members: &[MarketMember], user_id: &str) -> String {
    let mut s = section("members");
    if members.is_empty() {
        s.push_str("  No members.\n");
    }
    for member in members {
        let you = if member.id == user_id { "  (you)" } else { "" };
        s.push_str(&format!(
            "  {:<24} {}{}\n",
            member.display_name(),
            member.id,
            you
        ));
    }
    s
}

/// "updated 12:00:03" footer.
pub fn updated(fetched_at: Option<DateTime<Utc>>, refreshing: bool) -> String {
    let time = fetched_at
        .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    if refreshing {
        format!("updated {} (refreshing)", time)
    } else {
        format!("updated {}", time)
    }
}

fn stock_label(stock: &Stock) -> String {
    match &stock.champion {
        Some(champion) => format!("{} ({})", stock.display_name(), champion),
        None => stock.display_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(tag: &str, price: f64) -> Stock {
        Stock {
            player_tag: tag.to_string(),
            champion: None,
            champions: vec![],
            current_price: price,
            price_change_24h: 0.0,
            price_change_percent_24h: 1.0,
            price_change_7d: 0.0,
            price_change_percent_7d: 0.0,
            last_update: None,
        }
    }

    #[test]
    fn test_stock_table_sorted_and_truncated() {
        let table = stock_table(&[stock("Low#1", 1.0), stock("High#1", 9.0), stock("Mid#1", 5.0)], Some(2));
        let high = table.find("High").unwrap();
        let mid = table.find("Mid").unwrap();
        assert!(high < mid);
        assert!(!table.contains("Low"));
    }

    #[test]
    fn test_markets_marks_selection() {
        let list = vec![
            Market {
                id: 1,
                name: "Worlds".to_string(),
                creator_id: None,
                invite_code: None,
                member_count: Some(4),
            },
            Market {
                id: 2,
                name: "LCK".to_string(),
                creator_id: None,
                invite_code: None,
                member_count: None,
            },
        ];
        let text = markets(&list, Some(2));
        assert!(text.contains("      1  Worlds (4 members)"));
        assert!(text.contains("*     2  LCK"));
    }

    #[test]
    fn test_members_marks_user() {
        let list = vec![
            MarketMember {
                id: "u1".into(),
                username: Some("deft".into()),
            },
            MarketMember {
                id: "u2".into(),
                username: None,
            },
        ];
        let out = members(&list, "u2");
        assert!(out.contains("deft"));
        assert!(out.lines().any(|line| line.contains("u2") && line.contains("(you)")));
        assert!(!out.lines().any(|line| line.contains("deft") && line.contains("(you)")));
    }

    #[test]
    fn test_empty_history() {
        assert!(history(&[], None).contains("No price history"));
    }

    #[test]
    fn test_updated_footer() {
        assert_eq!(updated(None, false), "updated never");
        assert!(updated(Some(Utc::now()), true).ends_with("(refreshing)"));
    }
}
