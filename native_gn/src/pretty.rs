//! Human-readable one-line rendering of turn events for the server console.

use std::io::IsTerminal;

use gn_shared::{PlayerId, TurnEvent, TurnKind};
use owo_colors::OwoColorize;

fn tag(label: &str, color: bool) -> String {
    let bracketed = format!("[{label}]");
    if color {
        bracketed.bold().cyan().to_string()
    } else {
        bracketed
    }
}

pub fn format_turn_event<F>(event: &TurnEvent, name_of: F) -> String
where
    F: Fn(PlayerId) -> String,
{
    let color = std::io::stdout().is_terminal();
    match event {
        TurnEvent::GameStarted { players } => {
            format!("{} the race begins: {}", tag("GAME", color), players.join(", "))
        }
        TurnEvent::CardPlayed {
            player,
            card,
            burned,
            distance,
            priority,
        } => {
            let verb = if *burned { "burns" } else { "plays" };
            format!(
                "{} {} {verb} {card} (priority {priority}) moving {distance}",
                tag("RACE", color),
                name_of(*player),
            )
        }
        TurnEvent::BidRevealed {
            player,
            card,
            value,
        } => format!(
            "{} {} bids {card} at {value}",
            tag("AUCTION", color),
            name_of(*player),
        ),
        TurnEvent::Drafted { player, card } => format!(
            "{} {} drafts {card}",
            tag("DRAFT", color),
            name_of(*player),
        ),
        TurnEvent::PoolRevealed { count } => {
            format!("{} {count} cards up for auction", tag("POOL", color))
        }
        TurnEvent::PoolDiscarded { count } => {
            format!("{} {count} unclaimed cards discarded", tag("POOL", color))
        }
        TurnEvent::LapCompleted { player, lap } => format!(
            "{} {} enters lap {lap}",
            tag("LAP", color),
            name_of(*player),
        ),
        TurnEvent::TurnAdvanced { round, turn, kind } => {
            let kind = match kind {
                TurnKind::Race => "race",
                TurnKind::Auction => "auction",
            };
            format!("{} round {round}, turn {turn} ({kind})", tag("TURN", color))
        }
        TurnEvent::WinnerDeclared { player } => {
            let name = name_of(*player);
            if color {
                format!("{} {}", tag("WINNER", color), name.bold().green())
            } else {
                format!("{} {name}", tag("WINNER", color))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_render_player_names() {
        let line = format_turn_event(
            &TurnEvent::Drafted {
                player: PlayerId(3),
                card: "Wing Boost".into(),
            },
            |_| "Alice".to_owned(),
        );
        assert!(line.contains("Alice"));
        assert!(line.contains("Wing Boost"));
    }
}
