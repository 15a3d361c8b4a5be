//! Event commands

use super::Context;
use crate::output;
use anyhow::{bail, Result};
use cozycampus_api_client::endpoints::{Event, EventDraft};
use cozycampus_api_client::status::EventStatus;
use cozycampus_api_client::wire::parse_timestamp;
use owo_colors::OwoColorize;

/// Arguments of `events create`
pub struct DraftArgs {
    pub title: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DraftArgs {
    fn into_draft(self) -> Result<EventDraft> {
        let mut draft = EventDraft::new(self.title);
        draft.description = self.description;
        draft.venue = self.venue;
        draft.start = self.start.as_deref().map(parse_time).transpose()?;
        draft.end = self.end.as_deref().map(parse_time).transpose()?;

        if let (Some(start), Some(end)) = (draft.start, draft.end) {
            if end < start {
                bail!("The event cannot end before it starts");
            }
        }
        Ok(draft)
    }
}

fn parse_time(raw: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    match parse_timestamp(raw) {
        Some(at) => Ok(at),
        None => bail!("Invalid date '{raw}'"),
    }
}

/// `events list`
pub async fn list(ctx: &Context) -> Result<()> {
    let events = ctx.client()?.events().list().await;
    print_events(ctx, "📅 Campus Events", &events)
}

/// `events search <term>`
pub async fn search(ctx: &Context, term: &str) -> Result<()> {
    let events = ctx.client()?.events().search(term).await;
    print_events(ctx, &format!("🔎 Events matching \"{term}\""), &events)
}

/// `club-events list [--club <id>]`
pub async fn list_club_events(ctx: &Context, club: Option<i64>) -> Result<()> {
    let api = ctx.client()?.club_events();
    let events = match club {
        Some(id) => api.for_club(id).await,
        None => api.list().await,
    };
    print_events(ctx, "🎭 Club Events", &events)
}

/// `events create`
pub async fn create(ctx: &Context, creator: i64, args: DraftArgs) -> Result<()> {
    let draft = args.into_draft()?;
    let event = ctx.client()?.events().create(creator, draft).await?;

    if ctx.json() {
        return output::json(&event);
    }

    output::success(&format!(
        "Created \"{}\" (#{})",
        event.title,
        output::id(event.key())
    ));
    if event.is_placeholder() {
        println!(
            "  {}",
            "Backend unreachable: this is a local placeholder, it was not saved".yellow()
        );
    }
    Ok(())
}

/// `events transition <id> <status>`
pub async fn transition(ctx: &Context, id: i64, status: &str, creator: i64) -> Result<()> {
    let status: EventStatus = status.parse()?;
    let event = ctx.client()?.events().transition(id, status, creator).await?;

    if ctx.json() {
        return output::json(&event);
    }
    output::success(&format!("\"{}\" is now {}", event.title, event.status));
    Ok(())
}

fn print_events(ctx: &Context, title: &str, events: &[Event]) -> Result<()> {
    if ctx.json() {
        return output::json(events);
    }

    output::header(title);
    if events.is_empty() {
        output::empty("events");
        println!();
        return Ok(());
    }

    println!(
        "  {:<6} {:<32} {:<17} {:<10} {}",
        "Id".dimmed(),
        "Title".dimmed(),
        "Starts".dimmed(),
        "Status".dimmed(),
        "Venue".dimmed()
    );
    for event in events {
        println!(
            "  {:<6} {:<32} {:<17} {:<10} {}",
            output::id(event.key()),
            event.title,
            output::when(event.start.as_ref()),
            event.status.as_str(),
            event.venue
        );
    }
    println!();
    println!("  {} event(s)", events.len().to_string().green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(start: Option<&str>, end: Option<&str>) -> DraftArgs {
        DraftArgs {
            title: "Hackathon".to_string(),
            description: None,
            venue: Some("Amphi A".to_string()),
            start: start.map(str::to_string),
            end: end.map(str::to_string),
        }
    }

    #[test]
    fn test_draft_parses_times() {
        let draft = args(Some("2024-05-01 18:00:00"), Some("2024-05-01T20:00:00Z"))
            .into_draft()
            .unwrap();
        assert_eq!(draft.title.as_deref(), Some("Hackathon"));
        assert!(draft.start.unwrap() < draft.end.unwrap());
    }

    #[test]
    fn test_draft_rejects_inverted_schedule() {
        assert!(args(Some("2024-05-02"), Some("2024-05-01")).into_draft().is_err());
        assert!(args(Some("demain"), None).into_draft().is_err());
    }
}
