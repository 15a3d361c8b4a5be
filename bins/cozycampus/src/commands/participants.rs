//! Participation commands

use super::Context;
use crate::output;
use anyhow::Result;
use cozycampus_api_client::endpoints::ParticipantsApi;
use cozycampus_api_client::sync::AttendingSet;
use cozycampus_api_client::CampusClient;
use owo_colors::OwoColorize;

fn api(client: &CampusClient, club_event: bool) -> ParticipantsApi {
    if club_event {
        client.club_participants()
    } else {
        client.participants()
    }
}

/// `participants join <event> --user <id>`
pub async fn join(ctx: &Context, user: i64, event: i64, club_event: bool) -> Result<()> {
    let client = ctx.client()?;
    let mut attending = AttendingSet::new(api(&client, club_event), user);
    let participant = attending.join(event).await?;

    if ctx.json() {
        return output::json(&participant);
    }
    output::success(&format!(
        "User #{user} joined event #{event} ({})",
        participant.status
    ));
    Ok(())
}

/// `participants leave <event> --user <id>`
pub async fn leave(ctx: &Context, user: i64, event: i64, club_event: bool) -> Result<()> {
    let client = ctx.client()?;
    let mut attending = AttendingSet::new(api(&client, club_event), user);
    attending.leave(event).await?;

    if ctx.json() {
        return output::json(&serde_json::json!({ "user": user, "left": event }));
    }
    output::success(&format!("User #{user} left event #{event}"));
    Ok(())
}

/// `participants mine --user <id>`
pub async fn mine(ctx: &Context, user: i64, club_event: bool) -> Result<()> {
    let client = ctx.client()?;
    let participants = api(&client, club_event);
    let events = participants.user_events(user).await;

    if ctx.json() {
        return output::json(&events);
    }

    output::header(&format!("🎟  Events of user #{user}"));
    if events.is_empty() {
        output::empty("events");
    }
    for event in &events {
        println!(
            "  {:<6} {:<32} {}",
            output::id(event.key()),
            event.title,
            output::when(event.start.as_ref()).dimmed()
        );
    }
    println!();
    Ok(())
}
