//! Club commands

use super::Context;
use crate::output;
use anyhow::Result;
use cozycampus_api_client::endpoints::{Club, ClubMember};
use owo_colors::OwoColorize;

/// `clubs list`
pub async fn list(ctx: &Context, public_only: bool, count_members: bool) -> Result<()> {
    let api = ctx.client()?.clubs();
    let clubs = if count_members {
        api.list_with_member_counts(public_only).await
    } else {
        api.list(public_only).await
    };
    print_clubs(ctx, "🏛  Clubs", &clubs)
}

/// `clubs pending`
pub async fn pending(ctx: &Context) -> Result<()> {
    let clubs = ctx.client()?.clubs().pending().await;
    print_clubs(ctx, "⏳ Clubs Awaiting Moderation", &clubs)
}

/// `clubs accept <id>`
pub async fn accept(ctx: &Context, id: i64) -> Result<()> {
    let club = ctx.client()?.clubs().accept(id).await?;
    report_state(ctx, &club)
}

/// `clubs reject <id>`
pub async fn reject(ctx: &Context, id: i64) -> Result<()> {
    let club = ctx.client()?.clubs().reject(id).await?;
    report_state(ctx, &club)
}

fn report_state(ctx: &Context, club: &Club) -> Result<()> {
    if ctx.json() {
        return output::json(club);
    }
    output::success(&format!("\"{}\" is now {}", club.name, club.state));
    Ok(())
}

/// `clubs members <id>`
pub async fn members(ctx: &Context, id: i64, with_users: bool) -> Result<()> {
    let api = ctx.client()?.members();
    let members = if with_users {
        api.with_users(id).await
    } else {
        api.list(id).await
    };

    if ctx.json() {
        return output::json(&members);
    }

    output::header(&format!("👥 Members of club #{id}"));
    if members.is_empty() {
        output::empty("members");
        println!();
        return Ok(());
    }

    for member in &members {
        print_member(member);
    }
    println!();
    println!("  {} member(s)", members.len().to_string().green());
    Ok(())
}

fn print_member(member: &ClubMember) {
    let name = member
        .display_name()
        .unwrap_or_else(|| format!("user #{}", member.user_id));
    let role = if member.is_admin() {
        member.role.as_str().yellow().to_string()
    } else {
        member.role.as_str().to_string()
    };
    println!("  {:<6} {:<30} {}", output::id(member.id), name, role);
}

/// `clubs remove-member <club> <member> --admin <id>`
pub async fn remove_member(ctx: &Context, club_id: i64, member: i64, admin: i64) -> Result<()> {
    let api = ctx.client()?.clubs();
    let club = api.get(club_id).await?;
    api.remove_member(&club, member, admin).await?;

    if ctx.json() {
        return output::json(&serde_json::json!({ "club": club_id, "removed": member }));
    }
    output::success(&format!("Removed member #{member} from \"{}\"", club.name));
    Ok(())
}

fn print_clubs(ctx: &Context, title: &str, clubs: &[Club]) -> Result<()> {
    if ctx.json() {
        return output::json(clubs);
    }

    output::header(title);
    if clubs.is_empty() {
        output::empty("clubs");
        println!();
        return Ok(());
    }

    println!(
        "  {:<6} {:<30} {:<12} {}",
        "Id".dimmed(),
        "Name".dimmed(),
        "State".dimmed(),
        "Members".dimmed()
    );
    for club in clubs {
        println!(
            "  {:<6} {:<30} {:<12} {}",
            output::id(club.id),
            club.name,
            club.state.as_str(),
            club.member_count
        );
    }
    println!();
    Ok(())
}
