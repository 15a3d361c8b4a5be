//! Forum commands (posts, comments and reports)

use super::Context;
use crate::output;
use anyhow::Result;
use cozycampus_api_client::endpoints::{Comment, Post};
use owo_colors::OwoColorize;

/// `posts list [--category <tag>]`
pub async fn posts(ctx: &Context, category: Option<&str>) -> Result<()> {
    let api = ctx.client()?.posts();
    let posts = match category {
        Some(tag) => api.by_category(tag).await,
        None => api.list().await,
    };
    print_posts(ctx, "💬 Forum", &posts)
}

/// `posts search <query>`
pub async fn search(ctx: &Context, query: &str) -> Result<()> {
    let posts = ctx.client()?.posts().search(query).await;
    print_posts(ctx, &format!("🔎 Posts matching \"{query}\""), &posts)
}

/// `comments list <post>`
pub async fn comments(ctx: &Context, post: i64) -> Result<()> {
    let comments = ctx.client()?.comments().for_post(post).await;

    if ctx.json() {
        return output::json(&comments);
    }

    output::header(&format!("💭 Comments on post #{post}"));
    if comments.is_empty() {
        output::empty("comments");
    }
    for comment in &comments {
        print_comment(comment);
    }
    println!();
    Ok(())
}

/// `comments post <post> <content> --user <id>`
pub async fn comment(ctx: &Context, user: i64, post: i64, content: &str) -> Result<()> {
    let comment = ctx.client()?.comments().create(user, post, content).await?;

    if ctx.json() {
        return output::json(&comment);
    }
    output::success(&format!("Comment #{} posted", output::id(comment.id)));
    Ok(())
}

/// `reports pending`
pub async fn pending_reports(ctx: &Context) -> Result<()> {
    let reports = ctx.client()?.reports().pending().await;

    if ctx.json() {
        return output::json(&reports);
    }

    output::header("🚩 Pending reports");
    if reports.is_empty() {
        output::empty("reports");
    }
    for report in &reports {
        println!(
            "  {:<6} post {} · {} {}",
            output::id(report.id),
            output::id(report.post_id),
            report.reason.bold(),
            format!("by {}", report.username.as_deref().unwrap_or("anonymous")).dimmed()
        );
    }
    println!();
    Ok(())
}

/// `reports resolve <id>`
pub async fn resolve_report(ctx: &Context, id: i64) -> Result<()> {
    let report = ctx.client()?.reports().resolve(id).await?;

    if ctx.json() {
        return output::json(&report);
    }
    output::success(&format!("Report #{} marked {}", output::id(report.id), report.status));
    Ok(())
}

fn print_comment(comment: &Comment) {
    let author = comment.username.as_deref().unwrap_or("anonymous");
    println!(
        "  {} {} {}",
        author.bold(),
        output::when(comment.created_at.as_ref()).dimmed(),
        format!("♥ {}", comment.likes).dimmed()
    );
    println!("    {}", comment.content);
}

fn print_posts(ctx: &Context, title: &str, posts: &[Post]) -> Result<()> {
    if ctx.json() {
        return output::json(posts);
    }

    output::header(title);
    if posts.is_empty() {
        output::empty("posts");
        println!();
        return Ok(());
    }

    for post in posts {
        let heading = if post.title.is_empty() {
            post.content.lines().next().unwrap_or_default()
        } else {
            post.title.as_str()
        };
        println!(
            "  {:<6} {} {}",
            output::id(post.id),
            heading.bold(),
            post.category.as_deref().map(|tag| format!("[{tag}]")).unwrap_or_default().cyan()
        );
        println!(
            "         {} · {} · ♥ {} · {} comment(s)",
            post.author.as_deref().unwrap_or("anonymous"),
            output::when(post.created_at.as_ref()),
            post.like_count,
            post.comment_count
        );
    }
    println!();
    Ok(())
}
