//! Scripted walkthrough
//!
//! Signs a resident up, holds a conversation on one floor with simulated
//! neighbors, scrolls through it, then opens a floor whose live feed is down.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Local;
use colored::Colorize;
use floorboard_client::{
    AuthService, ClientConfig, Composer, FeedController, FloorPage, FrameRequest, Freshness,
    LiveSource, ScrollViewport, StaticSource, SubmitOutcome, Transition, VirtualViewport,
};
use floorboard_core::{Floor, MemoryBackend, MessageStore, NewMessage};

use crate::display::*;
use crate::view::{feed_lines, visible};

const CONVERSATION: [(&str, &str); 6] = [
    ("ana", "Morning all! Did anyone else get a package notice for 12B?"),
    ("maya", "That one might be mine, I just moved into 12C."),
    ("bo", "Welcome Maya! The mail room closes at 6 on weekdays."),
    ("ana", "Also heads up, the elevator inspection is Thursday."),
    ("maya", "Thanks both, good to know."),
    ("bo", "Laundry room dryer #2 is fixed, by the way."),
];

/// Wait for the feed to settle into `Ready` (or fail for good)
async fn settle(page: &mut FloorPage<VirtualViewport>) -> Result<Transition> {
    loop {
        let transition = tokio::time::timeout(Duration::from_secs(2), page.next_transition())
            .await
            .context("feed did not respond")?;
        match transition {
            Transition::Ready | Transition::Failed(_) => return Ok(transition),
            _ => {}
        }
    }
}

fn render(page: &mut FloorPage<VirtualViewport>) {
    let lines = feed_lines(page.feed().messages(), None, &Local::now());
    if let Some(viewport) = page.scroll_mut().viewport_mut() {
        viewport.set_content_height(lines.len() as f64);
    }
    page.rendered();
    page.scroll_mut().on_frame();
}

fn print_window(page: &FloorPage<VirtualViewport>) {
    let lines = feed_lines(page.feed().messages(), None, &Local::now());
    let metrics = page.scroll().viewport().and_then(|v| v.measure());
    print_feed_lines(visible(&lines, metrics));
    if page.scroll().show_jump_to_bottom() {
        print_jump_affordance();
    }
}

pub async fn run(config: ClientConfig, pace: Duration) -> Result<()> {
    print_banner();
    print_demo_mode();

    let backend = Arc::new(MemoryBackend::new());
    let ana = backend.add_resident("ana@tower.example", "ana-secret", Some("ana"), true);
    let bo = backend.add_resident("bo@tower.example", "bo-secret", Some("bo"), true);
    let auth = AuthService::new(backend.clone(), backend.clone(), config.clone());

    println!("{}", "Signing up a new resident...".dimmed());
    let maya = match auth.sign_up("maya@tower.example", "maya-secret", "maya").await {
        Ok(principal) => principal,
        Err(e) => bail!(e.user_message()),
    };
    print_info(&format!("Verification email sent to {}", maya.email.as_deref().unwrap_or("-")));
    if let Err(e) = auth.sign_in("maya@tower.example", "maya-secret").await {
        print_warning(&format!("Before verifying: {}", e.user_message()));
    }
    backend.verify_email("maya@tower.example");
    match auth.sign_in("maya@tower.example", "maya-secret").await {
        Ok(_) => print_success("Signed in as maya"),
        Err(e) => bail!(e.user_message()),
    }
    tokio::time::sleep(pace).await;

    let floor = Floor::new(12);
    let feed = FeedController::new(
        Arc::new(LiveSource::new(backend.clone())),
        Arc::new(StaticSource::building_fallback()),
        &config,
    );
    let mut page = FloorPage::new(feed, &config);
    page.scroll_mut().mount(VirtualViewport::new(0.0, 5.0));

    page.open(floor);
    settle(&mut page).await?;
    render(&mut page);
    print_floor_header(&floor.title(), &page.count_label(), false);
    print_empty_floor();

    let composer = Composer::new(backend.clone(), backend.clone(), floor, &config);
    for (index, (author, text)) in CONVERSATION.iter().enumerate() {
        match *author {
            "maya" => {
                composer.set_draft(*text);
                if !matches!(composer.submit().await, Ok(SubmitOutcome::Posted { .. })) {
                    bail!("failed to post as maya");
                }
            }
            "ana" => {
                backend.insert(NewMessage::new(floor, *text, &ana)).await?;
            }
            _ => {
                backend.insert(NewMessage::new(floor, *text, &bo)).await?;
            }
        }

        while page.feed().messages().len() < index + 1 {
            settle(&mut page).await?;
        }
        render(&mut page);
        if let Some(message) = page.feed().messages().last() {
            let lines = feed_lines(std::slice::from_ref(message), Some(&maya.id), &Local::now());
            print_feed_lines(&lines[lines.len() - 1..]);
        }
        tokio::time::sleep(pace).await;
    }

    println!();
    println!("{}", "Scrolling up to read history...".dimmed());
    if let Some(viewport) = page.scroll_mut().viewport_mut() {
        viewport.scroll_by(-3.0);
    }
    if page.scroll_mut().on_scroll() == FrameRequest::Schedule {
        page.scroll_mut().on_frame();
    }
    print_window(&page);

    println!("{}", "Jumping back to the newest message...".dimmed());
    page.scroll_mut().jump_to_bottom();
    print_window(&page);
    tokio::time::sleep(pace).await;

    println!();
    println!("{}", "Trying to post an empty message...".dimmed());
    composer.set_draft("   ");
    if let Err(e) = composer.submit().await {
        print_error(&e.user_message());
    }

    println!();
    println!("{}", "Opening Floor 3 while the live feed is down...".dimmed());
    backend.set_subscriptions_failing(true);
    page.open(Floor::new(3));
    settle(&mut page).await?;
    render(&mut page);
    print_floor_header(
        &Floor::new(3).title(),
        &page.count_label(),
        page.freshness() == Some(Freshness::Fallback),
    );
    print_window(&page);

    println!();
    print_success("Demo complete!");
    println!();
    println!("{}", "To explore on your own:".dimmed());
    println!("  {} {}", "1.".dimmed(), "floorboard session".green());
    println!("  {} {}", "2.".dimmed(), "/floor 12".green());
    println!();
    print_guidelines();

    Ok(())
}
