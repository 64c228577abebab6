//! Forum Day Example
//!
//! Walks a day of forum activity through the glimmer engine: two members
//! post, comment, and react; quests complete and get claimed; one buys an
//! item and trades it to the other; the day ends with a leaderboard.

use glimmer_core::{AccountId, DefId, Trigger};
use glimmer_defs::Loader;
use glimmer_engine::{EventSink, Gamification, Metric, NotificationSink, Period, Scope};
use glimmer_store::{Store, TradeSide};
use std::sync::Arc;

/// Sink that prints every side effect to the console.
struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, account: AccountId, kind: &str, title: &str, _body: &str) {
        println!("  [notify {}] {}: {}", account, kind, title);
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, account: AccountId, event: &str, _payload: &[(String, String)]) {
        println!("  [event  {}] {}", account, event);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Glimmer Forum Day Example ===\n");

    let mut loader = Loader::new();
    loader.load_achievements_str(include_str!("../defs/achievements.ron"))?;
    loader.load_quests_str(include_str!("../defs/quests.ron"))?;
    loader.load_items_str(include_str!("../defs/items.ron"))?;
    let defs = loader.finish()?;
    println!(
        "Loaded {} achievements, {} quests, {} items\n",
        defs.achievements.len(),
        defs.quests.len(),
        defs.items.len()
    );

    let sink = Arc::new(ConsoleSink);
    let engine = Gamification::new(Store::in_memory()?, defs)
        .with_notifications(sink.clone())
        .with_events(sink);

    let mira = AccountId::new(1);
    let theo = AccountId::new(2);
    engine.create_account(mira)?;
    engine.create_account(theo)?;
    println!("Created accounts {} and {}\n", mira, theo);

    // Morning: mira posts, the first-post achievement and daily quest fire
    println!("{} creates a post:", mira);
    let outcome = engine.on_trigger(mira, Trigger::PostCreated { lifetime_posts: 1 })?;
    for unlocked in &outcome.unlocked {
        println!("  unlocked: {} (+{} xp)", unlocked.name, unlocked.reward.xp);
    }

    println!("\nToday's quests for {}:", mira);
    for quest in engine.refresh_daily_quests(mira)? {
        println!("  {} - {}", quest.name, quest.status);
    }

    println!("\n{} claims the Daily Poster reward:", mira);
    let reward = engine.claim_quest_rewards(mira, &DefId::new("daily_poster"))?;
    println!("  claimed {} xp, {} sparkle", reward.xp, reward.sparkle);

    // Afternoon: theo is active too, and mira keeps earning
    println!("\n{} comments and reacts:", theo);
    engine.on_trigger(theo, Trigger::CommentPosted { lifetime_comments: 1 })?;
    engine.on_trigger(theo, Trigger::ReactionGiven)?;

    println!("\nActivity bonuses go out:");
    let award = engine.award_xp(mira, 500, "daily_bonus")?;
    if let Some(level) = award.new_level {
        println!("  {} reached level {}", mira, level);
    }
    let award = engine.award_xp(theo, 300, "daily_bonus")?;
    if let Some(level) = award.new_level {
        println!("  {} reached level {}", theo, level);
    }

    // Evening: a purchase and a trade
    let pin = DefId::new("pin_star");
    println!("\n{} buys a Star Pin:", mira);
    let owned = engine.purchase_item(mira, &pin, 1)?;
    println!("  now owns {} copy", owned);

    println!("\n{} offers the pin to {} for 10 sparkle:", mira, theo);
    let trade = engine.propose_trade(
        mira,
        theo,
        TradeSide { items: vec![(pin.to_string(), 1)], sparkle: 0, premium: 0 },
        TradeSide { items: vec![], sparkle: 10, premium: 0 },
        Some("for you!".to_string()),
    )?;
    engine.respond_trade(trade, theo, true)?;

    // Nightly wrap-up
    println!("\nXP leaderboard:");
    for entry in engine.get_leaderboard(Metric::Xp, Scope::Global, Period::AllTime, 5)? {
        println!("  #{} {} - {} xp", entry.rank, entry.account, entry.score);
    }

    for account in [mira, theo] {
        let stats = engine.get_user_stats(account)?;
        println!(
            "\n{}: level {} ({:.0}% to next), {} xp, {} sparkle, {} premium, {} achievements",
            account,
            stats.progress.level,
            stats.progress.percentage,
            stats.xp,
            stats.sparkle,
            stats.premium,
            stats.unlocked_achievements
        );
    }

    Ok(())
}
