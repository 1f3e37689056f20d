use std::path::Path;
use std::sync::Arc;

use codecircle_bot::command::{Destination, Interaction};
use codecircle_bot::error::ServiceResult;
use codecircle_bot::handler::Dispatcher;
use codecircle_bot::notify::Notifier;
use codecircle_bot::reply::{Embed, Reply};
use codecircle_bot::scheduler::Scheduler;
use codecircle_bot::storage::Stores;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn follow_up(&self, _destination: &Destination, _embed: &Embed) -> ServiceResult<()> {
        Ok(())
    }

    fn guilds(&self) -> ServiceResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn text_channels(&self, _guild_id: &str, _channel_name: &str) -> ServiceResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn post(&self, _channel_id: &str, _embed: &Embed) -> ServiceResult<()> {
        Ok(())
    }
}

fn dispatcher(dir: &Path) -> Dispatcher {
    let scheduler = Scheduler::new(Arc::new(SilentNotifier), CancellationToken::new());
    Dispatcher::load(dir.to_path_buf(), scheduler)
}

async fn run(dispatcher: &Dispatcher, owner: &str, command: &str, args: Value) -> Reply {
    let mut payload = json!({ "user": { "id": owner, "name": owner }, "command": command });
    if let (Some(target), Value::Object(extra)) = (payload.as_object_mut(), args) {
        target.extend(extra);
    }
    let interaction: Interaction = serde_json::from_value(payload).unwrap();
    dispatcher.handle(interaction).await
}

fn field<'a>(reply: &'a Reply, name: &str) -> Option<&'a str> {
    reply.first_embed().and_then(|e| e.field_value(name))
}

#[tokio::test]
async fn snippet_is_private_to_its_owner() {
    let dir = tempfile::tempdir().unwrap();
    let bot = dispatcher(dir.path());

    run(
        &bot,
        "U1",
        "snippet.save",
        json!({ "name": "fizzbuzz", "code": "...", "language": "js", "tags": "interview,loops" }),
    )
    .await;

    let mine = run(&bot, "U1", "snippet.get", json!({ "name": "fizzbuzz" })).await;
    let embed = mine.first_embed().unwrap();
    assert_eq!(embed.description.as_deref(), Some("```js\n...```"));
    assert_eq!(embed.field_value("Tags"), Some("interview, loops"));

    let theirs = run(&bot, "U2", "snippet.get", json!({ "name": "fizzbuzz" })).await;
    assert_eq!(theirs, Reply::notice("❌ Snippet \"fizzbuzz\" not found!"));
}

#[tokio::test]
async fn goal_moves_from_active_to_completed() {
    let dir = tempfile::tempdir().unwrap();
    let bot = dispatcher(dir.path());

    run(&bot, "U1", "goal.set", json!({ "title": "Learn Go" })).await;
    let listed = run(&bot, "U1", "goal.list", json!({})).await;
    assert_eq!(field(&listed, "🔄 Active Goals"), Some("**Learn Go**"));

    run(&bot, "U1", "goal.complete", json!({ "title": "Learn Go" })).await;
    let before_repeat = bot.snapshot().await;
    let repeat = run(&bot, "U1", "goal.complete", json!({ "title": "Learn Go" })).await;
    assert_eq!(repeat, Reply::notice("✅ You already completed \"Learn Go\"!"));
    assert_eq!(bot.snapshot().await, before_repeat);

    let listed = run(&bot, "U1", "goal.list", json!({})).await;
    assert_eq!(field(&listed, "🔄 Active Goals"), None);
    assert_eq!(field(&listed, "✅ Completed Goals"), Some("**Learn Go**"));
}

#[tokio::test]
async fn progress_stats_for_three_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let bot = dispatcher(dir.path());

    for (topic, hours) in [("go", 1), ("go", 2), ("rust", 3)] {
        run(&bot, "U1", "progress.log", json!({ "topic": topic, "hours": hours })).await;
    }
    assert_eq!(bot.snapshot().await.progress.len(), 3);

    let stats = run(&bot, "U1", "progress.stats", json!({})).await;
    assert_eq!(field(&stats, "Total Hours Logged"), Some("6"));
    assert_eq!(field(&stats, "Sessions Logged"), Some("3"));
    assert_eq!(field(&stats, "Average per Session"), Some("2.0h"));
    assert_eq!(field(&stats, "Top Topics"), Some("go: 3h\nrust: 3h"));
}

#[tokio::test]
async fn repeated_challenge_draws_never_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    let bot = dispatcher(dir.path());

    // Five catalog entries; enough draws make repeats certain.
    for _ in 0..20 {
        run(&bot, "U1", "challenge", json!({})).await;
    }
    let stores = bot.snapshot().await;
    assert!(stores.challenges.len() <= 5);
    let mut titles: Vec<&str> = stores.challenges.values().map(|c| c.title.as_str()).collect();
    titles.sort();
    titles.dedup();
    assert_eq!(titles.len(), stores.challenges.len());
}

#[tokio::test]
async fn state_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let bot = dispatcher(dir.path());
        run(&bot, "U1", "snippet.save", json!({ "name": "a", "code": "x", "language": "rs" })).await;
        run(&bot, "U1", "github.track", json!({ "repo": "https://github.com/tokio-rs/tokio" })).await;
        run(
            &bot,
            "U2",
            "review.submit",
            json!({ "title": "parser", "code": "fn p() {}", "language": "rust" }),
        )
        .await;
        bot.flush().await.unwrap();
    }

    let reloaded = Stores::load(dir.path());
    assert!(reloaded.snippets.has("U1_a"));
    assert!(reloaded.repos.has("U1_tokio-rs/tokio"));
    assert_eq!(reloaded.reviews.len(), 1);

    let bot = dispatcher(dir.path());
    let repos = run(&bot, "U1", "github.list", json!({})).await;
    assert_eq!(
        repos.first_embed().unwrap().description.as_deref(),
        Some("[tokio-rs/tokio](https://github.com/tokio-rs/tokio)")
    );
}

#[tokio::test]
async fn corrupt_store_file_is_kept_aside() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("goals.json"), "{ not json").unwrap();

    let bot = dispatcher(dir.path());
    let listed = run(&bot, "U1", "goal.list", json!({})).await;
    assert_eq!(listed, Reply::notice("🎯 You have no learning goals set yet!"));

    let preserved = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .any(|entry| entry.file_name().to_string_lossy().starts_with("goals.json.corrupt-"));
    assert!(preserved);
}

#[tokio::test]
async fn concurrent_feedback_is_never_lost() {
    let dir = tempfile::tempdir().unwrap();
    let bot = Arc::new(dispatcher(dir.path()));

    run(
        &bot,
        "U1",
        "review.submit",
        json!({ "title": "parser", "code": "fn p() {}", "language": "rust" }),
    )
    .await;
    let id = bot.snapshot().await.reviews.values().next().unwrap().id;

    let mut tasks = Vec::new();
    for n in 0..8 {
        let bot = bot.clone();
        tasks.push(tokio::spawn(async move {
            run(&bot, &format!("U{n}"), "review.feedback", json!({ "id": id, "feedback": format!("note {n}") })).await
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let stores = bot.snapshot().await;
    let review = stores.reviews.get(&id.to_string()).unwrap();
    assert_eq!(review.feedback.len(), 8);
}
