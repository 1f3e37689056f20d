use chrono::Utc;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::Instrument;
use ulid::Ulid;

use crate::command::{Context, Interaction, Outcome, execute};
use crate::error::{ServiceError, ServiceResult};
use crate::reply::Reply;
use crate::scheduler::Scheduler;
use crate::storage::{StorageError, StoreName, Stores};

/// Routes interactions to their handlers and owns the stores.
///
/// A single lock covers handler, mutation and persistence, so two commands
/// touching the same record run one after the other.
pub struct Dispatcher {
    stores: Mutex<Stores>,
    data_dir: PathBuf,
    scheduler: Scheduler,
}

impl Dispatcher {
    pub fn new(stores: Stores, data_dir: PathBuf, scheduler: Scheduler) -> Self {
        Self {
            stores: Mutex::new(stores),
            data_dir,
            scheduler,
        }
    }

    /// Loads every store found under `data_dir`.
    pub fn load(data_dir: PathBuf, scheduler: Scheduler) -> Self {
        let stores = Stores::load(&data_dir);
        Self::new(stores, data_dir, scheduler)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub async fn handle(&self, interaction: Interaction) -> Reply {
        let request_id = interaction
            .id
            .clone()
            .unwrap_or_else(|| Ulid::new().to_string());
        let span = tracing::info_span!(
            "interaction",
            %request_id,
            command = interaction.command.name(),
            caller = %interaction.user.id,
        );
        self.dispatch(interaction).instrument(span).await
    }

    async fn dispatch(&self, interaction: Interaction) -> Reply {
        let Interaction {
            user,
            reply_to,
            command,
            ..
        } = interaction;
        let ctx = Context::new(user, Utc::now(), rand::random());

        let mut stores = self.stores.lock().await;
        let outcome = match run_guarded(|| execute(command, &ctx, &stores)) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Error executing command: {e}");
                return Reply::failure();
            }
        };
        let Outcome {
            reply,
            mutations,
            follow_ups,
            announcements,
        } = outcome;

        let mut touched: Vec<StoreName> = Vec::new();
        for mutation in mutations {
            let name = mutation.apply(&mut stores);
            if !touched.contains(&name) {
                touched.push(name);
            }
        }
        for name in touched {
            if let Err(e) = stores.persist(&self.data_dir, name).await {
                tracing::error!("Failed to save {}: {e}", name.file_name());
                return Reply::failure();
            }
        }
        drop(stores);

        for follow_up in follow_ups {
            self.scheduler.schedule_follow_up(reply_to.clone(), follow_up);
        }
        for announcement in announcements {
            self.scheduler.announce(announcement);
        }
        tracing::debug!("Command handled");
        reply
    }

    /// Writes every store to disk.
    pub async fn flush(&self) -> Result<(), StorageError> {
        let stores = self.stores.lock().await;
        stores.persist_all(&self.data_dir).await
    }

    /// Copy of the current in-memory state.
    pub async fn snapshot(&self) -> Stores {
        self.stores.lock().await.clone()
    }
}

/// Runs a handler, turning a panic into [`ServiceError::HandlerPanic`].
pub fn run_guarded<F>(handler: F) -> ServiceResult<Outcome>
where
    F: FnOnce() -> ServiceResult<Outcome>,
{
    panic::catch_unwind(AssertUnwindSafe(handler))
        .unwrap_or_else(|payload| Err(ServiceError::HandlerPanic(panic_message(&payload))))
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Destination;
    use crate::reply::GENERIC_FAILURE;
    use crate::scheduler::testing::RecordingNotifier;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn dispatcher(data_dir: PathBuf) -> (Dispatcher, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let scheduler = Scheduler::new(notifier.clone(), CancellationToken::new());
        (Dispatcher::load(data_dir, scheduler), notifier)
    }

    fn interaction(raw: &str) -> Interaction {
        serde_json::from_str(raw).unwrap()
    }

    #[tokio::test]
    async fn mutations_are_persisted_and_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, _) = dispatcher(dir.path().to_path_buf());

        let reply = dispatcher
            .handle(interaction(
                r#"{"user": {"id": "U1", "name": "ada"}, "command": "goal.set", "title": "Learn Go"}"#,
            ))
            .await;
        assert_eq!(reply.first_embed().unwrap().title, "🎯 Learning Goal Set!");
        assert!(dir.path().join("goals.json").exists());
        assert!(!dir.path().join("snippets.json").exists());

        let reloaded = Stores::load(dir.path());
        assert_eq!(reloaded, dispatcher.snapshot().await);
        assert!(reloaded.goals.has("U1_Learn Go"));
    }

    #[tokio::test]
    async fn persistence_failure_keeps_memory_and_reports_generic_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let (dispatcher, _) = dispatcher(blocker.clone());

        let reply = dispatcher
            .handle(interaction(
                r#"{"user": {"id": "U1"}, "command": "goal.set", "title": "Learn Go"}"#,
            ))
            .await;
        assert_eq!(reply, Reply::notice(GENERIC_FAILURE));
        assert!(dispatcher.snapshot().await.goals.has("U1_Learn Go"));
    }

    #[tokio::test]
    async fn timer_follow_up_goes_to_reply_destination() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, notifier) = dispatcher(dir.path().to_path_buf());

        let reply = dispatcher
            .handle(interaction(
                r#"{"user": {"id": "U1"}, "command": "timer", "minutes": 1,
                    "replyTo": {"kind": "channel", "id": "99"}}"#,
            ))
            .await;
        assert_eq!(reply.first_embed().unwrap().title, "⏰ Timer Started!");
        // Delivery happens a minute later; nothing is sent yet.
        assert!(notifier.follow_ups.lock().unwrap().is_empty());
        dispatcher.scheduler().shutdown_token().cancel();
    }

    #[tokio::test]
    async fn short_follow_up_reaches_notifier() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, notifier) = dispatcher(dir.path().to_path_buf());
        let destination = Destination::Interaction { token: "tok".into() };

        let handle = dispatcher.scheduler().schedule_follow_up(
            Some(destination.clone()),
            crate::command::FollowUp {
                after: std::time::Duration::from_millis(5),
                embed: crate::commands::timer::completion_embed(1, "focus"),
            },
        );
        handle.await.unwrap();
        let sent = notifier.follow_ups.lock().unwrap();
        assert_eq!(sent[0].0, destination);
    }

    #[tokio::test]
    async fn member_join_posts_welcome_to_general() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier {
            guilds: vec![(
                "g1".into(),
                vec![("5".into(), "general".into()), ("6".into(), "daily-coding".into())],
            )],
            ..Default::default()
        });
        let scheduler = Scheduler::new(notifier.clone(), CancellationToken::new());
        let dispatcher = Dispatcher::load(dir.path().to_path_buf(), scheduler);

        let reply = dispatcher
            .handle(interaction(
                r#"{"user": {"id": "U7", "name": "grace"}, "command": "member-join", "guildId": "g1"}"#,
            ))
            .await;
        assert_eq!(reply, Reply::notice("👋 Welcoming grace"));

        for _ in 0..100 {
            if !notifier.posts.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let posts = notifier.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "5");
        assert_eq!(posts[0].1.title, "Welcome to the Learning Community! 🎉");
    }

    #[test]
    fn panics_become_handler_errors() {
        let result = run_guarded(|| panic!("boom"));
        match result {
            Err(ServiceError::HandlerPanic(message)) => assert_eq!(message, "boom"),
            other => panic!("unexpected {other:?}"),
        }

        let result = run_guarded(|| Err(ServiceError::FromString("bad".into())));
        assert!(matches!(result, Err(ServiceError::FromString(_))));
    }
}
