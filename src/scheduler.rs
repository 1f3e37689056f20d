//! Delayed and periodic deliveries.
//!
//! Every task spawned here watches the shared [`CancellationToken`], so
//! nothing fires once shutdown has begun.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;

use crate::command::{Announcement, Destination, FollowUp};
use crate::error::{ServiceError, ServiceResult};
use crate::notify::Notifier;
use crate::reply::{Embed, colors};

pub const REMINDER_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

pub fn reminder_embed() -> Embed {
    Embed::new(colors::STATS, "🌅 Daily Learning Reminder")
        .description("Time to level up your coding skills!")
        .field("💡 Today's Focus", "What will you learn or build today?")
        .field(
            "🎯 Quick Tips",
            "• Use `/challenge` for a coding problem\n• Set a goal with `/goal set`\n• Save useful snippets with `/snippet save`",
        )
        .footer("Every day is a chance to grow! 🚀")
}

#[derive(Clone)]
pub struct Scheduler {
    notifier: Arc<dyn Notifier>,
    shutdown: CancellationToken,
}

impl Scheduler {
    pub fn new(notifier: Arc<dyn Notifier>, shutdown: CancellationToken) -> Self {
        Self { notifier, shutdown }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Delivers `follow_up` after its delay unless shutdown comes first.
    /// Without a destination the message is dropped with a warning.
    pub fn schedule_follow_up(
        &self,
        destination: Option<Destination>,
        follow_up: FollowUp,
    ) -> JoinHandle<()> {
        let notifier = self.notifier.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("Follow-up cancelled by shutdown");
                    return;
                }
                _ = tokio::time::sleep(follow_up.after) => {}
            }

            let Some(destination) = destination else {
                tracing::warn!("Could not send follow-up: interaction context expired");
                return;
            };
            let embed = follow_up.embed;
            let result = run_blocking(move || notifier.follow_up(&destination, &embed)).await;
            if let Err(e) = result {
                tracing::warn!("Could not send follow-up: {e}");
            }
        })
    }

    /// Posts the reminder to every channel named `channel_name` once per `period`,
    /// first tick one period from now.
    pub fn spawn_daily_reminder(&self, channel_name: String, period: Duration) -> JoinHandle<()> {
        let notifier = self.notifier.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            tracing::info!(
                "Daily reminder scheduled for #{channel_name} every {}s",
                period.as_secs()
            );
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticks.tick() => {
                        let delivered = broadcast_reminder(notifier.clone(), channel_name.clone()).await;
                        tracing::info!("Daily reminder delivered to {delivered} channel(s)");
                    }
                }
            }
            tracing::debug!("Daily reminder stopped");
        })
    }

    /// Posts `announcement` to the first matching channel of its guild. A guild
    /// without such a channel gets nothing; failures are logged.
    pub fn announce(&self, announcement: Announcement) -> JoinHandle<()> {
        let notifier = self.notifier.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            if shutdown.is_cancelled() {
                return;
            }
            let Announcement {
                guild_id,
                channel_name,
                embed,
            } = announcement;
            let result = run_blocking(move || {
                let channels = notifier.text_channels(&guild_id, &channel_name)?;
                match channels.first() {
                    Some(id) => notifier.post(id, &embed).map(|()| true),
                    None => {
                        tracing::info!("Guild {guild_id} has no #{channel_name} channel");
                        Ok(false)
                    }
                }
            })
            .await;
            if let Err(e) = result {
                tracing::warn!("Could not post announcement: {e}");
            }
        })
    }
}

async fn run_blocking<T, F>(f: F) -> ServiceResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::FromString(format!("Task join error: {e}")))?
}

/// Sends one reminder round. A guild whose channels cannot be listed, or a
/// channel that rejects the post, does not stop the others.
pub async fn broadcast_reminder(notifier: Arc<dyn Notifier>, channel_name: String) -> usize {
    let result = run_blocking(move || {
        let embed = reminder_embed();
        let mut delivered = 0;
        for guild_id in notifier.guilds()? {
            let channels = match notifier.text_channels(&guild_id, &channel_name) {
                Ok(channels) => channels,
                Err(e) => {
                    tracing::warn!("Could not list channels of guild {guild_id}: {e}");
                    continue;
                }
            };
            for id in channels {
                match notifier.post(&id, &embed) {
                    Ok(()) => delivered += 1,
                    Err(e) => tracing::warn!("Daily reminder to channel {id} failed: {e}"),
                }
            }
        }
        Ok(delivered)
    })
    .await;

    result.unwrap_or_else(|e| {
        tracing::warn!("Daily reminder round failed: {e}");
        0
    })
}
