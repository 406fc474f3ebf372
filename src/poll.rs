use std::time::Duration;

use rocket::tokio::{self, sync::watch, task::JoinHandle, time::MissedTickBehavior};
use sqlx::{Pool, Sqlite};
use tracing::{Instrument, debug, info_span, warn};

use crate::db::list_messages;
use crate::error::AppError;
use crate::models::Message;

#[rocket::async_trait]
pub trait MessageSource: Send + Sync + 'static {
    async fn fetch_messages(&self, conversation_id: i64) -> Result<Vec<Message>, AppError>;
}

#[rocket::async_trait]
impl MessageSource for Pool<Sqlite> {
    async fn fetch_messages(&self, conversation_id: i64) -> Result<Vec<Message>, AppError> {
        list_messages(self, conversation_id).await
    }
}

/// Re-fetches one conversation's full message list on a fixed interval and publishes
/// each snapshot that differs from the last. No backoff and no delta fetch; a failed
/// fetch is logged and retried on the next tick. Dropping the poller stops it.
pub struct MessagePoller {
    receiver: watch::Receiver<Option<Vec<Message>>>,
    task: JoinHandle<()>,
}

impl MessagePoller {
    pub fn spawn<S: MessageSource>(source: S, conversation_id: i64, interval: Duration) -> Self {
        let (sender, receiver) = watch::channel(None);

        let task = tokio::spawn(
            async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    ticker.tick().await;

                    if sender.is_closed() {
                        break;
                    }

                    match source.fetch_messages(conversation_id).await {
                        Ok(messages) => {
                            let changed = sender.send_if_modified(|current| {
                                if current.as_ref() == Some(&messages) {
                                    return false;
                                }
                                *current = Some(messages);
                                true
                            });
                            if changed {
                                debug!("Published new message snapshot");
                            }
                        }
                        Err(err) => warn!(error = %err, "Message poll failed"),
                    }
                }
            }
            .instrument(info_span!("message_poller", conversation_id)),
        );

        Self { receiver, task }
    }

    /// Waits for the next changed snapshot. `None` once the poller task has ended.
    pub async fn changed(&mut self) -> Option<Vec<Message>> {
        self.receiver.changed().await.ok()?;
        self.receiver.borrow_and_update().clone()
    }

    pub fn latest(&self) -> Option<Vec<Message>> {
        self.receiver.borrow().clone()
    }
}

impl Drop for MessagePoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}
