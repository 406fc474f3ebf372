#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use chrono::Utc;
    use rocket::tokio::{self, sync::Mutex};

    use crate::db::{get_user, send_message, start_conversation};
    use crate::error::AppError;
    use crate::models::{Message, SenderRole};
    use crate::poll::{MessagePoller, MessageSource};
    use crate::test::test_db::{TestDbBuilder, athlete_profile};

    #[derive(Clone, Default)]
    struct ScriptedSource {
        messages: Arc<Mutex<Vec<Message>>>,
        fetches: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        async fn push(&self, body: &str) {
            let mut messages = self.messages.lock().await;
            let id = messages.len() as i64 + 1;
            messages.push(Message {
                id,
                conversation_id: 1,
                sender_user_id: 2,
                sender_role: SenderRole::Coach,
                body: body.to_string(),
                created_at: Utc::now(),
                read_at: None,
            });
        }
    }

    #[rocket::async_trait]
    impl MessageSource for ScriptedSource {
        async fn fetch_messages(&self, _conversation_id: i64) -> Result<Vec<Message>, AppError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.messages.lock().await.clone())
        }
    }

    struct FailingSource;

    #[rocket::async_trait]
    impl MessageSource for FailingSource {
        async fn fetch_messages(&self, _conversation_id: i64) -> Result<Vec<Message>, AppError> {
            Err(AppError::Internal("database went away".to_string()))
        }
    }

    const TICK: Duration = Duration::from_millis(10);

    #[tokio::test]
    async fn test_poller_publishes_only_changed_snapshots() {
        let source = ScriptedSource::default();
        source.push("hello").await;

        let mut poller = MessagePoller::spawn(source.clone(), 1, TICK);

        let first = poller.changed().await.expect("Poller stopped");
        assert_eq!(first.len(), 1);

        // Several ticks with nothing new must not publish again.
        let quiet = tokio::time::timeout(TICK * 5, poller.changed()).await;
        assert!(quiet.is_err(), "Unchanged snapshot was published");
        assert!(source.fetches.load(Ordering::SeqCst) >= 2);

        source.push("are you there?").await;
        let second = tokio::time::timeout(Duration::from_secs(2), poller.changed())
            .await
            .expect("No snapshot after a new message")
            .expect("Poller stopped");
        let bodies: Vec<&str> = second.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["hello", "are you there?"]);
        assert_eq!(poller.latest(), Some(second));
    }

    #[tokio::test]
    async fn test_failed_fetches_publish_nothing() {
        let mut poller = MessagePoller::spawn(FailingSource, 1, TICK);

        let result = tokio::time::timeout(TICK * 5, poller.changed()).await;

        assert!(result.is_err());
        assert_eq!(poller.latest(), None);
    }

    #[tokio::test]
    async fn test_dropping_poller_stops_fetching() {
        let source = ScriptedSource::default();
        let poller = MessagePoller::spawn(source.clone(), 1, TICK);

        tokio::time::sleep(TICK * 3).await;
        drop(poller);
        tokio::time::sleep(TICK * 2).await;
        let after_drop = source.fetches.load(Ordering::SeqCst);

        tokio::time::sleep(TICK * 5).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), after_drop);
    }

    #[tokio::test]
    async fn test_poller_reads_conversation_from_database() {
        let test_db = TestDbBuilder::new()
            .school("State University", Some("OH"))
            .coach("coach@state.edu", "State University", true)
            .athlete_with_profile(
                "alex@example.com",
                athlete_profile("Alex", "Johnson", "Basketball", "CA"),
            )
            .build()
            .await
            .expect("Failed to build test database");
        let coach = get_user(&test_db.pool, test_db.user_id("coach@state.edu"))
            .await
            .unwrap();
        let conversation =
            start_conversation(&test_db.pool, test_db.user_id("alex@example.com"), coach.id)
                .await
                .unwrap();
        send_message(&test_db.pool, &conversation, &coach, "Welcome")
            .await
            .unwrap();

        let mut poller = MessagePoller::spawn(test_db.pool.clone(), conversation.id, TICK);
        let snapshot = tokio::time::timeout(Duration::from_secs(2), poller.changed())
            .await
            .expect("No snapshot from the database")
            .expect("Poller stopped");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].body, "Welcome");
    }
}
