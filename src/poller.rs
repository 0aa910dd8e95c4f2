use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::discord::ChannelGateway;
use crate::replies::ReplyTable;
use crate::store::{InsertOutcome, Store};

/// Drives the endless sweep: fetch, persist, match, send for every channel,
/// then idle for the configured interval. In-loop failures are logged and
/// never abort the loop; stopping the process is the only way out.
pub struct Poller<G> {
    gateway: G,
    store: Store,
    replies: ReplyTable,
    channel_ids: Vec<u64>,
    interval: Duration,
}

impl<G: ChannelGateway> Poller<G> {
    pub fn new(
        gateway: G,
        store: Store,
        replies: ReplyTable,
        channel_ids: Vec<u64>,
        interval: Duration,
    ) -> Self {
        Self {
            gateway,
            store,
            replies,
            channel_ids,
            interval,
        }
    }

    pub async fn run(&self) -> Result<()> {
        info!(
            "Polling {} channels every {:?}",
            self.channel_ids.len(),
            self.interval
        );

        loop {
            self.sweep().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One pass over every configured channel, strictly in list order.
    pub async fn sweep(&self) {
        for &channel_id in &self.channel_ids {
            self.poll_channel(channel_id).await;
        }
    }

    async fn poll_channel(&self, channel_id: u64) {
        let message = match self.gateway.latest_message(channel_id).await {
            Ok(message) => message,
            Err(e) => {
                warn!("Skipping channel {} this sweep: {:#}", channel_id, e);
                return;
            }
        };

        match self.store.insert(&message).await {
            Ok(InsertOutcome::Inserted) => {
                info!("Stored message {} from channel {}", message.id, channel_id);
            }
            Ok(InsertOutcome::Skipped) => {
                debug!("Message {} already stored", message.id);
            }
            // A failed insert is a no-op; reply handling stays independent
            // of the persistence outcome.
            Err(e) => {
                error!("Failed to store message {}: {:#}", message.id, e);
            }
        }

        if let Some(reply) = self.replies.lookup(&message.content) {
            if !self.gateway.post_reply(channel_id, reply).await {
                warn!("Reply to channel {} was not delivered", channel_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{AttachmentInfo, AttachmentKind, MediaKind, Message};
    use anyhow::Context;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct FakeGateway {
        // Channels absent from the map simulate a failed fetch.
        latest: HashMap<u64, Message>,
        sends: Arc<Mutex<Vec<(u64, String)>>>,
    }

    #[async_trait]
    impl ChannelGateway for FakeGateway {
        async fn latest_message(&self, channel_id: u64) -> Result<Message> {
            self.latest
                .get(&channel_id)
                .cloned()
                .with_context(|| format!("Discord API error (403 Forbidden) for channel {channel_id}"))
        }

        async fn post_reply(&self, channel_id: u64, text: &str) -> bool {
            self.sends.lock().unwrap().push((channel_id, text.to_string()));
            true
        }
    }

    fn make_message(id: i64, content: &str, attachment: Option<AttachmentInfo>) -> Message {
        Message::from_parts(
            id,
            Some("kay".to_string()),
            content.to_string(),
            Utc.with_ymd_and_hms(2024, 9, 6, 12, 0, 0).unwrap(),
            attachment,
        )
    }

    fn make_poller(
        latest: HashMap<u64, Message>,
        channel_ids: Vec<u64>,
    ) -> (Poller<FakeGateway>, Arc<Mutex<Vec<(u64, String)>>>) {
        let sends = Arc::new(Mutex::new(Vec::new()));
        let gateway = FakeGateway {
            latest,
            sends: Arc::clone(&sends),
        };
        let poller = Poller::new(
            gateway,
            Store::open_in_memory().unwrap(),
            ReplyTable::default(),
            channel_ids,
            Duration::from_secs(2),
        );
        (poller, sends)
    }

    #[tokio::test]
    async fn matching_message_sends_the_reply() {
        let latest = HashMap::from([(1, make_message(10, "  How ARE you \n", None))]);
        let (poller, sends) = make_poller(latest, vec![1]);

        poller.sweep().await;

        assert_eq!(*sends.lock().unwrap(), vec![(1, "fine".to_string())]);
        assert_eq!(poller.store.fetch_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn image_message_is_stored_with_classification() {
        let attachment = AttachmentInfo {
            id: 55,
            media: MediaKind::Image,
            url: "https://x/y.png".to_string(),
        };
        let latest = HashMap::from([(1, make_message(10, "", Some(attachment)))]);
        let (poller, sends) = make_poller(latest, vec![1]);

        poller.sweep().await;

        let rows = poller.store.fetch_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].attachment_kind, AttachmentKind::Image);
        assert_eq!(rows[0].attachment_url, "https://x/y.png");
        assert_eq!(rows[0].attachment_id, 55);
        assert!(sends.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_skips_channel_and_sweep_continues() {
        let latest = HashMap::from([(2, make_message(20, "hi", None))]);
        let (poller, sends) = make_poller(latest, vec![1, 2]);

        poller.sweep().await;

        // Channel 1 failed to fetch: nothing stored, nothing sent for it.
        let rows = poller.store.fetch_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 20);
        assert_eq!(*sends.lock().unwrap(), vec![(2, "hello".to_string())]);
    }

    #[tokio::test]
    async fn duplicate_message_is_still_re_evaluated_for_reply() {
        let latest = HashMap::from([(1, make_message(10, "hi", None))]);
        let (poller, sends) = make_poller(latest, vec![1]);

        poller.sweep().await;
        poller.sweep().await;

        // One row, but the reply fired on both sweeps.
        assert_eq!(poller.store.fetch_all().await.unwrap().len(), 1);
        assert_eq!(sends.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn non_matching_message_sends_nothing() {
        let latest = HashMap::from([(1, make_message(10, "hi there", None))]);
        let (poller, sends) = make_poller(latest, vec![1]);

        poller.sweep().await;

        assert!(sends.lock().unwrap().is_empty());
        assert_eq!(poller.store.fetch_all().await.unwrap().len(), 1);
    }
}
