#[cfg(test)]
mod tests {
    use crate::protocol::Message;
    use crate::queue::QueueKind;
    use crate::storage::{create_store, BlockingGet, MessageStore, RamStorage, StorageKind};

    fn store() -> RamStorage {
        RamStorage::new(QueueKind::MutexQueue)
    }

    #[test]
    fn test_post_then_get_fifo() {
        let storage = store();
        storage.post_message("t1", Message::text("first"));
        storage.post_message("t1", Message::text("second"));
        storage.post_message("t2", Message::binary("other"));

        assert_eq!(
            storage.get_message_nonblocking("t1"),
            Some(Message::text("first"))
        );
        assert_eq!(
            storage.get_message_nonblocking("t1"),
            Some(Message::text("second"))
        );
        assert_eq!(storage.get_message_nonblocking("t1"), None);
        assert_eq!(
            storage.get_message_nonblocking("t2"),
            Some(Message::binary("other"))
        );
    }

    #[test]
    fn test_get_unknown_topic_is_a_miss_not_an_error() {
        let storage = store();
        for _ in 0..1000 {
            assert_eq!(storage.get_message_nonblocking("never-posted"), None);
        }
        // The misses must not have created state that swallows a post.
        storage.post_message("never-posted", Message::text("x"));
        assert_eq!(
            storage.get_message_nonblocking("never-posted"),
            Some(Message::text("x"))
        );
    }

    #[test]
    fn test_blocking_get_pops_existing_head() {
        let storage = store();
        storage.post_message("t", Message::text("head"));
        match storage.get_message_blocking("t") {
            BlockingGet::Ready(message) => assert_eq!(message, Message::text("head")),
            BlockingGet::Parked(_) => panic!("expected a ready message"),
        }
    }

    #[tokio::test]
    async fn test_post_hands_off_to_parked_waiter() {
        let storage = store();
        let rx = match storage.get_message_blocking("t") {
            BlockingGet::Parked(rx) => rx,
            BlockingGet::Ready(_) => panic!("topic should be empty"),
        };

        storage.post_message("t", Message::text("delivered"));
        assert_eq!(rx.await.unwrap(), Message::text("delivered"));

        // Handed off, not enqueued: the topic stays empty.
        assert_eq!(storage.get_message_nonblocking("t"), None);
    }

    #[tokio::test]
    async fn test_waiters_are_served_in_arrival_order() {
        let storage = store();
        let first = match storage.get_message_blocking("t") {
            BlockingGet::Parked(rx) => rx,
            BlockingGet::Ready(_) => panic!("topic should be empty"),
        };
        let second = match storage.get_message_blocking("t") {
            BlockingGet::Parked(rx) => rx,
            BlockingGet::Ready(_) => panic!("topic should be empty"),
        };

        storage.post_message("t", Message::text("one"));
        storage.post_message("t", Message::text("two"));

        assert_eq!(first.await.unwrap(), Message::text("one"));
        assert_eq!(second.await.unwrap(), Message::text("two"));
    }

    #[tokio::test]
    async fn test_dead_waiter_is_skipped() {
        let storage = store();
        let dead = match storage.get_message_blocking("t") {
            BlockingGet::Parked(rx) => rx,
            BlockingGet::Ready(_) => panic!("topic should be empty"),
        };
        drop(dead);
        let live = match storage.get_message_blocking("t") {
            BlockingGet::Parked(rx) => rx,
            BlockingGet::Ready(_) => panic!("topic should be empty"),
        };

        storage.post_message("t", Message::text("m"));
        assert_eq!(live.await.unwrap(), Message::text("m"));
    }

    #[test]
    fn test_post_with_only_dead_waiters_enqueues() {
        let storage = store();
        match storage.get_message_blocking("t") {
            BlockingGet::Parked(rx) => drop(rx),
            BlockingGet::Ready(_) => panic!("topic should be empty"),
        }

        storage.post_message("t", Message::text("kept"));
        assert_eq!(
            storage.get_message_nonblocking("t"),
            Some(Message::text("kept"))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_posts_and_parked_consumers_conserve_messages() {
        use std::sync::Arc;

        let storage: Arc<dyn MessageStore> = create_store(StorageKind::Ram, QueueKind::MutexQueue);
        let consumers: Vec<_> = (0..8)
            .map(|_| {
                let storage = Arc::clone(&storage);
                tokio::spawn(async move {
                    match storage.get_message_blocking("t") {
                        BlockingGet::Ready(message) => message,
                        BlockingGet::Parked(rx) => rx.await.unwrap(),
                    }
                })
            })
            .collect();

        let producer = {
            let storage = Arc::clone(&storage);
            tokio::spawn(async move {
                for i in 0..8 {
                    storage.post_message("t", Message::text(format!("m{}", i)));
                }
            })
        };
        producer.await.unwrap();

        let mut received: Vec<_> = Vec::new();
        for consumer in consumers {
            received.push(consumer.await.unwrap());
        }
        received.sort_by(|a, b| a.data.cmp(&b.data));
        let expected: Vec<_> = (0..8).map(|i| Message::text(format!("m{}", i))).collect();
        assert_eq!(received, expected);

        // Every message went to exactly one consumer; nothing left behind.
        assert_eq!(storage.get_message_nonblocking("t"), None);
    }

    #[test]
    fn test_storage_kind_fallback() {
        assert_eq!(StorageKind::from_name("ram"), StorageKind::Ram);
        assert_eq!(StorageKind::from_name("disk"), StorageKind::Ram);
        assert_eq!(StorageKind::Ram.as_str(), "ram");
    }
}
