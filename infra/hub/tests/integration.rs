pub mod fixtures;

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use beacon_hub::*;
    use futures_util::{FutureExt, StreamExt};

    #[tokio::test]
    async fn test_detached_subscriber_misses_later_events() {
        let hub = Hub::with_defaults();
        let mut h1 = hub.attach().await.unwrap();

        hub.publish("alpha").await.unwrap();
        hub.publish("beta").await.unwrap();
        assert_eq!(next_text(&mut h1).await, "alpha");
        assert_eq!(next_text(&mut h1).await, "beta");

        hub.detach(&h1).await;
        hub.publish("gamma").await.unwrap();

        assert!(next_event(&mut h1).await.is_none(), "gamma must not reach a detached handle");
        assert_eq!(h1.state(), SubscriberState::Detached);
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_publish_order() {
        let hub = Hub::with_defaults();
        let mut h1 = hub.attach().await.unwrap();
        let mut h2 = hub.attach().await.unwrap();

        hub.publish("x").await.unwrap();
        hub.publish("y").await.unwrap();

        for handle in [&mut h1, &mut h2] {
            assert_eq!(next_text(handle).await, "x");
            assert_eq!(next_text(handle).await, "y");
        }
    }

    #[tokio::test]
    async fn test_long_sequence_arrives_in_order() {
        let total = 500;
        let hub = hub_with(1024, OverflowPolicy::DropEvent);
        let mut subscriber = hub.attach().await.unwrap();

        for i in 0..total {
            hub.publish(format!("event-{i}")).await.unwrap();
        }

        let mut last_seq = 0;
        for i in 0..total {
            let event = next_event(&mut subscriber).await.unwrap();
            assert_eq!(event.text(), format!("event-{i}"));
            assert!(event.seq() > last_seq, "sequence numbers must increase");
            last_seq = event.seq();
        }
    }

    #[tokio::test]
    async fn test_nothing_delivered_after_detach_ack() {
        let hub = Hub::with_defaults();
        let mut subscriber = hub.attach().await.unwrap();
        let _witness = hub.attach().await.unwrap();

        hub.detach(&subscriber).await;
        for i in 0..25 {
            let delivery = hub.broadcast(format!("late-{i}")).await.unwrap();
            assert_eq!(delivery.delivered, 1, "only the witness remains attached");
        }

        assert!(drain(&mut subscriber).is_empty());
        assert!(next_event(&mut subscriber).await.is_none());
    }

    #[tokio::test]
    async fn test_detach_and_close_are_idempotent() {
        let hub = Hub::with_defaults();
        let subscriber = hub.attach().await.unwrap();

        hub.detach(&subscriber).await;
        subscriber.detach().await;
        subscriber.close();

        assert!(hub.members().await.unwrap().is_empty());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_dropping_handle_detaches() {
        let hub = Hub::with_defaults();
        let subscriber = hub.attach().await.unwrap();
        let id = subscriber.id();
        assert_eq!(hub.members().await.unwrap(), vec![id]);

        drop(subscriber);

        assert!(hub.members().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_attach_leaves_no_member() {
        let hub = Hub::with_defaults();

        // First poll sends the attach; the control loop has not answered yet.
        assert!(hub.attach().now_or_never().is_none());

        assert!(hub.members().await.unwrap().is_empty());
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.broadcast("after").await.unwrap().disconnected, 0);
    }

    #[tokio::test]
    async fn test_slow_subscriber_drops_without_stalling_others() {
        let capacity = 4;
        let hub = hub_with(capacity, OverflowPolicy::DropEvent);
        let mut slow = hub.attach().await.unwrap();
        let mut fast = hub.attach().await.unwrap();

        let mut dropped = 0;
        for i in 0..20 {
            let delivery = hub.broadcast(format!("n{i}")).await.unwrap();
            dropped += delivery.dropped;
            assert_eq!(next_text(&mut fast).await, format!("n{i}"));
        }

        assert_eq!(dropped, 16);
        assert!(slow.is_attached());
        let kept: Vec<String> = drain(&mut slow).iter().map(|e| e.text().into_owned()).collect();
        assert_eq!(kept, ["n0", "n1", "n2", "n3"]);

        // Once it catches up it receives new events again.
        hub.publish("fresh").await.unwrap();
        assert_eq!(next_text(&mut slow).await, "fresh");
    }

    #[tokio::test]
    async fn test_slow_subscriber_disconnected_under_disconnect_policy() {
        let hub = hub_with(4, OverflowPolicy::Disconnect);
        let mut slow = hub.attach().await.unwrap();
        let mut fast = hub.attach().await.unwrap();

        let mut disconnected = 0;
        for i in 0..10 {
            let delivery = hub.broadcast(format!("n{i}")).await.unwrap();
            disconnected += delivery.disconnected;
            assert_eq!(next_text(&mut fast).await, format!("n{i}"));
        }

        assert_eq!(disconnected, 1);
        assert_eq!(slow.state(), SubscriberState::Detached);
        assert_eq!(drain(&mut slow).len(), 4);
        assert!(next_event(&mut slow).await.is_none());
        assert_eq!(hub.members().await.unwrap(), vec![fast.id()]);
        assert_eq!(hub.stats().disconnected, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_producers_keep_their_own_order() {
        let producers = 4;
        let per_producer = 100;
        let hub = hub_with(1024, OverflowPolicy::DropEvent);
        let mut subscriber = hub.attach().await.unwrap();

        let tasks: Vec<_> = (0..producers)
            .map(|p| {
                let hub = hub.clone();
                tokio::spawn(async move {
                    for n in 0..per_producer {
                        hub.publish(format!("{p}:{n}")).await.unwrap();
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let mut next_expected = vec![0usize; producers];
        for _ in 0..producers * per_producer {
            let event = next_event(&mut subscriber).await.unwrap();
            let text = event.text();
            let (p, n) = text.split_once(':').unwrap();
            let (p, n): (usize, usize) = (p.parse().unwrap(), n.parse().unwrap());
            assert_eq!(n, next_expected[p], "producer {p} reordered");
            next_expected[p] += 1;
        }
        assert!(next_expected.iter().all(|&n| n == per_producer));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let hub = Hub::with_defaults();
        let delivery = hub.broadcast("nobody").await.unwrap();

        assert_eq!(delivery.delivered + delivery.dropped + delivery.disconnected, 0);
        assert_eq!(hub.stats().published, 1);
    }

    #[tokio::test]
    async fn test_shutdown_ends_streams_and_rejects_calls() {
        let hub = Hub::with_defaults();
        let mut h1 = hub.attach().await.unwrap();
        let h2 = hub.attach().await.unwrap();

        assert_eq!(hub.shutdown().await, 2);
        assert!(hub.is_closed());
        assert!(next_event(&mut h1).await.is_none());
        assert_eq!(h2.state(), SubscriberState::Detached);

        assert!(matches!(hub.publish("late").await, Err(HubError::Closed { .. })));
        assert!(matches!(hub.try_publish("late"), Err(HubError::Closed { .. })));
        assert!(matches!(hub.attach().await, Err(HubError::Closed { .. })));
        assert!(hub.members().await.is_err());
        assert_eq!(hub.shutdown().await, 0);

        // Still safe to detach and drop handles afterwards.
        hub.detach(&h2).await;
    }

    #[tokio::test]
    async fn test_try_publish_reports_full_queue() {
        let hub = Hub::spawn(HubConfig::default().with_publish_capacity(1)).unwrap();

        // The control loop cannot run until this task yields.
        hub.try_publish("first").unwrap();
        let err = hub.try_publish("second").unwrap_err();
        assert!(matches!(err, HubError::ChannelFull { .. }));
        assert!(err.to_string().contains("try_publish"));

        hub.members().await.unwrap();
        hub.try_publish("third").unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let err = Hub::spawn(HubConfig::default().with_subscriber_capacity(0)).unwrap_err();
        assert!(matches!(err, HubError::InvalidCapacity { .. }));
    }

    #[tokio::test]
    async fn test_stats_track_membership_and_traffic() {
        let hub = Hub::with_defaults();
        let mut stats = hub.watch_stats();

        let subscriber = hub.attach().await.unwrap();
        stats.wait_for(|s| s.subscribers == 1).await.unwrap();

        hub.broadcast("one").await.unwrap();
        hub.broadcast("two").await.unwrap();

        let snapshot = hub.stats();
        assert_eq!(snapshot.published, 2);
        assert_eq!(snapshot.delivered, 2);
        assert_eq!(snapshot.dropped, 0);

        hub.detach(&subscriber).await;
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_named_events_keep_their_name() {
        let hub = Hub::with_defaults();
        let mut subscriber = hub.attach().await.unwrap();

        hub.publish(Event::named("tick", "the time is now")).await.unwrap();

        let event = next_event(&mut subscriber).await.unwrap();
        assert_eq!(event.name(), Some("tick"));
        assert_eq!(event.seq(), 1);
    }

    #[tokio::test]
    async fn test_stream_ends_when_hub_shuts_down() {
        let hub = Hub::with_defaults();
        let stream = hub.attach().await.unwrap().into_stream();

        hub.publish("a").await.unwrap();
        hub.publish("b").await.unwrap();
        hub.shutdown().await;

        let received: Vec<String> = stream.map(|e| e.text().into_owned()).collect().await;
        assert_eq!(received, ["a", "b"]);
    }
}
