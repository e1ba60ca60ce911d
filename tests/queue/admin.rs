//! Administration integration tests

use crate::common::{backend_message, client_with_consumer, memory_client};

#[tokio::test]
async fn test_create_queue_reports_existing() {
    let (_engine, client) = memory_client();
    let admin = client.admin();

    assert!(admin.create_queue("orders").await.unwrap());
    assert!(!admin.create_queue("orders").await.unwrap());
    assert_eq!(admin.queue_names().await.unwrap(), vec!["orders"]);
}

#[tokio::test]
async fn test_drop_unknown_queue_leaves_queues_unchanged() {
    let (_engine, client) = memory_client();
    let admin = client.admin();
    admin.create_queue("orders").await.unwrap();
    admin.create_queue("payments").await.unwrap();

    let err = admin.drop_queue("missing", false).await.unwrap_err();
    assert!(backend_message(&err).unwrap().contains("No such event queue"));

    assert_eq!(
        admin.queue_names().await.unwrap(),
        vec!["orders", "payments"]
    );
}

#[tokio::test]
async fn test_drop_queue_with_consumers_needs_force() {
    let (_engine, client) = client_with_consumer("orders", "billing").await;
    let admin = client.admin();

    let err = admin.drop_queue("orders", false).await.unwrap_err();
    assert!(backend_message(&err).unwrap().contains("consumers still attached"));

    admin.drop_queue("orders", true).await.unwrap();
    assert!(admin.queue_names().await.unwrap().is_empty());
    assert!(admin.queue_info("orders").await.unwrap().is_none());
}

#[tokio::test]
async fn test_queue_info_shapes() {
    let (_engine, client) = memory_client();
    let admin = client.admin();
    admin.create_queue("orders").await.unwrap();
    admin.create_queue("payments").await.unwrap();

    let all = admin.get_queue_info(None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|info| info.last_tick_id == 1 && info.ev_new == 0));

    let one = admin.get_queue_info(Some("payments")).await.unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].queue_name, "payments");

    assert!(admin.get_queue_info(Some("missing")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_consumer_info_shapes() {
    let (engine, client) = client_with_consumer("orders", "billing").await;
    client.consumer("orders", "audit").register().await.unwrap();
    client.admin().create_queue("payments").await.unwrap();
    client.consumer("payments", "billing").register().await.unwrap();
    let admin = client.admin();

    assert_eq!(admin.get_consumer_info(None, None).await.unwrap().len(), 3);
    assert_eq!(
        admin.get_consumer_info(Some("orders"), None).await.unwrap().len(),
        2
    );

    let one = admin
        .get_consumer_info(Some("payments"), Some("billing"))
        .await
        .unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].queue_name, "payments");
    assert_eq!(one[0].current_batch, None);

    assert!(admin
        .consumer_info("payments", "audit")
        .await
        .unwrap()
        .is_none());

    let before = engine.calls().len();
    let err = admin.get_consumer_info(None, Some("billing")).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(engine.calls().len(), before);
}

#[tokio::test]
async fn test_consumer_info_tracks_open_batch() {
    let (_engine, client) = client_with_consumer("orders", "billing").await;
    client
        .producer()
        .insert_event("orders", "order.created", "{}", None)
        .await
        .unwrap();
    client.ticker().force_tick("orders").await.unwrap();
    let consumer = client.consumer("orders", "billing");
    let batch_id = consumer.next_batch().await.unwrap().unwrap();

    let info = client
        .admin()
        .consumer_info("orders", "billing")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(info.current_batch, Some(batch_id));
    assert_eq!(info.next_tick, Some(2));
    assert_eq!(info.last_tick, 1);
    assert_eq!(info.pending_events, Some(1));
}

#[tokio::test]
async fn test_batch_info_only_for_open_batches() {
    let (_engine, client) = client_with_consumer("orders", "billing").await;
    for _ in 0..3 {
        client
            .producer()
            .insert_event("orders", "order.created", "{}", None)
            .await
            .unwrap();
    }
    client.ticker().force_tick("orders").await.unwrap();
    let consumer = client.consumer("orders", "billing");
    let batch_id = consumer.next_batch().await.unwrap().unwrap();

    let info = client.admin().get_batch_info(batch_id).await.unwrap().unwrap();
    assert_eq!(info.queue_name, "orders");
    assert_eq!(info.consumer_name, "billing");
    assert_eq!((info.prev_tick_id, info.tick_id), (1, 2));
    assert_eq!(info.seq_end - info.seq_start, 2);

    consumer.finish_batch(batch_id).await.unwrap();
    assert!(client.admin().get_batch_info(batch_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_queue_config_and_metadata() {
    let (_engine, client) = memory_client();
    let admin = client.admin();
    admin.create_queue("orders").await.unwrap();

    admin
        .set_queue_config("orders", "ticker_max_count", "1000")
        .await
        .unwrap();
    let err = admin
        .set_queue_config("orders", "no_such_param", "1")
        .await
        .unwrap_err();
    assert!(backend_message(&err).unwrap().contains("cannot change parameter"));

    assert_eq!(
        admin.current_event_table("orders").await.unwrap(),
        "pgq.event_1_0"
    );
    assert!(!admin.version().await.unwrap().is_empty());
}
