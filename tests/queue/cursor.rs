//! Batch cursor integration tests

use crate::common::{backend_message, client_with_consumer};

#[tokio::test]
async fn test_cursor_pages_through_batch() {
    let (engine, client) = client_with_consumer("orders", "billing").await;
    let consumer = client.consumer("orders", "billing");
    for i in 0..10 {
        client
            .producer()
            .insert_event("orders", "order.created", &i.to_string(), None)
            .await
            .unwrap();
    }
    client.ticker().force_tick("orders").await.unwrap();
    let batch_id = consumer.next_batch().await.unwrap().unwrap();

    let mut seen = consumer
        .get_batch_cursor(batch_id, "batch_walk", 4, None)
        .await
        .unwrap();
    assert_eq!(seen.len(), 4);

    loop {
        let page = consumer.fetch_cursor("batch_walk", 4).await.unwrap();
        if page.is_empty() {
            break;
        }
        assert!(page.len() <= 4);
        seen.extend(page);
    }
    consumer.close_cursor("batch_walk").await.unwrap();

    assert_eq!(
        seen.iter().map(|event| event.ev_id).collect::<Vec<_>>(),
        (1..=10).collect::<Vec<i64>>()
    );
    assert!(engine.open_cursors().is_empty());
    assert!(consumer.finish_batch(batch_id).await.unwrap());
}

#[tokio::test]
async fn test_cursor_with_condition_filters_events() {
    let (_engine, client) = client_with_consumer("orders", "billing").await;
    let consumer = client.consumer("orders", "billing");
    for ev_type in ["created", "paid", "created", "paid", "paid"] {
        client
            .producer()
            .insert_event("orders", ev_type, "{}", None)
            .await
            .unwrap();
    }
    client.ticker().force_tick("orders").await.unwrap();
    let batch_id = consumer.next_batch().await.unwrap().unwrap();

    let first = consumer
        .get_batch_cursor(batch_id, "paid_only", 100, Some("ev_type = 'paid'"))
        .await
        .unwrap();
    assert_eq!(
        first.iter().map(|event| event.ev_id).collect::<Vec<_>>(),
        vec![2, 4, 5]
    );
    assert!(consumer.fetch_cursor("paid_only", 10).await.unwrap().is_empty());
    consumer.close_cursor("paid_only").await.unwrap();
}

#[tokio::test]
async fn test_invalid_cursor_name_never_reaches_backend() {
    let (engine, client) = client_with_consumer("orders", "billing").await;
    let consumer = client.consumer("orders", "billing");
    let before = engine.calls().len();

    let err = consumer
        .get_batch_cursor(1, "walk; DROP TABLE pgq.queue", 10, None)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(consumer.fetch_cursor("1walk", 10).await.unwrap_err().is_validation());
    assert!(consumer.close_cursor("").await.unwrap_err().is_validation());

    assert_eq!(engine.calls().len(), before);
}

#[tokio::test]
async fn test_fetch_from_unknown_cursor_is_a_backend_error() {
    let (_engine, client) = client_with_consumer("orders", "billing").await;

    let err = client
        .consumer("orders", "billing")
        .fetch_cursor("never_opened", 10)
        .await
        .unwrap_err();
    assert!(backend_message(&err).unwrap().contains("does not exist"));
}
