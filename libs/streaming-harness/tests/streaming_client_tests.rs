//! Integration tests for the simulated streaming client.
//!
//! Producers and consumers are obtained through the `StreamingClient`
//! surface, the way code under test would use the production client.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use codec_json::JsonCodec;
use serde::{Deserialize, Serialize};
use streaming_harness::{
    ConsumerOptions, HarnessConfig, OffsetStart, StreamingClient, TestStreamingClient,
    TopicConsumer, TopicProducer,
};
use transport::CodecRegistry;
use transport_api::{ModelKey, TransportError, TransportPackage, MODEL_KEY_HEADER};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: u64,
    symbol: String,
    qty: i32,
}

fn order(id: u64) -> Order {
    Order { id, symbol: "AAPL".into(), qty: 10 }
}

fn client() -> TestStreamingClient {
    let codecs = CodecRegistry::shared();
    codecs.register_for::<Order>(JsonCodec::shared());
    TestStreamingClient::new(codecs)
}

#[test]
fn test_producer_delivers_to_consumer_of_same_topic() {
    let client = client();
    let consumer = client.get_topic_consumer("orders", &ConsumerOptions::default()).unwrap();
    let producer = client.get_topic_producer("orders").unwrap();

    let pkg = TransportPackage::new(Some("1"), &order(1)).unwrap();
    producer.publish(&pkg).unwrap();

    let received = consumer.receive_all().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].key(), Some("1"));
    assert_eq!(received[0].model_key(), pkg.model_key());
    assert_eq!(received[0].value_as::<Order>().unwrap(), order(1));
    assert!(received[0].wire().is_some());
}

#[test]
fn test_other_topic_receives_nothing() {
    let client = client();
    let orders = client.get_topic_consumer("orders", &ConsumerOptions::default()).unwrap();
    let fills = client.get_topic_consumer("fills", &ConsumerOptions::default()).unwrap();
    let producer = client.get_topic_producer("orders").unwrap();

    producer
        .publish(&TransportPackage::new(Some("1"), &order(1)).unwrap())
        .unwrap();

    assert!(fills.receive().unwrap().is_none());
    assert!(orders.receive().unwrap().is_some());
    assert_eq!(client.topics(), vec!["fills".to_string(), "orders".to_string()]);
}

#[test]
fn test_same_topic_reuses_broker() {
    let client = client();
    let a = client.broker("orders");
    let b = client.broker("orders");
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &client.broker("fills")));
}

#[test]
fn test_packages_arrive_in_publish_order() {
    let client = client();
    let producer = client.topic_producer("orders");
    let consumer = client.topic_consumer("orders", &ConsumerOptions::default());

    for id in 0..5 {
        producer.publish_value(Some(&id.to_string()), &order(id)).unwrap();
    }

    let ids: Vec<u64> = consumer
        .receive_all()
        .unwrap()
        .iter()
        .map(|p| p.value_as::<Order>().unwrap().id)
        .collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    assert_eq!(consumer.pending(), 0);
}

#[test]
fn test_handler_receives_queued_and_live_packages() {
    let client = client();
    let producer = client.get_topic_producer("orders").unwrap();
    let consumer = client.get_topic_consumer("orders", &ConsumerOptions::default()).unwrap();

    producer.publish(&TransportPackage::new(Some("1"), &order(1)).unwrap()).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    consumer
        .on_package_received(Box::new(move |pkg: TransportPackage| {
            sink.lock().unwrap().push(pkg.value_as::<Order>().unwrap().id);
        }))
        .unwrap();

    producer.publish(&TransportPackage::new(Some("2"), &order(2)).unwrap()).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    assert!(consumer.receive().unwrap().is_none());
}

#[test]
fn test_unregistered_codec_fails_publish() {
    let client = TestStreamingClient::new(CodecRegistry::shared());
    let producer = client.get_topic_producer("orders").unwrap();

    let err = producer
        .publish(&TransportPackage::new(Some("1"), &order(1)).unwrap())
        .unwrap_err();

    assert!(matches!(err, TransportError::CodecNotFound(ref k) if *k == ModelKey::of::<Order>()));
    assert_eq!(client.broker("orders").pending(), 0);
}

#[test]
fn test_raw_package_reaches_consumer_unchanged() {
    let client = TestStreamingClient::new(CodecRegistry::shared());
    let producer = client.get_topic_producer("frames").unwrap();
    let consumer = client.get_topic_consumer("frames", &ConsumerOptions::default()).unwrap();

    producer
        .publish(&TransportPackage::raw(ModelKey::new("frame"), Some("f"), vec![9, 8, 7]))
        .unwrap();

    let pkg = consumer.receive().unwrap().unwrap();
    let wire = pkg.wire().unwrap();
    assert_eq!(wire.value(), &[9, 8, 7]);
    assert_eq!(wire.header_str(MODEL_KEY_HEADER), Some("frame"));
}

#[test]
fn test_default_topic_handles_share_a_broker() {
    let client = client();
    let producer = client.get_default_topic_producer().unwrap();
    let consumer = client.get_default_topic_consumer().unwrap();

    assert_eq!(producer.topic(), "DEFAULT");
    assert_eq!(consumer.topic(), "DEFAULT");

    producer.publish(&TransportPackage::new(None, &order(3)).unwrap()).unwrap();
    assert!(consumer.receive().unwrap().is_some());
}

#[test]
fn test_consumer_options_do_not_change_delivery() {
    let client = client();
    let options = ConsumerOptions::group("billing").with_offset(OffsetStart::Earliest);
    let consumer = client.topic_consumer("orders", &options);
    assert_eq!(consumer.consumer_group(), Some("billing"));

    client
        .topic_producer("orders")
        .publish_value(Some("1"), &order(1))
        .unwrap();
    assert!(consumer.receive().unwrap().is_some());
}

#[test]
fn test_raw_topic_handles_are_not_implemented() {
    let client = client();

    let err = client
        .get_raw_topic_consumer("orders", &ConsumerOptions::default())
        .err()
        .unwrap();
    assert!(matches!(err, TransportError::NotImplemented(_)));

    let err = client.get_raw_topic_producer("orders").err().unwrap();
    assert!(matches!(err, TransportError::NotImplemented(_)));
}

#[test]
fn test_configured_delay_and_default_topic() {
    let config = HarnessConfig::parse(
        r#"
        default_topic = "telemetry"
        publish_delay_ms = 15
        "#,
    )
    .unwrap();
    let codecs = CodecRegistry::shared();
    codecs.register_for::<Order>(JsonCodec::shared());
    let client = TestStreamingClient::with_config(codecs, config);

    let producer = client.get_default_topic_producer().unwrap();
    assert_eq!(producer.topic(), "telemetry");

    let started = Instant::now();
    producer.publish(&TransportPackage::new(None, &order(1)).unwrap()).unwrap();
    assert!(started.elapsed() >= Duration::from_millis(15));
    assert_eq!(client.broker("telemetry").pending(), 1);
}

#[test]
fn test_full_topic_queue_rejects_publish() {
    let config = HarnessConfig { queue_capacity: 2, ..Default::default() };
    let codecs = CodecRegistry::shared();
    codecs.register_for::<Order>(JsonCodec::shared());
    let client = TestStreamingClient::with_config(codecs, config);
    let producer = client.topic_producer("orders");

    producer.publish_value(None, &order(1)).unwrap();
    producer.publish_value(None, &order(2)).unwrap();
    let err = producer.publish_value(None, &order(3)).unwrap_err();

    assert!(matches!(err, TransportError::QueueFull { capacity: 2, .. }));
}

fn write_temp_config(name: &str, contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("{}-{name}.toml", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_client_from_config_file() {
    let path = write_temp_config(
        "harness",
        r#"
        default_topic = "quotes"
        queue_capacity = 1
        "#,
    );
    let codecs = CodecRegistry::shared();
    codecs.register_for::<Order>(JsonCodec::shared());

    let client = TestStreamingClient::from_config_file(codecs, path.to_str().unwrap()).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(client.default_topic(), "quotes");
    let producer = client.get_default_topic_producer().unwrap();
    producer.publish(&TransportPackage::new(None, &order(1)).unwrap()).unwrap();
    let err = producer.publish(&TransportPackage::new(None, &order(2)).unwrap()).unwrap_err();
    assert!(matches!(err, TransportError::QueueFull { capacity: 1, .. }));
}

#[test]
fn test_client_from_invalid_config_file_names_the_path() {
    let path = write_temp_config("invalid", "queue_capacity = \"many\"");
    let path_str = path.to_str().unwrap().to_string();

    let err = TestStreamingClient::from_config_file(CodecRegistry::shared(), &path_str).unwrap_err();
    std::fs::remove_file(&path).unwrap();

    match err {
        TransportError::Config(msg) => assert!(msg.contains(&path_str), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_default_codec_serves_unregistered_models() {
    let config = HarnessConfig::parse(r#"default_codec = "json""#).unwrap();
    let client = TestStreamingClient::with_config(CodecRegistry::shared(), config);
    let consumer = client.get_topic_consumer("orders", &ConsumerOptions::default()).unwrap();
    let producer = client.get_topic_producer("orders").unwrap();

    producer.publish(&TransportPackage::new(Some("7"), &order(7)).unwrap()).unwrap();

    let received = consumer.receive().unwrap().unwrap();
    assert_eq!(received.value_as::<Order>().unwrap(), order(7));
    assert!(!client.codecs().contains(&ModelKey::of::<Order>()));
}
