//! Integration tests for smart copies between differently typed beans

use std::sync::Arc;

use chrono::{DateTime, Utc};
use replica_copy::prelude::*;
use replica_core::bean;

bean! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Event {
        pub at: DateTime<Utc>,
        pub tags: Vec<String>,
        pub codes: Box<[i32]>,
        pub count: Option<i32>,
        pub ratio: f64,
        pub amount: String,
        pub flag: String,
    }
}

bean! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct EventRecord {
        pub at: i64,
        pub tags: String,
        pub codes: String,
        pub count: i8,
        pub ratio: i32,
        pub amount: i64,
        pub flag: bool,
    }
}

bean! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Labels {
        pub names: Box<[String]>,
    }
}

bean! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct LabelText {
        pub names: String,
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn registry() -> Arc<TypeRegistry> {
    init_logging();
    let registry = TypeRegistry::new();
    registry
        .register::<Event>()
        .and_then(|r| r.register::<EventRecord>())
        .and_then(|r| r.register::<Labels>())
        .and_then(|r| r.register::<LabelText>())
        .unwrap();
    Arc::new(registry)
}

fn event() -> Event {
    Event {
        at: DateTime::<Utc>::from_timestamp_millis(1000).unwrap(),
        tags: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        codes: vec![1, 2, 3].into_boxed_slice(),
        count: Some(300),
        ratio: 2.9,
        amount: "42".to_string(),
        flag: "yes".to_string(),
    }
}

#[test]
fn test_smart_copy_coerces_every_property() {
    let engine = CopyEngine::new(registry());
    let record: EventRecord = engine.smart_copy_to(&event()).unwrap();

    assert_eq!(record.at, 1000);
    assert_eq!(record.tags, "a,b,c");
    assert_eq!(record.codes, "1,2,3");
    // narrowing wraps like a primitive cast
    assert_eq!(record.count, 300i32 as i8);
    assert_eq!(record.ratio, 2);
    assert_eq!(record.amount, 42);
    // text is not a boolean
    assert!(!record.flag);
}

#[test]
fn test_smart_copy_back_from_primitives() {
    let engine = CopyEngine::new(registry());
    let record = EventRecord {
        at: 1000,
        tags: "x,y".to_string(),
        codes: "7,8".to_string(),
        count: 5,
        ratio: 3,
        amount: 10,
        flag: true,
    };

    let event: Event = engine.smart_copy_to(&record).unwrap();
    assert_eq!(event.at.timestamp_millis(), 1000);
    assert_eq!(event.tags, vec!["x".to_string(), "y".to_string()]);
    assert_eq!(&*event.codes, &[7, 8]);
    assert_eq!(event.count, Some(5));
    assert_eq!(event.ratio, 3.0);
    assert_eq!(event.amount, "10");
    assert_eq!(event.flag, "true");
}

#[test]
fn test_smart_copy_skips_null_sources() {
    let engine = CopyEngine::new(registry());
    let source = Event {
        count: None,
        ..event()
    };
    let mut target = EventRecord {
        count: 9,
        ..EventRecord::default()
    };

    engine.smart_copy(&source, &mut target).unwrap();
    assert_eq!(target.count, 9);
    assert_eq!(target.at, 1000);
}

#[test]
fn test_empty_text_becomes_empty_sequence() {
    let engine = CopyEngine::new(registry());
    let record = EventRecord {
        tags: String::new(),
        ..EventRecord::default()
    };
    let event: Event = engine.smart_copy_to(&record).unwrap();
    assert!(event.tags.is_empty());
}

#[test]
fn test_invalid_number_is_reported() {
    let engine = CopyEngine::new(registry());
    let source = Event {
        amount: "forty-two".to_string(),
        ..event()
    };

    let err = engine
        .smart_copy(&source, &mut EventRecord::default())
        .unwrap_err();
    assert!(matches!(err, CopyError::InvalidNumber(_)));
}

#[test]
fn test_string_array_round_trip() {
    let engine = CopyEngine::new(registry());
    let labels = Labels {
        names: vec!["red".to_string(), "green".to_string(), "blue".to_string()].into_boxed_slice(),
    };

    let text: LabelText = engine.smart_copy_to(&labels).unwrap();
    assert_eq!(text.names, "red,green,blue");
    let back: Labels = engine.smart_copy_to(&text).unwrap();
    assert_eq!(back, labels);
}

#[test]
fn test_configured_delimiter() {
    let config = CopyConfig::from_json(r#"{"delimiter": ";"}"#).unwrap();
    let engine = CopyEngine::with_config(registry(), config).unwrap();

    let records: Vec<EventRecord> = engine.smart_copy_list(&[event(), event()]).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.tags == "a;b;c"));
}
