use randomtalk_domain::domain_event::DomainEvent;
use randomtalk_domain::value_object::Version;
use randomtalk_macros::domain_event;

#[domain_event(version = 1)]
enum RoomEvent {
    #[event(event_type = "room_opened")]
    Opened { topic: String },
    #[event(event_version = 2)]
    TopicChanged { to: String },
    Closed,
}

fn main() {
    assert_eq!(
        RoomEvent::EVENT_TYPES,
        &["room_opened", "topic_changed", "closed"]
    );

    let opened = RoomEvent::Opened {
        id: "evt-1".to_string(),
        aggregate_version: Version::from_value(1),
        topic: "rust".to_string(),
    };
    assert_eq!(opened.event_id(), "evt-1");
    assert_eq!(opened.event_type(), "room_opened");
    assert_eq!(opened.event_version(), 1);
    assert_eq!(opened.aggregate_version(), Version::from_value(1));

    let changed = RoomEvent::TopicChanged {
        id: "evt-2".to_string(),
        aggregate_version: Version::from_value(2),
        to: "go".to_string(),
    };
    assert_eq!(changed.event_version(), 2);

    // 单元变体被改写为具名变体
    let closed = RoomEvent::Closed {
        id: "evt-3".to_string(),
        aggregate_version: Version::from_value(3),
    };
    assert_eq!(closed.event_type(), "closed");
    assert_ne!(closed.clone(), opened);
}
