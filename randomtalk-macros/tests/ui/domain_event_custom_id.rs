use randomtalk_domain::domain_event::DomainEvent;
use randomtalk_domain::value_object::Version;
use randomtalk_macros::{domain_event, entity_id};

#[entity_id]
struct EventId(String);

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[domain_event(id = EventId, version = 3)]
enum TicketEvent {
    Issued {
        id: EventId,
        aggregate_version: Version,
        seat: u32,
    },
}

fn main() {
    let issued = TicketEvent::Issued {
        id: EventId::new("evt-9"),
        aggregate_version: Version::from_value(1),
        seat: 12,
    };
    assert_eq!(issued.event_id(), "evt-9");
    assert_eq!(issued.event_version(), 3);
    assert_eq!(TicketEvent::EVENT_TYPES, &["issued"]);

    let json = serde_json::to_string(&issued).unwrap();
    let back: TicketEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, issued);
}
