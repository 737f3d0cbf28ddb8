use randomtalk_domain::entity::Entity;
use randomtalk_domain::value_object::Version;
use randomtalk_macros::{entity, entity_id};

#[entity_id]
struct RoomId(String);

#[entity(id = RoomId)]
struct Room {
    topic: Option<String>,
}

// 已声明的 id 字段保留原样，并被移到最前
#[entity(id = String, debug = false)]
struct Lobby {
    capacity: u32,
    id: String,
}

impl std::fmt::Debug for Lobby {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lobby({})", self.id)
    }
}

fn main() {
    let mut room = Room::new(RoomId::new("r-1"));
    assert!(room.topic.is_none());
    assert!(room.version().is_new());
    room.set_version(Version::from_value(3));
    assert_eq!(room.version().value(), 3);
    assert_eq!(room.id().to_string(), "r-1");
    let _ = format!("{:?}", room.clone());

    let lobby = Lobby::new("l-1".to_string());
    assert_eq!(lobby.capacity, 0);
    assert_eq!(format!("{lobby:?}"), "Lobby(l-1)");
}
