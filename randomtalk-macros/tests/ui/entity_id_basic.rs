use randomtalk_macros::entity_id;
use std::collections::HashSet;
use uuid::Uuid;

#[entity_id]
struct UserId(String);

#[entity_id(debug = false)]
struct SessionId(Uuid);

impl std::fmt::Debug for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionId(..)")
    }
}

fn main() {
    let id = UserId::new("u-1");
    assert_eq!(id.to_string(), "u-1");
    assert_eq!("u-1".parse::<UserId>().ok(), Some(id.clone()));
    assert!(UserId::new("a") < UserId::new("b"));

    let raw: String = id.clone().into();
    assert_eq!(UserId::from(raw), id);

    let mut seen = HashSet::new();
    seen.insert(id.clone());
    assert!(seen.contains(&UserId::new("u-1")));

    let session = SessionId::new(Uuid::new_v4());
    assert_eq!(format!("{session:?}"), "SessionId(..)");
    let _inner: Uuid = session.into_inner();
}
