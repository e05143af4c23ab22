use std::collections::BTreeSet;
use sync_macros::entity_id;

#[entity_id]
struct TicketId(String);

#[entity_id]
#[derive(Clone)]
struct SlugId(std::string::String);

fn main() {
    let id = TicketId::new("t-7");
    assert_eq!(id.to_string(), "t-7");
    assert_eq!(id.as_str(), "t-7");
    assert_eq!("t-7".parse::<TicketId>().unwrap(), id);
    let raw: String = id.clone().into();
    assert_eq!(raw, "t-7");

    assert!(TicketId::from("  ").is_blank());
    assert!(TicketId::default().is_blank());

    // 已手写的派生会被合并而不是重复
    let slug = SlugId::from("calm-harbor".to_string());
    assert_eq!(slug.as_ref(), "calm-harbor");

    let ordered: BTreeSet<SlugId> = ["b", "a"].into_iter().map(SlugId::from).collect();
    assert_eq!(ordered.iter().next().map(|s| s.to_string()), Some("a".into()));

    let json = serde_json::to_string(&TicketId::new("t-1")).unwrap();
    assert_eq!(json, "\"t-1\"");
    let back: TicketId = serde_json::from_str(&json).unwrap();
    assert_eq!(back.as_str(), "t-1");
}
