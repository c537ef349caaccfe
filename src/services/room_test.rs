use super::*;
use crate::services::player::PlayerStatus;

fn user(name: &str) -> User {
    User { id: Uuid::new_v4(), name: name.into(), color: "#4db6ac".into(), is_admin: false }
}

fn video(title: &str) -> Video {
    Video::new(format!("https://youtu.be/{title}"), title)
}

fn latest_sync(rx: &OutboxReceiver) -> RoomSnapshot {
    let frame = rx.sync.borrow().clone().expect("a snapshot should be pending");
    match frame.as_ref() {
        ServerFrame::Sync(snapshot) => snapshot.clone(),
        other => panic!("expected sync frame, got {}", other.kind()),
    }
}

#[test]
fn join_adds_member_once_per_user() {
    let mut room = Room::new("lobby", None);
    let alice = user("alice");
    let (tx1, _rx1) = outbox(4);
    let (tx2, _rx2) = outbox(4);

    assert!(room.join(alice.clone(), Uuid::new_v4(), tx1));
    assert!(!room.join(alice.clone(), Uuid::new_v4(), tx2));

    assert_eq!(room.member_count(), 1);
    assert_eq!(room.connection_count(), 2);
    assert_eq!(room.member(alice.id).map(Member::connection_count), Some(2));
}

#[test]
fn rejoin_keeps_room_copy_of_user() {
    let mut room = Room::new("lobby", None);
    let alice = user("alice");
    let (tx1, _rx1) = outbox(4);
    room.join(alice.clone(), Uuid::new_v4(), tx1);
    room.member_mut(alice.id).expect("member").user.name = "renamed".into();

    let (tx2, _rx2) = outbox(4);
    room.join(alice.clone(), Uuid::new_v4(), tx2);
    assert_eq!(room.member(alice.id).map(|m| m.user.name.as_str()), Some("renamed"));
}

#[test]
fn leave_removes_member_after_last_connection() {
    let mut room = Room::new("lobby", None);
    let alice = user("alice");
    let (c1, c2) = (Uuid::new_v4(), Uuid::new_v4());
    let (tx1, _rx1) = outbox(4);
    let (tx2, _rx2) = outbox(4);
    room.join(alice.clone(), c1, tx1);
    room.join(alice.clone(), c2, tx2);

    assert_eq!(room.leave(c1), None);
    assert_eq!(room.member_count(), 1);
    assert_eq!(room.leave(c2), Some(alice.id));
    assert!(room.is_empty());
}

#[test]
fn leave_unknown_connection_is_noop() {
    let mut room = Room::new("lobby", None);
    let (tx, _rx) = outbox(4);
    room.join(user("alice"), Uuid::new_v4(), tx);
    assert_eq!(room.leave(Uuid::new_v4()), None);
    assert_eq!(room.member_count(), 1);
}

#[test]
fn add_video_to_empty_player_plays_immediately() {
    let mut room = Room::new("lobby", None);
    let v1 = video("v1");
    let id = v1.id;

    room.add_video(Uuid::new_v4(), v1).expect("add");

    assert_eq!(room.player.status(), PlayerStatus::Playing);
    assert_eq!(room.player.current().map(|v| v.id), Some(id));
    assert!(room.player.position_ms() < 1_000);
    assert!(room.queue.is_empty());
}

#[test]
fn add_video_while_playing_enqueues_with_vote() {
    let mut room = Room::new("lobby", None);
    let alice = Uuid::new_v4();
    room.add_video(alice, video("v1")).expect("add v1");
    let v2 = video("v2");
    let id = v2.id;

    room.add_video(alice, v2).expect("add v2");

    assert_eq!(room.queue.len(), 1);
    assert!(room.queue.find(id).is_some_and(|v| v.has_vote(alice)));
}

#[test]
fn add_duplicate_video_is_rejected() {
    let mut room = Room::new("lobby", None);
    let alice = Uuid::new_v4();
    let v1 = video("v1");
    let v2 = video("v2");
    room.add_video(alice, v1.clone()).expect("add v1");
    room.add_video(alice, v2.clone()).expect("add v2");

    assert!(matches!(room.add_video(alice, v1), Err(ActionError::Precondition(_))));
    assert!(matches!(room.add_video(alice, v2), Err(ActionError::Precondition(_))));
    assert_eq!(room.queue.len(), 1);
}

#[test]
fn skip_promotes_queue_head() {
    let mut room = Room::new("lobby", None);
    let alice = Uuid::new_v4();
    room.add_video(alice, video("v1")).expect("add v1");
    let v2 = video("v2");
    let id = v2.id;
    room.add_video(alice, v2).expect("add v2");
    room.player.pause().expect("pause");

    room.skip().expect("skip");

    assert_eq!(room.player.current().map(|v| v.id), Some(id));
    assert!(room.player.is_playing());
    assert!(room.queue.is_empty());
}

#[test]
fn skip_on_empty_queue_leaves_player_unchanged() {
    let mut room = Room::new("lobby", None);
    room.add_video(Uuid::new_v4(), video("v1")).expect("add");
    room.player.seek(12_345);
    room.player.pause().expect("pause");
    let before = room.player.clone();

    assert!(matches!(room.skip(), Err(ActionError::Precondition(_))));
    assert_eq!(room.player, before);
}

#[test]
fn broadcast_sync_reaches_every_connection() {
    let mut room = Room::new("lobby", None);
    let (tx_a, rx_a) = outbox(4);
    let (tx_b1, rx_b1) = outbox(4);
    let (tx_b2, rx_b2) = outbox(4);
    let bob = user("bob");
    room.join(user("alice"), Uuid::new_v4(), tx_a);
    room.join(bob.clone(), Uuid::new_v4(), tx_b1);
    room.join(bob, Uuid::new_v4(), tx_b2);

    room.broadcast_sync();

    for rx in [&rx_a, &rx_b1, &rx_b2] {
        let snap = latest_sync(rx);
        assert_eq!(snap.revision, 1);
        assert_eq!(snap.members.len(), 2);
    }
}

#[test]
fn newer_snapshot_replaces_undelivered_one() {
    let mut room = Room::new("lobby", None);
    let (tx, mut rx) = outbox(4);
    room.join(user("alice"), Uuid::new_v4(), tx);

    room.broadcast_sync();
    room.broadcast_sync();
    room.broadcast_sync();

    assert!(rx.sync.has_changed().expect("sender alive"));
    let snap = {
        let frame = rx.sync.borrow_and_update().clone().expect("snapshot");
        match frame.as_ref() {
            ServerFrame::Sync(s) => s.clone(),
            other => panic!("unexpected {}", other.kind()),
        }
    };
    assert_eq!(snap.revision, 3);
    assert!(!rx.sync.has_changed().expect("sender alive"));
}

#[test]
fn broadcast_seeked_drops_when_event_queue_full() {
    let mut room = Room::new("lobby", None);
    let (tx, mut rx) = outbox(1);
    room.join(user("alice"), Uuid::new_v4(), tx);

    room.broadcast_seeked(1_000);
    room.broadcast_seeked(2_000);

    let first = rx.events.try_recv().expect("first seeked queued");
    assert!(matches!(first.as_ref(), ServerFrame::Seeked { time: 1_000 }));
    assert!(rx.events.try_recv().is_err(), "second seeked should be dropped");
}

#[test]
fn snapshot_lists_members_in_join_order_with_flags() {
    let mut room = Room::new("lobby", None);
    let alice = user("alice");
    let bob = user("bob");
    let (tx_a, _rx_a) = outbox(4);
    let (tx_b, _rx_b) = outbox(4);
    room.join(alice.clone(), Uuid::new_v4(), tx_a);
    room.join(bob.clone(), Uuid::new_v4(), tx_b);
    room.member_mut(bob.id).expect("bob").buffering = true;

    let snap = room.snapshot();
    let names: Vec<&str> = snap.members.iter().map(|m| m.user.name.as_str()).collect();
    assert_eq!(names, ["alice", "bob"]);
    assert!(!snap.members[0].buffering);
    assert!(snap.members[1].buffering);

    let json = serde_json::to_value(&snap).expect("serialize");
    assert_eq!(json["members"][1]["username"], "bob");
    assert_eq!(json["members"][1]["buffering"], true);
    assert_eq!(json["player"]["status"], "empty");
}

#[test]
fn dropped_receiver_does_not_disturb_others() {
    let mut room = Room::new("lobby", None);
    let (tx_a, rx_a) = outbox(1);
    let (tx_b, rx_b) = outbox(1);
    room.join(user("alice"), Uuid::new_v4(), tx_a);
    room.join(user("bob"), Uuid::new_v4(), tx_b);
    drop(rx_a);

    room.broadcast_seeked(500);
    room.broadcast_sync();

    assert_eq!(latest_sync(&rx_b).revision, 1);
}
