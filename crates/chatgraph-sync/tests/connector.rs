//! End-to-end tests for the connector: bulk load, team diff, event
//! handlers, confirmation folding, and the suggestion query, all against
//! the in-memory storage backend with a recording job queue and a stub
//! graph API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use chatgraph_core::id::{ChannelId, RemoteId, UserId};
use chatgraph_core::record::{ChannelRecord, UserRecord};
use chatgraph_core::remote::GraphDump;
use chatgraph_core::signal::{
    NodeProperties, NodeType, PrevProperties, Relation, Signal,
};
use chatgraph_core::team::{MembershipEvent, MessageEvent, TeamChannel, TeamUser, UserProfile};
use chatgraph_storage::InMemoryStore;
use chatgraph_sync::{
    CollabFilterResponse, ConnectorOptions, GraphApi, GraphConnector, IdentifierCache,
    JobOutcome, JobQueue, SyncError,
};

// ---------------------------------------------------------------------------
// Test collaborators
// ---------------------------------------------------------------------------

/// Job queue that records every submitted batch.
#[derive(Default)]
struct RecordingQueue {
    jobs: Mutex<Vec<Vec<Signal>>>,
}

impl RecordingQueue {
    fn jobs(&self) -> Vec<Vec<Signal>> {
        self.jobs.lock().unwrap().clone()
    }
}

impl JobQueue for RecordingQueue {
    fn add_job(&self, signals: Vec<Signal>) {
        self.jobs.lock().unwrap().push(signals);
    }
}

/// Graph API stub with canned collaborative-filter entries.
#[derive(Default)]
struct StubApi {
    suggestions: Mutex<Vec<serde_json::Value>>,
    collab_calls: AtomicUsize,
}

impl StubApi {
    fn with_suggestions(entries: Vec<serde_json::Value>) -> Self {
        StubApi {
            suggestions: Mutex::new(entries),
            collab_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GraphApi for StubApi {
    async fn fetch_graph(&self, _graph_id: &str) -> Result<GraphDump, SyncError> {
        Ok(GraphDump::default())
    }

    async fn apply_signals(
        &self,
        _graph_id: &str,
        _signals: &[Signal],
    ) -> Result<JobOutcome, SyncError> {
        Ok(JobOutcome::default())
    }

    async fn collab_filter(
        &self,
        _graph_id: &str,
        _from: &RemoteId,
        _via: Relation,
    ) -> Result<CollabFilterResponse, SyncError> {
        self.collab_calls.fetch_add(1, Ordering::SeqCst);
        let entries = self.suggestions.lock().unwrap().clone();
        Ok(serde_json::from_value(json!({ "suggestions": entries }))?)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn user_record(id: &str, name: &str, gc: Option<&str>, channels: &[&str]) -> UserRecord {
    let mut record = UserRecord::new(UserId::from(id), name);
    record.gc_id = gc.map(RemoteId::from);
    for channel in channels {
        record.channels.insert(ChannelId::from(*channel));
    }
    record
}

fn channel_record(id: &str, name: &str, gc: Option<&str>) -> ChannelRecord {
    let mut record = ChannelRecord::new(ChannelId::from(id), name);
    record.gc_id = gc.map(RemoteId::from);
    record
}

fn team_user(id: &str, name: &str, image: Option<&str>) -> TeamUser {
    TeamUser {
        id: UserId::from(id),
        name: name.to_string(),
        profile: Some(UserProfile {
            image_192: image.map(str::to_string),
        }),
    }
}

fn member_channel(id: &str, name: &str, members: &[&str]) -> TeamChannel {
    TeamChannel {
        id: ChannelId::from(id),
        name: name.to_string(),
        is_member: true,
        members: members.iter().map(|m| UserId::from(*m)).collect(),
    }
}

/// Cache seeded from (remote, local) node pairs and
/// (remoteFrom, remoteTo, edgeId) MEMBER_OF triples.
fn cache_with(
    users: &[(&str, &str)],
    channels: &[(&str, &str)],
    member_edges: &[(&str, &str, &str)],
) -> IdentifierCache {
    let mut cache = IdentifierCache::new();
    for (remote, local) in users {
        cache.record_user(RemoteId::from(*remote), UserId::from(*local));
    }
    for (remote, local) in channels {
        cache.record_channel(RemoteId::from(*remote), ChannelId::from(*local));
    }
    for (from, to, id) in member_edges {
        cache.record_edge(
            Relation::MemberOf,
            RemoteId::from(*from),
            RemoteId::from(*to),
            RemoteId::from(*id),
        );
    }
    cache
}

struct Harness {
    connector: GraphConnector,
    queue: Arc<RecordingQueue>,
    api: Arc<StubApi>,
}

fn harness(storage: InMemoryStore, cache: IdentifierCache, api: StubApi) -> Harness {
    let queue = Arc::new(RecordingQueue::default());
    let api = Arc::new(api);
    let factory_queue = Arc::clone(&queue);
    let connector = GraphConnector::new(ConnectorOptions {
        storage: Box::new(storage),
        cache: Some(cache),
        graph_id: "my graph id".to_string(),
        queues: Arc::new(move || Arc::clone(&factory_queue) as Arc<dyn JobQueue>),
        api: Arc::clone(&api) as Arc<dyn GraphApi>,
    })
    .unwrap();
    Harness {
        connector,
        queue,
        api,
    }
}

fn sample_dump() -> GraphDump {
    serde_json::from_value(json!({
        "nodes": [
            {
                "id": "1",
                "name": "first user",
                "type": "User",
                "type_id": "1",
                "properties": { "user_id": "U1" }
            },
            {
                "id": "2",
                "name": "first channel",
                "type": "Channel",
                "type_id": "2",
                "properties": { "channel_id": "C1" }
            },
            {
                "id": "3",
                "name": "second channel",
                "type": "Channel",
                "type_id": "2",
                "properties": { "channel_id": "C2" }
            }
        ],
        "edges": [
            { "id": "4", "name": "MEMBER_OF", "name_id": "5", "from": "1", "to": "2" },
            { "id": "5", "name": "MEMBER_OF", "name_id": "5", "from": "1", "to": "3" }
        ]
    }))
    .unwrap()
}

// ---------------------------------------------------------------------------
// Initial data load
// ---------------------------------------------------------------------------

#[test]
fn initial_load_parses_channel_membership() {
    let mut h = harness(InMemoryStore::new(), IdentifierCache::new(), StubApi::default());

    let summary = h.connector.load_initial_data(&sample_dump()).unwrap();
    assert_eq!(summary.users, 1);
    assert_eq!(summary.channels, 2);
    assert_eq!(summary.memberships, 2);

    let user = h
        .connector
        .storage()
        .user(&UserId::from("U1"))
        .unwrap()
        .unwrap();
    let channels: Vec<&str> = user.channels.iter().map(|c| c.as_str()).collect();
    assert_eq!(channels, vec!["C1", "C2"]);
    assert_eq!(user.gc_id, Some(RemoteId::from("1")));

    let cache = h.connector.cache();
    assert_eq!(cache.local_user_id(&RemoteId::from("1")), Some(&UserId::from("U1")));
    assert_eq!(cache.local_channel_id(&RemoteId::from("3")), Some(&ChannelId::from("C2")));
    assert_eq!(
        cache.edge_id(Relation::MemberOf, &RemoteId::from("1"), &RemoteId::from("3")),
        Some(&RemoteId::from("5"))
    );
}

// ---------------------------------------------------------------------------
// Team synchronization: users
// ---------------------------------------------------------------------------

fn user_sync_harness() -> Harness {
    let storage = InMemoryStore::seeded([user_record("U1", "first user", Some("1"), &[])], []);
    harness(storage, cache_with(&[("1", "U1")], &[], &[]), StubApi::default())
}

#[test]
fn new_users_produce_node_create_signals() {
    let mut h = user_sync_harness();

    let signals = h
        .connector
        .build_team_sync_signals(
            &[
                team_user("U1", "first user", Some("img_u1.jpg")),
                team_user("U2", "second user", Some("img_u2.jpg")),
            ],
            &[],
        )
        .unwrap();

    assert_eq!(signals.len(), 1);
    assert_eq!(
        signals[0],
        Signal::NodeCreate {
            node_type: NodeType::User,
            name: "second user".to_string(),
            image: Some("img_u2.jpg".to_string()),
            description: None,
            properties: NodeProperties::user(UserId::from("U2")),
        }
    );
}

#[test]
fn known_users_produce_no_signals() {
    let mut h = user_sync_harness();

    let signals = h
        .connector
        .build_team_sync_signals(&[team_user("U1", "first user", Some("img_u1.jpg"))], &[])
        .unwrap();
    assert!(signals.is_empty());
}

// ---------------------------------------------------------------------------
// Team synchronization: channels
// ---------------------------------------------------------------------------

fn channel_sync_harness() -> Harness {
    let storage = InMemoryStore::seeded([], [channel_record("C1", "first channel", Some("1"))]);
    harness(storage, cache_with(&[], &[("1", "C1")], &[]), StubApi::default())
}

#[test]
fn new_member_channels_produce_node_create_signals() {
    let mut h = channel_sync_harness();

    let signals = h
        .connector
        .build_team_sync_signals(
            &[],
            &[
                member_channel("C1", "first channel", &[]),
                member_channel("C2", "second channel", &[]),
            ],
        )
        .unwrap();

    assert_eq!(signals.len(), 1);
    assert_eq!(
        signals[0],
        Signal::NodeCreate {
            node_type: NodeType::Channel,
            name: "second channel".to_string(),
            image: None,
            description: None,
            properties: NodeProperties::channel(ChannelId::from("C2")),
        }
    );
}

#[test]
fn known_channels_produce_no_signals() {
    let mut h = channel_sync_harness();

    let signals = h
        .connector
        .build_team_sync_signals(&[], &[member_channel("C1", "first channel", &[])])
        .unwrap();
    assert!(signals.is_empty());
}

#[test]
fn non_member_channels_are_skipped() {
    let mut h = channel_sync_harness();

    let mut outside = member_channel("C3", "third channel", &[]);
    outside.is_member = false;

    let signals = h.connector.build_team_sync_signals(&[], &[outside]).unwrap();
    assert!(signals.is_empty());
}

// ---------------------------------------------------------------------------
// Team synchronization: memberships
// ---------------------------------------------------------------------------

fn membership_harness() -> Harness {
    let storage = InMemoryStore::seeded(
        [user_record("U1", "first user", Some("1"), &["C1"])],
        [
            channel_record("C1", "first channel", Some("2")),
            channel_record("C2", "second channel", Some("3")),
        ],
    );
    let cache = cache_with(
        &[("1", "U1")],
        &[("2", "C1"), ("3", "C2")],
        &[("1", "2", "4")],
    );
    harness(storage, cache, StubApi::default())
}

#[test]
fn new_membership_produces_edge_create() {
    let mut h = membership_harness();

    let signals = h
        .connector
        .build_team_sync_signals(
            &[team_user("U1", "first user", Some("img_u1.jpg"))],
            &[
                member_channel("C1", "first channel", &["U1"]),
                member_channel("C2", "second channel", &["U1"]),
            ],
        )
        .unwrap();

    assert_eq!(signals.len(), 1);
    assert_eq!(
        signals[0],
        Signal::EdgeCreate {
            name: Relation::MemberOf,
            from_type: NodeType::User,
            from_name: "first user".to_string(),
            to_type: NodeType::Channel,
            to_name: "second channel".to_string(),
            properties: Some(json!({})),
        }
    );
}

#[test]
fn dropped_membership_produces_edge_delete() {
    let mut h = membership_harness();

    let signals = h
        .connector
        .build_team_sync_signals(
            &[team_user("U1", "first user", Some("img_u1.jpg"))],
            &[
                member_channel("C1", "first channel", &[]),
                member_channel("C2", "second channel", &[]),
            ],
        )
        .unwrap();

    assert_eq!(signals.len(), 1);
    assert_eq!(
        signals[0],
        Signal::EdgeDelete {
            name: Relation::MemberOf,
            id: RemoteId::from("4"),
            from: RemoteId::from("1"),
            to: RemoteId::from("2"),
        }
    );
}

#[test]
fn matching_membership_produces_no_signals() {
    let mut h = membership_harness();

    let signals = h
        .connector
        .build_team_sync_signals(
            &[team_user("U1", "first user", Some("img_u1.jpg"))],
            &[
                member_channel("C1", "first channel", &["U1"]),
                member_channel("C2", "second channel", &[]),
            ],
        )
        .unwrap();
    assert!(signals.is_empty());
}

#[test]
fn unsynced_endpoints_defer_edge_signals() {
    // U2 exists in the snapshot but has no remote id yet: its membership
    // emits nothing beyond the node_create, without erroring.
    let mut h = membership_harness();

    let signals = h
        .connector
        .build_team_sync_signals(
            &[
                team_user("U1", "first user", None),
                team_user("U2", "second user", None),
            ],
            &[
                member_channel("C1", "first channel", &["U1", "U2"]),
                member_channel("C2", "second channel", &[]),
            ],
        )
        .unwrap();

    assert_eq!(signals.len(), 1);
    assert!(matches!(
        &signals[0],
        Signal::NodeCreate { node_type: NodeType::User, name, .. } if name == "second user"
    ));
}

#[test]
fn reconciliation_updates_stored_membership_sets() {
    let mut h = membership_harness();

    h.connector
        .build_team_sync_signals(
            &[team_user("U1", "first user", None)],
            &[
                member_channel("C1", "first channel", &[]),
                member_channel("C2", "second channel", &["U1"]),
            ],
        )
        .unwrap();

    let user = h
        .connector
        .storage()
        .user(&UserId::from("U1"))
        .unwrap()
        .unwrap();
    let channels: Vec<&str> = user.channels.iter().map(|c| c.as_str()).collect();
    assert_eq!(channels, vec!["C2"]);
}

#[test]
fn synchronize_team_data_submits_one_batch() {
    let mut h = membership_harness();

    let submitted = h
        .connector
        .synchronize_team_data(
            &[team_user("U1", "first user", None)],
            &[
                member_channel("C1", "first channel", &["U1"]),
                member_channel("C2", "second channel", &["U1"]),
            ],
        )
        .unwrap();

    assert_eq!(submitted, 1);
    assert_eq!(h.queue.jobs().len(), 1);

    // Nothing new: nothing submitted.
    let again = h
        .connector
        .synchronize_team_data(
            &[team_user("U1", "first user", None)],
            &[
                member_channel("C1", "first channel", &["U1"]),
                member_channel("C2", "second channel", &["U1"]),
            ],
        )
        .unwrap();
    assert_eq!(again, 1, "edge stays pending until its confirmation lands");

    // Confirm the edge, then the same snapshot diffs to nothing.
    h.connector
        .on_job_done(&JobOutcome::new(vec![json!({
            "action": "edge_create",
            "id": "9",
            "name": "MEMBER_OF",
            "from": "1",
            "to": "3"
        })]))
        .unwrap();
    let settled = h
        .connector
        .synchronize_team_data(
            &[team_user("U1", "first user", None)],
            &[
                member_channel("C1", "first channel", &["U1"]),
                member_channel("C2", "second channel", &["U1"]),
            ],
        )
        .unwrap();
    assert_eq!(settled, 0);
}

// ---------------------------------------------------------------------------
// Channel join / leave events
// ---------------------------------------------------------------------------

fn membership_event_harness(user_channels: &[&str], edges: &[(&str, &str, &str)]) -> Harness {
    let storage = InMemoryStore::seeded(
        [user_record("U1", "first user", Some("1"), user_channels)],
        [channel_record("C1", "first channel", Some("2"))],
    );
    let cache = cache_with(&[("1", "U1")], &[("2", "C1")], edges);
    harness(storage, cache, StubApi::default())
}

#[test]
fn join_adds_channel_and_submits_edge_create() {
    let mut h = membership_event_harness(&[], &[]);

    h.connector
        .on_user_joined_channel(&MembershipEvent {
            user: UserId::from("U1"),
            channel: ChannelId::from("C1"),
        })
        .unwrap();

    let user = h
        .connector
        .storage()
        .user(&UserId::from("U1"))
        .unwrap()
        .unwrap();
    let channels: Vec<&str> = user.channels.iter().map(|c| c.as_str()).collect();
    assert_eq!(channels, vec!["C1"]);

    let jobs = h.queue.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(
        jobs[0],
        vec![Signal::EdgeCreate {
            name: Relation::MemberOf,
            from_type: NodeType::User,
            from_name: "first user".to_string(),
            to_type: NodeType::Channel,
            to_name: "first channel".to_string(),
            properties: None,
        }]
    );
}

#[test]
fn join_is_idempotent_on_storage() {
    let mut h = membership_event_harness(&["C1"], &[]);

    h.connector
        .on_user_joined_channel(&MembershipEvent {
            user: UserId::from("U1"),
            channel: ChannelId::from("C1"),
        })
        .unwrap();

    let user = h
        .connector
        .storage()
        .user(&UserId::from("U1"))
        .unwrap()
        .unwrap();
    assert_eq!(user.channels.len(), 1);
}

#[test]
fn leave_removes_channel_and_submits_edge_delete() {
    let mut h = membership_event_harness(&["C1"], &[("1", "2", "4")]);

    h.connector
        .on_user_left_channel(&MembershipEvent {
            user: UserId::from("U1"),
            channel: ChannelId::from("C1"),
        })
        .unwrap();

    let user = h
        .connector
        .storage()
        .user(&UserId::from("U1"))
        .unwrap()
        .unwrap();
    assert!(user.channels.is_empty());

    let jobs = h.queue.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(
        jobs[0],
        vec![Signal::EdgeDelete {
            name: Relation::MemberOf,
            id: RemoteId::from("4"),
            from: RemoteId::from("1"),
            to: RemoteId::from("2"),
        }]
    );

    // The cached edge survives until the remote confirms the delete.
    assert_eq!(
        h.connector
            .cache()
            .edge_id(Relation::MemberOf, &RemoteId::from("1"), &RemoteId::from("2")),
        Some(&RemoteId::from("4"))
    );

    h.connector
        .on_job_done(&JobOutcome::new(vec![json!({
            "action": "edge_delete",
            "id": "4",
            "name": "MEMBER_OF",
            "from": "1",
            "to": "2"
        })]))
        .unwrap();
    assert_eq!(
        h.connector
            .cache()
            .edge_id(Relation::MemberOf, &RemoteId::from("1"), &RemoteId::from("2")),
        None
    );
}

#[test]
fn leave_without_cached_edge_skips_signal() {
    let mut h = membership_event_harness(&["C1"], &[]);

    h.connector
        .on_user_left_channel(&MembershipEvent {
            user: UserId::from("U1"),
            channel: ChannelId::from("C1"),
        })
        .unwrap();

    assert!(h.queue.jobs().is_empty());
    let user = h
        .connector
        .storage()
        .user(&UserId::from("U1"))
        .unwrap()
        .unwrap();
    assert!(user.channels.is_empty());
}

// ---------------------------------------------------------------------------
// Confirmation handling
// ---------------------------------------------------------------------------

#[test]
fn node_create_confirmation_maps_channel_ids() {
    let storage = InMemoryStore::new();
    let mut h = harness(storage, IdentifierCache::new(), StubApi::default());

    h.connector
        .on_job_done(&JobOutcome::new(vec![json!({
            "action": "node_create",
            "id": "1",
            "name": "first channel",
            "type": "Channel",
            "type_id": "2",
            "properties": { "channel_id": "C1" }
        })]))
        .unwrap();

    let channel = h
        .connector
        .storage()
        .channel(&ChannelId::from("C1"))
        .unwrap()
        .unwrap();
    assert_eq!(channel.gc_id, Some(RemoteId::from("1")));
    assert_eq!(
        h.connector.cache().local_channel_id(&RemoteId::from("1")),
        Some(&ChannelId::from("C1"))
    );
}

#[test]
fn node_create_confirmation_maps_user_ids() {
    let storage = InMemoryStore::seeded([user_record("U1", "first user", None, &[])], []);
    let mut h = harness(storage, IdentifierCache::new(), StubApi::default());

    h.connector
        .on_job_done(&JobOutcome::new(vec![json!({
            "action": "node_create",
            "id": "1",
            "name": "first user",
            "type": "User",
            "type_id": "2",
            "properties": { "user_id": "U1" }
        })]))
        .unwrap();

    let user = h
        .connector
        .storage()
        .user(&UserId::from("U1"))
        .unwrap()
        .unwrap();
    assert_eq!(user.gc_id, Some(RemoteId::from("1")));
    assert_eq!(
        h.connector.cache().local_user_id(&RemoteId::from("1")),
        Some(&UserId::from("U1"))
    );
    assert_eq!(
        h.connector.cache().remote_user_id(&UserId::from("U1")),
        Some(&RemoteId::from("1"))
    );
}

#[test]
fn edge_create_confirmation_stores_membership_edge() {
    let storage = InMemoryStore::seeded(
        [user_record("U1", "first user", Some("1"), &["C1"])],
        [channel_record("C1", "first channel", Some("2"))],
    );
    let mut h = harness(
        storage,
        cache_with(&[("1", "U1")], &[("2", "C1")], &[]),
        StubApi::default(),
    );

    h.connector
        .on_job_done(&JobOutcome::new(vec![json!({
            "action": "edge_create",
            "id": "3",
            "name": "MEMBER_OF",
            "name_id": "name id",
            "from": "1",
            "to": "2"
        })]))
        .unwrap();

    assert_eq!(
        h.connector
            .cache()
            .edge_id(Relation::MemberOf, &RemoteId::from("1"), &RemoteId::from("2")),
        Some(&RemoteId::from("3"))
    );
}

#[test]
fn unrecognized_confirmations_are_ignored() {
    let mut h = harness(InMemoryStore::new(), IdentifierCache::new(), StubApi::default());

    h.connector
        .on_job_done(&JobOutcome::new(vec![
            json!({ "action": "node_merge", "id": "1" }),
            json!({ "action": "edge_create", "id": "2", "name": "FOLLOWS", "from": "1", "to": "2" }),
            json!("not even an object"),
            json!({
                "action": "edge_create",
                "id": "9",
                "name": "MENTIONS",
                "from": "1",
                "to": "2"
            }),
        ]))
        .unwrap();

    assert_eq!(h.connector.cache().edge_count(Relation::MemberOf), 0);
    assert_eq!(h.connector.cache().edge_count(Relation::Mentions), 0);
}

#[test]
fn confirmation_round_trip_for_submitted_user() {
    // Submit a node_create for a new user, deliver its confirmation, and
    // the stored gc_id plus both cache directions line up.
    let mut h = harness(InMemoryStore::new(), IdentifierCache::new(), StubApi::default());

    let signals = h
        .connector
        .build_team_sync_signals(&[team_user("U7", "seventh user", None)], &[])
        .unwrap();
    assert_eq!(signals.len(), 1);

    let mut confirmed = serde_json::to_value(&signals[0]).unwrap();
    confirmed["id"] = json!("71");
    h.connector
        .on_job_done(&JobOutcome::new(vec![confirmed]))
        .unwrap();

    let user = h
        .connector
        .storage()
        .user(&UserId::from("U7"))
        .unwrap()
        .unwrap();
    assert_eq!(user.gc_id, Some(RemoteId::from("71")));
    assert_eq!(
        h.connector.cache().local_user_id(&RemoteId::from("71")),
        Some(&UserId::from("U7"))
    );
}

// ---------------------------------------------------------------------------
// Channel created
// ---------------------------------------------------------------------------

#[test]
fn new_channel_is_stored_and_announced() {
    let mut h = harness(InMemoryStore::new(), IdentifierCache::new(), StubApi::default());

    h.connector
        .on_channel_created(&TeamChannel {
            id: ChannelId::from("C1"),
            name: "first channel".to_string(),
            is_member: false,
            members: Vec::new(),
        })
        .unwrap();

    let stored = h
        .connector
        .storage()
        .channel(&ChannelId::from("C1"))
        .unwrap()
        .unwrap();
    assert_eq!(stored, ChannelRecord::new(ChannelId::from("C1"), "first channel"));

    let jobs = h.queue.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(
        jobs[0],
        vec![Signal::NodeCreate {
            node_type: NodeType::Channel,
            name: "first channel".to_string(),
            image: None,
            description: None,
            properties: NodeProperties::channel(ChannelId::from("C1")),
        }]
    );
}

#[test]
fn namesake_channel_reuses_the_synced_node() {
    let storage = InMemoryStore::seeded([], [channel_record("C1", "first channel", Some("1"))]);
    let mut h = harness(storage, cache_with(&[], &[("1", "C1")], &[]), StubApi::default());

    h.connector
        .on_channel_created(&TeamChannel {
            id: ChannelId::from("C2"),
            name: "first channel".to_string(),
            is_member: false,
            members: Vec::new(),
        })
        .unwrap();

    let jobs = h.queue.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(
        jobs[0],
        vec![Signal::NodeUpdate {
            id: RemoteId::from("1"),
            properties: NodeProperties::channel(ChannelId::from("C2")),
            prev: PrevProperties {
                properties: NodeProperties::channel(ChannelId::from("C1")),
            },
        }]
    );

    let stored = h
        .connector
        .storage()
        .channel(&ChannelId::from("C2"))
        .unwrap()
        .unwrap();
    assert_eq!(stored.gc_id, Some(RemoteId::from("1")));

    // Reverse mapping now points at the new local id.
    assert_eq!(
        h.connector.cache().local_channel_id(&RemoteId::from("1")),
        Some(&ChannelId::from("C2"))
    );
}

// ---------------------------------------------------------------------------
// Mentions
// ---------------------------------------------------------------------------

fn mention_harness() -> Harness {
    let storage = InMemoryStore::seeded(
        [
            user_record("U1", "first-user", Some("1"), &[]),
            user_record("U2", "second-user", Some("2"), &[]),
        ],
        [channel_record("C1", "channel-one", Some("3"))],
    );
    let cache = cache_with(&[("1", "U1"), ("2", "U2")], &[("3", "C1")], &[]);
    harness(storage, cache, StubApi::default())
}

fn message(text: &str) -> MessageEvent {
    MessageEvent {
        user: UserId::from("U1"),
        channel: ChannelId::from("C1"),
        ts: "1490214562.000123".to_string(),
        text: text.to_string(),
    }
}

fn message_description(signal: &Signal) -> &str {
    match signal {
        Signal::NodeCreate {
            description: Some(description),
            ..
        } => description,
        other => panic!("expected message node signal, got {:?}", other),
    }
}

#[test]
fn mention_tokens_become_readable_names() {
    let mut h = mention_harness();
    h.connector
        .on_message_received(&message("Here I mention <@U2>"))
        .unwrap();

    let jobs = h.queue.jobs();
    assert_eq!(
        message_description(&jobs[0][0]),
        "Here I mention @second-user"
    );
}

#[test]
fn repeated_mentions_are_all_rewritten() {
    let mut h = mention_harness();
    h.connector
        .on_message_received(&message("Here I mention <@U2> again <@U2>"))
        .unwrap();

    let jobs = h.queue.jobs();
    assert_eq!(
        message_description(&jobs[0][0]),
        "Here I mention @second-user again @second-user"
    );
}

#[test]
fn distinct_mentions_are_each_rewritten() {
    let mut h = mention_harness();
    h.connector
        .on_message_received(&message("Here I mention <@U2> and <@U1>"))
        .unwrap();

    let jobs = h.queue.jobs();
    assert_eq!(
        message_description(&jobs[0][0]),
        "Here I mention @second-user and @first-user"
    );
    // One MENTIONS edge per distinct user, in first-mention order.
    assert_eq!(jobs[0].len(), 3);
}

#[test]
fn unknown_mention_is_left_untouched() {
    let mut h = mention_harness();
    h.connector
        .on_message_received(&message("Here I mention <@U5>"))
        .unwrap();

    let jobs = h.queue.jobs();
    assert_eq!(message_description(&jobs[0][0]), "Here I mention <@U5>");
    // No edge for a user storage does not know.
    assert_eq!(jobs[0].len(), 1);
}

#[test]
fn mention_edge_targets_the_mentioned_user() {
    let mut h = mention_harness();
    let event = message("Here I mention <@U2>");
    h.connector.on_message_received(&event).unwrap();

    let jobs = h.queue.jobs();
    let last = jobs[0].last().unwrap();
    assert_eq!(
        *last,
        Signal::EdgeCreate {
            name: Relation::Mentions,
            from_type: NodeType::Message,
            from_name: format!("first-user - {}", event.ts),
            to_type: NodeType::User,
            to_name: "second-user".to_string(),
            properties: None,
        }
    );
}

#[test]
fn repeated_mentions_collapse_to_one_edge() {
    let mut h = mention_harness();
    h.connector
        .on_message_received(&message("Here I mention <@U2> again <@U2>"))
        .unwrap();

    let jobs = h.queue.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].len(), 2);
}

// ---------------------------------------------------------------------------
// Channel suggestions
// ---------------------------------------------------------------------------

fn sample_suggestion(channel: &str) -> serde_json::Value {
    json!({
        "node": {
            "id": channel,
            "name": channel,
            "type": { "name": "Channel" },
            "properties": { "channel_id": channel }
        }
    })
}

fn suggestion_harness(entries: Vec<serde_json::Value>) -> Harness {
    let storage = InMemoryStore::seeded([user_record("U1", "first user", Some("1"), &[])], []);
    harness(
        storage,
        cache_with(&[("1", "U1")], &[], &[]),
        StubApi::with_suggestions(entries),
    )
}

#[tokio::test]
async fn empty_response_yields_no_suggestions() {
    let h = suggestion_harness(Vec::new());
    let suggestions = h
        .connector
        .channel_suggestions_for(&UserId::from("U1"))
        .await
        .unwrap();
    assert!(suggestions.is_empty());
}

#[tokio::test]
async fn suggestions_extract_channel_ids() {
    let h = suggestion_harness(vec![sample_suggestion("C1")]);
    let suggestions = h
        .connector
        .channel_suggestions_for(&UserId::from("U1"))
        .await
        .unwrap();
    assert_eq!(suggestions, vec![ChannelId::from("C1")]);
}

#[tokio::test]
async fn suggestions_cap_at_four() {
    let h = suggestion_harness(vec![
        sample_suggestion("C1"),
        sample_suggestion("C2"),
        sample_suggestion("C3"),
        sample_suggestion("C4"),
        sample_suggestion("C5"),
    ]);
    let suggestions = h
        .connector
        .channel_suggestions_for(&UserId::from("U1"))
        .await
        .unwrap();
    assert_eq!(
        suggestions,
        vec![
            ChannelId::from("C1"),
            ChannelId::from("C2"),
            ChannelId::from("C3"),
            ChannelId::from("C4"),
        ]
    );
}

#[tokio::test]
async fn null_channel_ids_are_discarded_before_capping() {
    let mut faulty = sample_suggestion("C1");
    faulty["node"]["properties"]["channel_id"] = serde_json::Value::Null;

    let h = suggestion_harness(vec![faulty, sample_suggestion("C2")]);
    let suggestions = h
        .connector
        .channel_suggestions_for(&UserId::from("U1"))
        .await
        .unwrap();
    assert_eq!(suggestions, vec![ChannelId::from("C2")]);
}

#[tokio::test]
async fn unknown_user_is_an_error() {
    let h = suggestion_harness(Vec::new());
    let result = h
        .connector
        .channel_suggestions_for(&UserId::from("U9"))
        .await;
    assert!(matches!(result, Err(SyncError::UnknownUser(_))));
}

#[tokio::test]
async fn unsynced_user_yields_empty_without_network_call() {
    let storage = InMemoryStore::seeded([user_record("U3", "third user", None, &[])], []);
    let h = harness(
        storage,
        IdentifierCache::new(),
        StubApi::with_suggestions(vec![sample_suggestion("C1")]),
    );

    let suggestions = h
        .connector
        .channel_suggestions_for(&UserId::from("U3"))
        .await
        .unwrap();
    assert!(suggestions.is_empty());
    assert_eq!(h.api.collab_calls.load(Ordering::SeqCst), 0);
}
