//! Full lifecycle tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the client over
//! real HTTP through the default `UreqTransport`. Validates that request
//! building, the wire dialect and response classification agree with an
//! actual server.

use booked_client::{
    Accessory, Client, ClientConfig, ClientError, Date, File, Order, Pointer, Query, Reservation,
    Resource, RetryPolicy, User, Value,
};
use pretty_assertions::assert_eq;

/// Start the mock server on a random port and return a client for it.
fn start_server() -> Client {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    let config = ClientConfig::new(format!("http://{addr}")).with_retry(RetryPolicy::none());
    Client::new(config)
}

fn login(client: &Client) -> User {
    User::authenticate(client, mock_server::ADMIN_USERNAME, mock_server::ADMIN_PASSWORD).unwrap()
}

#[test]
fn object_lifecycle() {
    let client = start_server();

    // Step 1: create.
    let mut room = client.object("Room");
    room.set("name", "Blue");
    room.set("seats", 4);
    room.add("tags", "quiet").unwrap();
    room.save().unwrap();
    let id = room.id().unwrap().to_string();
    assert!(room.created_at().is_some());

    // Step 2: fetch it back; equality is by class and id.
    let fetched = client.get_object("Room", &id).unwrap();
    assert_eq!(fetched, room);
    assert_eq!(fetched.get("name").and_then(Value::as_str), Some("Blue"));
    assert_eq!(fetched.get("tags").unwrap().to_json(), serde_json::json!(["quiet"]));

    // Step 3: update a field and queue an array operation.
    room.set("name", "Green");
    room.add_unique("tags", "bright").unwrap();
    room.add_unique("tags", "quiet").unwrap();
    room.save().unwrap();
    assert!(room.pending_ops().is_empty());

    // Step 4: refresh picks up the server's view.
    let mut copy = client.get_object("Room", &id).unwrap();
    copy.refresh().unwrap();
    assert_eq!(copy.get("name").and_then(Value::as_str), Some("Green"));
    assert_eq!(
        copy.get("tags").unwrap().to_json(),
        serde_json::json!(["quiet", "bright"])
    );

    // Step 5: increment.
    room.increment("seats", 2).unwrap();
    assert_eq!(room.get("seats").and_then(Value::as_i64), Some(6));

    // Step 6: null fields are deleted remotely.
    room.set("tags", Value::Null);
    room.save().unwrap();
    room.refresh().unwrap();
    assert!(!room.contains_key("tags"));

    // Step 7: delete, then a lookup reports the missing object.
    room.delete().unwrap();
    assert!(room.is_empty());
    let err = client.get_object("Room", &id).unwrap_err();
    assert_eq!(err.code(), Some(101));
    assert!(err.to_string().ends_with(&format!("Room:{id}")), "{err}");
}

#[test]
fn pointers_and_queries() {
    let client = start_server();

    let mut owner = client.object("Owner");
    owner.set("name", "Kim");
    owner.save().unwrap();

    for (name, seats) in [("A", 2), ("B", 6), ("C", 10)] {
        let mut room = client.object("Room");
        room.set("name", name);
        room.set("seats", seats);
        room.set("owner", owner.clone());
        room.save().unwrap();
    }

    // Pointers round-trip and can be followed.
    let mut query = client.query("Room");
    query.eq("name", "B").unwrap();
    let b = query.first().unwrap().and_then(Value::into_object).unwrap();
    let pointer: &Pointer = b.get("owner").and_then(Value::as_pointer).unwrap();
    assert_eq!(pointer, &owner);
    let followed = pointer.fetch(&client).unwrap();
    assert_eq!(followed.get("name").and_then(Value::as_str), Some("Kim"));

    // Range constraints, ordering and counting.
    let mut query = client.query("Room");
    query
        .greater_than("seats", 2)
        .unwrap()
        .order_by("seats", Order::Descending)
        .count();
    let results = query.execute().unwrap();
    assert_eq!(results.count, Some(2));
    let names: Vec<String> = results
        .objects()
        .iter()
        .filter_map(|room| room.get("name").and_then(Value::as_str).map(str::to_string))
        .collect();
    assert_eq!(names, ["C", "B"]);

    // Pointer equality in a constraint.
    let mut query = client.query("Room");
    query.eq("owner", owner.clone()).unwrap();
    assert_eq!(query.execute().unwrap().len(), 3);

    // Alternatives.
    let mut a = Query::new("Room");
    a.eq("name", "A").unwrap();
    let mut c = Query::new("Room");
    c.eq("name", "C").unwrap();
    let mut either = client.query("Room");
    either.or(a).unwrap().or(c).unwrap();
    assert_eq!(either.execute().unwrap().len(), 2);
}

#[test]
fn fixed_endpoints_need_a_session() {
    let client = start_server();
    let err = Resource::statuses(&client).unwrap_err();
    match err {
        ClientError::Protocol(e) => assert_eq!(e.http_status, 401),
        other => panic!("expected protocol error, got {other:?}"),
    }
}

#[test]
fn authenticated_booking_flow() {
    let client = start_server();

    // Step 1: log in; the session is stored on the client.
    let user = login(&client);
    assert_eq!(user.id(), Some(mock_server::ADMIN_ID));
    let session = client.session();
    assert_eq!(session.user_id.as_deref(), Some(mock_server::ADMIN_ID));
    assert!(session.session_token.is_some());

    // Step 2: fixed lookups.
    let me = User::get(&client, mock_server::ADMIN_ID).unwrap();
    assert_eq!(me.get("username").and_then(Value::as_str), Some("admin"));
    let room = Resource::get(&client, "1").unwrap();
    assert_eq!(room.get("name").and_then(Value::as_str), Some("Conference Room"));
    let projector = Accessory::get(&client, "1").unwrap();
    assert_eq!(projector.get("quantityAvailable").and_then(Value::as_i64), Some(2));

    // Step 3: resource listings.
    let statuses = Resource::statuses(&client).unwrap();
    let statuses = statuses.as_map().unwrap()["statuses"].as_array().unwrap();
    assert_eq!(statuses.len(), 3);
    assert!(Resource::types(&client).unwrap().as_map().is_some());
    assert!(Resource::groups(&client).unwrap().as_map().is_some());
    assert!(Resource::status_reasons(&client).unwrap().as_map().is_some());
    let at = Date::parse("2024-03-01T09:00:00Z").unwrap();
    let availability = Resource::availability(&client, Some(&at)).unwrap();
    let first = &availability.as_map().unwrap()["resources"].as_array().unwrap()[0];
    assert_eq!(
        first.as_map().unwrap()["availableAt"].as_str(),
        Some("2024-03-01T09:00:00.000Z")
    );

    // Step 4: book and approve.
    let mut reservation = Reservation::new(&client);
    reservation.set("title", "Standup");
    reservation.set("resourceId", "1");
    reservation.set("requiresApproval", true);
    reservation.save().unwrap();
    let reference = reservation.id().unwrap().to_string();

    reservation.approve().unwrap();
    let stored = Reservation::by_reference_number(&client, &reference).unwrap();
    assert_eq!(stored.get("requiresApproval").and_then(Value::as_bool), Some(false));
    assert_eq!(stored.get("title").and_then(Value::as_str), Some("Standup"));
}

#[test]
fn file_upload() {
    let client = start_server();
    let mut file = File::new("notes.txt", "text/plain", b"hello".to_vec());
    file.save(&client).unwrap();

    let remote_name = file.remote_name.clone().unwrap();
    assert!(remote_name.ends_with("-notes.txt"));
    assert!(file.url.as_deref().unwrap().ends_with(&remote_name));

    // Files are stored on entities by reference.
    let mut report = client.object("Report");
    report.set("attachment", file.clone());
    report.save().unwrap();
    let fetched = client.get_object("Report", report.id().unwrap()).unwrap();
    assert_eq!(fetched.get("attachment").and_then(Value::as_file), Some(&file));
}
