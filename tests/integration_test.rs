use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use hotshot::auth::AuthConfig;
use hotshot::protocol::{ClientMessage, ServerMessage};
use hotshot::routes::build_router;
use hotshot::state::AppState;
use hotshot::types::{Role, RoomStatus};
use hotshot::ws::handlers::handle_message;
use hotshot::ws::Connection;
use hotshot::protocol::RoomBroadcast;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tower::ServiceExt;

fn conn(role: Role, room_id: &str) -> Connection {
    Connection {
        role,
        room_id: room_id.to_string(),
    }
}

/// Next room broadcast already queued for `room_id`
fn next_room_msg(rx: &mut Receiver<RoomBroadcast>, room_id: &str) -> ServerMessage {
    loop {
        let b = rx.try_recv().expect("Expected a queued room broadcast");
        if b.room_id == room_id {
            return b.msg;
        }
    }
}

fn router(state: Arc<AppState>, auth: AuthConfig) -> axum::Router {
    build_router(state, Arc::new(auth), Path::new("static"))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// End-to-end test of a complete poll: author, publish, vote, read results
#[tokio::test]
async fn test_full_poll_flow() {
    let state = Arc::new(AppState::new());

    // 1. Create room
    let room = state
        .create_room("Team lunch", "lunch12345")
        .await
        .expect("Room should be created");
    let host = conn(Role::Host, &room.id);
    let player = conn(Role::Player, &room.id);
    let admin = conn(Role::Admin, &room.id);

    let mut room_rx = state.broadcast.subscribe();

    // 2. Host adds questions; the room broadcast carries them back
    let reply = handle_message(
        ClientMessage::HostAddQuestion {
            text: "Where do we eat?".to_string(),
            max_options: Some(5),
        },
        &host,
        &state,
    )
    .await;
    assert!(reply.is_none());
    let first = match next_room_msg(&mut room_rx, &room.id) {
        ServerMessage::QuestionAdded { question } => {
            assert_eq!(question.order_index, 1);
            assert_eq!(question.max_options, 5);
            question
        }
        other => panic!("Expected QuestionAdded, got {:?}", other),
    };

    let reply = handle_message(
        ClientMessage::HostAddQuestion {
            text: "What time?".to_string(),
            max_options: None,
        },
        &host,
        &state,
    )
    .await;
    assert!(reply.is_none());
    let second = match next_room_msg(&mut room_rx, &room.id) {
        ServerMessage::QuestionAdded { question } => {
            assert_eq!(question.max_options, 10, "Default cap should apply");
            question
        }
        other => panic!("Expected QuestionAdded, got {:?}", other),
    };

    handle_message(
        ClientMessage::HostAddOption {
            question_id: first.id.clone(),
            text: "Pizza place".to_string(),
        },
        &host,
        &state,
    )
    .await;

    match handle_message(ClientMessage::HostListQuestions, &host, &state).await {
        Some(ServerMessage::Questions { list }) => {
            assert_eq!(list.len(), 2);
            assert_eq!(list[0].id, first.id);
        }
        other => panic!("Expected Questions, got {:?}", other),
    }

    // 3. Joining before publish fails
    match handle_message(
        ClientMessage::Join {
            name: "Alice".to_string(),
            session_token: None,
        },
        &player,
        &state,
    )
    .await
    {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "ROOM_NOT_LIVE"),
        other => panic!("Expected ROOM_NOT_LIVE error, got {:?}", other),
    }

    // 4. Publish
    assert!(handle_message(ClientMessage::HostPublish, &host, &state)
        .await
        .is_none());
    // Skip the option_added from the seeded option
    match next_room_msg(&mut room_rx, &room.id) {
        ServerMessage::OptionAdded { .. } => {}
        other => panic!("Expected OptionAdded, got {:?}", other),
    }
    match next_room_msg(&mut room_rx, &room.id) {
        ServerMessage::RoomPublished { room: info, share_path } => {
            assert_eq!(info.status, RoomStatus::Live);
            assert_eq!(share_path, format!("/play/{}", room.id));
        }
        other => panic!("Expected RoomPublished, got {:?}", other),
    }

    // 5. Two players join
    let mut tokens = Vec::new();
    for name in ["Alice", "Bob"] {
        match handle_message(
            ClientMessage::Join {
                name: name.to_string(),
                session_token: None,
            },
            &player,
            &state,
        )
        .await
        {
            Some(ServerMessage::Joined {
                name: joined_name,
                session_token,
                storage_key,
                ..
            }) => {
                assert_eq!(joined_name, name);
                assert_eq!(storage_key, format!("hotshot_{}", room.id));
                tokens.push(session_token);
            }
            other => panic!("Expected Joined, got {:?}", other),
        }
    }

    // 6. Alice walks the questions
    let view = match handle_message(
        ClientMessage::NextQuestion {
            session_token: tokens[0].clone(),
        },
        &player,
        &state,
    )
    .await
    {
        Some(ServerMessage::CurrentQuestion { view }) => view,
        other => panic!("Expected CurrentQuestion, got {:?}", other),
    };
    assert_eq!(view.question.id, first.id);
    assert_eq!(view.options.len(), 1);

    let pizza_id = view.options[0].id.clone();
    match handle_message(
        ClientMessage::Vote {
            session_token: tokens[0].clone(),
            question_id: first.id.clone(),
            option_id: pizza_id.clone(),
        },
        &player,
        &state,
    )
    .await
    {
        Some(ServerMessage::VoteAck { option_id, .. }) => assert_eq!(option_id, pizza_id),
        other => panic!("Expected VoteAck, got {:?}", other),
    }

    // Voting twice is refused
    match handle_message(
        ClientMessage::Vote {
            session_token: tokens[0].clone(),
            question_id: first.id.clone(),
            option_id: pizza_id.clone(),
        },
        &player,
        &state,
    )
    .await
    {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "ALREADY_VOTED"),
        other => panic!("Expected ALREADY_VOTED, got {:?}", other),
    }

    handle_message(
        ClientMessage::AddOption {
            session_token: tokens[0].clone(),
            question_id: second.id.clone(),
            text: "Noon".to_string(),
        },
        &player,
        &state,
    )
    .await;

    match handle_message(
        ClientMessage::NextQuestion {
            session_token: tokens[0].clone(),
        },
        &player,
        &state,
    )
    .await
    {
        Some(ServerMessage::Finished) => {}
        other => panic!("Expected Finished, got {:?}", other),
    }

    // 7. Bob adds his own option on the first question
    handle_message(
        ClientMessage::AddOption {
            session_token: tokens[1].clone(),
            question_id: first.id.clone(),
            text: "Sushi, obviously".to_string(),
        },
        &player,
        &state,
    )
    .await;

    // 8. Players can't read results
    match handle_message(ClientMessage::AdminResults, &player, &state).await {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "UNAUTHORIZED"),
        other => panic!("Expected UNAUTHORIZED, got {:?}", other),
    }

    // 9. Admin reads results
    match handle_message(ClientMessage::AdminResults, &admin, &state).await {
        Some(ServerMessage::Results { results }) => {
            assert_eq!(results.player_count, 2);
            assert_eq!(results.total_votes, 3);
            let first_results = &results.questions[0];
            assert_eq!(first_results.total_votes, 2);
            assert_eq!(first_results.slices[0].text, "Pizza place");
            assert_eq!(first_results.slices[1].text, "Sushi, obviously");
        }
        other => panic!("Expected Results, got {:?}", other),
    }

    let csv = state.results_csv(&room.id).await.unwrap();
    assert_eq!(
        csv,
        "player,question,option\r\n\
         Alice,Where do we eat?,Pizza place\r\n\
         Alice,What time?,Noon\r\n\
         Bob,Where do we eat?,\"Sushi, obviously\""
    );
}

/// A host socket sees the direct reply plus its room's broadcasts
#[tokio::test]
async fn test_host_sees_each_change_once() {
    let state = Arc::new(AppState::new());
    let room = state.create_room("Quiz", "abcdefghij").await.unwrap();
    let host = conn(Role::Host, &room.id);
    let mut room_rx = state.broadcast.subscribe();

    let mut delivered = Vec::new();
    let commands = [
        ClientMessage::HostAddQuestion {
            text: "Pick one".to_string(),
            max_options: None,
        },
        ClientMessage::HostPublish,
    ];
    for command in commands {
        delivered.extend(handle_message(command, &host, &state).await);
    }
    while let Ok(b) = room_rx.try_recv() {
        if b.room_id == room.id {
            delivered.push(b.msg);
        }
    }

    let published = delivered
        .iter()
        .filter(|m| matches!(m, ServerMessage::RoomPublished { .. }))
        .count();
    let added = delivered
        .iter()
        .filter(|m| matches!(m, ServerMessage::QuestionAdded { .. }))
        .count();
    assert_eq!(published, 1);
    assert_eq!(added, 1);
}

#[tokio::test]
async fn test_host_commands_rejected_for_players_and_admins() {
    let state = Arc::new(AppState::new());
    let room = state.create_room("Quiz", "abcdefghij").await.unwrap();

    for role in [Role::Player, Role::Admin] {
        let result = handle_message(ClientMessage::HostPublish, &conn(role, &room.id), &state).await;
        match result {
            Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "UNAUTHORIZED"),
            other => panic!("Expected UNAUTHORIZED, got {:?}", other),
        }
    }
    assert_eq!(
        state.get_room(&room.id).await.unwrap().status,
        RoomStatus::Draft
    );
}

#[tokio::test]
async fn test_option_cap_over_websocket() {
    let state = Arc::new(AppState::new());
    let room = state.create_room("Quiz", "abcdefghij").await.unwrap();
    let question = state.add_question(&room.id, "Pick one", 5).await.unwrap();
    state.publish_room(&room.id).await.unwrap();
    for i in 0..5 {
        state
            .add_option(&question.id, &format!("choice {}", i), None)
            .await
            .unwrap();
    }
    let player = state.join_room(&room.id, "Alice", None).await.unwrap();

    let view = state
        .next_question(&room.id, &player.session_token)
        .await
        .unwrap()
        .unwrap();
    assert!(!view.can_add_option);

    match handle_message(
        ClientMessage::AddOption {
            session_token: player.session_token.clone(),
            question_id: question.id.clone(),
            text: "sixth".to_string(),
        },
        &conn(Role::Player, &room.id),
        &state,
    )
    .await
    {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "OPTION_LIMIT_REACHED"),
        other => panic!("Expected OPTION_LIMIT_REACHED, got {:?}", other),
    }
}

#[tokio::test]
async fn test_question_from_other_room_is_not_votable() {
    let state = Arc::new(AppState::new());
    let room_a = state.create_room("A", "abcdefghij").await.unwrap();
    let room_b = state.create_room("B", "abcdefghij").await.unwrap();
    let foreign = state.add_question(&room_b.id, "Elsewhere", 5).await.unwrap();
    state.publish_room(&room_a.id).await.unwrap();
    let player = state.join_room(&room_a.id, "Alice", None).await.unwrap();

    match handle_message(
        ClientMessage::AddOption {
            session_token: player.session_token,
            question_id: foreign.id,
            text: "sneaky".to_string(),
        },
        &conn(Role::Player, &room_a.id),
        &state,
    )
    .await
    {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "QUESTION_NOT_FOUND"),
        other => panic!("Expected QUESTION_NOT_FOUND, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_create_room_and_admin_login() {
    let state = Arc::new(AppState::new());
    let app = router(state.clone(), AuthConfig::disabled());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/rooms",
            serde_json::json!({"room_name": "Quiz", "passkey": "abcdefghij"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    let room_id = created["room"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["room"]["status"], "draft");
    assert_eq!(created["share_path"], format!("/play/{}", room_id));
    assert!(created["room"].get("passkey_hash").is_none());

    // Same name again
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/rooms",
            serde_json::json!({"room_name": "Quiz", "passkey": "0123456789"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Short passkey
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/rooms",
            serde_json::json!({"room_name": "Other", "passkey": "short"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/login",
            serde_json::json!({"passkey": "abcdefghij"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let login: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(login["room_id"], room_id);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/admin/login",
            serde_json::json!({"passkey": "zzzzzzzzzz"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_http_results_and_csv_require_passkey() {
    let state = Arc::new(AppState::new());
    let room = state.create_room("Quiz", "abcdefghij").await.unwrap();
    let q = state.add_question(&room.id, "Best snack?", 10).await.unwrap();
    state.publish_room(&room.id).await.unwrap();
    let player = state.join_room(&room.id, "Alice", None).await.unwrap();
    state
        .add_option_and_vote(&room.id, &player.session_token, &q.id, "Chips")
        .await
        .unwrap();
    let app = router(state.clone(), AuthConfig::disabled());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/rooms/{}/results?passkey=wrongwrong", room.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/rooms/{}/results?passkey=abcdefghij", room.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let results: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(results["questions"][0]["slices"][0]["text"], "Chips");
    assert_eq!(results["questions"][0]["slices"][0]["votes"], 1);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/rooms/{}/results.csv?passkey=abcdefghij", room.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("hotshot_results.csv"));
    assert_eq!(
        body_string(response).await,
        "player,question,option\r\nAlice,Best snack?,Chips"
    );
}

#[tokio::test]
async fn test_http_room_lookup() {
    let state = Arc::new(AppState::new());
    let room = state.create_room("Quiz", "abcdefghij").await.unwrap();
    state.add_question(&room.id, "First?", 5).await.unwrap();
    let app = router(state, AuthConfig::disabled());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/rooms/{}", room.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/rooms/{}/questions", room.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let questions: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(questions.as_array().unwrap().len(), 1);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/rooms/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_operator_routes_require_basic_auth() {
    let state = Arc::new(AppState::new());
    state.create_room("Quiz", "abcdefghij").await.unwrap();
    let auth = AuthConfig::with_operator("admin", "secret");
    let app = router(state.clone(), auth);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/state/export")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/state/export")
                // "admin:secret"
                .header(header::AUTHORIZATION, "Basic YWRtaW46c2VjcmV0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let exported = body_string(response).await;

    // Import into a fresh server
    let fresh = Arc::new(AppState::new());
    let app = router(
        fresh.clone(),
        AuthConfig::with_operator("admin", "secret"),
    );
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/state/import")
                .header(header::AUTHORIZATION, "Basic YWRtaW46c2VjcmV0")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(exported))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(fresh.rooms.read().await.len(), 1);
}
