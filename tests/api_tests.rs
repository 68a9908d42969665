use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use fantasy_rugby::{build_router, config::Config};

async fn test_app() -> Router {
    // One connection that never recycles, otherwise the in-memory database vanishes.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    fantasy_rugby::migrate(&pool).await.unwrap();

    let config = Config {
        jwt_secret: "test-secret".to_string(),
        ..Config::default()
    };
    build_router(pool, Arc::new(config))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn register(app: &Router, username: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/users",
        None,
        Some(json!({
            "name": username,
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "pass123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "username": username, "password": "pass123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn seed_players(app: &Router) {
    let admin = register(app, "admin").await;
    let players = json!([
        { "id": 100, "name": "Finn Russell", "club": "Bath", "position": "Fly-half", "fantasy_position": "Fly-half" },
        { "id": 101, "name": "Ellis Genge", "club": "Bristol", "position": "Prop", "fantasy_position": "Prop" },
        { "id": 102, "name": "Maro Itoje", "club": "Saracens", "position": "Lock", "fantasy_position": "Lock" },
        { "id": 103, "name": "Jamie George", "club": "Saracens", "position": "Hooker", "fantasy_position": "Hooker" },
    ]);
    let (status, _) = send(app, Method::POST, "/players", Some(&admin), Some(players)).await;
    assert_eq!(status, StatusCode::OK);
}

async fn create_league(app: &Router, token: &str, body: Value) -> i64 {
    let (status, league) = send(app, Method::POST, "/leagues", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{league}");
    league["id"].as_i64().unwrap()
}

async fn join(app: &Router, token: &str, league_id: i64, team_name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        &format!("/leagues/{}/join", league_id),
        Some(token),
        Some(json!({ "team_name": team_name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["team_id"].as_i64().unwrap()
}

async fn claim(app: &Router, token: &str, league_id: i64, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        &format!("/leagues/{}/waiver-claims", league_id),
        Some(token),
        Some(body),
    )
    .await
}

async fn team_json(app: &Router, league_id: i64, team_id: i64) -> Value {
    let (_, teams) = send(app, Method::GET, &format!("/leagues/{}/teams", league_id), None, None).await;
    teams
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["id"].as_i64() == Some(team_id))
        .cloned()
        .unwrap()
}

#[tokio::test]
async fn faab_highest_earliest_bid_wins() {
    let app = test_app().await;
    seed_players(&app).await;

    let x = register(&app, "xavier").await;
    let y = register(&app, "yara").await;
    let z = register(&app, "zoe").await;

    let league = create_league(
        &app,
        &x,
        json!({ "name": "Six Nations Mates", "waiver_mode": "FAAB", "starting_budget": 10000 }),
    )
    .await;
    let tx = join(&app, &x, league, "X Factor").await;
    let ty = join(&app, &y, league, "Y Front").await;
    let tz = join(&app, &z, league, "Z Cars").await;

    for (token, team, bid) in [(&x, tx, 1000), (&y, ty, 2500), (&z, tz, 2500)] {
        let (status, body) = claim(
            &app,
            token,
            league,
            json!({ "team_id": team, "player_id": 100, "bid_amount": bid }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (status, summary) = send(
        &app,
        Method::POST,
        &format!("/leagues/{}/process-waivers", league),
        Some(&x),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{summary}");
    assert_eq!(summary["approved_count"], 1);
    assert_eq!(summary["rejected_count"], 2);
    assert!(summary["priority_order"].is_null());

    let (_, claims) = send(&app, Method::GET, &format!("/leagues/{}/waiver-claims", league), None, None).await;
    for c in claims.as_array().unwrap() {
        let expected = if c["team_id"].as_i64() == Some(ty) { "APPROVED" } else { "REJECTED" };
        assert_eq!(c["status"], expected);
        assert!(!c["processed_at"].is_null());
    }

    let winner = team_json(&app, league, ty).await;
    assert_eq!(winner["faab_budget"], 7500);
    assert_eq!(winner["roster"][0]["player_id"], 100);
    // An empty lineup has room, so the new fly-half starts straight away.
    assert_eq!(winner["roster"][0]["is_starting"], true);
    assert_eq!(team_json(&app, league, tx).await["faab_budget"], 10000);

    // A second run finds nothing pending.
    let (_, again) = send(
        &app,
        Method::POST,
        &format!("/leagues/{}/process-waivers", league),
        Some(&x),
        None,
    )
    .await;
    assert_eq!(again["processed_count"], 0);
}

#[tokio::test]
async fn priority_mode_reorders_waiver_queue() {
    let app = test_app().await;
    seed_players(&app).await;

    let a = register(&app, "ana").await;
    let b = register(&app, "ben").await;
    let c = register(&app, "cai").await;
    let d = register(&app, "dee").await;

    let league = create_league(&app, &a, json!({ "name": "Ordinal", "waiver_mode": "PRIORITY" })).await;
    let ta = join(&app, &a, league, "A").await;
    let tb = join(&app, &b, league, "B").await;
    let tc = join(&app, &c, league, "C").await;
    let td = join(&app, &d, league, "D").await;

    for (token, team) in [(&a, ta), (&b, tb), (&c, tc)] {
        let (status, body) = claim(&app, token, league, json!({ "team_id": team, "player_id": 101 })).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (status, summary) = send(
        &app,
        Method::POST,
        &format!("/leagues/{}/process-waivers", league),
        Some(&a),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["priority_order"], json!([td, tb, tc, ta]));

    let (_, order) = send(&app, Method::GET, &format!("/leagues/{}/waiver-order", league), None, None).await;
    let ids: Vec<i64> = order
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["team_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![td, tb, tc, ta]);
}

#[tokio::test]
async fn starting_players_cannot_be_dropped() {
    let app = test_app().await;
    seed_players(&app).await;

    let owner = register(&app, "olly").await;
    let league = create_league(&app, &owner, json!({ "name": "Bench Rules" })).await;
    let team = join(&app, &owner, league, "Olly's XV").await;

    let (status, _) = claim(&app, &owner, league, json!({ "team_id": team, "player_id": 101, "bid_amount": 0 })).await;
    assert_eq!(status, StatusCode::CREATED);
    send(&app, Method::POST, &format!("/leagues/{}/process-waivers", league), Some(&owner), None).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/leagues/{}/teams/{}/players/101", league, team),
        Some(&owner),
        Some(json!({ "is_starting": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = claim(
        &app,
        &owner,
        league,
        json!({ "team_id": team, "player_id": 102, "players_to_drop": [101] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("starting lineup"));

    // Nothing reached the pending set.
    let (_, claims) = send(&app, Method::GET, &format!("/leagues/{}/waiver-claims", league), None, None).await;
    assert!(claims.as_array().unwrap().iter().all(|c| c["status"] != "PENDING"));
}

#[tokio::test]
async fn claim_validation_errors() {
    let app = test_app().await;
    seed_players(&app).await;

    let owner = register(&app, "owen").await;
    let other = register(&app, "otto").await;
    let league = create_league(&app, &owner, json!({ "name": "Strict", "starting_budget": 500 })).await;
    let team = join(&app, &owner, league, "Owen's").await;

    let (status, _) = claim(&app, &other, league, json!({ "team_id": team, "player_id": 100 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = claim(&app, &owner, league, json!({ "team_id": team, "player_id": 100, "bid_amount": 501 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Insufficient FAAB budget"));

    let (status, _) = claim(&app, &owner, league, json!({ "team_id": team, "player_id": 100, "bid_amount": -1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = claim(&app, &owner, league, json!({ "team_id": team, "player_id": 999 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = claim(&app, &owner, league, json!({ "team_id": team, "player_id": 100, "players_to_drop": [103] })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pending_claims_can_be_withdrawn_by_owner() {
    let app = test_app().await;
    seed_players(&app).await;

    let owner = register(&app, "wendy").await;
    let stranger = register(&app, "sam").await;
    let league = create_league(&app, &owner, json!({ "name": "Withdrawals" })).await;
    let team = join(&app, &owner, league, "W").await;
    join(&app, &stranger, league, "S").await;

    let (_, body) = claim(&app, &owner, league, json!({ "team_id": team, "player_id": 100 })).await;
    let claim_id = body["data"]["id"].as_i64().unwrap();
    let uri = format!("/leagues/{}/waiver-claims/{}", league, claim_id);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_commissioner_processes_waivers() {
    let app = test_app().await;
    let owner = register(&app, "cora").await;
    let member = register(&app, "mick").await;
    let league = create_league(&app, &owner, json!({ "name": "Commish" })).await;
    join(&app, &member, league, "M").await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/leagues/{}/process-waivers", league),
        Some(&member),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::POST, &format!("/leagues/{}/process-waivers", league), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn joining_rules() {
    let app = test_app().await;
    let owner = register(&app, "jo").await;
    let second = register(&app, "kit").await;
    let third = register(&app, "lou").await;
    let league = create_league(&app, &owner, json!({ "name": "Tiny", "max_teams": 2 })).await;

    join(&app, &owner, league, "Jo").await;
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/leagues/{}/join", league),
        Some(&owner),
        Some(json!({ "team_name": "Jo again" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You are already in this league");

    join(&app, &second, league, "Kit").await;
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/leagues/{}/join", league),
        Some(&third),
        Some(json!({ "team_name": "Lou" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "League is full");

    let (status, _) = send(&app, Method::GET, "/leagues/9999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn fixtures_follow_joins_and_keep_results() {
    let app = test_app().await;
    let commissioner = register(&app, "comm").await;
    let league = create_league(
        &app,
        &commissioner,
        json!({ "name": "Round Robin", "max_teams": 6, "total_weeks": 3, "playoff_weeks": 1 }),
    )
    .await;

    let mut team_ids = Vec::new();
    for name in ["t1", "t2", "t3", "t4", "t5"] {
        let token = if name == "t1" { commissioner.clone() } else { register(&app, name).await };
        team_ids.push(join(&app, &token, league, name).await);
    }

    let (_, fixtures) = send(&app, Method::GET, &format!("/leagues/{}/fixtures", league), None, None).await;
    let fixtures = fixtures.as_array().unwrap().clone();
    assert_eq!(fixtures.len(), 6);
    for f in &fixtures {
        let week = f["week_number"].as_i64().unwrap();
        assert!((1..=3).contains(&week));
        assert_eq!(f["is_playoff"], week == 3);
        assert!(team_ids.contains(&f["home_team_id"].as_i64().unwrap()));
        assert!(team_ids.contains(&f["away_team_id"].as_i64().unwrap()));
    }

    let played = fixtures
        .iter()
        .find(|f| f["week_number"] == 1)
        .cloned()
        .unwrap();
    let played_id = played["id"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/leagues/{}/fixtures/{}/score", league, played_id),
        Some(&commissioner),
        Some(json!({ "home_score": 31.5, "away_score": 12.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let sixth = register(&app, "t6").await;
    let t6 = join(&app, &sixth, league, "t6").await;

    let (_, after) = send(&app, Method::GET, &format!("/leagues/{}/fixtures", league), None, None).await;
    let after = after.as_array().unwrap();
    assert_eq!(after.len(), 7);

    let kept = after.iter().find(|f| f["id"].as_i64() == Some(played_id)).unwrap();
    assert_eq!(kept["home_score"], 31.5);
    assert_eq!(kept["home_team_id"], played["home_team_id"]);
    assert_eq!(kept["week_number"], 1);

    let regenerated: Vec<&Value> = after.iter().filter(|f| f["id"].as_i64() != Some(played_id)).collect();
    assert!(regenerated.iter().all(|f| f["home_score"].is_null()));
    assert!(regenerated.iter().all(|f| (2..=3).contains(&f["week_number"].as_i64().unwrap())));
    assert!(regenerated.iter().any(|f| f["home_team_id"] == t6 || f["away_team_id"] == t6));

    let (_, next) = send(
        &app,
        Method::GET,
        &format!("/leagues/{}/next-matchup?team_id={}", league, t6),
        None,
        None,
    )
    .await;
    assert_eq!(next["fixture"]["week_number"], 2);
}

#[tokio::test]
async fn only_admin_loads_players() {
    let app = test_app().await;
    let user = register(&app, "nadia").await;

    let players = json!([
        { "id": 1, "name": "Nobody", "club": "None", "position": "Prop", "fantasy_position": "Prop" },
    ]);
    let (status, _) = send(&app, Method::POST, "/players", Some(&user), Some(players.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::POST, "/players", None, Some(players)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn league_chat_is_for_members() {
    let app = test_app().await;
    let owner = register(&app, "cher").await;
    let outsider = register(&app, "otis").await;
    let league = create_league(&app, &owner, json!({ "name": "Chatty" })).await;
    join(&app, &owner, league, "Cher's").await;
    let uri = format!("/leagues/{}/chat", league);

    let (status, _) = send(&app, Method::POST, &uri, None, Some(json!({ "message": "hi" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, &uri, Some(&outsider), Some(json!({ "message": "hi" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::POST, &uri, Some(&owner), Some(json!({ "message": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message cannot be empty");

    let (status, first) = send(&app, Method::POST, &uri, Some(&owner), Some(json!({ "message": "Morning all" }))).await;
    assert_eq!(status, StatusCode::CREATED, "{first}");
    assert_eq!(first["team_name"], "Cher's");
    assert_eq!(first["message_type"], "text");

    let reply = json!({ "message": "Still here", "reply_to_id": first["id"] });
    let (status, _) = send(&app, Method::POST, &uri, Some(&owner), Some(reply)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, page) = send(&app, Method::GET, &format!("{}?limit=1", uri), None, None).await;
    assert_eq!(page["messages"].as_array().unwrap().len(), 1);
    assert_eq!(page["messages"][0]["message"], "Still here");
    assert_eq!(page["messages"][0]["reply_to_id"], first["id"]);
    assert_eq!(page["has_more"], true);

    let (_, rest) = send(&app, Method::GET, &format!("{}?limit=5&offset=1", uri), None, None).await;
    assert_eq!(rest["messages"][0]["message"], "Morning all");
    assert_eq!(rest["has_more"], false);

    let (_, participants) = send(&app, Method::GET, &format!("{}/participants", uri), None, None).await;
    assert_eq!(participants.as_array().unwrap().len(), 1);
    assert_eq!(participants[0]["username"], "cher");

    let (status, _) = send(&app, Method::PUT, &format!("{}/read", uri), Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, participants) = send(&app, Method::GET, &format!("{}/participants", uri), None, None).await;
    assert!(!participants[0]["last_read_at"].is_null());
}

#[tokio::test]
async fn teams_rank_their_own_claims() {
    let app = test_app().await;
    seed_players(&app).await;

    let owner = register(&app, "rhea").await;
    let stranger = register(&app, "stan").await;
    let league = create_league(&app, &owner, json!({ "name": "Ranked", "waiver_mode": "PRIORITY" })).await;
    let team = join(&app, &owner, league, "Rhea's").await;

    let (_, first) = claim(&app, &owner, league, json!({ "team_id": team, "player_id": 100 })).await;
    let (_, second) = claim(&app, &owner, league, json!({ "team_id": team, "player_id": 101 })).await;
    assert_eq!(first["data"]["priority"], 1);
    assert_eq!(second["data"]["priority"], 2);

    let second_id = second["data"]["id"].as_i64().unwrap();
    let uri = format!("/leagues/{}/waiver-claims/{}/priority", league, second_id);

    let (status, body) = send(&app, Method::PUT, &uri, Some(&owner), Some(json!({ "priority": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, _) = send(&app, Method::PUT, &uri, Some(&stranger), Some(json!({ "priority": 1 }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::PUT, &uri, Some(&owner), Some(json!({ "priority": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "claim_id": second_id, "new_priority": 1 }));

    send(
        &app,
        Method::PUT,
        &format!("/leagues/{}/waiver-claims/{}/priority", league, first["data"]["id"]),
        Some(&owner),
        Some(json!({ "priority": 2 })),
    )
    .await;

    let (_, claims) = send(&app, Method::GET, &format!("/leagues/{}/waiver-claims", league), None, None).await;
    let players: Vec<i64> = claims
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["player_id"].as_i64().unwrap())
        .collect();
    assert_eq!(players, vec![101, 100]);

    send(&app, Method::POST, &format!("/leagues/{}/process-waivers", league), Some(&owner), None).await;
    let (status, _) = send(&app, Method::PUT, &uri, Some(&owner), Some(json!({ "priority": 3 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn accepted_trade_swaps_rosters() {
    let app = test_app().await;
    seed_players(&app).await;

    let a = register(&app, "tia").await;
    let b = register(&app, "ugo").await;
    let league = create_league(&app, &a, json!({ "name": "Traders" })).await;
    let ta = join(&app, &a, league, "Tia's").await;
    let tb = join(&app, &b, league, "Ugo's").await;

    claim(&app, &a, league, json!({ "team_id": ta, "player_id": 100 })).await;
    claim(&app, &b, league, json!({ "team_id": tb, "player_id": 101 })).await;
    send(&app, Method::POST, &format!("/leagues/{}/process-waivers", league), Some(&a), None).await;

    let uri = format!("/leagues/{}/trades", league);
    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(&a),
        Some(json!({ "from_team_id": ta, "to_team_id": ta, "players_offered": [100] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot trade with yourself");

    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        Some(&b),
        Some(json!({ "from_team_id": ta, "to_team_id": tb, "players_offered": [100] })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, proposed) = send(
        &app,
        Method::POST,
        &uri,
        Some(&a),
        Some(json!({ "from_team_id": ta, "to_team_id": tb, "players_offered": [100], "players_requested": [101] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{proposed}");
    assert_eq!(proposed["data"]["status"], "PENDING");
    let respond = format!("{}/{}/respond", uri, proposed["data"]["id"]);

    let (status, _) = send(&app, Method::POST, &respond, Some(&a), Some(json!({ "response": "ACCEPTED" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::POST, &respond, Some(&b), Some(json!({ "response": "MAYBE" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::POST, &respond, Some(&b), Some(json!({ "response": "ACCEPTED" }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "ACCEPTED");
    assert!(!body["data"]["responded_at"].is_null());

    let team_a = team_json(&app, league, ta).await;
    let team_b = team_json(&app, league, tb).await;
    assert_eq!(team_a["roster"], json!([{ "player_id": 101, "position": "Prop", "is_starting": true }]));
    assert_eq!(team_b["roster"], json!([{ "player_id": 100, "position": "Fly-half", "is_starting": true }]));

    let (status, body) = send(&app, Method::POST, &respond, Some(&b), Some(json!({ "response": "REJECTED" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This trade has already been responded to");
}

#[tokio::test]
async fn draft_follows_the_clock() {
    let app = test_app().await;
    seed_players(&app).await;

    let a = register(&app, "vic").await;
    let b = register(&app, "wyn").await;
    let late = register(&app, "xan").await;
    let league = create_league(&app, &a, json!({ "name": "Draft Day" })).await;
    let ta = join(&app, &a, league, "Vic's").await;
    let tb = join(&app, &b, league, "Wyn's").await;
    let draft = format!("/leagues/{}/draft", league);

    let (_, state) = send(&app, Method::GET, &draft, None, None).await;
    assert_eq!(state["draft_state"]["status"], "NOT_STARTED");

    let (status, _) = send(&app, Method::POST, &format!("{}/start", draft), Some(&b), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, started) = send(&app, Method::POST, &format!("{}/start", draft), Some(&a), None).await;
    assert_eq!(status, StatusCode::OK, "{started}");
    assert_eq!(started["draft_state"]["status"], "LIVE");
    let mut order: Vec<i64> = started["draft_state"]["pick_order"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_i64().unwrap())
        .collect();
    order.sort_unstable();
    assert_eq!(order, vec![ta, tb]);

    let (status, _) = send(&app, Method::POST, &format!("{}/start", draft), Some(&a), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, state) = send(&app, Method::GET, &draft, None, None).await;
    let first = state["on_the_clock"].as_i64().unwrap();
    let (on_clock, waiting) = if first == ta { (&a, &b) } else { (&b, &a) };

    let pick = format!("{}/pick", draft);
    let (status, _) = send(&app, Method::POST, &pick, Some(waiting), Some(json!({ "player_id": 103 }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::POST, &pick, Some(on_clock), Some(json!({ "player_id": 103 }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["pick"]["round"], 1);
    assert_eq!(body["pick"]["is_starting"], true);
    assert_eq!(team_json(&app, league, first).await["roster"][0]["player_id"], 103);

    let (status, _) = send(&app, Method::POST, &pick, Some(waiting), Some(json!({ "player_id": 103 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/leagues/{}/join", league),
        Some(&late),
        Some(json!({ "team_name": "Too late" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot join while the draft is live");

    let (status, done) = send(&app, Method::POST, &format!("{}/complete", draft), Some(&a), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["draft_state"]["status"], "COMPLETED");
    assert_eq!(done["draft_state"]["picks"].as_array().unwrap().len(), 1);

    let (_, league_json) = send(&app, Method::GET, &format!("/leagues/{}", league), None, None).await;
    assert_eq!(league_json["draft_status"], "COMPLETED");

    let (status, _) = send(&app, Method::POST, &pick, Some(waiting), Some(json!({ "player_id": 102 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn removing_a_team_rebuilds_fixtures() {
    let app = test_app().await;
    seed_players(&app).await;

    let commissioner = register(&app, "yves").await;
    let league = create_league(
        &app,
        &commissioner,
        json!({ "name": "Shrinking", "total_weeks": 3, "playoff_weeks": 0 }),
    )
    .await;

    let mut teams = Vec::new();
    for name in ["r1", "r2", "r3", "r4"] {
        let token = if name == "r1" { commissioner.clone() } else { register(&app, name).await };
        teams.push((join(&app, &token, league, name).await, token));
    }
    let (leaving, leaving_token) = teams[3].clone();

    let (status, _) = claim(&app, &leaving_token, league, json!({ "team_id": leaving, "player_id": 100 })).await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/leagues/{}/teams/{}", league, leaving);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&leaving_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&commissioner), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&commissioner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Team not found in this league");

    let (_, remaining) = send(&app, Method::GET, &format!("/leagues/{}/teams", league), None, None).await;
    assert_eq!(remaining.as_array().unwrap().len(), 3);

    let (_, fixtures) = send(&app, Method::GET, &format!("/leagues/{}/fixtures", league), None, None).await;
    let fixtures = fixtures.as_array().unwrap();
    assert!(!fixtures.is_empty());
    assert!(fixtures.iter().all(|f| f["home_team_id"] != leaving && f["away_team_id"] != leaving));

    let (_, claims) = send(&app, Method::GET, &format!("/leagues/{}/waiver-claims", league), None, None).await;
    assert_eq!(claims[0]["status"], "REJECTED");
    assert_eq!(claims[0]["reject_reason"], "TEAM_NOT_FOUND");
}
