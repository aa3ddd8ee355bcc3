//! Views driven against mock PLC and PDS servers over HTTP.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use atnav_atproto::{
    ClientConfig, IdentityResolver, RepositoryRpc, ResolverConfig, SessionFactory, XrpcSession,
    XrpcSessionFactory,
};
use atnav_views::{ListItem, Navigator, Route, ValueRenderer, View, ViewError, ViewState};

const DID: &str = "did:plc:oisofpd7lj26yvgiivf3lxsi";
const RKEY: &str = "3l2zpbbhuvw2h";

/// Renderer that remembers what it was handed.
#[derive(Default)]
struct Recorder {
    values: Vec<(Value, String)>,
    items: Vec<ListItem>,
}

impl ValueRenderer for Recorder {
    fn render_value(&mut self, value: &Value, repo: &str) {
        self.values.push((value.clone(), repo.to_string()));
    }

    fn render_item(&mut self, item: &ListItem) {
        self.items.push(item.clone());
    }
}

/// Sends every session to one mock server, remembering the endpoints asked for.
struct RedirectSessions {
    base: String,
    requested: Mutex<Vec<String>>,
}

impl SessionFactory for RedirectSessions {
    fn create_session(&self, endpoint: &str) -> Box<dyn RepositoryRpc> {
        self.requested.lock().unwrap().push(endpoint.to_string());
        Box::new(XrpcSession::new(&self.base).unwrap())
    }
}

fn redirect(server: &MockServer) -> Arc<RedirectSessions> {
    Arc::new(RedirectSessions {
        base: server.uri(),
        requested: Mutex::new(Vec::new()),
    })
}

fn repos(range: std::ops::Range<usize>) -> Value {
    let repos: Vec<Value> = range
        .map(|i| {
            json!({
                "did": format!("did:plc:repo{:05}", i),
                "head": format!("bafyhead{}", i),
                "rev": format!("3k{}", i),
                "active": i % 7 != 0,
            })
        })
        .collect();
    Value::Array(repos)
}

fn records(repo: &str, range: std::ops::Range<usize>) -> Value {
    let records: Vec<Value> = range
        .map(|i| {
            json!({
                "uri": format!("at://{}/app.bsky.feed.post/3k{:06}", repo, i),
                "cid": format!("bafy{}", i),
                "value": {"$type": "app.bsky.feed.post", "text": format!("post {}", i)},
            })
        })
        .collect();
    Value::Array(records)
}

#[tokio::test]
async fn test_record_resolves_and_loads() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{}", DID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": DID,
            "alsoKnownAs": ["at://retr0.id"],
            "service": [{
                "id": "#atproto_pds",
                "type": "AtprotoPersonalDataServer",
                "serviceEndpoint": server.uri(),
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.repo.getRecord"))
        .and(query_param("repo", DID))
        .and(query_param("collection", "app.bsky.feed.post"))
        .and(query_param("rkey", RKEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": format!("at://{}/app.bsky.feed.post/{}", DID, RKEY),
            "cid": "bafyreib2rxk3rh6kzwq",
            "value": {"$type": "app.bsky.feed.post", "text": "hello"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolver =
        IdentityResolver::new(&ResolverConfig::default().with_plc_directory(server.uri())).unwrap();
    let sessions = XrpcSessionFactory::new(&ClientConfig::default()).unwrap();
    let nav = Navigator::new(resolver, Arc::new(sessions));

    let route = nav
        .submit(&format!("{}/app.bsky.feed.post/{}", DID, RKEY))
        .await
        .unwrap();
    let mut view = nav.mount(route);
    view.load().await.unwrap();

    assert_eq!(*view.state(), ViewState::Ready);
    assert_eq!(nav.notices().current(), "");
    assert_eq!(
        view.endpoint_host(),
        Some(server.uri().trim_start_matches("http://"))
    );

    let View::Record(record_view) = &view else {
        panic!("expected a record view");
    };
    let record = record_view.record().unwrap();
    assert_eq!(record.value["text"], "hello");

    let mut recorder = Recorder::default();
    view.render(&mut recorder);
    assert_eq!(recorder.values.len(), 1);
    assert_eq!(recorder.values[0].1, DID);
    assert_eq!(recorder.values[0].0["cid"], "bafyreib2rxk3rh6kzwq");

    let labels: Vec<String> = view.breadcrumb().into_iter().map(|c| c.label).collect();
    assert_eq!(labels[1..].to_vec(), vec![DID, "app.bsky.feed.post", RKEY]);
}

#[tokio::test]
async fn test_server_lists_repos_until_short_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.sync.listRepos"))
        .and(query_param("limit", "1000"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "repos": repos(0..1000),
            "cursor": "c1000"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.sync.listRepos"))
        .and(query_param("cursor", "c1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "repos": repos(1000..2000),
            "cursor": "c2000"
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Short last page still carries a cursor
    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.sync.listRepos"))
        .and(query_param("cursor", "c2000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "repos": repos(2000..2250),
            "cursor": "c2250"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sessions = redirect(&server);
    let nav = Navigator::new(
        IdentityResolver::new(&ResolverConfig::default()).unwrap(),
        sessions.clone(),
    );

    let route = nav.submit("https://pds.bsky.mom").await.unwrap();
    assert_eq!(
        route,
        Route::Server {
            host: "pds.bsky.mom".to_string()
        }
    );

    let mut view = nav.mount(route);
    view.load().await.unwrap();
    assert!(view.has_more());

    let mut pages = 1;
    while view.has_more() {
        view.load_more().await.unwrap();
        pages += 1;
    }

    assert_eq!(pages, 3);
    assert_eq!(*view.state(), ViewState::Ready);
    assert_eq!(nav.notices().current(), "");
    assert_eq!(*sessions.requested.lock().unwrap(), vec!["pds.bsky.mom"]);
    assert_eq!(view.endpoint_host(), Some("pds.bsky.mom"));

    let links = view.links();
    assert_eq!(links.len(), 2250);
    assert_eq!(links[0].label, "did:plc:repo00000");
    assert!(links[0].inactive);
    assert!(!links[1].inactive);
    assert_eq!(links[1999].route.to_string(), "/at/did:plc:repo01999");

    assert!(matches!(
        view.load_more().await,
        Err(ViewError::NothingToLoad)
    ));
}

#[tokio::test]
async fn test_failed_load_more_keeps_records() {
    let server = MockServer::start().await;
    let repo = "did:plc:alice";

    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.repo.listRecords"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": records(repo, 0..100),
            "cursor": "c100"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.repo.listRecords"))
        .and(query_param("cursor", "c100"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "InternalServerError",
            "message": "Internal Server Error"
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.repo.listRecords"))
        .and(query_param("cursor", "c100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": records(repo, 100..130),
        })))
        .mount(&server)
        .await;

    let nav = Navigator::new(
        IdentityResolver::new(&ResolverConfig::default()).unwrap(),
        redirect(&server),
    );
    let mut view = nav
        .open(&format!("/pds.example.com/{}/app.bsky.feed.post", repo))
        .unwrap();

    view.load().await.unwrap();
    assert_eq!(view.links().len(), 100);

    let err = view.load_more().await.unwrap_err();
    assert_eq!(err.to_string(), "Internal Server Error");
    assert_eq!(
        *view.state(),
        ViewState::Failed("Internal Server Error".to_string())
    );
    assert_eq!(nav.notices().current(), "Internal Server Error");
    assert_eq!(view.links().len(), 100);
    assert!(view.has_more());

    let outcome = view.load_more().await.unwrap();
    assert_eq!(outcome.appended, 30);
    assert!(outcome.exhausted);
    assert_eq!(*view.state(), ViewState::Ready);
    assert_eq!(nav.notices().current(), "");

    let links = view.links();
    assert_eq!(links.len(), 130);
    assert_eq!(
        links[129].route.to_string(),
        format!("/pds.example.com/{}/app.bsky.feed.post/3k000129", repo)
    );
}

#[tokio::test]
async fn test_repeated_load_more_failure_reports_latest_error() {
    let server = MockServer::start().await;
    let repo = "did:plc:alice";

    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.repo.listRecords"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": records(repo, 0..100),
            "cursor": "c100"
        })))
        .mount(&server)
        .await;

    for (priority, message) in [(1, "Upstream timed out"), (2, "Service Unavailable")] {
        Mock::given(method("GET"))
            .and(path("/xrpc/com.atproto.repo.listRecords"))
            .and(query_param("cursor", "c100"))
            .respond_with(ResponseTemplate::new(502).set_body_json(json!({
                "error": "UpstreamFailure",
                "message": message
            })))
            .up_to_n_times(1)
            .with_priority(priority)
            .mount(&server)
            .await;
    }

    let nav = Navigator::new(
        IdentityResolver::new(&ResolverConfig::default()).unwrap(),
        redirect(&server),
    );
    let mut view = nav
        .open(&format!("/pds.example.com/{}/app.bsky.feed.post", repo))
        .unwrap();
    view.load().await.unwrap();

    let first = view.load_more().await.unwrap_err();
    assert_eq!(first.to_string(), "Upstream timed out");
    assert_eq!(view.state().failure(), Some("Upstream timed out"));

    let second = view.load_more().await.unwrap_err();
    assert_eq!(second.to_string(), "Service Unavailable");
    assert_eq!(view.state().failure(), Some("Service Unavailable"));
    assert_eq!(nav.notices().current(), "Service Unavailable");
    assert_eq!(view.links().len(), 100);
    assert!(view.has_more());
}

#[tokio::test]
async fn test_records_without_rkey_are_not_linked() {
    let server = MockServer::start().await;
    let repo = "did:plc:alice";

    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.repo.listRecords"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [
                {
                    "uri": format!("at://{}/app.bsky.feed.post/", repo),
                    "cid": "bafybroken",
                    "value": {}
                },
                {
                    "uri": format!("at://{}/app.bsky.feed.post/3kgood", repo),
                    "cid": "bafygood",
                    "value": {}
                }
            ]
        })))
        .mount(&server)
        .await;

    let nav = Navigator::new(
        IdentityResolver::new(&ResolverConfig::default()).unwrap(),
        redirect(&server),
    );
    let mut view = nav
        .open(&format!("/pds.example.com/{}/app.bsky.feed.post", repo))
        .unwrap();
    view.load().await.unwrap();

    let links = view.links();
    assert_eq!(links.len(), 1);
    let path = links[0].route.to_string();
    assert_eq!(
        path,
        format!("/pds.example.com/{}/app.bsky.feed.post/3kgood", repo)
    );
    assert_eq!(Route::parse(&path).unwrap(), links[0].route);
}

#[tokio::test]
async fn test_repository_renders_did_document() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.repo.describeRepo"))
        .and(query_param("repo", DID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "did": DID,
            "handle": "retr0.id",
            "didDoc": {"id": DID},
            "collections": ["app.bsky.actor.profile", "app.bsky.feed.post"],
            "handleIsCorrect": true
        })))
        .mount(&server)
        .await;

    let nav = Navigator::new(
        IdentityResolver::new(&ResolverConfig::default()).unwrap(),
        redirect(&server),
    );
    let mut view = nav.open(&format!("/pds.example.com/{}", DID)).unwrap();
    view.load().await.unwrap();

    let mut recorder = Recorder::default();
    view.render(&mut recorder);

    assert_eq!(recorder.values, vec![(json!({"id": DID}), DID.to_string())]);
    let routes: Vec<String> = recorder
        .items
        .iter()
        .map(|item| item.route.to_string())
        .collect();
    assert_eq!(
        routes,
        vec![
            format!("/pds.example.com/{}/app.bsky.actor.profile", DID),
            format!("/pds.example.com/{}/app.bsky.feed.post", DID),
        ]
    );
}

#[tokio::test]
async fn test_server_error_message_shown_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.repo.getRecord"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "RecordNotFound",
            "message": "Could not locate record"
        })))
        .mount(&server)
        .await;

    let nav = Navigator::new(
        IdentityResolver::new(&ResolverConfig::default()).unwrap(),
        redirect(&server),
    );
    let mut view = nav
        .open(&format!("/pds.example.com/{}/app.bsky.feed.post/{}", DID, RKEY))
        .unwrap();

    assert!(matches!(view.load().await, Err(ViewError::Rpc(_))));
    assert_eq!(nav.notices().current(), "Could not locate record");
    assert_eq!(view.state().failure(), Some("Could not locate record"));
}
