//! Route and private domain access lifecycle tests
//!
//! Drives the managers through create, read, update, delete and import
//! against the in-memory Cloud Controller

use std::sync::Arc;

use cf_route_common::ApiError;
use cf_route_test::{
    route_fixtures, standard_controller, ApiCall, CallVerifier, FakeCloudController, HTTP_DOMAIN_ID, ORG_ID,
    PRIVATE_DOMAIN_ID, SPACE_ID, TCP_DOMAIN_ID,
};
use cf_routemgr::{
    DesiredRoute, PrivateDomainAccessMgr, RouteAddress, RouteMgr, RouteMgrError, RouteSpec,
    Target, TargetKey, TargetOp, TargetSet, DEFAULT_APP_PORT,
};
use pretty_assertions::assert_eq;

fn setup() -> (Arc<FakeCloudController>, RouteMgr) {
    let cc = Arc::new(standard_controller());
    let mgr = RouteMgr::new(cc.clone(), cc.clone());
    (cc, mgr)
}

fn route_spec(domain_id: &str, address: RouteAddress, apps: &[&str]) -> RouteSpec {
    RouteSpec {
        domain_id: domain_id.to_string(),
        space_id: SPACE_ID.to_string(),
        address,
        targets: TargetSet::try_from_targets(apps.iter().map(|app| Target::new(*app))).unwrap(),
    }
}

fn host(hostname: &str, path: Option<&str>) -> RouteAddress {
    RouteAddress::Host {
        hostname: hostname.to_string(),
        path: path.map(str::to_string),
    }
}

fn is_delete_route(call: &ApiCall) -> bool {
    matches!(call, ApiCall::DeleteRoute(_))
}

#[tokio::test]
async fn test_create_http_route_with_targets() {
    let (cc, mgr) = setup();

    let state = mgr
        .create(&route_spec(HTTP_DOMAIN_ID, host("api", None), &["app1", "app2"]))
        .await
        .unwrap();

    assert_eq!(state.endpoint, "api.example.com");
    assert_eq!(state.hostname.as_deref(), Some("api"));
    assert_eq!(state.targets.len(), 2);
    assert!(state.targets.iter().all(|t| t.mapping_id().is_some()));
    assert_eq!(cc.mappings_for(&state.id).len(), 2);

    let calls = cc.calls();
    assert!(matches!(calls[0], ApiCall::CreateRoute { random_port: false, .. }));
    assert_eq!(calls[1], ApiCall::FindDomain(HTTP_DOMAIN_ID.to_string()));
    CallVerifier::of(&cc).assert_mapping_creates(2).unwrap();
}

#[tokio::test]
async fn test_endpoints_by_address_mode() {
    let (_cc, mgr) = setup();

    let tcp = mgr
        .create(&route_spec(TCP_DOMAIN_ID, RouteAddress::Port(1024), &[]))
        .await
        .unwrap();
    assert_eq!(tcp.endpoint, "tcp.example.com:1024");

    let with_path = mgr
        .create(&route_spec(HTTP_DOMAIN_ID, host("app", Some("v1")), &[]))
        .await
        .unwrap();
    assert_eq!(with_path.endpoint, "app.example.com/v1");

    let random = mgr
        .create(&route_spec(TCP_DOMAIN_ID, RouteAddress::RandomPort, &[]))
        .await
        .unwrap();
    assert!(random.random_port);
    assert_eq!(random.port, Some(61000));
    assert_eq!(random.endpoint, "tcp.example.com:61000");
}

#[tokio::test]
async fn test_create_rolls_back_on_target_failure() {
    let (cc, mgr) = setup();
    cc.fail_create_mapping_for("app2", ApiError::unavailable("create route mapping", "timeout"));

    let err = mgr
        .create(&route_spec(HTTP_DOMAIN_ID, host("api", None), &["app1", "app2", "app3"]))
        .await
        .unwrap_err();

    let reconcile = err.as_reconcile().expect("reconcile error");
    assert_eq!(reconcile.op, TargetOp::Create);
    assert_eq!(reconcile.key, TargetKey::new("app2", DEFAULT_APP_PORT));
    assert!(reconcile.is_partial());

    assert_eq!(cc.route_count(), 0);
    assert!(cc.calls().last().is_some_and(is_delete_route));
}

#[tokio::test]
async fn test_create_rolls_back_on_domain_lookup_failure() {
    let (cc, mgr) = setup();
    cc.fail_next(
        |c| matches!(c, ApiCall::FindDomain(_)),
        ApiError::unavailable("find domain", "timeout"),
    );

    let err = mgr
        .create(&route_spec(HTTP_DOMAIN_ID, host("api", None), &["app1"]))
        .await
        .unwrap_err();

    assert!(matches!(err, RouteMgrError::Api(ApiError::RemoteUnavailable { .. })));
    assert_eq!(cc.route_count(), 0);
    CallVerifier::of(&cc).assert_mapping_creates(0).unwrap();
}

#[tokio::test]
async fn test_failed_rollback_is_unrecoverable() {
    let (cc, mgr) = setup();
    cc.fail_create_mapping_for("app1", ApiError::unavailable("create route mapping", "timeout"));
    cc.fail_next(is_delete_route, ApiError::unavailable("delete route", "timeout"));

    let err = mgr
        .create(&route_spec(HTTP_DOMAIN_ID, host("api", None), &["app1"]))
        .await
        .unwrap_err();

    assert!(err.is_unrecoverable());
    match err {
        RouteMgrError::Unrecoverable { route_id, cause, rollback } => {
            assert!(cc.has_route(&route_id));
            assert!(cause.as_reconcile().is_some());
            assert!(rollback.is_unavailable());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_failed_route_create_needs_no_rollback() {
    let (cc, mgr) = setup();

    let err = mgr
        .create(&route_spec("dom-unknown", host("api", None), &["app1"]))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(cc.calls().len(), 1);
}

#[tokio::test]
async fn test_read_vanished_route() {
    let (cc, mgr) = setup();
    let state = mgr
        .create(&route_spec(HTTP_DOMAIN_ID, host("api", None), &[]))
        .await
        .unwrap();
    cc.clear_calls();

    mgr.delete(&state).await.unwrap();
    assert_eq!(mgr.read(&state.id, true).await.unwrap(), None);
}

#[tokio::test]
async fn test_read_observes_out_of_band_mappings() {
    let (cc, mgr) = setup();
    let state = mgr
        .create(&route_spec(HTTP_DOMAIN_ID, host("api", None), &["app1"]))
        .await
        .unwrap();
    cc.seed_mapping(&state.id, "app9", Some(9090), "m-oob");

    let read = mgr.read(&state.id, true).await.unwrap().unwrap();
    assert_eq!(read.targets.len(), 2);
    assert_eq!(
        read.targets.get(&TargetKey::new("app9", 9090)),
        Some(&Target::with_port("app9", 9090).mapped("m-oob"))
    );
}

#[tokio::test]
async fn test_read_rejects_route_with_empty_hostname_and_no_port() {
    let (cc, mgr) = setup();
    cc.seed_route(route_fixtures::http_route("route-blank", ""));

    let err = mgr.read("route-blank", false).await.unwrap_err();
    assert!(matches!(
        err,
        RouteMgrError::ContractViolation { ref field, .. } if field == "hostname"
    ));

    let err = mgr.import("route-blank").await.unwrap_err();
    assert!(matches!(err, RouteMgrError::ContractViolation { .. }));
}

#[tokio::test]
async fn test_read_applies_default_port_to_portless_mappings() {
    let cc = Arc::new(standard_controller());
    let mgr = RouteMgr::new(cc.clone(), cc.clone()).with_default_app_port(3000);
    let state = mgr
        .create(&route_spec(HTTP_DOMAIN_ID, host("api", None), &[]))
        .await
        .unwrap();
    cc.seed_mapping(&state.id, "app1", None, "m1");

    let read = mgr.read(&state.id, true).await.unwrap().unwrap();
    assert!(read.targets.contains_key(&TargetKey::new("app1", 3000)));
}

#[tokio::test]
async fn test_refresh_keeps_random_port_flag() {
    let (_cc, mgr) = setup();
    let state = mgr
        .create(&route_spec(TCP_DOMAIN_ID, RouteAddress::RandomPort, &["app1"]))
        .await
        .unwrap();

    let refreshed = mgr.refresh(&state).await.unwrap().unwrap();
    assert_eq!(refreshed, state);
}

#[tokio::test]
async fn test_import_tracks_targets() {
    let (cc, mgr) = setup();
    let state = mgr
        .create(&route_spec(HTTP_DOMAIN_ID, host("api", Some("v1")), &["app1", "app2"]))
        .await
        .unwrap();
    cc.clear_calls();

    let imported = mgr.import(&state.id).await.unwrap();
    assert_eq!(imported, state);

    let err = mgr.import("route-404").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_update_hostname_in_place() {
    let (cc, mgr) = setup();
    let state = mgr
        .create(&route_spec(HTTP_DOMAIN_ID, host("api", None), &["app1"]))
        .await
        .unwrap();
    cc.clear_calls();

    let updated = mgr
        .update(&state, &route_spec(HTTP_DOMAIN_ID, host("www", None), &["app1"]))
        .await
        .unwrap();

    assert_eq!(updated.endpoint, "www.example.com");
    assert_eq!(updated.targets, state.targets);
    let verifier = CallVerifier::of(&cc);
    verifier.assert_mutation_count(1).unwrap();
    verifier
        .assert_called(&ApiCall::UpdateRoute {
            id: state.id.clone(),
            domain_id: HTTP_DOMAIN_ID.to_string(),
            space_id: SPACE_ID.to_string(),
            hostname: Some("www".to_string()),
        })
        .unwrap();
}

#[tokio::test]
async fn test_update_targets_only() {
    let (cc, mgr) = setup();
    let state = mgr
        .create(&route_spec(HTTP_DOMAIN_ID, host("api", None), &["app1", "app2"]))
        .await
        .unwrap();
    cc.clear_calls();

    let updated = mgr
        .update(&state, &route_spec(HTTP_DOMAIN_ID, host("api", None), &["app2", "app3"]))
        .await
        .unwrap();

    let keys: Vec<_> = updated.targets.keys().map(|k| k.app_id).collect();
    assert_eq!(keys, vec!["app2".to_string(), "app3".to_string()]);

    let verifier = CallVerifier::of(&cc);
    verifier.assert_mapping_deletes(1).unwrap();
    verifier.assert_mapping_creates(1).unwrap();
    verifier.assert_deletes_before_creates().unwrap();
    verifier
        .assert_not_called(&ApiCall::UpdateRoute {
            id: state.id.clone(),
            domain_id: HTTP_DOMAIN_ID.to_string(),
            space_id: SPACE_ID.to_string(),
            hostname: Some("api".to_string()),
        })
        .unwrap();
}

#[tokio::test]
async fn test_refresh_after_failed_update_sees_applied_route_change() {
    let (cc, mgr) = setup();
    let state = mgr
        .create(&route_spec(HTTP_DOMAIN_ID, host("api", None), &["app1"]))
        .await
        .unwrap();
    cc.fail_create_mapping_for("app2", ApiError::unavailable("create route mapping", "timeout"));

    let err = mgr
        .update(&state, &route_spec(HTTP_DOMAIN_ID, host("www", None), &["app2"]))
        .await
        .unwrap_err();
    assert_eq!(err.as_reconcile().map(|e| e.op), Some(TargetOp::Create));

    let refreshed = mgr.refresh(&state).await.unwrap().unwrap();
    assert_eq!(refreshed.hostname.as_deref(), Some("www"));
    assert_eq!(refreshed.endpoint, "www.example.com");
    assert!(refreshed.targets.is_empty());
}

#[tokio::test]
async fn test_update_rejects_creation_time_changes() {
    let (cc, mgr) = setup();
    let state = mgr
        .create(&route_spec(HTTP_DOMAIN_ID, host("api", Some("v1")), &[]))
        .await
        .unwrap();
    cc.clear_calls();

    let err = mgr
        .update(&state, &route_spec(HTTP_DOMAIN_ID, host("api", Some("v2")), &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, RouteMgrError::RequiresReplacement { ref field, .. } if field == "path"));

    let err = mgr
        .update(&state, &route_spec(TCP_DOMAIN_ID, RouteAddress::Port(1024), &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, RouteMgrError::RequiresReplacement { ref field, .. } if field == "port"));

    assert!(cc.calls().is_empty());
}

#[tokio::test]
async fn test_delete_tears_down_before_route_delete() {
    let (cc, mgr) = setup();
    let state = mgr
        .create(&route_spec(HTTP_DOMAIN_ID, host("api", None), &["app1", "app2"]))
        .await
        .unwrap();
    cc.clear_calls();

    mgr.delete(&state).await.unwrap();

    let calls = cc.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[..2].iter().all(|c| matches!(c, ApiCall::DeleteMapping(_))));
    assert_eq!(calls[2], ApiCall::DeleteRoute(state.id.clone()));
    assert_eq!(cc.route_count(), 0);
}

#[tokio::test]
async fn test_delete_stops_on_teardown_failure() {
    let (cc, mgr) = setup();
    let state = mgr
        .create(&route_spec(HTTP_DOMAIN_ID, host("api", None), &["app1"]))
        .await
        .unwrap();
    cc.fail_next(
        |c| matches!(c, ApiCall::DeleteMapping(_)),
        ApiError::unavailable("delete route mapping", "timeout"),
    );

    let err = mgr.delete(&state).await.unwrap_err();

    assert_eq!(err.as_reconcile().map(|e| e.op), Some(TargetOp::Delete));
    assert!(cc.has_route(&state.id));
}

/// Scenario:
/// 1. Parse and validate a TOML route description
/// 2. Create the route, then change its targets and hostname
/// 3. Delete it and verify nothing remains
#[tokio::test]
async fn test_description_to_deletion() {
    let (cc, mgr) = setup();

    let desired = DesiredRoute::from_toml_str(
        r#"
domain_id = "dom-http"
space_id = "space-1"
hostname = "shop"

[[target]]
app_id = "web"

[[target]]
app_id = "admin"
port = 9000
"#,
    )
    .unwrap();
    let spec = desired.clone().into_spec(DEFAULT_APP_PORT).unwrap();
    let state = mgr.create(&spec).await.unwrap();
    assert_eq!(state.endpoint, "shop.example.com");

    let changed = DesiredRoute {
        hostname: Some("store".to_string()),
        targets: desired.targets[..1].to_vec(),
        ..desired
    }
    .into_spec(DEFAULT_APP_PORT)
    .unwrap();
    let state = mgr.update(&state, &changed).await.unwrap();
    assert_eq!(state.endpoint, "store.example.com");
    assert_eq!(state.targets.len(), 1);
    assert_eq!(cc.mappings_for(&state.id).len(), 1);

    mgr.delete(&state).await.unwrap();
    assert_eq!(cc.route_count(), 0);
    assert!(cc.mappings_for(&state.id).is_empty());
}

#[tokio::test]
async fn test_private_domain_access_lifecycle() {
    let cc = Arc::new(standard_controller());
    let mgr = PrivateDomainAccessMgr::new(cc.clone());

    let access = mgr.create(ORG_ID, PRIVATE_DOMAIN_ID).await.unwrap();
    assert_eq!(access.id, format!("{}/{}", ORG_ID, PRIVATE_DOMAIN_ID));

    let imported = mgr.import(&access.id).unwrap();
    assert_eq!(imported, access);
    assert_eq!(mgr.read(&imported.id).await.unwrap(), Some(access.clone()));

    mgr.delete(&access.id).await.unwrap();
    assert_eq!(mgr.read(&access.id).await.unwrap(), None);
    assert!(!cc.has_private_access(ORG_ID, PRIVATE_DOMAIN_ID));

    let err = mgr.create(ORG_ID, "dom-unknown").await.unwrap_err();
    assert!(err.is_not_found());
}
