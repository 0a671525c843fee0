//! Integration tests for request scopes.

use remote_resource::connection::{HttpMethod, SetHeader, StubResponse, Stubs};
use remote_resource::{
    Adapter, AttributeValue, Params, ResourceError, ResourceQuery, ResourceType, SiteUrl,
};
use serde_json::{json, Value};

fn person(stubs: &Stubs) -> ResourceType {
    let person = ResourceType::builder("Person")
        .site(SiteUrl::new("http://37s.sunrise.i:3000").unwrap())
        .adapter(Adapter::Test(stubs.clone()))
        .build()
        .unwrap();
    person.define_scope("authed", |stack, args| {
        let token = args.first().and_then(Value::as_str).unwrap_or_default();
        stack.insert(0, SetHeader::new("X-Auth", token));
    });
    person.define_scope("traced", |stack, _| {
        stack.insert(0, SetHeader::new("X-Trace", "on"));
    });
    person
}

fn person_body(id: i64, name: &str) -> StubResponse {
    StubResponse::json(200, &json!({"person": {"id": id, "name": name}}))
}

#[tokio::test]
async fn test_scope_header_only_on_scoped_requests() {
    let stubs = Stubs::new();
    stubs
        .get("/people/1.json", person_body(1, "Matz"))
        .get("/people/2.json", person_body(2, "David"));
    let person = person(&stubs);

    person
        .scope("authed", &[json!("t0k3n")])
        .unwrap()
        .find(2, &Params::new())
        .await
        .unwrap();
    assert_eq!(stubs.last_request().unwrap().header("X-Auth"), Some("t0k3n"));

    person.find(1, &Params::new()).await.unwrap();
    assert_eq!(stubs.last_request().unwrap().header("X-Auth"), None);
}

#[tokio::test]
async fn test_scoped_record_saves_through_scope() {
    let stubs = Stubs::new();
    stubs
        .get("/people/2.json", person_body(2, "David"))
        .put("/people/2.json", StubResponse::new(204));
    let person = person(&stubs);

    let mut david = person
        .scope("authed", &[json!("t0k3n")])
        .unwrap()
        .find(2, &Params::new())
        .await
        .unwrap();
    david.set("name", "DHH");
    assert!(david.save().await.unwrap());

    let request = stubs.last_request().unwrap();
    assert_eq!(request.http_method, HttpMethod::Put);
    assert_eq!(request.header("X-Auth"), Some("t0k3n"));
}

#[tokio::test]
async fn test_scoped_collection_records_keep_scope() {
    let stubs = Stubs::new();
    stubs
        .get(
            "/people.json",
            StubResponse::json(200, &json!([{"id": 1, "name": "Matz"}])),
        )
        .delete("/people/1.json", StubResponse::new(200));
    let person = person(&stubs);

    let people = person
        .scope("authed", &[json!("abc")])
        .unwrap()
        .all()
        .await
        .unwrap();
    assert_eq!(people[0].get("name").and_then(AttributeValue::as_str), Some("Matz"));

    people[0].destroy().await.unwrap();
    assert_eq!(stubs.last_request().unwrap().header("X-Auth"), Some("abc"));
}

#[tokio::test]
async fn test_chained_scopes_apply_all_headers() {
    let stubs = Stubs::new();
    stubs.get("/people/1.json", person_body(1, "Matz"));
    let person = person(&stubs);

    person
        .scope("authed", &[json!("k")])
        .unwrap()
        .scope("traced", &[])
        .unwrap()
        .find(1, &Params::new())
        .await
        .unwrap();

    let request = stubs.last_request().unwrap();
    assert_eq!(request.header("X-Auth"), Some("k"));
    assert_eq!(request.header("X-Trace"), Some("on"));
}

#[tokio::test]
async fn test_scopes_are_inherited_by_subtypes() {
    let stubs = Stubs::new();
    stubs.get("/admins/1.json", person_body(1, "Root"));
    let person = person(&stubs);
    let admin = ResourceType::builder("Admin").parent(&person).build().unwrap();

    admin
        .scope("authed", &[json!("root")])
        .unwrap()
        .find(1, &Params::new())
        .await
        .unwrap();
    assert_eq!(stubs.last_request().unwrap().header("X-Auth"), Some("root"));
}

#[tokio::test]
async fn test_unknown_scope_is_rejected() {
    let stubs = Stubs::new();
    let person = person(&stubs);

    let error = person.scope("missing", &[]).unwrap_err();
    assert!(matches!(error, ResourceError::UnknownScope { ref name, .. } if name == "missing"));
}
