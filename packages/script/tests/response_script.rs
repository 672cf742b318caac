use std::sync::{Arc, Mutex};
use std::thread;

use collection_literals::btree;
use harvest_assets::payload::{Column, Payload};
use harvest_assets::Record;
use harvest_script::{
    Emit, Error, Resource, ResponseScript, RunContext, RunOutcome, ScriptConfig,
};
use harvest_structmap::StructMap;
use harvest_value::Value;

fn collector() -> (Emit, Arc<Mutex<Vec<Record>>>) {
    let records = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&records);
    let emit: Emit = Arc::new(move |record| sink.lock().unwrap().push(record));
    (emit, records)
}

fn script(source: &str) -> harvest_script::Result<ResponseScript> {
    ResponseScript::new(
        &ScriptConfig::lua(source),
        Arc::new(StructMap::default()),
        "test-recipe",
    )
}

fn response() -> Value {
    Value::Map(btree! {
        "id".to_string() => Value::from("42"),
        "title".to_string() => Value::from("hi"),
    })
}

#[test]
fn emits_a_typed_table_record() {
    let script = script(
        r#"
        local a = new_asset("table")
        a.data.columns = { { name = "id" }, { name = "title" } }
        emit(a)
        "#,
    )
    .unwrap();
    let (emit, records) = collector();

    let outcome = script.execute(&RunContext::background(), &response(), emit).unwrap();
    assert_eq!(outcome, RunOutcome::Completed);

    let records = records.lock().unwrap();
    assert_eq!(records.len(), 1);
    let asset = records[0].data();
    assert_eq!(asset.kind, "table");
    let Some(Payload::Table(table)) = &asset.data else {
        panic!("expected a table payload, got {:?}", asset.data);
    };
    let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "title"]);
    assert_eq!(
        table.columns[0],
        Column {
            name: "id".to_string(),
            ..Column::default()
        }
    );
}

#[test]
fn fields_come_from_the_response_and_scope() {
    let script = script(
        r#"
        local text = import("text")
        local a = new_asset("topic")
        a.urn = "urn:api:" .. recipe_scope .. ":" .. response.id
        a.name = text.to_upper(response.title)
        a.labels = { source = "api" }
        emit(a)
        "#,
    )
    .unwrap();
    let (emit, records) = collector();
    script.execute(&RunContext::background(), &response(), emit).unwrap();

    let records = records.lock().unwrap();
    let asset = records[0].data();
    assert_eq!(asset.urn, "urn:api:test-recipe:42");
    assert_eq!(asset.name, "HI");
    assert_eq!(asset.labels.get("source").map(String::as_str), Some("api"));
    assert!(matches!(asset.data, Some(Payload::Topic(_))));
}

#[test]
fn exit_before_emit_delivers_nothing() {
    let script = script("if response.id == '42' then exit() end\nemit(new_asset('table'))").unwrap();
    let (emit, records) = collector();
    let outcome = script.execute(&RunContext::background(), &response(), emit).unwrap();
    assert_eq!(outcome, RunOutcome::UserExited);
    assert!(records.lock().unwrap().is_empty());
}

#[test]
fn records_emitted_before_a_failure_stay_delivered() {
    let script = script("emit(new_asset('table'))\nlocal x = response.missing.field").unwrap();
    let (emit, records) = collector();
    let err = script.execute(&RunContext::background(), &response(), emit).unwrap_err();
    assert!(matches!(err, Error::Runtime { function: None, .. }), "{err:?}");
    assert_eq!(records.lock().unwrap().len(), 1);
}

#[test]
fn emit_checks_arity_and_type() {
    let cases = [
        ("emit()", "wrong number of arguments: expected 1, got 0"),
        (
            "emit(new_asset('table'), new_asset('table'))",
            "wrong number of arguments: expected 1, got 2",
        ),
        ("emit('table')", "invalid argument type: expected map, found string"),
    ];
    for (source, message) in cases {
        let script = script(source).unwrap();
        let (emit, records) = collector();
        let err = script.execute(&RunContext::background(), &response(), emit).unwrap_err();
        assert_eq!(err, Error::runtime("emit", message), "{source}");
        assert!(records.lock().unwrap().is_empty(), "{source}");
    }
}

#[test]
fn unknown_asset_types_are_runtime_errors() {
    let script = script("emit(new_asset('spreadsheet'))").unwrap();
    let (emit, _) = collector();
    let err = script.execute(&RunContext::background(), &response(), emit).unwrap_err();
    assert_eq!(err, Error::runtime("new_asset", "unknown type \"spreadsheet\""));
}

#[test]
fn invalid_fields_are_marshal_errors() {
    let script = script(
        r#"
        local a = new_asset("table")
        a.data.colums = {}
        emit(a)
        "#,
    )
    .unwrap();
    let (emit, records) = collector();
    let err = script.execute(&RunContext::background(), &response(), emit).unwrap_err();
    assert!(matches!(err, Error::Marshal(_)), "{err:?}");
    assert!(err.to_string().contains("colums"), "{err}");
    assert!(records.lock().unwrap().is_empty());
}

#[test]
fn nan_fields_are_marshal_errors() {
    let script = script(
        r#"
        local a = new_asset("experiment")
        a.data.traffic_percent = 0 / 0
        emit(a)
        "#,
    )
    .unwrap();
    let (emit, records) = collector();
    let err = script.execute(&RunContext::background(), &response(), emit).unwrap_err();
    assert!(
        matches!(err, Error::Marshal(harvest_structmap::Error::Parse { .. })),
        "{err:?}"
    );
    assert!(records.lock().unwrap().is_empty());
}

#[test]
fn compile_errors_are_reported_up_front() {
    for source in [
        r#"local os = import("os")"#,
        "emit(asset)",
        "local a = new_asset('table'",
    ] {
        let err = script(source).unwrap_err();
        assert!(matches!(err, Error::Compile { .. }), "{source}: {err:?}");
    }
}

#[test]
fn allocation_budget_applies_per_config() {
    let source = r#"
        local total = 0
        for i = 1, 2000 do total = total + i end
        local a = new_asset("metric")
        a.name = tostring(total)
        emit(a)
    "#;

    let (emit, records) = collector();
    script(source)
        .unwrap()
        .execute(&RunContext::background(), &response(), emit)
        .unwrap();
    assert_eq!(records.lock().unwrap()[0].data().name, "2001000");

    let mut tight = ScriptConfig::lua(source);
    tight.max_allocs = 200;
    let tight = ResponseScript::new(&tight, Arc::new(StructMap::default()), "test").unwrap();
    let (emit, records) = collector();
    let err = tight.execute(&RunContext::background(), &response(), emit).unwrap_err();
    assert_eq!(
        err,
        Error::ResourceLimitExceeded {
            resource: Resource::Allocations,
            limit: 200,
        }
    );
    assert!(records.lock().unwrap().is_empty());
}

#[test]
fn concurrent_runs_do_not_share_state() {
    let script = Arc::new(
        script(
            r#"
            local a = new_asset("user")
            a.urn = "urn:user:" .. response.id
            a.data.email = response.id .. "@example.com"
            emit(a)
            "#,
        )
        .unwrap(),
    );
    let (emit, records) = collector();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let script = Arc::clone(&script);
            let emit = Arc::clone(&emit);
            thread::spawn(move || {
                let response = Value::Map(btree! {
                    "id".to_string() => Value::from(i.to_string()),
                });
                script.execute(&RunContext::background(), &response, emit).unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), RunOutcome::Completed);
    }

    let records = records.lock().unwrap();
    assert_eq!(records.len(), 16);
    for record in records.iter() {
        let asset = record.data();
        let id = asset.urn.trim_start_matches("urn:user:");
        let Some(Payload::User(user)) = &asset.data else {
            panic!("expected user payload");
        };
        assert_eq!(user.email, format!("{id}@example.com"));
    }
}

#[test]
fn cancelled_context_runs_nothing() {
    let script = script("emit(new_asset('table'))").unwrap();
    let ctx = RunContext::background();
    ctx.cancel();
    let (emit, records) = collector();
    let err = script.execute(&ctx, &response(), emit).unwrap_err();
    assert!(err.is_cancelled());
    assert!(records.lock().unwrap().is_empty());
}
