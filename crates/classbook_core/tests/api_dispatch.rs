use classbook_core::{execute_json, ErrorKind, Store};
use serde_json::{json, Value};

fn run(store: &Store, request: Value) -> (Value, Vec<(Value, ErrorKind)>) {
    let response = execute_json(store, &request.to_string());
    let errors = response
        .errors
        .iter()
        .map(|entry| (serde_json::to_value(&entry.path).unwrap(), entry.kind))
        .collect();
    (Value::Array(response.data), errors)
}

#[test]
fn failing_operation_is_null_while_siblings_resolve() {
    let store = Store::open_in_memory().unwrap();
    let (data, errors) = run(
        &store,
        json!({"operations": [
            {"op": "createFeature", "input": {"name": "Stealth", "desc": "Move unseen"}},
            {"op": "updateJob", "id": "0123456789abcdef0123456789abcdef", "input": {"name": "Ghost"}},
            {"op": "features"}
        ]}),
    );

    assert_eq!(data[0]["name"], "Stealth");
    assert!(data[1].is_null());
    assert_eq!(data[2].as_array().unwrap().len(), 1);
    assert_eq!(data[2][0]["id"], data[0]["id"]);
    assert_eq!(errors, [(json!([1, "updateJob"]), ErrorKind::NotFound)]);
}

#[test]
fn job_flow_through_operations() {
    let store = Store::open_in_memory().unwrap();
    let (created, errors) = run(
        &store,
        json!({"operations": [
            {"op": "createJob", "input": {"name": "Rogue", "isSpecialization": false}},
            {"op": "createFeature", "input": {"name": "Stealth"}}
        ]}),
    );
    assert!(errors.is_empty());
    let rogue_id = created[0]["id"].clone();
    let stealth_id = created[1]["id"].clone();

    let (data, errors) = run(
        &store,
        json!({"operations": [
            {"op": "createJob", "input": {"name": "Assassin", "isSpecialization": true, "base": rogue_id}},
            {"op": "attachFeature", "jobId": rogue_id, "featureId": stealth_id, "level": 1},
            {"op": "jobs", "id": rogue_id},
            {"op": "jobs", "base": true}
        ]}),
    );
    assert!(errors.is_empty());

    let assassin = &data[0];
    assert_eq!(assassin["base"], rogue_id);
    assert!(assassin["specializations"].is_null());

    assert_eq!(data[1]["features"], json!([{"feature": stealth_id, "level": 1}]));

    let rogue = &data[2][0];
    assert_eq!(rogue["specializations"], json!([assassin["id"]]));
    assert_eq!(rogue["isSpecialization"], false);

    let roots = data[3].as_array().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["name"], "Rogue");
}

#[test]
fn malformed_identifier_is_reported_per_operation() {
    let store = Store::open_in_memory().unwrap();
    let (data, errors) = run(
        &store,
        json!({"operations": [
            {"op": "jobs", "id": "not-an-identifier"},
            {"op": "jobs"}
        ]}),
    );

    assert!(data[0].is_null());
    assert_eq!(data[1], json!([]));
    assert_eq!(
        errors,
        [(json!([0, "jobs"]), ErrorKind::MalformedIdentifier)]
    );
}

#[test]
fn dice_selection_failure_nulls_only_that_field() {
    let store = Store::open_in_memory().unwrap();
    let (data, errors) = run(
        &store,
        json!({"operations": [
            {"op": "dice", "numSides": 10, "select": [
                {"field": "rollOnce"},
                {"field": "rollSum", "numRolls": 2, "drop": 2},
                {"field": "roll", "numRolls": 4, "drop": 1}
            ]}
        ]}),
    );

    let die = &data[0];
    assert_eq!(die["numSides"], 10);
    let once = die["rollOnce"].as_i64().unwrap();
    assert!((1..=10).contains(&once));
    assert!(die["rollSum"].is_null());
    assert_eq!(die["roll"].as_array().unwrap().len(), 3);
    assert_eq!(
        errors,
        [(json!([0, "dice", "rollSum"]), ErrorKind::EmptyReduction)]
    );
}

#[test]
fn dice_defaults_to_six_sides_and_rejects_zero() {
    let store = Store::open_in_memory().unwrap();
    let (data, errors) = run(
        &store,
        json!({"operations": [
            {"op": "dice"},
            {"op": "dice", "numSides": 0, "select": [{"field": "rollOnce"}]}
        ]}),
    );

    assert_eq!(data[0], json!({"numSides": 6}));
    assert!(data[1].is_null());
    assert_eq!(errors, [(json!([1, "dice"]), ErrorKind::InvalidArgument)]);
}

#[test]
fn negative_roll_count_is_invalid_for_that_selection() {
    let store = Store::open_in_memory().unwrap();
    let (data, errors) = run(
        &store,
        json!({"operations": [
            {"op": "dice", "select": [{"field": "roll", "numRolls": -1}]}
        ]}),
    );

    assert_eq!(data[0]["numSides"], 6);
    assert!(data[0]["roll"].is_null());
    assert_eq!(
        errors,
        [(json!([0, "dice", "roll"]), ErrorKind::InvalidArgument)]
    );
}

#[test]
fn malformed_json_rejects_the_request() {
    let store = Store::open_in_memory().unwrap();
    let response = execute_json(&store, "{\"operations\": [");
    assert!(response.data.is_empty());
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].kind, ErrorKind::InvalidArgument);
}
