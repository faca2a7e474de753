//! Canned forum and explorer payloads, shaped like the live APIs.

use serde_json::{json, Value};

/// Wrap `data` in the forum's success envelope.
pub fn forum_ok(data: Value) -> Value {
    json!({ "status": true, "code": 20000, "data": data, "description": "" })
}

/// A forum error envelope.
pub fn forum_error(code: i64, description: &str) -> Value {
    json!({ "status": false, "code": code, "description": description })
}

/// `get_thread` body with one poll. Options are `(id, label, voters, weights)`.
pub fn thread(options: &[(u64, &str, u64, f64)]) -> Value {
    let options: Vec<Value> = options
        .iter()
        .map(|(id, label, voters, weights)| {
            json!({ "id": id, "html": label, "voters": voters, "weights": weights })
        })
        .collect();
    forum_ok(json!({ "thread": { "polls": [ { "options": options } ] } }))
}

/// One `poll/list` page. Ballots are `(user_id, name, weight)`.
pub fn ballot_page(ballots: &[(u64, &str, f64)]) -> Value {
    let list: Vec<Value> = ballots
        .iter()
        .map(|(user_id, name, weight)| {
            json!({
                "user_id": user_id,
                "name": name,
                "weight": weight,
                "last_time": "2025-10-01 12:00:00"
            })
        })
        .collect();
    forum_ok(json!({ "list": list }))
}

/// The empty page that terminates a ballot listing.
pub fn empty_ballot_page() -> Value {
    forum_ok(json!({ "list": [] }))
}

/// `profile` body with the given neuron addresses and optional web3 key.
pub fn profile(neuron_addresses: &[&str], web3_public_key: Option<&str>) -> Value {
    forum_ok(json!({
        "user": {
            "neuron_addresses": neuron_addresses,
            "web3_public_key": web3_public_key.unwrap_or("")
        }
    }))
}

/// An `address_live_cells` page. Cells are `(cell_type, capacity_in_shannons)`.
pub fn live_cells(cells: &[(&str, u128)]) -> Value {
    let raw: Vec<(&str, String)> = cells
        .iter()
        .map(|(cell_type, capacity)| (*cell_type, format!("{capacity}.0")))
        .collect();
    live_cells_raw(&raw)
}

/// An `address_live_cells` page with capacities given verbatim.
pub fn live_cells_raw<S: AsRef<str>>(cells: &[(&str, S)]) -> Value {
    let data: Vec<Value> = cells
        .iter()
        .map(|(cell_type, capacity)| {
            json!({
                "type": "cell",
                "attributes": {
                    "cell_type": cell_type,
                    "capacity": capacity.as_ref()
                }
            })
        })
        .collect();
    json!({ "data": data })
}

/// `count` deposit cells of `capacity` shannons each.
pub fn deposit_cells(count: usize, capacity: u128) -> Value {
    live_cells(&vec![("nervos_dao_deposit", capacity); count])
}

/// Route pattern for one explorer page of `address`.
pub fn explorer_page(address: &str, page: u32) -> String {
    format!("{address}?page={page}&")
}

/// Route pattern for one `poll/list` page of an option.
pub fn ballots_page(option_id: u64, page: u32) -> String {
    format!("option_id={option_id}&page={page}&")
}

/// Route pattern for a user's profile.
pub fn profile_of(user_id: u64) -> String {
    format!("/profile/{user_id}/")
}

/// Route pattern for a thread lookup.
pub fn thread_of(thread_id: u64) -> String {
    format!("/get_thread/{thread_id}?")
}
