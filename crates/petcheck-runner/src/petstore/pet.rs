//! Pet feature

use std::sync::Arc;

use petcheck_core::RequestSpec;
use serde_json::{Value, json};

use super::{MISSING_ID, PetStoreApi};
use crate::scenario::{Scenario, table};

const FEATURE: &str = "Pet";
const NOT_FOUND: &str = "Pet not found";

fn buddy(id: i64) -> Value {
    json!({ "id": id, "name": "Buddy", "status": "available" })
}

fn buddy_updated(id: i64) -> Value {
    json!({ "id": id, "name": "Buddy Updated", "status": "sold" })
}

fn full_data_pet(id: i64) -> Value {
    json!({
        "id": id,
        "name": "doggie",
        "category": { "id": 1, "name": "Dogs" },
        "photoUrls": ["string"],
        "tags": [{ "id": 0, "name": "string" }],
        "status": "available"
    })
}

const PET_FIELDS: &[&str] = &["id", "name", "status"];

pub(super) fn scenarios(api: &Arc<PetStoreApi>) -> Vec<Scenario> {
    let mut scenarios = vec![
        add_pet(api),
        add_full_data_pet(api),
        get_pet_by_id(api),
        update_pet(api),
        delete_pet(api),
        get_missing_pet(api),
        update_missing_pet(api),
        delete_missing_pet(api),
    ];
    scenarios.extend(find_by_status(api));
    scenarios.push(lifecycle(api));
    scenarios
}

fn add_pet(api: &Arc<PetStoreApi>) -> Scenario {
    let api = Arc::clone(api);
    Scenario::new(FEATURE, "Add pet", move |ctx, _| {
        let id = ctx.ids().next_id()?;
        let payload = buddy(id);
        ctx.adopt(&api.pet, id);

        let resp = ctx.send(&api.add_pet, RequestSpec::new().with_body(payload.clone()))?;
        if ctx.expect_status(&resp, &[200]) {
            ctx.validate_schema(&resp, "Pet")?;
            ctx.assert_fields("pet fields", &payload, resp.json(), PET_FIELDS);
        }
        Ok(())
    })
}

fn add_full_data_pet(api: &Arc<PetStoreApi>) -> Scenario {
    let api = Arc::clone(api);
    Scenario::new(FEATURE, "Add pet with full data", move |ctx, _| {
        let id = ctx.ids().next_id()?;
        let payload = full_data_pet(id);
        ctx.adopt(&api.pet, id);

        let resp = ctx.send(&api.add_pet, RequestSpec::new().with_body(payload.clone()))?;
        if ctx.expect_status(&resp, &[200]) {
            ctx.validate_schema(&resp, "Pet")?;
            ctx.assert_fields(
                "pet fields",
                &payload,
                resp.json(),
                &[
                    "id",
                    "name",
                    "category.id",
                    "category.name",
                    "photoUrls",
                    "tags.0.id",
                    "tags.0.name",
                    "status",
                ],
            );
        }
        Ok(())
    })
}

fn get_pet_by_id(api: &Arc<PetStoreApi>) -> Scenario {
    let pet = api.pet.clone();
    let api = Arc::clone(api);
    Scenario::new(FEATURE, "Get pet by id", move |ctx, fixtures| {
        let pet = fixtures.get("pet")?;
        let resp = ctx.send(&api.get_pet, RequestSpec::new().path_param("petId", pet.id()))?;
        if ctx.expect_status(&resp, &[200]) {
            ctx.validate_schema(&resp, "Pet")?;
            ctx.assert_fields("pet fields", pet.document(), resp.json(), PET_FIELDS);
        }
        Ok(())
    })
    .fixture("pet", pet, buddy)
}

fn update_pet(api: &Arc<PetStoreApi>) -> Scenario {
    let pet = api.pet.clone();
    let api = Arc::clone(api);
    Scenario::new(FEATURE, "Update pet", move |ctx, fixtures| {
        let id = fixtures.id("pet")?;
        let payload = buddy_updated(id);
        let resp = ctx.send(&api.update_pet, RequestSpec::new().with_body(payload.clone()))?;
        if ctx.expect_status(&resp, &[200]) {
            ctx.validate_schema(&resp, "Pet")?;
            ctx.assert_fields("updated fields", &payload, resp.json(), PET_FIELDS);
        }
        Ok(())
    })
    .fixture("pet", pet, buddy)
}

fn delete_pet(api: &Arc<PetStoreApi>) -> Scenario {
    let pet = api.pet.clone();
    let api = Arc::clone(api);
    Scenario::new(FEATURE, "Delete pet", move |ctx, fixtures| {
        let id = fixtures.id("pet")?;
        let resp = ctx.send(&api.delete_pet, RequestSpec::new().path_param("petId", id))?;
        ctx.expect_status(&resp, &[200]);

        let resp = ctx.send(&api.get_pet, RequestSpec::new().path_param("petId", id))?;
        ctx.expect_status(&resp, &[404]);
        Ok(())
    })
    .fixture("pet", pet, buddy)
}

fn get_missing_pet(api: &Arc<PetStoreApi>) -> Scenario {
    let api = Arc::clone(api);
    Scenario::new(FEATURE, "Get nonexistent pet", move |ctx, _| {
        let resp = ctx.send(&api.get_pet, RequestSpec::new().path_param("petId", MISSING_ID))?;
        if ctx.expect_status(&resp, &[404]) {
            let body = Value::from(resp.text());
            ctx.check("error text", |r| {
                r.check_value("body", NOT_FOUND, Some(&body));
            });
        }
        Ok(())
    })
}

fn update_missing_pet(api: &Arc<PetStoreApi>) -> Scenario {
    let api = Arc::clone(api);
    Scenario::new(FEATURE, "Update nonexistent pet", move |ctx, _| {
        let payload = json!({ "id": MISSING_ID, "name": "Non-existent Pet", "status": "available" });
        let resp = ctx.send(&api.update_pet, RequestSpec::new().with_body(payload))?;
        if ctx.expect_status(&resp, &[404]) {
            let body = Value::from(resp.text());
            ctx.check("error text", |r| {
                r.check_value("body", NOT_FOUND, Some(&body));
            });
        }
        Ok(())
    })
}

fn delete_missing_pet(api: &Arc<PetStoreApi>) -> Scenario {
    let api = Arc::clone(api);
    Scenario::new(FEATURE, "Delete nonexistent pet", move |ctx, _| {
        let resp = ctx.send(&api.delete_pet, RequestSpec::new().path_param("petId", MISSING_ID))?;
        if ctx.expect_status(&resp, &[200]) {
            let body = Value::from(resp.text());
            ctx.check("confirmation text", |r| {
                r.check_value("body", "Pet deleted", Some(&body));
            });
        }
        Ok(())
    })
}

/// Valid statuses answer a pet list; anything else is rejected with 400.
fn find_by_status(api: &Arc<PetStoreApi>) -> Vec<Scenario> {
    let api = Arc::clone(api);
    let rows = [
        ("available", ("available", 200)),
        ("pending", ("pending", 200)),
        ("sold", ("sold", 200)),
        ("unbelieve", ("unbelieve", 400)),
        ("empty", ("", 400)),
    ];
    table(
        FEATURE,
        "Find pets by status",
        rows,
        move |ctx, _, &(status, expected): &(&'static str, u16)| {
            let resp = ctx.send(&api.find_by_status, RequestSpec::new().query("status", status))?;
            if ctx.expect_status(&resp, &[expected])
                && expected == 200
                && ctx.validate_schema(&resp, "PetList")?
            {
                let pets = resp.json().and_then(Value::as_array).cloned().unwrap_or_default();
                ctx.check("every pet has the requested status", |r| {
                    for (i, pet) in pets.iter().enumerate() {
                        r.check_value(format!("{i}.status"), status, pet.get("status"));
                    }
                });
            }
            Ok(())
        },
    )
}

fn lifecycle(api: &Arc<PetStoreApi>) -> Scenario {
    let api = Arc::clone(api);
    Scenario::new(FEATURE, "Pet lifecycle", move |ctx, _| {
        let id = ctx.ids().next_id()?;
        ctx.adopt(&api.pet, id);

        let created = buddy(id);
        let resp = ctx.send(&api.add_pet, RequestSpec::new().with_body(created.clone()))?;
        if !ctx.expect_status(&resp, &[200]) {
            return Ok(());
        }
        ctx.validate_schema(&resp, "Pet")?;
        ctx.assert_fields("created fields", &created, resp.json(), PET_FIELDS);

        let updated = buddy_updated(id);
        let resp = ctx.send(&api.update_pet, RequestSpec::new().with_body(updated.clone()))?;
        if ctx.expect_status(&resp, &[200]) {
            ctx.assert_fields("updated fields", &updated, resp.json(), PET_FIELDS);
        }

        let resp = ctx.send(&api.delete_pet, RequestSpec::new().path_param("petId", id))?;
        ctx.expect_status(&resp, &[200]);

        let resp = ctx.send(&api.get_pet, RequestSpec::new().path_param("petId", id))?;
        ctx.expect_status(&resp, &[404]);
        Ok(())
    })
}
