//! Store feature
//!
//! Order 1 is a well-known identifier, so the scenarios touching it run serially.

use std::sync::Arc;

use petcheck_core::RequestSpec;
use serde_json::{Value, json};

use super::{MISSING_ID, PetStoreApi, WELL_KNOWN_ORDER_ID};
use crate::scenario::Scenario;

const FEATURE: &str = "Store";

fn order(id: i64) -> Value {
    json!({
        "id": id,
        "petId": 1,
        "quantity": 1,
        "status": "placed",
        "complete": true
    })
}

pub(super) fn scenarios(api: &Arc<PetStoreApi>) -> Vec<Scenario> {
    vec![
        place_order(api),
        get_order_by_id(api),
        delete_order(api),
        get_missing_order(api),
    ]
}

fn place_order(api: &Arc<PetStoreApi>) -> Scenario {
    let api = Arc::clone(api);
    Scenario::new(FEATURE, "Place order", move |ctx, _| {
        let payload = order(WELL_KNOWN_ORDER_ID);
        ctx.adopt(&api.order, WELL_KNOWN_ORDER_ID);

        let resp = ctx.send(&api.place_order, RequestSpec::new().with_body(payload.clone()))?;
        if ctx.expect_status(&resp, &[200]) {
            ctx.validate_schema(&resp, "Order")?;
            ctx.assert_fields(
                "order fields",
                &payload,
                resp.json(),
                &["id", "petId", "quantity", "status", "complete"],
            );
        }
        Ok(())
    })
    .serial()
}

fn get_order_by_id(api: &Arc<PetStoreApi>) -> Scenario {
    let kind = api.order.clone();
    let api = Arc::clone(api);
    Scenario::new(FEATURE, "Get order by id", move |ctx, fixtures| {
        let id = fixtures.id("order")?;
        let resp = ctx.send(&api.get_order, RequestSpec::new().path_param("orderId", id))?;
        if ctx.expect_status(&resp, &[200]) {
            ctx.validate_schema(&resp, "Order")?;
            ctx.check("order id", |r| {
                r.check_value("id", id, resp.json().and_then(|doc| doc.get("id")));
            });
        }
        Ok(())
    })
    .fixture("order", kind, |_| order(WELL_KNOWN_ORDER_ID))
    .serial()
}

fn delete_order(api: &Arc<PetStoreApi>) -> Scenario {
    let kind = api.order.clone();
    let api = Arc::clone(api);
    Scenario::new(FEATURE, "Delete order", move |ctx, fixtures| {
        let id = fixtures.id("order")?;
        let resp = ctx.send(&api.delete_order, RequestSpec::new().path_param("orderId", id))?;
        ctx.expect_status(&resp, &[200]);

        let resp = ctx.send(&api.get_order, RequestSpec::new().path_param("orderId", id))?;
        ctx.expect_status(&resp, &[404]);
        Ok(())
    })
    .fixture("order", kind, order)
}

fn get_missing_order(api: &Arc<PetStoreApi>) -> Scenario {
    let api = Arc::clone(api);
    Scenario::new(FEATURE, "Get nonexistent order", move |ctx, _| {
        let resp = ctx.send(&api.get_order, RequestSpec::new().path_param("orderId", MISSING_ID))?;
        ctx.expect_status(&resp, &[404]);
        Ok(())
    })
}
