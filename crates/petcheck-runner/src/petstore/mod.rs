//! Pet Store scenario catalogue (`/pet`, `/store/order`)

mod pet;
mod store;

use std::sync::Arc;

use petcheck_core::{EndpointDescriptor, Method};

use crate::fixture::ResourceKind;
use crate::suite::Suite;

pub use petcheck_core::{MISSING_ID, WELL_KNOWN_ORDER_ID};

/// Endpoints of the service under test, bound to one base URL.
#[derive(Debug, Clone)]
pub struct PetStoreApi {
    pub add_pet: EndpointDescriptor,
    pub update_pet: EndpointDescriptor,
    pub get_pet: EndpointDescriptor,
    pub delete_pet: EndpointDescriptor,
    pub find_by_status: EndpointDescriptor,
    pub place_order: EndpointDescriptor,
    pub get_order: EndpointDescriptor,
    pub delete_order: EndpointDescriptor,
    pub pet: ResourceKind,
    pub order: ResourceKind,
}

impl PetStoreApi {
    pub fn new(base_url: &str) -> Self {
        let endpoint = |method, path: &str| EndpointDescriptor::new(base_url, method, path);
        let add_pet = endpoint(Method::Post, "/pet");
        let delete_pet = endpoint(Method::Delete, "/pet/{petId}");
        let place_order = endpoint(Method::Post, "/store/order");
        let delete_order = endpoint(Method::Delete, "/store/order/{orderId}");
        Self {
            pet: ResourceKind::new("pet", add_pet.clone(), delete_pet.clone(), "petId"),
            order: ResourceKind::new(
                "order",
                place_order.clone(),
                delete_order.clone(),
                "orderId",
            ),
            update_pet: endpoint(Method::Put, "/pet"),
            get_pet: endpoint(Method::Get, "/pet/{petId}"),
            find_by_status: endpoint(Method::Get, "/pet/findByStatus"),
            get_order: endpoint(Method::Get, "/store/order/{orderId}"),
            add_pet,
            delete_pet,
            place_order,
            delete_order,
        }
    }

    /// Every Pet and Store scenario, in declaration order.
    pub fn suite(base_url: &str) -> Suite {
        let api = Arc::new(Self::new(base_url));
        Suite::new()
            .extend(pet::scenarios(&api))
            .extend(store::scenarios(&api))
    }
}
