//! Pet Store resource schemas (Swagger Petstore v3 contract)

use super::{FieldSchema, SchemaDefinition};

fn category() -> FieldSchema {
    FieldSchema::object()
        .field("id", FieldSchema::integer())
        .field("name", FieldSchema::string())
}

fn tag() -> FieldSchema {
    FieldSchema::object()
        .field("id", FieldSchema::integer())
        .field("name", FieldSchema::string())
}

fn pet() -> FieldSchema {
    FieldSchema::object()
        .field("id", FieldSchema::integer().required())
        .field("name", FieldSchema::string().required())
        .field("category", category())
        .field("photoUrls", FieldSchema::array(FieldSchema::string()))
        .field("tags", FieldSchema::array(tag()))
        .field(
            "status",
            FieldSchema::string().one_of(["available", "pending", "sold"]),
        )
}

fn order() -> FieldSchema {
    FieldSchema::object()
        .field("id", FieldSchema::integer().required())
        .field("petId", FieldSchema::integer().required())
        .field("quantity", FieldSchema::integer().required())
        .field("shipDate", FieldSchema::string())
        .field(
            "status",
            FieldSchema::string()
                .required()
                .one_of(["placed", "approved", "delivered"]),
        )
        .field("complete", FieldSchema::boolean())
}

fn api_response() -> FieldSchema {
    FieldSchema::object()
        .field("code", FieldSchema::integer())
        .field("type", FieldSchema::string())
        .field("message", FieldSchema::string())
}

pub(super) fn definitions() -> Vec<SchemaDefinition> {
    [
        ("Pet", pet()),
        ("PetList", FieldSchema::array(pet())),
        ("Order", order()),
        ("Category", category()),
        ("Tag", tag()),
        ("ApiResponse", api_response()),
    ]
    .into_iter()
    .map(|(name, root)| SchemaDefinition {
        name: name.to_string(),
        root,
    })
    .collect()
}
