use tracing::{debug, instrument};
use uuid::Uuid;

/// Fresh identity for a deck, deck configuration or note model exported for
/// the first time.
#[instrument]
pub fn create_entity_uuid() -> Uuid {
	let uuid = Uuid::new_v4();
	debug!("Created entity UUID {}", uuid);
	uuid
}

/// Namespace for the notes of one note model. Falls back to a fixed namespace
/// when the model's identifier is not a UUID (hand-edited collections).
pub fn model_namespace(model_uuid: &str) -> Uuid {
	Uuid::parse_str(model_uuid).unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, model_uuid.as_bytes()))
}

/// Generate a UUID for a specific note based on its content
#[instrument(skip(content))]
pub fn generate_note_uuid(namespace: &Uuid, content: &str) -> Uuid {
	Uuid::new_v5(namespace, content.as_bytes())
}
