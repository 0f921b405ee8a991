use uuid::Uuid;

/// Produces the `slotid` of each outgoing Criteo slot.
pub trait SlotIdGenerator: Send + Sync {
    fn new_slot_id(&self) -> String;
}

/// Random v4 UUIDs, the generator used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidSlotIdGenerator;

impl SlotIdGenerator for UuidSlotIdGenerator {
    fn new_slot_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
