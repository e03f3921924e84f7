use serde::{Deserialize, Serialize};

/// Identifier of a resource owned by the host's resource manager.
pub type ResourceId = i32;

/// Assignment of an external resource to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAssignment {
    pub resource_id: ResourceId,
    /// Share of the resource's time, in percent.
    pub load: f32,
    /// Whether the resource coordinates the task.
    #[serde(default)]
    pub coordinator: bool,
}

impl ResourceAssignment {
    pub fn new(resource_id: ResourceId, load: f32) -> Self {
        Self {
            resource_id,
            load,
            coordinator: false,
        }
    }
}
