//! The static audio object graph.
//!
//! ```text
//! PlugIn (1)
//! └── Box (2)
//!     ├── Device (3)   ─ input stream, volume, mute; output stream, volume, mute; pitch; clock source
//!     └── Device2 (12) ─ same layout, IDs 13..=20
//! ```
//!
//! The graph is built once from the configuration and never changes. IDs are
//! fixed so that a device keeps the same object IDs across runs; nodes a
//! device does not have (an input-only device has no output stream) are
//! absent and resolve to [`EngineError::InvalidObject`].

use crate::config::{DeviceConfig, DriverConfig};
use crate::error::{EngineError, EngineResult};
use crate::types::{Direction, ObjectId};

// =============================================================================
// ID layout
// =============================================================================

/// Object ID of the plug-in.
pub const PLUG_IN_ID: ObjectId = 1;

/// Object ID of the box.
pub const BOX_ID: ObjectId = 2;

/// Objects per device block (the device plus its eight children).
const DEVICE_BLOCK: ObjectId = 9;

/// Offsets of device children relative to the device ID.
mod offset {
    use crate::types::ObjectId;

    pub const STREAM_INPUT: ObjectId = 1;
    pub const VOLUME_INPUT: ObjectId = 2;
    pub const MUTE_INPUT: ObjectId = 3;
    pub const STREAM_OUTPUT: ObjectId = 4;
    pub const VOLUME_OUTPUT: ObjectId = 5;
    pub const MUTE_OUTPUT: ObjectId = 6;
    pub const PITCH: ObjectId = 7;
    pub const CLOCK_SOURCE: ObjectId = 8;
}

/// Which of the two devices a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceSlot {
    Primary,
    Mirror,
}

impl DeviceSlot {
    pub const ALL: [DeviceSlot; 2] = [DeviceSlot::Primary, DeviceSlot::Mirror];

    pub const fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Mirror => 1,
        }
    }

    /// Object ID of this slot's device node.
    pub const fn device_id(self) -> ObjectId {
        BOX_ID + 1 + self.index() as ObjectId * DEVICE_BLOCK
    }

    pub const fn stream_id(self, direction: Direction) -> ObjectId {
        self.device_id()
            + match direction {
                Direction::Input => offset::STREAM_INPUT,
                Direction::Output => offset::STREAM_OUTPUT,
            }
    }

    pub const fn volume_id(self, direction: Direction) -> ObjectId {
        self.device_id()
            + match direction {
                Direction::Input => offset::VOLUME_INPUT,
                Direction::Output => offset::VOLUME_OUTPUT,
            }
    }

    pub const fn mute_id(self, direction: Direction) -> ObjectId {
        self.device_id()
            + match direction {
                Direction::Input => offset::MUTE_INPUT,
                Direction::Output => offset::MUTE_OUTPUT,
            }
    }

    pub const fn pitch_id(self) -> ObjectId {
        self.device_id() + offset::PITCH
    }

    pub const fn clock_source_id(self) -> ObjectId {
        self.device_id() + offset::CLOCK_SOURCE
    }
}

/// Highest object ID the layout can produce.
const MAX_OBJECT_ID: ObjectId = DeviceSlot::Mirror.clock_source_id();

// =============================================================================
// Nodes
// =============================================================================

/// The kind of an object, carrying where it sits in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    PlugIn,
    Box,
    Device(DeviceSlot),
    Stream(DeviceSlot, Direction),
    Volume(DeviceSlot, Direction),
    Mute(DeviceSlot, Direction),
    Pitch(DeviceSlot),
    ClockSource(DeviceSlot),
}

impl ObjectKind {
    /// The device this object belongs to, if any.
    pub fn device_slot(&self) -> Option<DeviceSlot> {
        match *self {
            Self::PlugIn | Self::Box => None,
            Self::Device(slot)
            | Self::Stream(slot, _)
            | Self::Volume(slot, _)
            | Self::Mute(slot, _)
            | Self::Pitch(slot)
            | Self::ClockSource(slot) => Some(slot),
        }
    }

    /// Whether this object is a control.
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            Self::Volume(..) | Self::Mute(..) | Self::Pitch(_) | Self::ClockSource(_)
        )
    }
}

/// One node of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub owner: ObjectId,
    pub children: Vec<ObjectId>,
}

// =============================================================================
// Graph
// =============================================================================

/// Indexed table of every object, built once.
#[derive(Debug, Clone)]
pub struct ObjectGraph {
    table: Vec<Option<AudioObject>>,
    devices: Vec<ObjectId>,
}

impl ObjectGraph {
    /// Build the graph for a configuration.
    pub fn build(config: &DriverConfig) -> Self {
        let mut graph = Self {
            table: vec![None; MAX_OBJECT_ID as usize + 1],
            devices: Vec::with_capacity(2),
        };

        graph.insert(PLUG_IN_ID, ObjectKind::PlugIn, 0);
        graph.insert(BOX_ID, ObjectKind::Box, PLUG_IN_ID);

        graph.insert_device(DeviceSlot::Primary, &config.primary);
        if let Some(mirror) = &config.mirror {
            graph.insert_device(DeviceSlot::Mirror, mirror);
        }
        graph
    }

    fn insert_device(&mut self, slot: DeviceSlot, device: &DeviceConfig) {
        let device_id = slot.device_id();
        self.insert(device_id, ObjectKind::Device(slot), BOX_ID);
        self.devices.push(device_id);

        for direction in [Direction::Input, Direction::Output] {
            let present = match direction {
                Direction::Input => device.has_input,
                Direction::Output => device.has_output,
            };
            if present {
                self.insert(
                    slot.stream_id(direction),
                    ObjectKind::Stream(slot, direction),
                    device_id,
                );
                self.insert(
                    slot.volume_id(direction),
                    ObjectKind::Volume(slot, direction),
                    device_id,
                );
                self.insert(
                    slot.mute_id(direction),
                    ObjectKind::Mute(slot, direction),
                    device_id,
                );
            }
        }
        self.insert(slot.pitch_id(), ObjectKind::Pitch(slot), device_id);
        self.insert(
            slot.clock_source_id(),
            ObjectKind::ClockSource(slot),
            device_id,
        );
    }

    fn insert(&mut self, id: ObjectId, kind: ObjectKind, owner: ObjectId) {
        self.table[id as usize] = Some(AudioObject {
            id,
            kind,
            owner,
            children: Vec::new(),
        });
        if let Some(Some(parent)) = self.table.get_mut(owner as usize) {
            parent.children.push(id);
        }
    }

    /// Look up an object by ID.
    pub fn get(&self, id: ObjectId) -> EngineResult<&AudioObject> {
        self.table
            .get(id as usize)
            .and_then(Option::as_ref)
            .ok_or(EngineError::InvalidObject(id))
    }

    /// Look up the kind of an object.
    pub fn kind(&self, id: ObjectId) -> EngineResult<ObjectKind> {
        self.get(id).map(|object| object.kind)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_ok()
    }

    /// Children of an object in creation order.
    pub fn children(&self, id: ObjectId) -> EngineResult<&[ObjectId]> {
        self.get(id).map(|object| object.children.as_slice())
    }

    /// IDs of every device node.
    pub fn devices(&self) -> &[ObjectId] {
        &self.devices
    }

    /// Slot of a device node. Fails if `id` is not a device.
    pub fn device_slot(&self, id: ObjectId) -> EngineResult<DeviceSlot> {
        match self.kind(id)? {
            ObjectKind::Device(slot) => Ok(slot),
            _ => Err(EngineError::InvalidObject(id)),
        }
    }

    /// Children of a device matching a scope: streams and direction-scoped
    /// controls of that direction, plus device-wide controls for the global
    /// scope.
    pub fn device_children(
        &self,
        device: ObjectId,
        direction: Option<Direction>,
        filter: impl Fn(ObjectKind) -> bool,
    ) -> EngineResult<Vec<ObjectId>> {
        let children = self.children(device)?;
        Ok(children
            .iter()
            .copied()
            .filter(|&child| {
                let Ok(kind) = self.kind(child) else {
                    return false;
                };
                let child_direction = match kind {
                    ObjectKind::Stream(_, d) | ObjectKind::Volume(_, d) | ObjectKind::Mute(_, d) => {
                        Some(d)
                    }
                    _ => None,
                };
                let in_scope = match direction {
                    None => true,
                    Some(wanted) => child_direction == Some(wanted),
                };
                in_scope && filter(kind)
            })
            .collect())
    }

    /// Stream IDs of a device in a scope.
    pub fn device_streams(
        &self,
        device: ObjectId,
        direction: Option<Direction>,
    ) -> EngineResult<Vec<ObjectId>> {
        self.device_children(device, direction, |kind| {
            matches!(kind, ObjectKind::Stream(..))
        })
    }

    /// Control IDs of a device in a scope.
    pub fn device_controls(
        &self,
        device: ObjectId,
        direction: Option<Direction>,
    ) -> EngineResult<Vec<ObjectId>> {
        self.device_children(device, direction, |kind| kind.is_control())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: DriverConfig = DriverConfig::new("Graph")
        .with_mirror(DeviceConfig::new("Mirror", "Mirror_UID").without_input());

    #[test]
    fn test_id_layout() {
        assert_eq!(DeviceSlot::Primary.device_id(), 3);
        assert_eq!(DeviceSlot::Primary.stream_id(Direction::Input), 4);
        assert_eq!(DeviceSlot::Primary.mute_id(Direction::Output), 9);
        assert_eq!(DeviceSlot::Primary.clock_source_id(), 11);
        assert_eq!(DeviceSlot::Mirror.device_id(), 12);
        assert_eq!(DeviceSlot::Mirror.stream_id(Direction::Input), 13);
        assert_eq!(DeviceSlot::Mirror.clock_source_id(), 20);
    }

    #[test]
    fn test_tree_structure() {
        let graph = ObjectGraph::build(&CONFIG);
        assert_eq!(graph.children(PLUG_IN_ID).unwrap(), &[BOX_ID]);
        assert_eq!(graph.children(BOX_ID).unwrap(), &[3, 12]);
        assert_eq!(graph.get(7).unwrap().owner, 3);
        assert_eq!(graph.kind(10).unwrap(), ObjectKind::Pitch(DeviceSlot::Primary));
        assert_eq!(graph.devices(), &[3, 12]);
    }

    #[test]
    fn test_absent_nodes_are_invalid() {
        let graph = ObjectGraph::build(&CONFIG);
        // The mirror has no input stream, volume or mute.
        for id in [13, 14, 15] {
            assert_eq!(graph.get(id), Err(EngineError::InvalidObject(id)));
        }
        assert!(graph.contains(16));
        assert!(!graph.contains(0));
        assert!(!graph.contains(21));
        assert!(!graph.contains(u32::MAX));
    }

    #[test]
    fn test_no_mirror_without_config() {
        let graph = ObjectGraph::build(&DriverConfig::new("Solo"));
        assert_eq!(graph.devices(), &[3]);
        assert!(!graph.contains(12));
    }

    #[test]
    fn test_scoped_children() {
        let graph = ObjectGraph::build(&CONFIG);
        assert_eq!(graph.device_streams(3, None).unwrap(), vec![4, 7]);
        assert_eq!(graph.device_streams(3, Some(Direction::Input)).unwrap(), vec![4]);
        assert!(graph
            .device_streams(12, Some(Direction::Input))
            .unwrap()
            .is_empty());
        assert_eq!(
            graph.device_controls(3, None).unwrap(),
            vec![5, 6, 8, 9, 10, 11]
        );
        assert_eq!(
            graph.device_controls(3, Some(Direction::Output)).unwrap(),
            vec![8, 9]
        );
    }

    #[test]
    fn test_device_slot_lookup() {
        let graph = ObjectGraph::build(&CONFIG);
        assert_eq!(graph.device_slot(12).unwrap(), DeviceSlot::Mirror);
        assert!(graph.device_slot(4).is_err());
    }
}
