//! Plug-in object properties.

use super::device::device_config;
use super::{common_data, ObjectProperties, PropertyContext, PropertyData, Qualifier};
use crate::error::{EngineError, EngineResult};
use crate::graph::{AudioObject, BOX_ID};
use crate::selectors::{object, plugin};
use crate::types::{ObjectId, PropertyAddress, UNKNOWN_OBJECT};

pub(super) struct PlugInObject<'a> {
    pub object: &'a AudioObject,
}

const PROPERTIES: &[u32] = &[
    object::BASE_CLASS,
    object::CLASS,
    object::OWNER,
    object::OWNED_OBJECTS,
    object::MANUFACTURER,
    plugin::DEVICE_LIST,
    plugin::BOX_LIST,
    plugin::CLOCK_DEVICE_LIST,
    plugin::TRANSLATE_UID_TO_DEVICE,
    plugin::TRANSLATE_UID_TO_BOX,
    plugin::RESOURCE_BUNDLE,
];

/// Devices that currently exist.
pub(super) fn live_devices(ctx: &PropertyContext<'_, '_>) -> Vec<ObjectId> {
    ctx.graph
        .devices()
        .iter()
        .copied()
        .filter(|&id| {
            ctx.graph
                .device_slot(id)
                .is_ok_and(|slot| ctx.plane().device(slot).is_created())
        })
        .collect()
}

fn uid_qualifier<'q>(qualifier: Qualifier<'q>) -> EngineResult<&'q str> {
    match qualifier {
        Qualifier::Uid(uid) => Ok(uid),
        _ => Err(EngineError::IllegalOperation("UID qualifier required")),
    }
}

impl ObjectProperties for PlugInObject<'_> {
    fn object(&self) -> &AudioObject {
        self.object
    }

    fn properties(&self) -> &'static [u32] {
        PROPERTIES
    }

    fn data(
        &self,
        ctx: &PropertyContext<'_, '_>,
        address: &PropertyAddress,
        qualifier: Qualifier<'_>,
    ) -> EngineResult<PropertyData> {
        if let Some(data) = common_data(ctx.graph, self.object, address.selector, qualifier) {
            return Ok(data);
        }
        let data = match address.selector {
            object::MANUFACTURER => PropertyData::text(ctx.config.manufacturer),
            plugin::DEVICE_LIST => PropertyData::ObjectList(live_devices(ctx)),
            plugin::BOX_LIST => PropertyData::ObjectList(vec![BOX_ID]),
            plugin::CLOCK_DEVICE_LIST => PropertyData::ObjectList(Vec::new()),
            plugin::TRANSLATE_UID_TO_DEVICE => {
                let uid = uid_qualifier(qualifier)?;
                let found = live_devices(ctx).into_iter().find(|&id| {
                    ctx.graph
                        .device_slot(id)
                        .is_ok_and(|slot| device_config(ctx.config, slot).uid == uid)
                });
                PropertyData::U32(found.unwrap_or(UNKNOWN_OBJECT))
            }
            plugin::TRANSLATE_UID_TO_BOX => {
                let uid = uid_qualifier(qualifier)?;
                let found = if uid == ctx.config.box_uid {
                    BOX_ID
                } else {
                    UNKNOWN_OBJECT
                };
                PropertyData::U32(found)
            }
            plugin::RESOURCE_BUNDLE => PropertyData::text(""),
            _ => return Err(self.unsupported(address)),
        };
        Ok(data)
    }
}
