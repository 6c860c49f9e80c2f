//! Box object properties.

use super::plugin::live_devices;
use super::{
    common_data, data::parse_u32, ObjectProperties, PropertyChange, PropertyContext,
    PropertyData, Qualifier,
};
use crate::error::EngineResult;
use crate::graph::AudioObject;
use crate::selectors::{boxes, object, TRANSPORT_VIRTUAL};
use crate::types::PropertyAddress;

pub(super) struct BoxObject<'a> {
    pub object: &'a AudioObject,
}

const PROPERTIES: &[u32] = &[
    object::BASE_CLASS,
    object::CLASS,
    object::OWNER,
    object::OWNED_OBJECTS,
    object::NAME,
    object::MODEL_NAME,
    object::MANUFACTURER,
    object::IDENTIFY,
    object::SERIAL_NUMBER,
    object::FIRMWARE_VERSION,
    boxes::BOX_UID,
    boxes::TRANSPORT_TYPE,
    boxes::HAS_AUDIO,
    boxes::HAS_VIDEO,
    boxes::HAS_MIDI,
    boxes::IS_PROTECTED,
    boxes::ACQUIRED,
    boxes::ACQUISITION_FAILED,
    boxes::DEVICE_LIST,
    boxes::CLOCK_DEVICE_LIST,
];

const SETTABLE: &[u32] = &[boxes::ACQUIRED];

impl ObjectProperties for BoxObject<'_> {
    fn object(&self) -> &AudioObject {
        self.object
    }

    fn properties(&self) -> &'static [u32] {
        PROPERTIES
    }

    fn settable(&self) -> &'static [u32] {
        SETTABLE
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
            object::NAME | object::MODEL_NAME => PropertyData::text(ctx.config.name),
            object::MANUFACTURER => PropertyData::text(ctx.config.manufacturer),
            object::IDENTIFY => PropertyData::bool(false),
            object::SERIAL_NUMBER => PropertyData::text(""),
            object::FIRMWARE_VERSION => PropertyData::text(env!("CARGO_PKG_VERSION")),
            boxes::BOX_UID => PropertyData::text(ctx.config.box_uid),
            boxes::TRANSPORT_TYPE => PropertyData::U32(TRANSPORT_VIRTUAL),
            boxes::HAS_AUDIO => PropertyData::bool(true),
            boxes::HAS_VIDEO | boxes::HAS_MIDI | boxes::IS_PROTECTED => PropertyData::bool(false),
            boxes::ACQUIRED => PropertyData::bool(ctx.plane().box_acquired),
            boxes::ACQUISITION_FAILED => PropertyData::bool(false),
            boxes::DEVICE_LIST => {
                let devices = if ctx.plane().box_acquired {
                    live_devices(ctx)
                } else {
                    Vec::new()
                };
                PropertyData::ObjectList(devices)
            }
            boxes::CLOCK_DEVICE_LIST => PropertyData::ObjectList(Vec::new()),
            _ => return Err(self.unsupported(address)),
        };
        Ok(data)
    }

    fn set_data(
        &self,
        ctx: &mut PropertyContext<'_, '_>,
        address: &PropertyAddress,
        _qualifier: Qualifier<'_>,
        bytes: &[u8],
    ) -> EngineResult<Vec<PropertyChange>> {
        match address.selector {
            boxes::ACQUIRED => {
                let acquired = parse_u32(bytes)? != 0;
                let plane = ctx.plane_mut();
                if plane.box_acquired == acquired {
                    return Ok(Vec::new());
                }
                plane.box_acquired = acquired;
                let id = self.object.id;
                Ok(vec![
                    PropertyChange::new(id, PropertyAddress::global(boxes::ACQUIRED)),
                    PropertyChange::new(id, PropertyAddress::global(boxes::DEVICE_LIST)),
                ])
            }
            _ => {
                self.require(address)?;
                Err(self.not_settable(address))
            }
        }
    }
}
