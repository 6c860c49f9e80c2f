//! Control object properties: volume (level), mute (boolean), pitch (stereo
//! pan) and clock source (selector).

use super::{
    common_data,
    data::{parse_f32, parse_u32},
    ObjectProperties, PropertyChange, PropertyContext, PropertyData, Qualifier,
};
use crate::control::{
    decibels_to_scalar, scalar_to_decibels, CLOCK_SOURCE_ITEMS, MAX_DB, MIN_DB,
};
use crate::error::{EngineError, EngineResult};
use crate::format::ValueRange;
use crate::graph::{AudioObject, DeviceSlot};
use crate::selectors::{control, object, scope, ELEMENT_MAIN};
use crate::types::{Direction, PropertyAddress};

/// Data shared by every control kind, or `None` for other selectors.
fn control_common(
    ctx: &PropertyContext<'_, '_>,
    object: &AudioObject,
    control_scope: u32,
    address: &PropertyAddress,
    qualifier: Qualifier<'_>,
) -> Option<PropertyData> {
    if let Some(data) = common_data(ctx.graph, object, address.selector, qualifier) {
        return Some(data);
    }
    match address.selector {
        control::SCOPE => Some(PropertyData::U32(control_scope)),
        control::ELEMENT => Some(PropertyData::U32(ELEMENT_MAIN)),
        _ => None,
    }
}

fn changes(id: u32, selectors: &[u32]) -> Vec<PropertyChange> {
    selectors
        .iter()
        .map(|&selector| PropertyChange::new(id, PropertyAddress::global(selector)))
        .collect()
}

// =============================================================================
// Volume
// =============================================================================

pub(super) struct LevelControl<'a> {
    pub object: &'a AudioObject,
    pub slot: DeviceSlot,
    pub direction: Direction,
}

const LEVEL_PROPERTIES: &[u32] = &[
    object::BASE_CLASS,
    object::CLASS,
    object::OWNER,
    object::OWNED_OBJECTS,
    control::SCOPE,
    control::ELEMENT,
    control::SCALAR_VALUE,
    control::DECIBEL_VALUE,
    control::DECIBEL_RANGE,
    control::CONVERT_SCALAR_TO_DECIBELS,
    control::CONVERT_DECIBELS_TO_SCALAR,
];

const LEVEL_SETTABLE: &[u32] = &[control::SCALAR_VALUE, control::DECIBEL_VALUE];

fn conversion_input(qualifier: Qualifier<'_>) -> EngineResult<f32> {
    match qualifier {
        Qualifier::Value(value) => Ok(value),
        _ => Err(EngineError::IllegalOperation("conversion needs an input value")),
    }
}

impl ObjectProperties for LevelControl<'_> {
    fn object(&self) -> &AudioObject {
        self.object
    }

    fn properties(&self) -> &'static [u32] {
        LEVEL_PROPERTIES
    }

    fn settable(&self) -> &'static [u32] {
        LEVEL_SETTABLE
    }

    fn data(
        &self,
        ctx: &PropertyContext<'_, '_>,
        address: &PropertyAddress,
        qualifier: Qualifier<'_>,
    ) -> EngineResult<PropertyData> {
        let scope = self.direction.scope();
        if let Some(data) = control_common(ctx, self.object, scope, address, qualifier) {
            return Ok(data);
        }
        let volume = ctx.device_controls(self.slot).stream(self.direction);
        let data = match address.selector {
            control::SCALAR_VALUE => PropertyData::F32(volume.scalar()),
            control::DECIBEL_VALUE => PropertyData::F32(volume.decibels()),
            control::DECIBEL_RANGE => {
                PropertyData::ValueRange(ValueRange::new(f64::from(MIN_DB), f64::from(MAX_DB)))
            }
            control::CONVERT_SCALAR_TO_DECIBELS => {
                PropertyData::F32(scalar_to_decibels(conversion_input(qualifier)?))
            }
            control::CONVERT_DECIBELS_TO_SCALAR => {
                PropertyData::F32(decibels_to_scalar(conversion_input(qualifier)?))
            }
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
        let volume = ctx.device_controls(self.slot).stream(self.direction);
        let changed = match address.selector {
            control::SCALAR_VALUE => volume.set_scalar(parse_f32(bytes)?)?,
            control::DECIBEL_VALUE => volume.set_decibels(parse_f32(bytes)?)?,
            _ => {
                self.require(address)?;
                return Err(self.not_settable(address));
            }
        };
        Ok(if changed {
            changes(
                self.object.id,
                &[control::SCALAR_VALUE, control::DECIBEL_VALUE],
            )
        } else {
            Vec::new()
        })
    }
}

// =============================================================================
// Mute
// =============================================================================

pub(super) struct BooleanControl<'a> {
    pub object: &'a AudioObject,
    pub slot: DeviceSlot,
    pub direction: Direction,
}

const BOOLEAN_PROPERTIES: &[u32] = &[
    object::BASE_CLASS,
    object::CLASS,
    object::OWNER,
    object::OWNED_OBJECTS,
    control::SCOPE,
    control::ELEMENT,
    control::BOOLEAN_VALUE,
];

const BOOLEAN_SETTABLE: &[u32] = &[control::BOOLEAN_VALUE];

impl ObjectProperties for BooleanControl<'_> {
    fn object(&self) -> &AudioObject {
        self.object
    }

    fn properties(&self) -> &'static [u32] {
        BOOLEAN_PROPERTIES
    }

    fn settable(&self) -> &'static [u32] {
        BOOLEAN_SETTABLE
    }

    fn data(
        &self,
        ctx: &PropertyContext<'_, '_>,
        address: &PropertyAddress,
        qualifier: Qualifier<'_>,
    ) -> EngineResult<PropertyData> {
        let scope = self.direction.scope();
        if let Some(data) = control_common(ctx, self.object, scope, address, qualifier) {
            return Ok(data);
        }
        match address.selector {
            control::BOOLEAN_VALUE => Ok(PropertyData::bool(
                ctx.device_controls(self.slot)
                    .stream(self.direction)
                    .is_muted(),
            )),
            _ => Err(self.unsupported(address)),
        }
    }

    fn set_data(
        &self,
        ctx: &mut PropertyContext<'_, '_>,
        address: &PropertyAddress,
        _qualifier: Qualifier<'_>,
        bytes: &[u8],
    ) -> EngineResult<Vec<PropertyChange>> {
        if address.selector != control::BOOLEAN_VALUE {
            self.require(address)?;
            return Err(self.not_settable(address));
        }
        let muted = parse_u32(bytes)? != 0;
        let changed = ctx
            .device_controls(self.slot)
            .stream(self.direction)
            .set_muted(muted);
        Ok(if changed {
            changes(self.object.id, &[control::BOOLEAN_VALUE])
        } else {
            Vec::new()
        })
    }
}

// =============================================================================
// Pitch
// =============================================================================

pub(super) struct PanControl<'a> {
    pub object: &'a AudioObject,
    pub slot: DeviceSlot,
}

const PAN_PROPERTIES: &[u32] = &[
    object::BASE_CLASS,
    object::CLASS,
    object::OWNER,
    object::OWNED_OBJECTS,
    control::SCOPE,
    control::ELEMENT,
    control::PAN_VALUE,
    control::PAN_CHANNELS,
];

const PAN_SETTABLE: &[u32] = &[control::PAN_VALUE];

impl ObjectProperties for PanControl<'_> {
    fn object(&self) -> &AudioObject {
        self.object
    }

    fn properties(&self) -> &'static [u32] {
        PAN_PROPERTIES
    }

    fn settable(&self) -> &'static [u32] {
        PAN_SETTABLE
    }

    fn data(
        &self,
        ctx: &PropertyContext<'_, '_>,
        address: &PropertyAddress,
        qualifier: Qualifier<'_>,
    ) -> EngineResult<PropertyData> {
        if let Some(data) = control_common(ctx, self.object, scope::GLOBAL, address, qualifier) {
            return Ok(data);
        }
        match address.selector {
            control::PAN_VALUE => Ok(PropertyData::F32(ctx.device_controls(self.slot).pitch())),
            control::PAN_CHANNELS => Ok(PropertyData::U32List(vec![1, 2])),
            _ => Err(self.unsupported(address)),
        }
    }

    fn set_data(
        &self,
        ctx: &mut PropertyContext<'_, '_>,
        address: &PropertyAddress,
        _qualifier: Qualifier<'_>,
        bytes: &[u8],
    ) -> EngineResult<Vec<PropertyChange>> {
        if address.selector != control::PAN_VALUE {
            self.require(address)?;
            return Err(self.not_settable(address));
        }
        let pitch = parse_f32(bytes)?;
        if !ctx.device_controls(self.slot).set_pitch(pitch)? {
            return Ok(Vec::new());
        }
        ctx.retime(self.slot);
        Ok(changes(self.object.id, &[control::PAN_VALUE]))
    }
}

// =============================================================================
// Clock source
// =============================================================================

pub(super) struct SelectorControl<'a> {
    pub object: &'a AudioObject,
    pub slot: DeviceSlot,
}

const SELECTOR_PROPERTIES: &[u32] = &[
    object::BASE_CLASS,
    object::CLASS,
    object::OWNER,
    object::OWNED_OBJECTS,
    control::SCOPE,
    control::ELEMENT,
    control::CURRENT_ITEM,
    control::AVAILABLE_ITEMS,
    control::ITEM_NAME,
];

const SELECTOR_SETTABLE: &[u32] = &[control::CURRENT_ITEM];

impl ObjectProperties for SelectorControl<'_> {
    fn object(&self) -> &AudioObject {
        self.object
    }

    fn properties(&self) -> &'static [u32] {
        SELECTOR_PROPERTIES
    }

    fn settable(&self) -> &'static [u32] {
        SELECTOR_SETTABLE
    }

    fn data(
        &self,
        ctx: &PropertyContext<'_, '_>,
        address: &PropertyAddress,
        qualifier: Qualifier<'_>,
    ) -> EngineResult<PropertyData> {
        if let Some(data) = control_common(ctx, self.object, scope::GLOBAL, address, qualifier) {
            return Ok(data);
        }
        match address.selector {
            control::CURRENT_ITEM => Ok(PropertyData::U32List(vec![ctx
                .device_controls(self.slot)
                .clock_source()])),
            control::AVAILABLE_ITEMS => Ok(PropertyData::U32List(
                (0..CLOCK_SOURCE_ITEMS.len() as u32).collect(),
            )),
            control::ITEM_NAME => match qualifier {
                Qualifier::Item(item) => CLOCK_SOURCE_ITEMS
                    .get(item as usize)
                    .map(|&name| PropertyData::text(name))
                    .ok_or(EngineError::InvalidValue("unknown clock source item")),
                _ => Err(EngineError::IllegalOperation("item qualifier required")),
            },
            _ => Err(self.unsupported(address)),
        }
    }

    fn set_data(
        &self,
        ctx: &mut PropertyContext<'_, '_>,
        address: &PropertyAddress,
        _qualifier: Qualifier<'_>,
        bytes: &[u8],
    ) -> EngineResult<Vec<PropertyChange>> {
        if address.selector != control::CURRENT_ITEM {
            self.require(address)?;
            return Err(self.not_settable(address));
        }
        let item = parse_u32(bytes)?;
        if !ctx.device_controls(self.slot).set_clock_source(item)? {
            return Ok(Vec::new());
        }
        Ok(changes(self.object.id, &[control::CURRENT_ITEM]))
    }
}
