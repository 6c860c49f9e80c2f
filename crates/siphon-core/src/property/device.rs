//! Device object properties.

use super::{
    common_data, data::parse_f64, ObjectProperties, PropertyChange, PropertyContext,
    PropertyData, Qualifier,
};
use crate::config::{DeviceConfig, DriverConfig};
use crate::error::{EngineError, EngineResult};
use crate::format::{ChannelLayout, ValueRange};
use crate::graph::{AudioObject, DeviceSlot};
use crate::selectors::{device, object, ELEMENT_MAIN, TRANSPORT_VIRTUAL};
use crate::types::{Direction, PropertyAddress};

pub(super) struct DeviceObject<'a> {
    pub object: &'a AudioObject,
    pub slot: DeviceSlot,
}

/// Configuration of the device in `slot`.
///
/// A mirror node only exists in the graph when a mirror is configured, so
/// falling back to the primary is unreachable for live objects.
pub(crate) fn device_config(config: &DriverConfig, slot: DeviceSlot) -> &DeviceConfig {
    match slot {
        DeviceSlot::Primary => &config.primary,
        DeviceSlot::Mirror => config.mirror.as_ref().unwrap_or(&config.primary),
    }
}

const PROPERTIES: &[u32] = &[
    object::BASE_CLASS,
    object::CLASS,
    object::OWNER,
    object::OWNED_OBJECTS,
    object::NAME,
    object::MANUFACTURER,
    object::ELEMENT_NAME,
    object::CONTROL_LIST,
    device::DEVICE_UID,
    device::MODEL_UID,
    device::TRANSPORT_TYPE,
    device::RELATED_DEVICES,
    device::CLOCK_DOMAIN,
    device::IS_ALIVE,
    device::IS_RUNNING,
    device::CAN_BE_DEFAULT_DEVICE,
    device::CAN_BE_DEFAULT_SYSTEM_DEVICE,
    device::LATENCY,
    device::STREAMS,
    device::SAFETY_OFFSET,
    device::NOMINAL_SAMPLE_RATE,
    device::AVAILABLE_NOMINAL_SAMPLE_RATES,
    device::IS_HIDDEN,
    device::PREFERRED_CHANNELS_FOR_STEREO,
    device::PREFERRED_CHANNEL_LAYOUT,
    device::ZERO_TIMESTAMP_PERIOD,
];

const SETTABLE: &[u32] = &[device::NOMINAL_SAMPLE_RATE];

impl DeviceObject<'_> {
    /// Default-device eligibility in the address's scope.
    fn can_be_default(config: &DeviceConfig, flag: bool, scope: Option<Direction>) -> bool {
        if config.is_hidden || !flag {
            return false;
        }
        match scope {
            Some(Direction::Input) => config.has_input,
            Some(Direction::Output) => config.has_output,
            None => true,
        }
    }
}

impl ObjectProperties for DeviceObject<'_> {
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

        let id = self.object.id;
        let config = device_config(ctx.config, self.slot);
        let scope = address.direction();
        let data = match address.selector {
            object::NAME => PropertyData::text(config.name),
            object::MANUFACTURER => PropertyData::text(ctx.config.manufacturer),
            object::ELEMENT_NAME => match address.element {
                ELEMENT_MAIN => PropertyData::text(config.name),
                channel if channel <= ctx.config.channel_count => {
                    PropertyData::text(format!("Channel {}", channel))
                }
                _ => return Err(EngineError::InvalidValue("no such channel element")),
            },
            object::CONTROL_LIST => PropertyData::ObjectList(ctx.graph.device_controls(id, None)?),
            device::DEVICE_UID => PropertyData::text(config.uid),
            device::MODEL_UID => PropertyData::text(ctx.config.model_uid),
            device::TRANSPORT_TYPE => PropertyData::U32(TRANSPORT_VIRTUAL),
            device::RELATED_DEVICES => PropertyData::ObjectList(vec![id]),
            device::CLOCK_DOMAIN => PropertyData::U32(0),
            device::IS_ALIVE => PropertyData::bool(ctx.plane().device(self.slot).is_created()),
            device::IS_RUNNING => {
                PropertyData::bool(ctx.plane().device(self.slot).running > 0)
            }
            device::CAN_BE_DEFAULT_DEVICE => {
                PropertyData::bool(Self::can_be_default(config, config.can_be_default, scope))
            }
            device::CAN_BE_DEFAULT_SYSTEM_DEVICE => PropertyData::bool(Self::can_be_default(
                config,
                config.can_be_default_system,
                scope,
            )),
            device::LATENCY => PropertyData::U32(ctx.config.latency_frames),
            device::STREAMS => PropertyData::ObjectList(ctx.graph.device_streams(id, scope)?),
            device::SAFETY_OFFSET => PropertyData::U32(ctx.config.safety_offset_frames),
            device::NOMINAL_SAMPLE_RATE => PropertyData::F64(ctx.plane().sample_rate),
            device::AVAILABLE_NOMINAL_SAMPLE_RATES => PropertyData::ValueRanges(
                ctx.config
                    .sample_rates
                    .iter()
                    .map(|&rate| ValueRange::point(rate))
                    .collect(),
            ),
            device::IS_HIDDEN => PropertyData::bool(config.is_hidden),
            device::PREFERRED_CHANNELS_FOR_STEREO => PropertyData::U32List(vec![1, 2]),
            device::PREFERRED_CHANNEL_LAYOUT => {
                PropertyData::ChannelLayout(ChannelLayout::for_channels(ctx.config.channel_count))
            }
            device::ZERO_TIMESTAMP_PERIOD => PropertyData::U32(ctx.config.zero_timestamp_period),
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
            device::NOMINAL_SAMPLE_RATE => {
                let rate = parse_f64(bytes)?;
                ctx.set_sample_rate(rate)
            }
            _ => {
                self.require(address)?;
                Err(self.not_settable(address))
            }
        }
    }
}
