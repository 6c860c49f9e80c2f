//! Stream object properties.

use super::{
    common_data, data::parse_u32, ObjectProperties, PropertyChange, PropertyContext,
    PropertyData, Qualifier,
};
use crate::error::{EngineError, EngineResult};
use crate::format::{RangedFormat, StreamFormat, ValueRange};
use crate::graph::{AudioObject, DeviceSlot};
use crate::selectors::{object, stream};
use crate::types::{Direction, PropertyAddress};

pub(super) struct StreamObject<'a> {
    pub object: &'a AudioObject,
    pub slot: DeviceSlot,
    pub direction: Direction,
}

const PROPERTIES: &[u32] = &[
    object::BASE_CLASS,
    object::CLASS,
    object::OWNER,
    object::OWNED_OBJECTS,
    stream::IS_ACTIVE,
    stream::DIRECTION,
    stream::TERMINAL_TYPE,
    stream::STARTING_CHANNEL,
    stream::LATENCY,
    stream::VIRTUAL_FORMAT,
    stream::PHYSICAL_FORMAT,
    stream::AVAILABLE_VIRTUAL_FORMATS,
    stream::AVAILABLE_PHYSICAL_FORMATS,
];

const SETTABLE: &[u32] = &[
    stream::IS_ACTIVE,
    stream::VIRTUAL_FORMAT,
    stream::PHYSICAL_FORMAT,
];

impl ObjectProperties for StreamObject<'_> {
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

        let channels = ctx.config.channel_count;
        let data = match address.selector {
            stream::IS_ACTIVE => {
                PropertyData::bool(ctx.plane().stream_active(self.slot, self.direction))
            }
            stream::DIRECTION => PropertyData::U32(self.direction.as_u32()),
            stream::TERMINAL_TYPE => PropertyData::U32(match self.direction {
                Direction::Input => stream::TERMINAL_MICROPHONE,
                Direction::Output => stream::TERMINAL_SPEAKER,
            }),
            stream::STARTING_CHANNEL => PropertyData::U32(1),
            stream::LATENCY => PropertyData::U32(ctx.config.latency_frames),
            stream::VIRTUAL_FORMAT | stream::PHYSICAL_FORMAT => PropertyData::StreamFormat(
                StreamFormat::float32(ctx.plane().sample_rate, channels),
            ),
            stream::AVAILABLE_VIRTUAL_FORMATS | stream::AVAILABLE_PHYSICAL_FORMATS => {
                PropertyData::RangedFormats(
                    ctx.config
                        .sample_rates
                        .iter()
                        .map(|&rate| RangedFormat {
                            format: StreamFormat::float32(rate, channels),
                            rate_range: ValueRange::point(rate),
                        })
                        .collect(),
                )
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
        match address.selector {
            stream::IS_ACTIVE => {
                let active = parse_u32(bytes)? != 0;
                let plane = ctx.plane_mut();
                if plane.stream_active(self.slot, self.direction) == active {
                    return Ok(Vec::new());
                }
                plane.set_stream_active(self.slot, self.direction, active);
                Ok(vec![PropertyChange::new(
                    self.object.id,
                    PropertyAddress::global(stream::IS_ACTIVE),
                )])
            }
            stream::VIRTUAL_FORMAT | stream::PHYSICAL_FORMAT => {
                ctx.require_idle()?;
                let format = StreamFormat::from_bytes(bytes)?;
                format.check_layout(ctx.config.channel_count)?;
                if !ctx.config.supports_sample_rate(format.sample_rate) {
                    return Err(EngineError::InvalidValue("unsupported sample rate"));
                }
                ctx.set_sample_rate(format.sample_rate)
            }
            _ => {
                self.require(address)?;
                Err(self.not_settable(address))
            }
        }
    }
}
