//! Sink discovery and default-device switching.

use crate::models::config::AudioConfig;
use crate::models::error::NegotiationError;
use crate::models::format::{self, FormatTag};
use crate::models::sink::{DeviceDescriptor, DeviceRole, NullSinks, SinkDescriptor};
use crate::processing::sink_id;
use crate::session::capture;
use crate::traits::audio_backend::AudioBackend;
use crate::traits::endpoint_policy::EndpointPolicy;

/// Describe the current sink: the default render device, plus the virtual
/// streaming sink's identifiers when one is configured or detected.
///
/// Devices that accept none of the catalog formats are ignored entirely,
/// including for virtual-sink detection.
pub fn current_sink(backend: &dyn AudioBackend, config: &AudioConfig) -> Result<SinkDescriptor, NegotiationError> {
    let host = backend.default_render_device().map_err(|e| {
        log::error!("Couldn't create audio Device {}", e);
        NegotiationError::DeviceNotAvailable(e)
    })?;

    let device_ids = backend.render_devices().map_err(|e| {
        log::error!("Couldn't enumerate {}", e);
        NegotiationError::Enumeration(e)
    })?;

    let mut virtual_sink = config.virtual_sink.clone();
    for device in usable_devices(backend, device_ids) {
        if virtual_sink.is_none() && device.adapter_name == config.virtual_adapter_name {
            virtual_sink = Some(device.id);
        }
    }

    Ok(SinkDescriptor {
        host,
        null_sinks: virtual_sink.map(|id| NullSinks {
            stereo: sink_id::encode(Some(FormatTag::Stereo), &id),
            surround51: sink_id::encode(Some(FormatTag::Surr51), &id),
            surround71: sink_id::encode(Some(FormatTag::Surr71), &id),
        }),
    })
}

fn usable_devices(backend: &dyn AudioBackend, device_ids: Vec<String>) -> Vec<DeviceDescriptor> {
    device_ids
        .into_iter()
        .filter(|id| capture::validate(backend, id))
        .map(|id| {
            let properties = backend.device_properties(&id);
            let device = DeviceDescriptor::from_properties(id, properties);
            log::trace!(
                "===== Device =====\nDevice ID          : {}\nDevice name        : {}\nAdapter name       : {}\nDevice description : {}\n",
                device.id,
                device.friendly_name,
                device.adapter_name,
                device.description
            );
            device
        })
        .collect()
}

/// Apply the channel layout requested by a sink string, if any.
///
/// Returns the device id the sink refers to. A plain device id is passed
/// through without touching the device.
pub fn apply_format(policy: &dyn EndpointPolicy, sink: &str) -> Result<String, NegotiationError> {
    let decoded = sink_id::decode(sink);
    let Some(tag) = decoded.format else {
        return Ok(decoded.device_id);
    };
    let device_id = decoded.device_id;

    let mut wave_format = policy.mix_format(&device_id).map_err(|e| {
        log::error!("Couldn't acquire Wave Format {}", e);
        NegotiationError::MixFormat(e)
    })?;

    wave_format.overlay(tag.descriptor())?;
    let mut status = policy.set_device_format(&device_id, &wave_format);

    // Some drivers only expose 5.1 with side speakers instead of back
    // speakers; they reject the back-speaker mask with this status.
    if tag == FormatTag::Surr51 && matches!(&status, Err(e) if e.is_unsupported_format()) {
        log::debug!("Retrying [{}] with side speakers", tag.name());
        wave_format.overlay(format::side_speaker_variant())?;
        status = policy.set_device_format(&device_id, &wave_format);
    }

    status.map_err(|e| {
        log::error!("Couldn't set Wave Format {}", e);
        NegotiationError::SetFormat(e)
    })?;

    Ok(device_id)
}

/// Apply the sink's format and make its device the default for every role.
///
/// Returns how many roles could not be switched; 0 means full success.
pub fn set_active_sink(policy: &dyn EndpointPolicy, sink: &str) -> Result<usize, NegotiationError> {
    let device_id = apply_format(policy, sink)?;

    let mut failures = 0;
    for role in DeviceRole::ALL {
        if let Err(e) = policy.set_default_endpoint(&device_id, role) {
            log::warn!("Couldn't set [{}] to role [{}]: {}", sink, role.index(), e);
            failures += 1;
        }
    }

    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{float_stereo_mix_format, MockBackend, MockDevice, MockPolicy, PolicyCall};
    use crate::models::error::{PlatformError, AUDCLNT_E_UNSUPPORTED_FORMAT};
    use crate::models::sink::UNKNOWN_PROPERTY;

    const STEAM: &str = "Steam Streaming Speakers";

    fn stereo_mask() -> u32 {
        FormatTag::Stereo.descriptor().channel_mask
    }

    fn surround51_mask() -> u32 {
        FormatTag::Surr51.descriptor().channel_mask
    }

    #[test]
    fn detects_virtual_sink_by_adapter_name() {
        let backend = MockBackend::new(
            "HOST",
            vec![
                MockDevice::new("HOST", "Realtek Audio", vec![stereo_mask()]),
                MockDevice::new("STEAM", STEAM, vec![stereo_mask(), surround51_mask()]),
            ],
        );

        let sink = current_sink(&backend, &AudioConfig::default()).unwrap();
        assert_eq!(sink.host, "HOST");
        assert_eq!(
            sink.null_sinks,
            Some(NullSinks {
                stereo: "virtual-StereoSTEAM".into(),
                surround51: "virtual-Surround 5.1STEAM".into(),
                surround71: "virtual-Surround 7.1STEAM".into(),
            })
        );
    }

    #[test]
    fn non_validating_device_is_excluded() {
        let backend = MockBackend::new(
            "HOST",
            vec![
                MockDevice::new("HOST", "Realtek Audio", vec![stereo_mask()]),
                MockDevice::new("STEAM", STEAM, vec![]),
            ],
        );

        let sink = current_sink(&backend, &AudioConfig::default()).unwrap();
        assert_eq!(sink.host, "HOST");
        assert!(sink.null_sinks.is_none());
    }

    #[test]
    fn configured_virtual_sink_takes_precedence() {
        let backend = MockBackend::new(
            "HOST",
            vec![
                MockDevice::new("HOST", "Realtek Audio", vec![stereo_mask()]),
                MockDevice::new("STEAM", STEAM, vec![stereo_mask()]),
            ],
        );
        let config = AudioConfig {
            virtual_sink: Some("CONFIGURED".into()),
            ..AudioConfig::default()
        };

        let sink = current_sink(&backend, &config).unwrap();
        assert_eq!(sink.null_sinks.unwrap().stereo, "virtual-StereoCONFIGURED");
    }

    #[test]
    fn configured_virtual_sink_without_devices() {
        let backend = MockBackend::new("HOST", vec![]);
        let config = AudioConfig {
            virtual_sink: Some("CONFIGURED".into()),
            ..AudioConfig::default()
        };

        let sink = current_sink(&backend, &config).unwrap();
        assert!(sink.null_sinks.is_some());
    }

    #[test]
    fn first_matching_adapter_wins() {
        let backend = MockBackend::new(
            "HOST",
            vec![
                MockDevice::new("STEAM-A", STEAM, vec![stereo_mask()]),
                MockDevice::new("STEAM-B", STEAM, vec![stereo_mask()]),
            ],
        );

        let sink = current_sink(&backend, &AudioConfig::default()).unwrap();
        assert_eq!(sink.null_sinks.unwrap().surround71, "virtual-Surround 7.1STEAM-A");
    }

    #[test]
    fn missing_adapter_property_never_matches() {
        let mut device = MockDevice::new("DEV", STEAM, vec![stereo_mask()]);
        device.properties.adapter_name = None;
        let backend = MockBackend::new("HOST", vec![device]);

        let sink = current_sink(&backend, &AudioConfig::default()).unwrap();
        assert!(sink.null_sinks.is_none());

        let usable = usable_devices(&backend, vec!["DEV".into()]);
        assert_eq!(usable[0].adapter_name, UNKNOWN_PROPERTY);
    }

    #[test]
    fn enumeration_failures_are_reported() {
        let mut backend = MockBackend::new("HOST", vec![]);
        backend.enumeration_error = Some(-1);
        assert!(matches!(
            current_sink(&backend, &AudioConfig::default()),
            Err(NegotiationError::Enumeration(_))
        ));

        backend.default_device = None;
        assert!(matches!(
            current_sink(&backend, &AudioConfig::default()),
            Err(NegotiationError::DeviceNotAvailable(_))
        ));
    }

    #[test]
    fn plain_sink_does_not_touch_format() {
        let policy = MockPolicy::default();

        assert_eq!(apply_format(&policy, "DEVICE123").unwrap(), "DEVICE123");
        assert!(policy.calls().is_empty());
    }

    #[test]
    fn apply_format_sets_stereo() {
        let policy = MockPolicy::with_mix_format("DEVICE123", float_stereo_mix_format());

        let id = apply_format(&policy, "virtual-StereoDEVICE123").unwrap();
        assert_eq!(id, "DEVICE123");

        let calls = policy.calls();
        assert_eq!(calls.len(), 2);
        let PolicyCall::SetDeviceFormat(ref device, wave) = calls[1] else {
            panic!("expected SetDeviceFormat, got {:?}", calls[1]);
        };
        assert_eq!(device, "DEVICE123");
        assert_eq!(wave.channels, 2);
        assert_eq!(wave.bits_per_sample, 16);
        assert_eq!(wave.samples_per_sec, 48_000);
        assert_eq!(wave.channel_mask(), Some(stereo_mask()));
    }

    #[test]
    fn surround51_falls_back_to_side_speakers() {
        let mut policy = MockPolicy::with_mix_format("DEVICE123", float_stereo_mix_format());
        policy.rejected_masks = vec![(surround51_mask(), AUDCLNT_E_UNSUPPORTED_FORMAT)];

        let failures = set_active_sink(&policy, "virtual-Surround 5.1DEVICE123").unwrap();
        assert_eq!(failures, 0);

        let masks: Vec<_> = policy
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                PolicyCall::SetDeviceFormat(_, wave) => wave.channel_mask(),
                _ => None,
            })
            .collect();
        assert_eq!(masks, vec![surround51_mask(), format::side_speaker_variant().channel_mask]);
    }

    #[test]
    fn surround51_fallback_failure_is_reported() {
        let mut policy = MockPolicy::with_mix_format("DEVICE123", float_stereo_mix_format());
        policy.rejected_masks = vec![
            (surround51_mask(), AUDCLNT_E_UNSUPPORTED_FORMAT),
            (format::side_speaker_variant().channel_mask, AUDCLNT_E_UNSUPPORTED_FORMAT),
        ];

        let err = set_active_sink(&policy, "virtual-Surround 5.1DEVICE123").unwrap_err();
        assert_eq!(
            err,
            NegotiationError::SetFormat(PlatformError::new(AUDCLNT_E_UNSUPPORTED_FORMAT, "SetDeviceFormat"))
        );
        assert!(!policy
            .calls()
            .iter()
            .any(|call| matches!(call, PolicyCall::SetDefaultEndpoint(..))));
    }

    #[test]
    fn no_fallback_for_other_formats_or_codes() {
        let surround71_mask = FormatTag::Surr71.descriptor().channel_mask;
        let mut policy = MockPolicy::with_mix_format("DEV", float_stereo_mix_format());
        policy.rejected_masks = vec![
            (surround71_mask, AUDCLNT_E_UNSUPPORTED_FORMAT),
            (surround51_mask(), -1),
        ];

        assert!(apply_format(&policy, "virtual-Surround 7.1DEV").is_err());
        assert!(apply_format(&policy, "virtual-Surround 5.1DEV").is_err());

        let set_calls = policy
            .calls()
            .iter()
            .filter(|call| matches!(call, PolicyCall::SetDeviceFormat(..)))
            .count();
        assert_eq!(set_calls, 2);
    }

    #[test]
    fn missing_mix_format_fails() {
        let policy = MockPolicy::default();
        assert!(matches!(
            apply_format(&policy, "virtual-StereoDEV"),
            Err(NegotiationError::MixFormat(_))
        ));
    }

    #[test]
    fn set_active_sink_switches_every_role() {
        let policy = MockPolicy::default();

        assert_eq!(set_active_sink(&policy, "DEV").unwrap(), 0);
        assert_eq!(
            policy.calls(),
            vec![
                PolicyCall::SetDefaultEndpoint("DEV".into(), DeviceRole::Console),
                PolicyCall::SetDefaultEndpoint("DEV".into(), DeviceRole::Multimedia),
                PolicyCall::SetDefaultEndpoint("DEV".into(), DeviceRole::Communications),
            ]
        );
    }

    #[test]
    fn partial_role_failures_are_counted() {
        let policy = MockPolicy {
            failing_roles: vec![DeviceRole::Console, DeviceRole::Communications],
            ..MockPolicy::default()
        };

        assert_eq!(set_active_sink(&policy, "DEV").unwrap(), 2);
        assert_eq!(policy.calls().len(), 3);
    }
}
