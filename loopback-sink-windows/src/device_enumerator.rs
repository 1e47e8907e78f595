//! Render endpoint discovery and loopback activation via the MMDevice API.

use windows::core::HSTRING;
use windows::Win32::System::Com::StructuredStorage::PROPVARIANT;
use windows::Win32::Devices::FunctionDiscovery::{
    PKEY_DeviceInterface_FriendlyName, PKEY_Device_DeviceDesc, PKEY_Device_FriendlyName,
};
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::*;
use windows::Win32::UI::Shell::PropertiesSystem::IPropertyStore;

use loopback_sink_core::models::sink::DeviceProperties;
use loopback_sink_core::traits::audio_backend::AudioBackend;
use loopback_sink_core::traits::loopback_stream::LoopbackStream;
use loopback_sink_core::{PlatformError, WaveFormat};

use crate::com::{platform_error, CoTaskMem, ComGuard};
use crate::wasapi_loopback::WasapiLoopbackStream;
use crate::wave_format;

/// Shared-mode loopback with the engine converting to the requested format.
const LOOPBACK_STREAM_FLAGS: u32 = AUDCLNT_STREAMFLAGS_LOOPBACK
    | AUDCLNT_STREAMFLAGS_EVENTCALLBACK
    | AUDCLNT_STREAMFLAGS_AUTOCONVERTPCM
    | AUDCLNT_STREAMFLAGS_SRC_DEFAULT_QUALITY;

/// `AudioBackend` over `IMMDeviceEnumerator`.
pub struct WasapiBackend {
    enumerator: IMMDeviceEnumerator,
    _com: ComGuard,
}

impl WasapiBackend {
    /// Initialize COM for the calling thread and create the enumerator.
    pub fn new() -> Result<Self, PlatformError> {
        let com = ComGuard::new();
        let enumerator: IMMDeviceEnumerator = unsafe { CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL) }
            .map_err(|e| platform_error(e, "CoCreateInstance(MMDeviceEnumerator)"))?;

        Ok(Self { enumerator, _com: com })
    }

    fn device(&self, device_id: &str) -> Result<IMMDevice, PlatformError> {
        unsafe {
            self.enumerator
                .GetDevice(&HSTRING::from(device_id))
                .map_err(|e| platform_error(e, "GetDevice"))
        }
    }
}

impl AudioBackend for WasapiBackend {
    fn default_render_device(&self) -> Result<String, PlatformError> {
        let device = unsafe { self.enumerator.GetDefaultAudioEndpoint(eRender, eConsole) }
            .map_err(|e| platform_error(e, "GetDefaultAudioEndpoint"))?;
        device_id(&device)
    }

    fn render_devices(&self) -> Result<Vec<String>, PlatformError> {
        unsafe {
            let collection = self
                .enumerator
                .EnumAudioEndpoints(eRender, DEVICE_STATE_ACTIVE)
                .map_err(|e| platform_error(e, "EnumAudioEndpoints"))?;

            let count = collection
                .GetCount()
                .map_err(|e| platform_error(e, "GetCount"))?;

            let mut ids = Vec::with_capacity(count as usize);
            for i in 0..count {
                let device = collection
                    .Item(i)
                    .map_err(|e| platform_error(e, "Item"))?;
                ids.push(device_id(&device)?);
            }

            Ok(ids)
        }
    }

    fn device_properties(&self, device_id: &str) -> DeviceProperties {
        let store = self.device(device_id).and_then(|device| unsafe {
            device
                .OpenPropertyStore(STGM_READ)
                .map_err(|e| platform_error(e, "OpenPropertyStore"))
        });
        let store: IPropertyStore = match store {
            Ok(store) => store,
            Err(e) => {
                log::debug!("Couldn't open properties of [{}]: {}", device_id, e);
                return DeviceProperties::default();
            }
        };

        unsafe {
            DeviceProperties {
                friendly_name: property_string(store.GetValue(&PKEY_Device_FriendlyName)),
                adapter_name: property_string(store.GetValue(&PKEY_DeviceInterface_FriendlyName)),
                description: property_string(store.GetValue(&PKEY_Device_DeviceDesc)),
            }
        }
    }

    fn activate_loopback(
        &self,
        device_id: &str,
        format: &WaveFormat,
    ) -> Result<Box<dyn LoopbackStream>, PlatformError> {
        let device = self.device(device_id)?;
        let client: IAudioClient =
            unsafe { device.Activate(CLSCTX_ALL, None) }.map_err(|e| platform_error(e, "Activate"))?;

        let raw = wave_format::to_raw(format);
        unsafe {
            client
                .Initialize(
                    AUDCLNT_SHAREMODE_SHARED,
                    LOOPBACK_STREAM_FLAGS,
                    0,
                    0,
                    std::ptr::addr_of!(raw).cast::<WAVEFORMATEX>(),
                    None,
                )
                .map_err(|e| platform_error(e, "Initialize"))?;
        }

        Ok(Box::new(WasapiLoopbackStream::new(client, format.channels)))
    }
}

fn device_id(device: &IMMDevice) -> Result<String, PlatformError> {
    unsafe {
        let id = device.GetId().map_err(|e| platform_error(e, "GetId"))?;
        let _owned = CoTaskMem::from_raw(id.0);
        Ok(String::from_utf16_lossy(id.as_wide()))
    }
}

fn property_string(value: windows::core::Result<PROPVARIANT>) -> Option<String> {
    let text = value.ok()?.to_string();
    (!text.is_empty()).then_some(text)
}
