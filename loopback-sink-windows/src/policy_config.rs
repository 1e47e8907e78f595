//! Endpoint format and default-device control through `IPolicyConfig`.
//!
//! `IPolicyConfig` is undocumented; it is what the Sound control panel uses
//! to change a device's shared-mode format and the per-role default
//! endpoints. Only the slots we call are given meaningful signatures, but
//! every slot must be declared to keep the vtable order.

#![allow(non_snake_case)]

use std::ffi::c_void;

use windows::core::{interface, IUnknown, IUnknown_Vtbl, GUID, HRESULT, HSTRING, PCWSTR};
use windows::Win32::Foundation::E_POINTER;
use windows::Win32::Media::Audio::{ERole, WAVEFORMATEX, WAVEFORMATEXTENSIBLE};
use windows::Win32::System::Com::{CoCreateInstance, CLSCTX_ALL};

use loopback_sink_core::models::sink::DeviceRole;
use loopback_sink_core::traits::endpoint_policy::EndpointPolicy;
use loopback_sink_core::{PlatformError, WaveFormat};

use crate::com::{platform_error, CoTaskMem, ComGuard};
use crate::wave_format;

const CLSID_CPOLICY_CONFIG_CLIENT: GUID = GUID::from_u128(0x870af99c_171d_4f9e_af0d_e63df40c2bc9);

#[interface("f8679f50-850a-41cf-9c72-430f290290c8")]
unsafe trait IPolicyConfig: IUnknown {
    fn GetMixFormat(&self, device_id: PCWSTR, format: *mut *mut WAVEFORMATEX) -> HRESULT;
    fn GetDeviceFormat(&self, device_id: PCWSTR, default: i32, format: *mut *mut WAVEFORMATEX) -> HRESULT;
    fn ResetDeviceFormat(&self, device_id: PCWSTR) -> HRESULT;
    fn SetDeviceFormat(&self, device_id: PCWSTR, endpoint: *const WAVEFORMATEX, mix: *const WAVEFORMATEX) -> HRESULT;
    fn GetProcessingPeriod(&self, device_id: PCWSTR, default: i32, period: *mut i64, min_period: *mut i64) -> HRESULT;
    fn SetProcessingPeriod(&self, device_id: PCWSTR, period: *const i64) -> HRESULT;
    fn GetShareMode(&self, device_id: PCWSTR, mode: *mut c_void) -> HRESULT;
    fn SetShareMode(&self, device_id: PCWSTR, mode: *const c_void) -> HRESULT;
    fn GetPropertyValue(&self, device_id: PCWSTR, key: *const c_void, value: *mut c_void) -> HRESULT;
    fn SetPropertyValue(&self, device_id: PCWSTR, key: *const c_void, value: *const c_void) -> HRESULT;
    fn SetDefaultEndpoint(&self, device_id: PCWSTR, role: ERole) -> HRESULT;
    fn SetEndpointVisibility(&self, device_id: PCWSTR, visible: i32) -> HRESULT;
}

/// `EndpointPolicy` over the `IPolicyConfig` client object.
pub struct PolicyConfig {
    policy: IPolicyConfig,
    _com: ComGuard,
}

impl PolicyConfig {
    pub fn new() -> Result<Self, PlatformError> {
        let com = ComGuard::new();
        let policy: IPolicyConfig = unsafe { CoCreateInstance(&CLSID_CPOLICY_CONFIG_CLIENT, None, CLSCTX_ALL) }
            .map_err(|e| platform_error(e, "CoCreateInstance(CPolicyConfigClient)"))?;

        Ok(Self { policy, _com: com })
    }
}

impl EndpointPolicy for PolicyConfig {
    fn mix_format(&self, device_id: &str) -> Result<WaveFormat, PlatformError> {
        let device_id = HSTRING::from(device_id);
        let mut format: *mut WAVEFORMATEX = std::ptr::null_mut();
        unsafe {
            self.policy
                .GetMixFormat(PCWSTR(device_id.as_ptr()), &mut format)
                .ok()
                .map_err(|e| platform_error(e, "GetMixFormat"))?;

            let format = CoTaskMem::from_raw(format);
            if format.is_null() {
                return Err(PlatformError::new(E_POINTER.0, "GetMixFormat"));
            }
            Ok(wave_format::from_raw(format.as_ptr()))
        }
    }

    fn set_device_format(&self, device_id: &str, format: &WaveFormat) -> Result<(), PlatformError> {
        let device_id = HSTRING::from(device_id);
        let endpoint = wave_format::to_raw(format);
        // The mix-format slot is left empty.
        let mix = WAVEFORMATEXTENSIBLE::default();
        unsafe {
            self.policy
                .SetDeviceFormat(
                    PCWSTR(device_id.as_ptr()),
                    std::ptr::addr_of!(endpoint).cast(),
                    std::ptr::addr_of!(mix).cast(),
                )
                .ok()
                .map_err(|e| platform_error(e, "SetDeviceFormat"))
        }
    }

    fn set_default_endpoint(&self, device_id: &str, role: DeviceRole) -> Result<(), PlatformError> {
        let device_id = HSTRING::from(device_id);
        unsafe {
            self.policy
                .SetDefaultEndpoint(PCWSTR(device_id.as_ptr()), ERole(role.index()))
                .ok()
                .map_err(|e| platform_error(e, "SetDefaultEndpoint"))
        }
    }
}
