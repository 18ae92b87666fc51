//! Supported keyboard registry
//!
//! OpenRazer exposes every Razer peripheral (mice, headsets, docks) on the
//! same bus, so discovery filters on the USB IDs of keyboards with a per-key
//! matrix.

/// Razer USA vendor ID
pub const VENDOR_ID: u16 = 0x1532;

/// Product IDs of per-key RGB keyboards
pub const KEYBOARD_PIDS: &[u16] = &[
    0x010D, 0x010E, 0x010F, 0x0118, 0x011A, 0x011B, 0x011C, 0x0202,
    0x0203, 0x0204, 0x0205, 0x0209, 0x020F, 0x0210, 0x0211, 0x0214,
    0x0216, 0x0217, 0x021A, 0x021E, 0x021F, 0x0220, 0x0221, 0x0224,
    0x0225, 0x0226, 0x0227, 0x0228, 0x022A, 0x022C, 0x022D, 0x022F,
    0x0232, 0x0233, 0x0234, 0x0235, 0x0237, 0x0239, 0x023A, 0x023B,
    0x023F, 0x0240, 0x0241, 0x0243, 0x0245, 0x0246, 0x024A, 0x024B,
    0x024C, 0x024D, 0x024E, 0x0252, 0x0253, 0x0255, 0x0256, 0x0257,
    0x0258, 0x0259, 0x025A, 0x025C, 0x025D, 0x025E, 0x0266, 0x0268,
    0x0269, 0x026A, 0x026B, 0x026C, 0x026D, 0x026E, 0x026F, 0x0270,
    0x0271, 0x0276, 0x0279, 0x027A, 0x0282, 0x0287, 0x028A, 0x028B,
    0x028C, 0x028D, 0x028F, 0x0290, 0x0292, 0x0293, 0x0294, 0x0295,
    0x0296, 0x0298, 0x029D, 0x029E, 0x029F, 0x02A0, 0x02A1, 0x02A2,
    0x02A3, 0x02A5, 0x02A6, 0x02B6, 0x02B8, 0x0A24,
];

/// Check whether a VID/PID pair is a supported keyboard
#[inline]
pub fn is_supported(vid: u16, pid: u16) -> bool {
    vid == VENDOR_ID && KEYBOARD_PIDS.contains(&pid)
}
