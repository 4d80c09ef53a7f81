//! BLE radio adapter.
//!
//! Implements [`RadioPort`], [`BondStore`] and [`PresencePort`]: the
//! hexagonal boundary for advertising, bond management and the presence
//! characteristic.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid GAP/GATTS via `esp_idf_svc::sys`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## GATT Service Layout
//!
//! | Service / Characteristic | UUID     | Perms                    |
//! |--------------------------|----------|--------------------------|
//! | Battery Service          | `0x180F` | primary                  |
//! | Battery Level            | `0x2A19` | Read (MITM) + Notify     |
//! | Client Characteristic Cfg| `0x2902` | Read + Write             |
//!
//! Battery Level carries whole-degree temperature, not charge.
//!
//! ## Callback bridging
//!
//! Bluedroid callbacks are C function pointers that cannot capture Rust
//! closures.  They translate stack events into [`RadioEvent`]s on the
//! static [`RADIO_EVENTS`] queue, which the link task drains.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use log::info;

use crate::app::ports::{BondStore, PresencePort, RadioPort};
use crate::error::RadioError;
use crate::link::advertising::AdvertisingMode;
use crate::link::{RadioEventChannel, post_event};
#[cfg(target_os = "espidf")]
use crate::link::{AddressKind, PeerAddress, RadioEvent};

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const BATTERY_SERVICE_UUID: u16 = 0x180F;
pub const BATTERY_LEVEL_UUID: u16 = 0x2A19;
pub const CLIENT_CONFIG_UUID: u16 = 0x2902;

/// Service, characteristic declaration + value, CCCD.
#[cfg(target_os = "espidf")]
const BATTERY_SERVICE_HANDLES: u16 = 4;

/// Stack callbacks land here; drained by the link task.
pub static RADIO_EVENTS: RadioEventChannel = RadioEventChannel::new();

// Shared between the callback context and the adapter.  `LINKED` follows
// the tracked (first) link only.
static LINKED: AtomicBool = AtomicBool::new(false);
static PRESENCE: AtomicU8 = AtomicU8::new(0);

// ── ESP-IDF BLE static state (ISR-safe atomics) ───────────────

#[cfg(target_os = "espidf")]
use core::sync::atomic::AtomicU32;

#[cfg(target_os = "espidf")]
static BLE_GATTS_IF: AtomicU32 = AtomicU32::new(0);
/// Connection id of the tracked link, `NO_CONN` when none.
#[cfg(target_os = "espidf")]
static BLE_CONN_ID: AtomicU32 = AtomicU32::new(NO_CONN);
#[cfg(target_os = "espidf")]
const NO_CONN: u32 = u32::MAX;
/// Bit `conn_id` set when that link's peer uses a random address.
#[cfg(target_os = "espidf")]
static BLE_RANDOM_PEERS: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static NOTIFY_ENABLED: AtomicBool = AtomicBool::new(false);
#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_LEVEL_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CCCD_HANDLE: AtomicU32 = AtomicU32::new(0);
/// `interval_min << 16 | interval_max`, applied once raw adv data is set.
#[cfg(target_os = "espidf")]
static BLE_ADV_INTERVALS: AtomicU32 = AtomicU32::new(0);

#[cfg(target_os = "espidf")]
fn uuid16_to_esp(uuid: u16) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 2;
    t.uuid.uuid16 = uuid;
    t
}

#[cfg(target_os = "espidf")]
fn peer_from(bda: &[u8; 6], addr_type: esp_idf_svc::sys::esp_ble_addr_type_t) -> PeerAddress {
    let kind = if addr_type == esp_idf_svc::sys::esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC {
        AddressKind::Public
    } else {
        AddressKind::Random
    };
    PeerAddress::new(*bda, kind)
}

#[cfg(target_os = "espidf")]
fn remember_kind(conn_id: u16, kind: AddressKind) {
    let Some(bit) = 1u32.checked_shl(u32::from(conn_id)) else {
        return;
    };
    match kind {
        AddressKind::Random => BLE_RANDOM_PEERS.fetch_or(bit, Ordering::Relaxed),
        AddressKind::Public => BLE_RANDOM_PEERS.fetch_and(!bit, Ordering::Relaxed),
    };
}

#[cfg(target_os = "espidf")]
fn recorded_kind(conn_id: u16) -> AddressKind {
    match 1u32.checked_shl(u32::from(conn_id)) {
        Some(bit) if BLE_RANDOM_PEERS.load(Ordering::Relaxed) & bit != 0 => AddressKind::Random,
        _ => AddressKind::Public,
    }
}

#[cfg(target_os = "espidf")]
fn check(ret: esp_idf_svc::sys::esp_err_t) -> Result<(), RadioError> {
    if ret == esp_idf_svc::sys::ESP_OK as i32 {
        Ok(())
    } else {
        Err(RadioError(ret))
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_RAW_SET_COMPLETE_EVT => {
            let status = unsafe { (*param).adv_data_raw_cmpl.status };
            if status != esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                post_event(&RADIO_EVENTS, RadioEvent::AdvertisingFailed { code: status as i32 });
                return;
            }
            let packed = BLE_ADV_INTERVALS.load(Ordering::Relaxed);
            let mut adv_params = esp_ble_adv_params_t {
                adv_int_min: (packed >> 16) as u16,
                adv_int_max: packed as u16,
                adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
                own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
                channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
                adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
                ..unsafe { core::mem::zeroed() }
            };
            let ret = unsafe { esp_ble_gap_start_advertising(&mut adv_params) };
            if ret != ESP_OK as i32 {
                post_event(&RADIO_EVENTS, RadioEvent::AdvertisingFailed { code: ret });
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            let status = unsafe { (*param).adv_start_cmpl.status };
            if status != esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                post_event(&RADIO_EVENTS, RadioEvent::AdvertisingFailed { code: status as i32 });
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_SEC_REQ_EVT => unsafe {
            esp_ble_gap_security_rsp((*param).ble_security.ble_req.bd_addr.as_mut_ptr(), true);
        },
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_PASSKEY_NOTIF_EVT => {
            let notif = unsafe { &(*param).ble_security.key_notif };
            // Address type is not carried with the notification.
            let peer = PeerAddress::new(notif.bd_addr, AddressKind::Public);
            post_event(
                &RADIO_EVENTS,
                RadioEvent::PasskeyDisplay {
                    peer,
                    passkey: notif.passkey,
                },
            );
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_AUTH_CMPL_EVT => {
            let p = unsafe { &(*param).ble_security.auth_cmpl };
            let peer = peer_from(&p.bd_addr, p.addr_type);
            let event = if p.success {
                RadioEvent::PairingComplete {
                    peer,
                    bonded: u32::from(p.auth_mode) & ESP_LE_AUTH_BOND != 0,
                }
            } else {
                log::debug!("BLE GAP: authentication failed (reason={})", p.fail_reason);
                RadioEvent::PairingCancelled { peer }
            };
            post_event(&RADIO_EVENTS, event);
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use esp_idf_svc::sys::*;

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            BLE_GATTS_IF.store(u32::from(gatts_if), Ordering::Relaxed);
            let mut svc_id = esp_gatt_srvc_id_t {
                id: esp_gatt_id_t {
                    uuid: uuid16_to_esp(BATTERY_SERVICE_UUID),
                    inst_id: 0,
                },
                is_primary: true,
            };
            unsafe { esp_ble_gatts_create_service(gatts_if, &mut svc_id, BATTERY_SERVICE_HANDLES) };
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
            let svc_handle = unsafe { (*param).create.service_handle };
            BLE_SVC_HANDLE.store(u32::from(svc_handle), Ordering::Relaxed);
            let mut char_uuid = uuid16_to_esp(BATTERY_LEVEL_UUID);
            let mut initial = PRESENCE.load(Ordering::Relaxed);
            let mut value = esp_attr_value_t {
                attr_max_len: 1,
                attr_len: 1,
                attr_value: &mut initial,
            };
            unsafe {
                esp_ble_gatts_start_service(svc_handle);
                esp_ble_gatts_add_char(
                    svc_handle,
                    &mut char_uuid,
                    ESP_GATT_PERM_READ_ENC_MITM as esp_gatt_perm_t,
                    (ESP_GATT_CHAR_PROP_BIT_READ | ESP_GATT_CHAR_PROP_BIT_NOTIFY) as esp_gatt_char_prop_t,
                    &mut value,
                    core::ptr::null_mut(),
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
            let handle = unsafe { (*param).add_char.attr_handle };
            BLE_LEVEL_HANDLE.store(u32::from(handle), Ordering::Relaxed);
            let svc_handle = BLE_SVC_HANDLE.load(Ordering::Relaxed) as u16;
            let mut descr_uuid = uuid16_to_esp(CLIENT_CONFIG_UUID);
            unsafe {
                esp_ble_gatts_add_char_descr(
                    svc_handle,
                    &mut descr_uuid,
                    (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
                    core::ptr::null_mut(),
                    core::ptr::null_mut(),
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
            let handle = unsafe { (*param).add_char_descr.attr_handle };
            BLE_CCCD_HANDLE.store(u32::from(handle), Ordering::Relaxed);
            log::info!("BLE GATTS: battery service ready (level handle={})", BLE_LEVEL_HANDLE.load(Ordering::Relaxed));
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            let p = unsafe { &mut (*param).connect };
            let peer = peer_from(&p.remote_bda, p.ble_addr_type);
            remember_kind(p.conn_id, peer.kind());
            if BLE_CONN_ID
                .compare_exchange(NO_CONN, u32::from(p.conn_id), Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                LINKED.store(true, Ordering::Release);
            }
            // Link encryption drives the passkey exchange.
            unsafe { esp_ble_set_encryption(p.remote_bda.as_mut_ptr(), esp_ble_sec_act_t_ESP_BLE_SEC_ENCRYPT_MITM) };
            post_event(&RADIO_EVENTS, RadioEvent::Connected { peer, status: 0 });
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            let p = unsafe { &(*param).disconnect };
            if BLE_CONN_ID
                .compare_exchange(u32::from(p.conn_id), NO_CONN, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                LINKED.store(false, Ordering::Release);
                NOTIFY_ENABLED.store(false, Ordering::Relaxed);
            }
            post_event(
                &RADIO_EVENTS,
                RadioEvent::Disconnected {
                    peer: PeerAddress::new(p.remote_bda, recorded_kind(p.conn_id)),
                    reason: p.reason as u8,
                },
            );
        }
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
            let p = unsafe { &(*param).write };
            if u32::from(p.handle) == BLE_CCCD_HANDLE.load(Ordering::Relaxed)
                && u32::from(p.conn_id) == BLE_CONN_ID.load(Ordering::Acquire)
                && p.len == 2
            {
                let data = unsafe { core::slice::from_raw_parts(p.value, 2) };
                NOTIFY_ENABLED.store(data[0] & 0x01 != 0, Ordering::Relaxed);
            }
        }
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation state
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicI32, AtomicUsize};

#[cfg(not(target_os = "espidf"))]
use core::cell::Cell;

#[cfg(not(target_os = "espidf"))]
use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};

#[cfg(not(target_os = "espidf"))]
use crate::link::PeerAddress;

#[cfg(not(target_os = "espidf"))]
struct SimRadio {
    enable_err: AtomicI32,
    adv_err: AtomicI32,
    unpair_err: AtomicI32,
    bonds: AtomicUsize,
    advertising: AtomicBool,
    /// Peer of the tracked link.
    tracked: Mutex<CriticalSectionRawMutex, Cell<Option<PeerAddress>>>,
}

#[cfg(not(target_os = "espidf"))]
impl SimRadio {
    fn new() -> Self {
        Self {
            enable_err: AtomicI32::new(0),
            adv_err: AtomicI32::new(0),
            unpair_err: AtomicI32::new(0),
            bonds: AtomicUsize::new(0),
            advertising: AtomicBool::new(false),
            tracked: Mutex::new(Cell::new(None)),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn sim_result(code: &AtomicI32) -> Result<(), RadioError> {
    match code.load(Ordering::Relaxed) {
        0 => Ok(()),
        e => Err(RadioError(e)),
    }
}

// ───────────────────────────────────────────────────────────────
// BLE adapter
// ───────────────────────────────────────────────────────────────

pub struct BleRadio {
    device_name: heapless::String<24>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimRadio,
}

impl BleRadio {
    pub fn new(device_name: heapless::String<24>) -> Self {
        Self {
            device_name,
            #[cfg(not(target_os = "espidf"))]
            sim: SimRadio::new(),
        }
    }

    /// Queue the stack callbacks feed.
    pub fn events(&self) -> &'static RadioEventChannel {
        &RADIO_EVENTS
    }

    /// Whether the tracked peer link is up.
    pub fn is_linked(&self) -> bool {
        LINKED.load(Ordering::Acquire)
    }

    /// Last value written to the presence characteristic.
    pub fn presence(&self) -> u8 {
        PRESENCE.load(Ordering::Relaxed)
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_enable(&self) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;
        unsafe {
            // Release classic BT memory (BLE-only mode saves ~30 KB).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            check(esp_bt_controller_init(&mut bt_cfg))?;
            check(esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE))?;
            check(esp_bluedroid_init())?;
            check(esp_bluedroid_enable())?;

            // Display-only passkey pairing with MITM protection and bonding.
            let auth_req = (ESP_LE_AUTH_BOND | ESP_LE_AUTH_REQ_MITM | ESP_LE_AUTH_REQ_SC_ONLY) as u8;
            let iocap = ESP_IO_CAP_OUT as u8;
            let key_size: u8 = 16;
            let key_mask = (ESP_BLE_ENC_KEY_MASK | ESP_BLE_ID_KEY_MASK) as u8;
            for (param, value) in [
                (esp_ble_sm_param_t_ESP_BLE_SM_AUTHEN_REQ_MODE, &auth_req),
                (esp_ble_sm_param_t_ESP_BLE_SM_IOCAP_MODE, &iocap),
                (esp_ble_sm_param_t_ESP_BLE_SM_MAX_KEY_SIZE, &key_size),
                (esp_ble_sm_param_t_ESP_BLE_SM_SET_INIT_KEY, &key_mask),
                (esp_ble_sm_param_t_ESP_BLE_SM_SET_RSP_KEY, &key_mask),
            ] {
                check(esp_ble_gap_set_security_param(
                    param,
                    value as *const u8 as *mut _,
                    1,
                ))?;
            }

            let mut name: heapless::Vec<u8, 25> = heapless::Vec::new();
            let _ = name.extend_from_slice(self.device_name.as_bytes());
            let _ = name.push(0);
            check(esp_ble_gap_set_device_name(name.as_ptr() as *const _))?;
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_enable(&self) -> Result<(), RadioError> {
        sim_result(&self.sim.enable_err)
    }

    #[cfg(target_os = "espidf")]
    fn platform_register(&self) {
        use esp_idf_svc::sys::*;
        unsafe {
            esp_ble_gap_register_callback(Some(ble_gap_event_handler));
            esp_ble_gatts_register_callback(Some(ble_gatts_event_handler));
            esp_ble_gatts_app_register(0);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_register(&self) {
        info!("BLE(sim): callbacks bound to event queue");
    }

    #[cfg(target_os = "espidf")]
    fn platform_advertise(&self, mode: AdvertisingMode, payload: &[u8]) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;
        BLE_ADV_INTERVALS.store(
            (u32::from(mode.interval_min) << 16) | u32::from(mode.interval_max),
            Ordering::Relaxed,
        );
        let mut adv: heapless::Vec<u8, 31> = heapless::Vec::new();
        adv.extend_from_slice(payload)
            .map_err(|_| RadioError(ESP_ERR_INVALID_SIZE as i32))?;
        unsafe {
            if mode.use_name {
                // Complete Local Name in the scan response.
                let mut rsp: heapless::Vec<u8, 31> = heapless::Vec::new();
                let name = self.device_name.as_bytes();
                let _ = rsp.push((name.len() + 1) as u8);
                let _ = rsp.push(0x09);
                let _ = rsp.extend_from_slice(name);
                check(esp_ble_gap_config_scan_rsp_data_raw(rsp.as_mut_ptr(), rsp.len() as u32))?;
            }
            // Advertising starts from the RAW_SET_COMPLETE callback.
            check(esp_ble_gap_config_adv_data_raw(adv.as_mut_ptr(), adv.len() as u32))
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_advertise(&self, mode: AdvertisingMode, payload: &[u8]) -> Result<(), RadioError> {
        sim_result(&self.sim.adv_err)?;
        self.sim.advertising.store(true, Ordering::Relaxed);
        info!(
            "BLE(sim): advertising '{}' ({} bytes, interval {:#06x}..{:#06x})",
            self.device_name,
            payload.len(),
            mode.interval_min,
            mode.interval_max
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_clear_bonds(&self) -> Result<usize, RadioError> {
        use esp_idf_svc::sys::*;
        const MAX_BONDS: usize = 15;
        unsafe {
            let mut count = esp_ble_get_bond_device_num();
            if count < 0 {
                return Err(RadioError(count));
            }
            let mut list: [esp_ble_bond_dev_t; MAX_BONDS] = core::mem::zeroed();
            count = count.min(MAX_BONDS as i32);
            check(esp_ble_get_bond_device_list(&mut count, list.as_mut_ptr()))?;
            for dev in &mut list[..count as usize] {
                check(esp_ble_remove_bond_device(dev.bd_addr.as_mut_ptr()))?;
            }
            Ok(count as usize)
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_clear_bonds(&self) -> Result<usize, RadioError> {
        sim_result(&self.sim.unpair_err)?;
        Ok(self.sim.bonds.swap(0, Ordering::Relaxed))
    }

    #[cfg(target_os = "espidf")]
    fn platform_notify(&self, level: u8) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;
        let handle = BLE_LEVEL_HANDLE.load(Ordering::Relaxed) as u16;
        if handle == 0 {
            return Err(RadioError::NOT_CONNECTED);
        }
        unsafe {
            check(esp_ble_gatts_set_attr_value(handle, 1, &level))?;
            if !LINKED.load(Ordering::Acquire) {
                return Err(RadioError::NOT_CONNECTED);
            }
            if !NOTIFY_ENABLED.load(Ordering::Relaxed) {
                return Ok(());
            }
            let mut value = level;
            check(esp_ble_gatts_send_indicate(
                BLE_GATTS_IF.load(Ordering::Relaxed) as esp_gatt_if_t,
                BLE_CONN_ID.load(Ordering::Relaxed) as u16,
                handle,
                1,
                &mut value,
                false,
            ))
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_notify(&self, _level: u8) -> Result<(), RadioError> {
        if LINKED.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(RadioError::NOT_CONNECTED)
        }
    }
}

// ── Host simulation controls ──────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl BleRadio {
    /// Make `enable` fail with `code` (0 restores success).
    pub fn sim_set_enable_error(&self, code: i32) {
        self.sim.enable_err.store(code, Ordering::Relaxed);
    }

    pub fn sim_set_advertise_error(&self, code: i32) {
        self.sim.adv_err.store(code, Ordering::Relaxed);
    }

    pub fn sim_set_unpair_error(&self, code: i32) {
        self.sim.unpair_err.store(code, Ordering::Relaxed);
    }

    /// Pretend `count` bonds survived from a previous boot.
    pub fn sim_seed_bonds(&self, count: usize) {
        self.sim.bonds.store(count, Ordering::Relaxed);
    }

    pub fn sim_bond_count(&self) -> usize {
        self.sim.bonds.load(Ordering::Relaxed)
    }

    pub fn sim_is_advertising(&self) -> bool {
        self.sim.advertising.load(Ordering::Relaxed)
    }

    /// Deliver a stack event as a callback would.
    pub fn sim_inject(&self, event: crate::link::RadioEvent) -> bool {
        use crate::link::RadioEvent;
        match event {
            RadioEvent::Connected { peer, status: 0 } => {
                self.sim.tracked.lock(|t| {
                    if t.get().is_none() {
                        t.set(Some(peer));
                        LINKED.store(true, Ordering::Release);
                    }
                });
                self.sim.advertising.store(false, Ordering::Relaxed);
            }
            RadioEvent::Disconnected { peer, .. } => {
                self.sim.tracked.lock(|t| {
                    if t.get() == Some(peer) {
                        t.set(None);
                        LINKED.store(false, Ordering::Release);
                    }
                });
            }
            RadioEvent::PairingComplete { bonded: true, .. } => {
                self.sim.bonds.fetch_add(1, Ordering::Relaxed);
            }
            RadioEvent::AdvertisingFailed { .. } => {
                self.sim.advertising.store(false, Ordering::Relaxed);
            }
            _ => {}
        }
        post_event(&RADIO_EVENTS, event)
    }
}

// ───────────────────────────────────────────────────────────────
// Port implementations
// ───────────────────────────────────────────────────────────────

impl RadioPort for BleRadio {
    fn enable(&self) -> Result<(), RadioError> {
        self.platform_enable()?;
        info!("BLE: stack enabled as '{}'", self.device_name);
        Ok(())
    }

    fn register_callbacks(&self) {
        self.platform_register();
    }

    fn start_advertising(&self, mode: AdvertisingMode, payload: &[u8]) -> Result<(), RadioError> {
        self.platform_advertise(mode, payload)
    }
}

impl BondStore for BleRadio {
    fn clear_bonds(&self) -> Result<usize, RadioError> {
        self.platform_clear_bonds()
    }
}

impl PresencePort for BleRadio {
    fn set_presence(&self, level: u8) -> Result<(), RadioError> {
        PRESENCE.store(level, Ordering::Relaxed);
        self.platform_notify(level)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
