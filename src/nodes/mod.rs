//! Live model of the mesh: one [`NodeEntity`] per observed node id.
//!
//! The store folds partial observations (position here, telemetry there)
//! into a consistent record per node. Merges are additive: an update only
//! overwrites the attributes it supplies and never nulls out the rest.
//! Entities are created on first reference and destroyed only by
//! [`NodeStore::clear`].
//!
//! All map access is serialized under one mutex; snapshots taken by
//! [`NodeStore::get_all`] are atomic with respect to writers. Change
//! notification is two-level: an entity event per update, plus one
//! debounced collective event (~100 ms, single shot) that coalesces update
//! bursts. `clear` and bulk loads are already-batched events and notify
//! immediately instead - after the map lock is released, so a handler that
//! reads the store back cannot deadlock.

pub mod persist;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::link::packet::{
    DecodedPacket, NodeId, PacketBody, PositionFix, TelemetryReading, BROADCAST_ADDR, NODE_UNSET,
};
use crate::proto;

use persist::NodePersistence;

/// Debounce window for the collective change notification.
pub const SET_CHANGED_DEBOUNCE: Duration = Duration::from_millis(100);

/// Battery levels above 100 signal external power on the wire.
const BATTERY_EXTERNAL_POWER: u32 = 100;

/// Everything known about one mesh node. Fields default to absent/zero and
/// are filled in as observations arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntity {
    pub num: NodeId,
    pub long_name: String,
    pub short_name: String,
    pub hw_model: String,
    pub has_position: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: i32,
    pub battery_level: Option<u32>,
    pub voltage: Option<f32>,
    pub channel_utilization: Option<f32>,
    pub air_util_tx: Option<f32>,
    pub has_environment: bool,
    pub temperature: f32,
    pub relative_humidity: f32,
    pub barometric_pressure: f32,
    pub snr: Option<f32>,
    pub rssi: Option<i32>,
    pub hops_away: Option<u32>,
    pub external_power: bool,
    pub favorite: bool,
    pub last_heard: DateTime<Utc>,
    pub first_seen: DateTime<Utc>,
}

impl NodeEntity {
    pub fn new(num: NodeId, at: DateTime<Utc>) -> Self {
        Self {
            num,
            long_name: String::new(),
            short_name: String::new(),
            hw_model: String::new(),
            has_position: false,
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0,
            battery_level: None,
            voltage: None,
            channel_utilization: None,
            air_util_tx: None,
            has_environment: false,
            temperature: 0.0,
            relative_humidity: 0.0,
            barometric_pressure: 0.0,
            snr: None,
            rssi: None,
            hops_away: None,
            external_power: false,
            favorite: false,
            last_heard: at,
            first_seen: at,
        }
    }
}

/// Change notification. Entity events always precede the collective event
/// they schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEvent {
    /// One entity was created or merged.
    Updated(NodeId),
    /// The set as a whole changed (debounced, or immediate for clear/load).
    SetChanged,
}

pub struct NodeStore {
    entities: Mutex<HashMap<NodeId, NodeEntity>>,
    observers: Arc<Mutex<Vec<mpsc::UnboundedSender<NodeEvent>>>>,
    persistence: Arc<dyn NodePersistence>,
    debounce: Duration,
    flush_task: Mutex<Option<JoinHandle<()>>>,
}

impl NodeStore {
    /// Persistence is passed in explicitly; use
    /// [`persist::NullPersistence`] to keep the model in memory only.
    pub fn new(persistence: Arc<dyn NodePersistence>) -> Self {
        Self::with_debounce(persistence, SET_CHANGED_DEBOUNCE)
    }

    pub fn with_debounce(persistence: Arc<dyn NodePersistence>, debounce: Duration) -> Self {
        Self {
            entities: Mutex::new(HashMap::new()),
            observers: Arc::new(Mutex::new(Vec::new())),
            persistence,
            debounce,
            flush_task: Mutex::new(None),
        }
    }

    /// Register an observer. Dropped receivers are pruned on the next emit.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<NodeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.lock().unwrap().push(tx);
        rx
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    pub fn get(&self, num: NodeId) -> Option<NodeEntity> {
        self.entities.lock().unwrap().get(&num).cloned()
    }

    /// Atomic snapshot of every entity, most recently heard first.
    pub fn get_all(&self) -> Vec<NodeEntity> {
        let mut all: Vec<NodeEntity> = self.entities.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| b.last_heard.cmp(&a.last_heard));
        all
    }

    pub fn contains(&self, num: NodeId) -> bool {
        self.entities.lock().unwrap().contains_key(&num)
    }

    pub fn len(&self) -> usize {
        self.entities.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.lock().unwrap().is_empty()
    }

    // -----------------------------------------------------------------
    // Merge updates
    // -----------------------------------------------------------------

    /// Generic update path: fold one decoded packet into the model. Uses the
    /// packet's own timestamp. Packets without a usable source node are
    /// ignored.
    pub fn apply_packet(&self, pkt: &DecodedPacket) {
        if let PacketBody::NodeInfo(info) = &pkt.body {
            let num = info.num;
            let info = info.clone();
            self.merge(num, pkt.timestamp, |e| merge_node_info(e, &info));
            return;
        }

        if pkt.from == NODE_UNSET || pkt.from == BROADCAST_ADDR {
            return;
        }
        let snr = pkt.snr;
        let rssi = pkt.rssi;
        let hops = pkt.hops;
        let body = pkt.body.clone();
        self.merge(pkt.from, pkt.timestamp, move |e| {
            if let Some(s) = snr {
                e.snr = Some(s);
            }
            if let Some(r) = rssi {
                e.rssi = Some(r);
            }
            if let Some(h) = hops {
                e.hops_away = Some(h);
            }
            match &body {
                PacketBody::Position(fix) => merge_position(e, fix),
                PacketBody::User(user) => merge_user(e, user),
                PacketBody::Telemetry(reading) => merge_telemetry(e, reading),
                // Any other traffic still proves the node is alive; the
                // last-heard stamp in merge() covers it.
                _ => {}
            }
        });
    }

    /// Merge a position observation.
    pub fn update_position(&self, num: NodeId, fix: &PositionFix) {
        let fix = fix.clone();
        self.merge(num, Utc::now(), move |e| merge_position(e, &fix));
    }

    /// Merge identity (user record) attributes.
    pub fn update_user(&self, num: NodeId, user: &proto::User) {
        let user = user.clone();
        self.merge(num, Utc::now(), move |e| merge_user(e, &user));
    }

    /// Merge a telemetry reading.
    pub fn update_telemetry(&self, num: NodeId, reading: &TelemetryReading) {
        let reading = reading.clone();
        self.merge(num, Utc::now(), move |e| merge_telemetry(e, &reading));
    }

    /// Merge link-quality attributes.
    pub fn update_signal(
        &self,
        num: NodeId,
        snr: Option<f32>,
        rssi: Option<i32>,
        hops: Option<u32>,
    ) {
        self.merge(num, Utc::now(), move |e| {
            if let Some(s) = snr {
                e.snr = Some(s);
            }
            if let Some(r) = rssi {
                e.rssi = Some(r);
            }
            if let Some(h) = hops {
                e.hops_away = Some(h);
            }
        });
    }

    pub fn set_favorite(&self, num: NodeId, favorite: bool) {
        self.merge(num, Utc::now(), move |e| e.favorite = favorite);
    }

    fn merge<F>(&self, num: NodeId, timestamp: DateTime<Utc>, apply: F)
    where
        F: FnOnce(&mut NodeEntity),
    {
        let snapshot = {
            let mut map = self.entities.lock().unwrap();
            let entity = map
                .entry(num)
                .or_insert_with(|| NodeEntity::new(num, timestamp));
            apply(entity);
            entity.last_heard = timestamp;
            entity.clone()
        };
        // Hook and events run outside the map lock.
        if let Err(e) = self.persistence.upsert(&snapshot) {
            warn!("node persistence upsert failed for {}: {}", num, e);
        }
        self.emit(NodeEvent::Updated(num));
        self.schedule_set_changed();
    }

    // -----------------------------------------------------------------
    // Bulk operations
    // -----------------------------------------------------------------

    /// Drop every entity (device disconnect, database switch), in memory and
    /// in the persistence hook. Notifies immediately - no debounce - once the
    /// map lock is released.
    pub fn clear(&self) {
        self.cancel_pending_flush();
        {
            let mut map = self.entities.lock().unwrap();
            map.clear();
        }
        if let Err(e) = self.persistence.clear() {
            warn!("node persistence clear failed: {}", e);
        }
        self.emit(NodeEvent::SetChanged);
    }

    /// Bulk load from the persistence hook. Loaded entities keep their
    /// stored timestamps; one immediate collective notification follows.
    pub fn load_from_persistence(&self) -> anyhow::Result<usize> {
        let loaded = self.persistence.load_all()?;
        let count = loaded.len();
        {
            let mut map = self.entities.lock().unwrap();
            for entity in loaded {
                map.insert(entity.num, entity);
            }
        }
        debug!("loaded {} nodes from persistence", count);
        self.cancel_pending_flush();
        self.emit(NodeEvent::SetChanged);
        Ok(count)
    }

    // -----------------------------------------------------------------
    // Notification plumbing
    // -----------------------------------------------------------------

    fn emit(&self, event: NodeEvent) {
        let mut observers = self.observers.lock().unwrap();
        observers.retain(|tx| tx.send(event).is_ok());
    }

    /// Arm (or re-arm) the single-shot collective notification. Callers on
    /// threads without a tokio runtime get an immediate emit instead of a
    /// debounced one; updates must never be fatal.
    fn schedule_set_changed(&self) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(_) => {
                self.emit(NodeEvent::SetChanged);
                return;
            }
        };
        let mut slot = self.flush_task.lock().unwrap();
        if let Some(task) = slot.take() {
            task.abort();
        }
        let observers = Arc::clone(&self.observers);
        let window = self.debounce;
        *slot = Some(handle.spawn(async move {
            tokio::time::sleep(window).await;
            let mut observers = observers.lock().unwrap();
            observers.retain(|tx| tx.send(NodeEvent::SetChanged).is_ok());
        }));
    }

    fn cancel_pending_flush(&self) {
        if let Some(task) = self.flush_task.lock().unwrap().take() {
            task.abort();
        }
    }
}

impl Drop for NodeStore {
    fn drop(&mut self) {
        self.cancel_pending_flush();
    }
}

fn merge_position(e: &mut NodeEntity, fix: &PositionFix) {
    if let (Some(lat), Some(lon)) = (fix.latitude, fix.longitude) {
        e.latitude = lat;
        e.longitude = lon;
        e.has_position = true;
    }
    if let Some(alt) = fix.altitude {
        e.altitude = alt;
    }
}

fn merge_user(e: &mut NodeEntity, user: &proto::User) {
    if !user.long_name.trim().is_empty() {
        e.long_name = user.long_name.trim().to_string();
    }
    if !user.short_name.trim().is_empty() {
        e.short_name = user.short_name.trim().to_string();
    }
    if user.hw_model != 0 {
        e.hw_model = proto::HardwareModel::name(user.hw_model);
    }
}

fn merge_telemetry(e: &mut NodeEntity, reading: &TelemetryReading) {
    match reading {
        TelemetryReading::Device(d) => {
            if let Some(level) = d.battery_level {
                e.external_power = level > BATTERY_EXTERNAL_POWER;
                e.battery_level = Some(level.min(100));
            }
            if let Some(v) = d.voltage {
                e.voltage = Some(v);
            }
            if let Some(u) = d.channel_utilization {
                e.channel_utilization = Some(u);
            }
            if let Some(a) = d.air_util_tx {
                e.air_util_tx = Some(a);
            }
        }
        TelemetryReading::Environment(env) => {
            if let Some(t) = env.temperature {
                e.temperature = t;
                e.has_environment = true;
            }
            if let Some(h) = env.relative_humidity {
                e.relative_humidity = h;
                e.has_environment = true;
            }
            if let Some(p) = env.barometric_pressure {
                e.barometric_pressure = p;
                e.has_environment = true;
            }
        }
        // Power-channel readings describe attached rails, not the node
        // record itself; nothing to merge.
        TelemetryReading::Power(_) => {}
    }
}

fn merge_node_info(e: &mut NodeEntity, info: &proto::NodeInfo) {
    if let Some(user) = &info.user {
        merge_user(e, user);
    }
    if let Some(pos) = &info.position {
        let lat_i = pos.latitude_i.unwrap_or(0);
        let lon_i = pos.longitude_i.unwrap_or(0);
        if lat_i != 0 || lon_i != 0 {
            e.latitude = lat_i as f64 * 1e-7;
            e.longitude = lon_i as f64 * 1e-7;
            e.has_position = true;
        }
        if let Some(alt) = pos.altitude {
            e.altitude = alt;
        }
    }
    if let Some(metrics) = &info.device_metrics {
        merge_telemetry(e, &TelemetryReading::Device(metrics.clone()));
    }
    if info.snr != 0.0 {
        e.snr = Some(info.snr);
    }
    if let Some(h) = info.hops_away {
        e.hops_away = Some(h);
    }
    if info.is_favorite {
        e.favorite = true;
    }
}
