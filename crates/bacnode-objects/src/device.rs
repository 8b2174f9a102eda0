//! Device context.
//!
//! A [`Device`] owns one [`ObjectStore`] per hosted object type together
//! with the collaborators the objects report to. Every operation runs on
//! the caller's thread; property access, the schedule timer and the
//! reporting tick are expected to be serialized by one control loop.

use crate::objects::{
    read_object_property, write_object_property, AnalogOutput, BacnetObject, BinaryInput,
    BinaryOutput, MultiStateInput, Schedule,
};
use crate::observer::{DeviceWriter, NameRegistry, NotificationClassReporter, PresentValueObserver};
use crate::persist::{ConfigChange, ConfigSection, ConfigStore};
use crate::property::{ReadPropertyData, WritePropertyData};
use crate::reporting::EventNotification;
use crate::store::ObjectStore;
use crate::{ConfigError, PropertyError};
use bacnode_core::types::object_id::{BACNET_MAX_INSTANCE, BACNET_WILDCARD_INSTANCE};
use bacnode_core::types::{
    BinaryPv, DataValue, DateTime, EventState, EventTransitionBits, NotifyType, ObjectId,
    ObjectType, PropertyId, TimeStamp,
};
use bacnode_core::value_codec::encode_to_vec;
use serde::Serialize;

/// Runs `$body` with `$o` bound to the hosted type for `$object_type`.
macro_rules! dispatch {
    ($object_type:expr, $o:ident => $body:expr, $other:ident => $fallback:expr) => {
        match $object_type {
            ObjectType::AnalogOutput => {
                type $o = AnalogOutput;
                $body
            }
            ObjectType::BinaryInput => {
                type $o = BinaryInput;
                $body
            }
            ObjectType::BinaryOutput => {
                type $o = BinaryOutput;
                $body
            }
            ObjectType::MultiStateInput => {
                type $o = MultiStateInput;
                $body
            }
            ObjectType::Schedule => {
                type $o = Schedule;
                $body
            }
            $other => $fallback,
        }
    };
}

/// Object stores of every hosted type.
#[derive(Debug, Clone, Default)]
pub struct Stores {
    analog_outputs: ObjectStore<AnalogOutput>,
    binary_inputs: ObjectStore<BinaryInput>,
    binary_outputs: ObjectStore<BinaryOutput>,
    multistate_inputs: ObjectStore<MultiStateInput>,
    schedules: ObjectStore<Schedule>,
}

/// Present-value observers, one per commandable type.
#[derive(Default)]
pub struct Observers {
    analog_output: Option<Box<dyn PresentValueObserver<f32>>>,
    binary_input: Option<Box<dyn PresentValueObserver<BinaryPv>>>,
    binary_output: Option<Box<dyn PresentValueObserver<BinaryPv>>>,
    multistate_input: Option<Box<dyn PresentValueObserver<u32>>>,
}

/// An object type a [`Device`] can host.
pub trait HostedObject: BacnetObject {
    fn store(stores: &Stores) -> &ObjectStore<Self>;

    fn store_mut(stores: &mut Stores) -> &mut ObjectStore<Self>;

    fn observer(
        observers: &mut Observers,
    ) -> Option<&mut (dyn PresentValueObserver<Self::Value> + 'static)>;
}

macro_rules! hosted {
    ($ty:ty, $store:ident, $observer:ident) => {
        impl HostedObject for $ty {
            fn store(stores: &Stores) -> &ObjectStore<Self> {
                &stores.$store
            }

            fn store_mut(stores: &mut Stores) -> &mut ObjectStore<Self> {
                &mut stores.$store
            }

            fn observer(
                observers: &mut Observers,
            ) -> Option<&mut (dyn PresentValueObserver<Self::Value> + 'static)> {
                observers.$observer.as_deref_mut()
            }
        }
    };
}

hosted!(AnalogOutput, analog_outputs, analog_output);
hosted!(BinaryInput, binary_inputs, binary_input);
hosted!(BinaryOutput, binary_outputs, binary_output);
hosted!(MultiStateInput, multistate_inputs, multistate_input);

impl HostedObject for Schedule {
    fn store(stores: &Stores) -> &ObjectStore<Self> {
        &stores.schedules
    }

    fn store_mut(stores: &mut Stores) -> &mut ObjectStore<Self> {
        &mut stores.schedules
    }

    fn observer(
        _observers: &mut Observers,
    ) -> Option<&mut (dyn PresentValueObserver<DataValue> + 'static)> {
        None
    }
}

/// GetEventInformation data for one object with an active or
/// unacknowledged event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSummary {
    pub object_id: ObjectId,
    pub event_state: EventState,
    pub acked_transitions: EventTransitionBits,
    pub event_time_stamps: [DateTime; 3],
    pub notify_type: NotifyType,
    pub event_enable: EventTransitionBits,
}

/// Reporter used when none is configured: logs each notification.
struct LogReporter;

impl NotificationClassReporter for LogReporter {
    fn report(&mut self, notification: &mut EventNotification) {
        log::info!(
            "{} {} -> {}: {}",
            notification.event_object,
            notification.from_state.name(),
            notification.to_state.name(),
            notification.message_text.as_deref().unwrap_or(""),
        );
    }
}

/// Stamps the initiating device on every notification before delivery.
struct DeviceReporter<'a> {
    device_id: ObjectId,
    inner: &'a mut dyn NotificationClassReporter,
}

impl NotificationClassReporter for DeviceReporter<'_> {
    fn report(&mut self, notification: &mut EventNotification) {
        notification.initiating_device = Some(self.device_id);
        self.inner.report(notification);
    }
}

pub struct DeviceBuilder {
    device_id: ObjectId,
    observers: Observers,
    config: Option<Box<dyn ConfigStore>>,
    reporter: Option<Box<dyn NotificationClassReporter>>,
    remote_writer: Option<Box<dyn DeviceWriter>>,
    names: Option<Box<dyn NameRegistry>>,
}

impl DeviceBuilder {
    pub fn new(device_instance: u32) -> Self {
        Self {
            device_id: ObjectId::new(ObjectType::Device, device_instance),
            observers: Observers::default(),
            config: None,
            reporter: None,
            remote_writer: None,
            names: None,
        }
    }

    pub fn analog_output_observer(
        mut self,
        observer: impl PresentValueObserver<f32> + 'static,
    ) -> Self {
        self.observers.analog_output = Some(Box::new(observer));
        self
    }

    pub fn binary_input_observer(
        mut self,
        observer: impl PresentValueObserver<BinaryPv> + 'static,
    ) -> Self {
        self.observers.binary_input = Some(Box::new(observer));
        self
    }

    pub fn binary_output_observer(
        mut self,
        observer: impl PresentValueObserver<BinaryPv> + 'static,
    ) -> Self {
        self.observers.binary_output = Some(Box::new(observer));
        self
    }

    pub fn multistate_input_observer(
        mut self,
        observer: impl PresentValueObserver<u32> + 'static,
    ) -> Self {
        self.observers.multistate_input = Some(Box::new(observer));
        self
    }

    /// Store that successful writes are persisted to.
    pub fn config_store(mut self, store: impl ConfigStore + 'static) -> Self {
        self.config = Some(Box::new(store));
        self
    }

    pub fn reporter(mut self, reporter: impl NotificationClassReporter + 'static) -> Self {
        self.reporter = Some(Box::new(reporter));
        self
    }

    /// Destination for schedule writes addressed to other devices.
    pub fn remote_writer(mut self, writer: impl DeviceWriter + 'static) -> Self {
        self.remote_writer = Some(Box::new(writer));
        self
    }

    pub fn name_registry(mut self, names: impl NameRegistry + 'static) -> Self {
        self.names = Some(Box::new(names));
        self
    }

    pub fn build(self) -> Device {
        Device {
            device_id: self.device_id,
            stores: Stores::default(),
            observers: self.observers,
            config: self.config,
            reporter: self.reporter.unwrap_or_else(|| Box::new(LogReporter)),
            remote_writer: self.remote_writer,
            names: self.names,
        }
    }
}

pub struct Device {
    device_id: ObjectId,
    stores: Stores,
    observers: Observers,
    config: Option<Box<dyn ConfigStore>>,
    reporter: Box<dyn NotificationClassReporter>,
    remote_writer: Option<Box<dyn DeviceWriter>>,
    names: Option<Box<dyn NameRegistry>>,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("device_id", &self.device_id)
            .field("stores", &self.stores)
            .finish_non_exhaustive()
    }
}

fn load_into<O: BacnetObject>(
    objects: &mut ObjectStore<O>,
    config: &dyn ConfigStore,
) -> Result<usize, ConfigError> {
    let mut loaded = 0;
    for section in config.sections(O::PACKAGE) {
        let instance = match section.parse::<u32>() {
            Ok(instance) if instance <= BACNET_MAX_INSTANCE => instance,
            _ => {
                let err = ConfigError::InvalidSection {
                    package: O::PACKAGE.to_string(),
                    section,
                };
                log::warn!("skipping {err}");
                continue;
            }
        };
        let object = O::from_config(instance, &ConfigSection::new(config, O::PACKAGE, &section))?;
        objects.insert(instance, object);
        loaded += 1;
    }
    log::debug!("loaded {loaded} objects from {}", O::PACKAGE);
    Ok(loaded)
}

fn unknown<O: BacnetObject>(instance: u32) -> PropertyError {
    PropertyError::UnknownObject(ObjectId::new(O::OBJECT_TYPE, instance))
}

impl Device {
    pub fn builder(device_instance: u32) -> DeviceBuilder {
        DeviceBuilder::new(device_instance)
    }

    pub fn device_id(&self) -> ObjectId {
        self.device_id
    }

    pub fn config(&self) -> Option<&dyn ConfigStore> {
        self.config.as_deref()
    }

    pub fn objects<O: HostedObject>(&self) -> &ObjectStore<O> {
        O::store(&self.stores)
    }

    pub fn object<O: HostedObject>(&self, instance: u32) -> Option<&O> {
        O::store(&self.stores).get(instance)
    }

    pub fn object_mut<O: HostedObject>(&mut self, instance: u32) -> Option<&mut O> {
        O::store_mut(&mut self.stores).get_mut(instance)
    }

    /// Hosts an already built object.
    pub fn add<O: HostedObject>(&mut self, object: O) -> Result<ObjectId, PropertyError> {
        let object_id = object.object_id();
        let store = O::store_mut(&mut self.stores);
        if store.contains(object.instance()) {
            return Err(PropertyError::ObjectIdentifierAlreadyExists(object_id));
        }
        store.insert(object.instance(), object);
        Ok(object_id)
    }

    /// Creates an object with default properties. `None` or the wildcard
    /// instance picks the lowest free instance.
    pub fn create(
        &mut self,
        object_type: ObjectType,
        instance: Option<u32>,
    ) -> Result<ObjectId, PropertyError> {
        dispatch!(object_type, O => self.create_in::<O>(instance),
            other => Err(PropertyError::UnsupportedObjectType(other)))
    }

    fn create_in<O: HostedObject>(
        &mut self,
        requested: Option<u32>,
    ) -> Result<ObjectId, PropertyError> {
        let store = O::store_mut(&mut self.stores);
        let Some(instance) = store.assign_instance(requested) else {
            return Err(match requested {
                Some(instance) if store.contains(instance) => {
                    PropertyError::ObjectIdentifierAlreadyExists(ObjectId::new(
                        O::OBJECT_TYPE,
                        instance,
                    ))
                }
                None | Some(BACNET_WILDCARD_INSTANCE) => PropertyError::NoFreeInstance(O::OBJECT_TYPE),
                Some(_) => PropertyError::ValueOutOfRange,
            });
        };
        let mut object = O::new(instance);
        let object_id = object.object_id();
        let name = self.unique_name(object.name());
        if name != object.name() {
            let rename =
                WritePropertyData::new(object_id, PropertyId::ObjectName, &name.as_str().into())?;
            write_object_property(&mut object, &rename)?;
        }
        O::store_mut(&mut self.stores).insert(instance, object);
        self.persist(O::PACKAGE, instance, &[ConfigChange::single("name", &name)]);
        log::info!("created {object_id} as {name:?}");
        Ok(object_id)
    }

    /// `base`, or `base (n)` with the lowest `n` from 2 that no object
    /// already uses.
    fn unique_name(&self, base: &str) -> String {
        let mut name = base.to_string();
        let mut suffix = 2u32;
        while self.find_object_by_name(&name).is_some() {
            name = format!("{base} ({suffix})");
            suffix += 1;
        }
        name
    }

    /// Removes the object and its config section.
    pub fn delete(&mut self, object_id: ObjectId) -> Result<(), PropertyError> {
        let instance = object_id.instance();
        let package = dispatch!(object_id.object_type(),
            O => O::store_mut(&mut self.stores).remove(instance).map(|_| O::PACKAGE),
            _other => None);
        let Some(package) = package else {
            return Err(PropertyError::UnknownObject(object_id));
        };
        self.forget(package, instance);
        log::info!("deleted {object_id}");
        Ok(())
    }

    /// Removes every hosted object.
    pub fn cleanup(&mut self) {
        self.stores = Stores::default();
    }

    pub fn contains(&self, object_id: ObjectId) -> bool {
        dispatch!(object_id.object_type(),
            O => O::store(&self.stores).contains(object_id.instance()),
            _other => false)
    }

    /// Every hosted object, ordered by type then instance.
    pub fn object_list(&self) -> Vec<ObjectId> {
        let s = &self.stores;
        let mut list: Vec<ObjectId> = s
            .analog_outputs
            .values()
            .map(BacnetObject::object_id)
            .chain(s.binary_inputs.values().map(BacnetObject::object_id))
            .chain(s.binary_outputs.values().map(BacnetObject::object_id))
            .chain(s.multistate_inputs.values().map(BacnetObject::object_id))
            .chain(s.schedules.values().map(BacnetObject::object_id))
            .collect();
        list.sort();
        list
    }

    pub fn object_count(&self) -> usize {
        let s = &self.stores;
        s.analog_outputs.len()
            + s.binary_inputs.len()
            + s.binary_outputs.len()
            + s.multistate_inputs.len()
            + s.schedules.len()
    }

    pub fn find_object_by_name(&self, name: &str) -> Option<ObjectId> {
        fn find<O: BacnetObject>(store: &ObjectStore<O>, name: &str) -> Option<ObjectId> {
            store.values().find(|o| o.name() == name).map(O::object_id)
        }
        let s = &self.stores;
        find(&s.analog_outputs, name)
            .or_else(|| find(&s.binary_inputs, name))
            .or_else(|| find(&s.binary_outputs, name))
            .or_else(|| find(&s.multistate_inputs, name))
            .or_else(|| find(&s.schedules, name))
            .or_else(|| self.names.as_ref().and_then(|n| n.find_name(name)))
    }

    pub fn read_property(&self, request: &ReadPropertyData) -> Result<DataValue, PropertyError> {
        let instance = request.object_id.instance();
        dispatch!(request.object_id.object_type(),
            O => {
                let object = self.object::<O>(instance).ok_or_else(|| unknown::<O>(instance))?;
                read_object_property(object, request.property, request.array_index)
            },
            _other => Err(PropertyError::UnknownObject(request.object_id)))
    }

    /// ReadProperty with the value encoded as it goes on the wire.
    pub fn read_property_encoded(
        &self,
        request: &ReadPropertyData,
    ) -> Result<Vec<u8>, PropertyError> {
        Ok(encode_to_vec(&self.read_property(request)?)?)
    }

    /// WriteProperty. Object names must stay unique across the device; a
    /// commanded change is reported to the type's observer and persisted
    /// fields are pushed to the config store.
    pub fn write_property(&mut self, request: &WritePropertyData) -> Result<(), PropertyError> {
        if !self.contains(request.object_id) {
            return Err(PropertyError::UnknownObject(request.object_id));
        }
        if request.property == PropertyId::ObjectName {
            if let Ok(DataValue::CharacterString(name)) = request.decode_value() {
                match self.find_object_by_name(&name) {
                    Some(owner) if owner != request.object_id => {
                        return Err(PropertyError::DuplicateName(name));
                    }
                    _ => {}
                }
            }
        }
        dispatch!(request.object_id.object_type(),
            O => self.write_in::<O>(request),
            _other => Err(PropertyError::UnknownObject(request.object_id)))
    }

    fn write_in<O: HostedObject>(&mut self, request: &WritePropertyData) -> Result<(), PropertyError> {
        let instance = request.object_id.instance();
        let object = O::store_mut(&mut self.stores)
            .get_mut(instance)
            .ok_or_else(|| unknown::<O>(instance))?;
        let outcome = write_object_property(object, request)?;
        if let Some((old, new)) = &outcome.commanded {
            if let Some(observer) = O::observer(&mut self.observers) {
                observer.present_value_written(instance, old, new);
            }
        }
        self.persist(O::PACKAGE, instance, &outcome.persist);
        Ok(())
    }

    /// Pushes changes to the config store. Failures are logged only.
    fn persist(&mut self, package: &str, instance: u32, changes: &[ConfigChange]) {
        let Some(config) = self.config.as_deref_mut() else {
            return;
        };
        if changes.is_empty() {
            return;
        }
        let section = instance.to_string();
        for change in changes {
            if let Err(err) = config.apply(package, &section, change) {
                log::warn!("failed to persist {package}.{section}.{}: {err}", change.option);
            }
        }
        if let Err(err) = config.commit(package) {
            log::warn!("failed to commit {package}: {err}");
        }
    }

    /// Drops a deleted object's section. Failures are logged only.
    fn forget(&mut self, package: &str, instance: u32) {
        let Some(config) = self.config.as_deref_mut() else {
            return;
        };
        let section = instance.to_string();
        if let Err(err) = config.delete_section(package, &section) {
            log::warn!("failed to remove {package}.{section}: {err}");
        }
        if let Err(err) = config.commit(package) {
            log::warn!("failed to commit {package}: {err}");
        }
    }

    pub fn acknowledge_alarm(
        &mut self,
        object_id: ObjectId,
        event_state_acked: EventState,
        time_stamp: &TimeStamp,
    ) -> Result<(), PropertyError> {
        let instance = object_id.instance();
        dispatch!(object_id.object_type(),
            O => self
                .object_mut::<O>(instance)
                .ok_or_else(|| unknown::<O>(instance))?
                .acknowledge(event_state_acked, time_stamp),
            _other => Err(PropertyError::UnknownObject(object_id)))
    }

    /// Objects that are not NORMAL or still have unacknowledged transitions.
    pub fn event_summaries(&self) -> Vec<EventSummary> {
        fn collect<O: BacnetObject>(store: &ObjectStore<O>, out: &mut Vec<EventSummary>) {
            for object in store.values() {
                let Some(reporting) = object.reporting() else {
                    continue;
                };
                if reporting.event_state() == EventState::Normal
                    && !reporting.has_unacked_transitions()
                {
                    continue;
                }
                out.push(EventSummary {
                    object_id: object.object_id(),
                    event_state: reporting.event_state(),
                    acked_transitions: reporting.acked_transitions(),
                    event_time_stamps: *reporting.event_time_stamps(),
                    notify_type: reporting.notify_type(),
                    event_enable: reporting.event_enable,
                });
            }
        }
        let mut out = Vec::new();
        collect(&self.stores.binary_inputs, &mut out);
        collect(&self.stores.binary_outputs, &mut out);
        collect(&self.stores.multistate_inputs, &mut out);
        out
    }

    /// Evaluates every schedule at `now` and writes changed values to their
    /// references. Returns the number of writes issued.
    pub fn schedule_timer(&mut self, now: &DateTime) -> usize {
        let mut pending = Vec::new();
        for (instance, schedule) in self.stores.schedules.iter_mut() {
            if schedule.evaluate(now).is_none() {
                continue;
            }
            match schedule.write_requests() {
                Ok(writes) => pending.extend(writes),
                Err(err) => log::warn!("schedule {instance}: cannot encode write-back: {err}"),
            }
        }

        let mut issued = 0;
        for write in pending {
            let target = write.request.object_id;
            let property = write.request.property;
            let result = match write.device_id {
                Some(device) if device != self.device_id => {
                    match self.remote_writer.as_deref_mut() {
                        Some(writer) => writer.write_property(device, &write.request),
                        None => {
                            log::warn!("no remote writer, dropping {device} {target} {property}");
                            continue;
                        }
                    }
                }
                _ => self.write_property(&write.request),
            };
            issued += 1;
            if let Err(err) = result {
                log::warn!("schedule write to {target} {property} failed: {err}");
            }
        }
        issued
    }

    /// Runs one intrinsic reporting tick over every reporting object.
    pub fn intrinsic_reporting(&mut self, now: DateTime) -> Vec<EventNotification> {
        let mut reporter = DeviceReporter {
            device_id: self.device_id,
            inner: &mut *self.reporter,
        };
        let s = &mut self.stores;
        let mut notifications = Vec::new();
        for (_, object) in s.binary_inputs.iter_mut() {
            notifications.extend(object.intrinsic_reporting(now, &mut reporter));
        }
        for (_, object) in s.binary_outputs.iter_mut() {
            notifications.extend(object.intrinsic_reporting(now, &mut reporter));
        }
        for (_, object) in s.multistate_inputs.iter_mut() {
            notifications.extend(object.intrinsic_reporting(now, &mut reporter));
        }
        notifications
    }

    /// Objects with a change of value not yet reported.
    pub fn cov_pending(&self) -> Vec<ObjectId> {
        fn changed<O: BacnetObject>(store: &ObjectStore<O>) -> impl Iterator<Item = ObjectId> + '_ {
            store
                .values()
                .filter(|o| o.cov_changed())
                .map(O::object_id)
        }
        let s = &self.stores;
        changed(&s.analog_outputs)
            .chain(changed(&s.binary_inputs))
            .chain(changed(&s.binary_outputs))
            .chain(changed(&s.multistate_inputs))
            .chain(changed(&s.schedules))
            .collect()
    }

    pub fn cov_values(
        &self,
        object_id: ObjectId,
    ) -> Result<Vec<(PropertyId, DataValue)>, PropertyError> {
        let instance = object_id.instance();
        dispatch!(object_id.object_type(),
            O => Ok(self
                .object::<O>(instance)
                .ok_or_else(|| unknown::<O>(instance))?
                .cov_values()),
            _other => Err(PropertyError::UnknownObject(object_id)))
    }

    /// Marks the object's change of value as reported.
    pub fn cov_clear(&mut self, object_id: ObjectId) -> Result<(), PropertyError> {
        let instance = object_id.instance();
        dispatch!(object_id.object_type(),
            O => {
                self.object_mut::<O>(instance)
                    .ok_or_else(|| unknown::<O>(instance))?
                    .cov_clear();
                Ok(())
            },
            _other => Err(PropertyError::UnknownObject(object_id)))
    }

    /// Loads every object section from `store`, replacing objects with the
    /// same instance. Returns the number of objects loaded.
    pub fn load_config(&mut self, store: &dyn ConfigStore) -> Result<usize, ConfigError> {
        let s = &mut self.stores;
        Ok(load_into(&mut s.analog_outputs, store)?
            + load_into(&mut s.binary_inputs, store)?
            + load_into(&mut s.binary_outputs, store)?
            + load_into(&mut s.multistate_inputs, store)?
            + load_into(&mut s.schedules, store)?)
    }

    /// Loads objects from the device's own config store.
    pub fn load_persisted(&mut self) -> Result<usize, ConfigError> {
        let Some(config) = self.config.as_deref() else {
            return Ok(0);
        };
        let s = &mut self.stores;
        Ok(load_into(&mut s.analog_outputs, config)?
            + load_into(&mut s.binary_inputs, config)?
            + load_into(&mut s.binary_outputs, config)?
            + load_into(&mut s.multistate_inputs, config)?
            + load_into(&mut s.schedules, config)?)
    }
}
