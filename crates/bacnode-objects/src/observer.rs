//! Collaborators the device context is wired to.

use crate::property::WritePropertyData;
use crate::reporting::EventNotification;
use crate::PropertyError;
use bacnode_core::types::ObjectId;

/// Observes commanded present-value changes of one object type, typically
/// to drive physical outputs. Not called while the object is out of service.
pub trait PresentValueObserver<T> {
    fn present_value_written(&mut self, instance: u32, old: &T, new: &T);
}

impl<T, F> PresentValueObserver<T> for F
where
    F: FnMut(u32, &T, &T),
{
    fn present_value_written(&mut self, instance: u32, old: &T, new: &T) {
        self(instance, old, new)
    }
}

/// Notification-class delivery. Implementations fill in the priority and
/// ack-required fields for the notification's class and send it.
pub trait NotificationClassReporter {
    fn report(&mut self, notification: &mut EventNotification);
}

/// Device-wide object name lookup for names hosted outside this device
/// context (for example the device object itself).
pub trait NameRegistry {
    fn find_name(&self, name: &str) -> Option<ObjectId>;
}

/// Writes a schedule's value to a property on another device.
pub trait DeviceWriter {
    fn write_property(
        &mut self,
        device: ObjectId,
        request: &WritePropertyData,
    ) -> Result<(), PropertyError>;
}
