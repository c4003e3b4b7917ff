//! Board support layer: fixed tables of sensor instances addressed by index.
//!
//! Every slot holds a driver behind its trait object plus the mask of
//! functions the component reported at probe time. Operations on a function
//! outside that mask are rejected before the driver is touched.

pub mod env;
pub mod motion;

pub use env::EnvSensors;
pub use motion::MotionSensors;

use crate::errors::{BspError, BspResult};

struct Slot<S: ?Sized> {
    sensor: Box<S>,
    /// Factory name the slot was created from
    driver: &'static str,
    functions: u32,
}

struct InstanceTable<S: ?Sized> {
    slots: Vec<Option<Slot<S>>>,
}

impl<S: ?Sized> InstanceTable<S> {
    fn new(instances: usize) -> Self {
        Self {
            slots: (0..instances).map(|_| None).collect(),
        }
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn check_range(&self, instance: usize) -> BspResult<()> {
        if instance < self.slots.len() {
            Ok(())
        } else {
            Err(BspError::WrongParam)
        }
    }

    fn slot(&self, instance: usize) -> BspResult<&Slot<S>> {
        self.slots
            .get(instance)
            .ok_or(BspError::WrongParam)?
            .as_ref()
            .ok_or(BspError::NoInit)
    }

    fn slot_mut(&mut self, instance: usize) -> BspResult<&mut Slot<S>> {
        self.slots
            .get_mut(instance)
            .ok_or(BspError::WrongParam)?
            .as_mut()
            .ok_or(BspError::NoInit)
    }

    /// Sensor of an initialized slot whose mask covers `function`
    fn sensor_for(&mut self, instance: usize, function: u32) -> BspResult<&mut S> {
        let slot = self.slot_mut(instance)?;
        if slot.functions & function != function {
            return Err(BspError::WrongParam);
        }
        Ok(&mut *slot.sensor)
    }

    fn install(&mut self, instance: usize, slot: Slot<S>) {
        if let Some(entry) = self.slots.get_mut(instance) {
            *entry = Some(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_table_lookups() {
        let mut table: InstanceTable<str> = InstanceTable::new(2);
        assert_eq!(table.len(), 2);
        assert!(matches!(table.slot(0), Err(BspError::NoInit)));
        assert!(matches!(table.slot(2), Err(BspError::WrongParam)));

        table.install(
            1,
            Slot {
                sensor: Box::from("acc"),
                driver: "lis2dw12",
                functions: 0x02,
            },
        );
        assert!(table.sensor_for(1, 0x02).is_ok());
        assert!(matches!(table.sensor_for(1, 0x01), Err(BspError::WrongParam)));
        assert!(table.check_range(1).is_ok());
        assert!(table.check_range(5).is_err());
    }
}
