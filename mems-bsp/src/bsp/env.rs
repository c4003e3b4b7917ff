use tracing::{debug, info, warn};

use super::{InstanceTable, Slot};
use crate::bus::BusIo;
use crate::drivers::{find_factory, Component, ComponentFactory, EnvCapabilities, EnvFunction, EnvSensor};
use crate::errors::{BspError, BspResult};

/// Environmental sensor instances (temperature, pressure, humidity, gas)
pub struct EnvSensors {
    table: InstanceTable<dyn EnvSensor>,
}

impl EnvSensors {
    pub fn new(instances: usize) -> Self {
        Self {
            table: InstanceTable::new(instances),
        }
    }

    pub fn instances(&self) -> usize {
        self.table.len()
    }

    pub fn init_by_name(&mut self, instance: usize, driver: &str, io: BusIo, functions: u32) -> BspResult<()> {
        let factory = find_factory(driver).ok_or(BspError::WrongParam)?;
        self.init(instance, factory, io, functions)
    }

    pub fn init(
        &mut self,
        instance: usize,
        factory: &dyn ComponentFactory,
        io: BusIo,
        functions: u32,
    ) -> BspResult<()> {
        self.table.check_range(instance)?;

        let mut slot = probe(factory, io, functions).map_err(|e| {
            warn!("[bsp] env {} probe of {} failed: {}", instance, factory.name(), e);
            BspError::NoInit
        })?;

        let caps = slot.sensor.capabilities();
        for function in EnvFunction::from_mask(functions).filter(|f| f.is_supported_by(&caps)) {
            slot.sensor.enable(function).map_err(|_| BspError::ComponentFailure)?;
        }

        info!("[bsp] env {} ready: {} functions={:#x}", instance, factory.name(), slot.functions);
        self.table.install(instance, slot);
        Ok(())
    }

    pub fn deinit(&mut self, instance: usize) -> BspResult<()> {
        let slot = self.table.slot_mut(instance)?;
        slot.sensor.deinit().map_err(|_| BspError::ComponentFailure)?;
        debug!("[bsp] env {} deinitialized", instance);
        Ok(())
    }

    /// Part number reported by the driver, e.g. `LPS22DF`
    pub fn name(&self, instance: usize) -> BspResult<&'static str> {
        Ok(self.table.slot(instance)?.sensor.name())
    }

    /// Driver name the instance was created with, e.g. `lps22df`
    pub fn driver(&self, instance: usize) -> BspResult<&'static str> {
        Ok(self.table.slot(instance)?.driver)
    }

    pub fn functions(&self, instance: usize) -> BspResult<u32> {
        Ok(self.table.slot(instance)?.functions)
    }

    pub fn read_id(&mut self, instance: usize) -> BspResult<u8> {
        let slot = self.table.slot_mut(instance)?;
        slot.sensor.read_id().map_err(|_| BspError::UnknownComponent)
    }

    pub fn capabilities(&self, instance: usize) -> BspResult<EnvCapabilities> {
        Ok(self.table.slot(instance)?.sensor.capabilities())
    }

    pub fn enable(&mut self, instance: usize, function: EnvFunction) -> BspResult<()> {
        Ok(self.sensor(instance, function)?.enable(function)?)
    }

    pub fn disable(&mut self, instance: usize, function: EnvFunction) -> BspResult<()> {
        Ok(self.sensor(instance, function)?.disable(function)?)
    }

    pub fn output_data_rate(&mut self, instance: usize, function: EnvFunction) -> BspResult<f32> {
        Ok(self.sensor(instance, function)?.output_data_rate(function)?)
    }

    pub fn set_output_data_rate(&mut self, instance: usize, function: EnvFunction, odr: f32) -> BspResult<()> {
        Ok(self.sensor(instance, function)?.set_output_data_rate(function, odr)?)
    }

    /// Measurement in °C, hPa or %RH
    pub fn value(&mut self, instance: usize, function: EnvFunction) -> BspResult<f32> {
        Ok(self.sensor(instance, function)?.value(function)?)
    }

    pub fn drdy_status(&mut self, instance: usize, function: EnvFunction) -> BspResult<bool> {
        Ok(self.sensor(instance, function)?.drdy_status(function)?)
    }

    pub fn read_register(&mut self, instance: usize, reg: u8) -> BspResult<u8> {
        Ok(self.table.slot_mut(instance)?.sensor.read_register(reg)?)
    }

    pub fn write_register(&mut self, instance: usize, reg: u8, value: u8) -> BspResult<()> {
        Ok(self.table.slot_mut(instance)?.sensor.write_register(reg, value)?)
    }

    fn sensor(&mut self, instance: usize, function: EnvFunction) -> BspResult<&mut (dyn EnvSensor + 'static)> {
        self.table.sensor_for(instance, function.mask())
    }
}

fn probe(factory: &dyn ComponentFactory, io: BusIo, functions: u32) -> BspResult<Slot<dyn EnvSensor>> {
    let mut sensor = match factory.create(io) {
        Ok(Component::Env(sensor)) => sensor,
        Ok(Component::Motion(_)) | Err(_) => return Err(BspError::UnknownComponent),
    };

    let id = sensor.read_id().map_err(|_| BspError::UnknownComponent)?;
    if id != factory.id() {
        debug!("[bsp] {} answered {:#04x}, expected {:#04x}", factory.name(), id, factory.id());
        return Err(BspError::UnknownComponent);
    }

    let caps = sensor.capabilities();
    let supported = EnvFunction::ALL
        .into_iter()
        .filter(|f| f.is_supported_by(&caps))
        .fold(0, |mask, f| mask | f.mask());

    if functions & supported != 0 {
        sensor.init().map_err(|_| BspError::ComponentFailure)?;
    }
    if functions & !supported != 0 {
        return Err(BspError::ComponentFailure);
    }

    Ok(Slot {
        sensor,
        driver: factory.name(),
        functions: supported,
    })
}
