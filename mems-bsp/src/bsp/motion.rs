use tracing::{debug, info, warn};

use super::{InstanceTable, Slot};
use crate::bus::BusIo;
use crate::drivers::{
    find_factory, Axes, AxesRaw, Component, ComponentFactory, MotionCapabilities, MotionFunction, MotionSensor,
};
use crate::errors::{BspError, BspResult};

/// Motion sensor instances (accelerometers, gyroscopes, magnetometers)
pub struct MotionSensors {
    table: InstanceTable<dyn MotionSensor>,
}

impl MotionSensors {
    pub fn new(instances: usize) -> Self {
        Self {
            table: InstanceTable::new(instances),
        }
    }

    pub fn instances(&self) -> usize {
        self.table.len()
    }

    /// Probe the component by driver name and enable the requested functions
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

        let mut slot = match probe(factory, io, functions) {
            Ok(slot) => slot,
            Err(e) => {
                warn!("[bsp] motion {} probe of {} failed: {}", instance, factory.name(), e);
                return Err(BspError::NoInit);
            }
        };

        let caps = slot.sensor.capabilities();
        for function in MotionFunction::from_mask(functions) {
            if function.is_supported_by(&caps) {
                slot.sensor.enable(function).map_err(|_| BspError::ComponentFailure)?;
            }
        }

        info!(
            "[bsp] motion {} ready: {} functions={:#x}",
            instance,
            factory.name(),
            slot.functions
        );
        self.table.install(instance, slot);
        Ok(())
    }

    pub fn deinit(&mut self, instance: usize) -> BspResult<()> {
        let slot = self.table.slot_mut(instance)?;
        slot.sensor.deinit().map_err(|_| BspError::ComponentFailure)?;
        debug!("[bsp] motion {} deinitialized", instance);
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

    /// Function mask recorded when the instance was probed
    pub fn functions(&self, instance: usize) -> BspResult<u32> {
        Ok(self.table.slot(instance)?.functions)
    }

    pub fn read_id(&mut self, instance: usize) -> BspResult<u8> {
        let slot = self.table.slot_mut(instance)?;
        slot.sensor.read_id().map_err(|_| BspError::UnknownComponent)
    }

    pub fn capabilities(&self, instance: usize) -> BspResult<MotionCapabilities> {
        Ok(self.table.slot(instance)?.sensor.capabilities())
    }

    pub fn enable(&mut self, instance: usize, function: MotionFunction) -> BspResult<()> {
        Ok(self.sensor(instance, function)?.enable(function)?)
    }

    pub fn disable(&mut self, instance: usize, function: MotionFunction) -> BspResult<()> {
        Ok(self.sensor(instance, function)?.disable(function)?)
    }

    pub fn axes(&mut self, instance: usize, function: MotionFunction) -> BspResult<Axes> {
        Ok(self.sensor(instance, function)?.axes(function)?)
    }

    pub fn axes_raw(&mut self, instance: usize, function: MotionFunction) -> BspResult<AxesRaw> {
        Ok(self.sensor(instance, function)?.axes_raw(function)?)
    }

    pub fn sensitivity(&mut self, instance: usize, function: MotionFunction) -> BspResult<f32> {
        Ok(self.sensor(instance, function)?.sensitivity(function)?)
    }

    pub fn output_data_rate(&mut self, instance: usize, function: MotionFunction) -> BspResult<f32> {
        Ok(self.sensor(instance, function)?.output_data_rate(function)?)
    }

    pub fn set_output_data_rate(&mut self, instance: usize, function: MotionFunction, odr: f32) -> BspResult<()> {
        Ok(self.sensor(instance, function)?.set_output_data_rate(function, odr)?)
    }

    pub fn full_scale(&mut self, instance: usize, function: MotionFunction) -> BspResult<i32> {
        Ok(self.sensor(instance, function)?.full_scale(function)?)
    }

    pub fn set_full_scale(&mut self, instance: usize, function: MotionFunction, full_scale: i32) -> BspResult<()> {
        Ok(self.sensor(instance, function)?.set_full_scale(function, full_scale)?)
    }

    pub fn drdy_status(&mut self, instance: usize, function: MotionFunction) -> BspResult<bool> {
        Ok(self.sensor(instance, function)?.drdy_status(function)?)
    }

    pub fn read_register(&mut self, instance: usize, reg: u8) -> BspResult<u8> {
        Ok(self.table.slot_mut(instance)?.sensor.read_register(reg)?)
    }

    pub fn write_register(&mut self, instance: usize, reg: u8, value: u8) -> BspResult<()> {
        Ok(self.table.slot_mut(instance)?.sensor.write_register(reg, value)?)
    }

    fn sensor(&mut self, instance: usize, function: MotionFunction) -> BspResult<&mut (dyn MotionSensor + 'static)> {
        self.table.sensor_for(instance, function.mask())
    }
}

/// Create the component, check its identity and run the driver init.
///
/// The returned slot carries the full capability mask, not just the
/// requested functions.
fn probe(factory: &dyn ComponentFactory, io: BusIo, functions: u32) -> BspResult<Slot<dyn MotionSensor>> {
    let mut sensor = match factory.create(io) {
        Ok(Component::Motion(sensor)) => sensor,
        Ok(Component::Env(_)) | Err(_) => return Err(BspError::UnknownComponent),
    };

    let id = sensor.read_id().map_err(|_| BspError::UnknownComponent)?;
    if id != factory.id() {
        debug!("[bsp] {} answered {:#04x}, expected {:#04x}", factory.name(), id, factory.id());
        return Err(BspError::UnknownComponent);
    }

    let caps = sensor.capabilities();
    let supported = MotionFunction::ALL
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::{FakeRegisters, FakeSpi, NoopDelay};
    use crate::bus::BusType;

    const ACC: u32 = 2;
    const GYRO_ACC: u32 = 3;

    fn lis2dw12_io(fake: &FakeRegisters) -> BusIo {
        BusIo::i2c(fake.clone(), 0x19, NoopDelay)
    }

    fn board_with_lis2dw12() -> (MotionSensors, FakeRegisters) {
        let fake = FakeRegisters::new().with(0x0F, 0x44);
        let mut sensors = MotionSensors::new(2);
        sensors.init_by_name(0, "lis2dw12", lis2dw12_io(&fake), ACC).unwrap();
        (sensors, fake)
    }

    #[test]
    fn test_init_enables_requested_functions() {
        let (mut sensors, _fake) = board_with_lis2dw12();

        assert_eq!(sensors.name(0).unwrap(), "LIS2DW12");
        assert_eq!(sensors.driver(0).unwrap(), "lis2dw12");
        assert_eq!(sensors.functions(0).unwrap(), ACC);
        assert_eq!(sensors.read_id(0).unwrap(), 0x44);
        assert_eq!(sensors.output_data_rate(0, MotionFunction::Accelero).unwrap(), 100.0);
        assert!(sensors.capabilities(0).unwrap().acc);
    }

    #[test]
    fn test_three_wire_spi_part_switches_wiring_before_id_check() {
        let fake = FakeRegisters::new().with(0x0F, 0x44);
        // SIM is CTRL2 bit 0; until it is set the part does not drive SDI
        let spi = FakeSpi::three_wires(fake.clone(), 0x21, 0x01);
        let mut sensors = MotionSensors::new(1);

        sensors
            .init_by_name(0, "lis2dw12", BusIo::spi(spi, BusType::Spi3Wires, NoopDelay), ACC)
            .unwrap();

        assert_eq!(fake.writes()[0], (0x21, 0x05));
        assert_eq!(fake.get(0x21) & 0x01, 0x01);
        assert_eq!(sensors.read_id(0).unwrap(), 0x44);
        assert_eq!(sensors.output_data_rate(0, MotionFunction::Accelero).unwrap(), 100.0);
    }

    #[test]
    fn test_four_wire_spi_part_needs_no_wiring_change() {
        let fake = FakeRegisters::new().with(0x0F, 0x44);
        let mut sensors = MotionSensors::new(1);

        sensors
            .init_by_name(0, "lis2dw12", BusIo::spi(FakeSpi::new(fake.clone()), BusType::Spi4Wires, NoopDelay), ACC)
            .unwrap();

        assert_eq!(fake.get(0x21) & 0x01, 0x00);
        assert_eq!(sensors.read_id(0).unwrap(), 0x44);
    }

    #[test]
    fn test_init_rejects_wrong_chip() {
        let fake = FakeRegisters::new().with(0x0F, 0x6C);
        let mut sensors = MotionSensors::new(1);

        let err = sensors.init_by_name(0, "lis2dw12", lis2dw12_io(&fake), ACC).unwrap_err();
        assert_eq!(err, BspError::NoInit);
        assert_eq!(sensors.read_id(0).unwrap_err(), BspError::NoInit);

        let factory = find_factory("lis2dw12").unwrap();
        let err = probe(factory, lis2dw12_io(&fake), ACC).err();
        assert_eq!(err, Some(BspError::UnknownComponent));
    }

    #[test]
    fn test_probe_fails_for_unsupported_function() {
        let fake = FakeRegisters::new().with(0x0F, 0x44);
        let factory = find_factory("lis2dw12").unwrap();
        let err = probe(factory, lis2dw12_io(&fake), GYRO_ACC).err();
        assert_eq!(err, Some(BspError::ComponentFailure));

        let mut sensors = MotionSensors::new(1);
        let err = sensors.init(0, factory, lis2dw12_io(&fake), GYRO_ACC).unwrap_err();
        assert_eq!(err, BspError::NoInit);
    }

    #[test]
    fn test_parameter_errors() {
        let (mut sensors, _fake) = board_with_lis2dw12();
        let fake = FakeRegisters::new().with(0x0F, 0x44);

        assert_eq!(sensors.enable(5, MotionFunction::Accelero).unwrap_err(), BspError::WrongParam);
        assert_eq!(sensors.enable(0, MotionFunction::Gyro).unwrap_err(), BspError::WrongParam);
        assert_eq!(sensors.enable(1, MotionFunction::Accelero).unwrap_err(), BspError::NoInit);
        assert_eq!(
            sensors.init_by_name(1, "bmi270", lis2dw12_io(&fake), ACC).unwrap_err(),
            BspError::WrongParam
        );
        assert_eq!(
            sensors.init_by_name(2, "lis2dw12", lis2dw12_io(&fake), ACC).unwrap_err(),
            BspError::WrongParam
        );
    }

    #[test]
    fn test_bus_failures_become_component_failures() {
        let (mut sensors, fake) = board_with_lis2dw12();
        fake.fail(true);

        assert_eq!(sensors.axes(0, MotionFunction::Accelero).unwrap_err(), BspError::ComponentFailure);
        assert_eq!(sensors.read_register(0, 0x20).unwrap_err(), BspError::ComponentFailure);
        assert_eq!(sensors.read_id(0).unwrap_err(), BspError::UnknownComponent);
        assert_eq!(sensors.deinit(0).unwrap_err(), BspError::ComponentFailure);
    }

    #[test]
    fn test_axes_follow_sensitivity() {
        let (mut sensors, fake) = board_with_lis2dw12();
        // 14-bit left-justified samples, high-performance mode at +-2 g
        fake.set_bytes(0x28, &[0x00, 0x10, 0x00, 0xF0, 0x00, 0x00]);

        let raw = sensors.axes_raw(0, MotionFunction::Accelero).unwrap();
        assert_eq!(raw, AxesRaw { x: 1024, y: -1024, z: 0 });

        let sensitivity = sensors.sensitivity(0, MotionFunction::Accelero).unwrap();
        let axes = sensors.axes(0, MotionFunction::Accelero).unwrap();
        assert_eq!(axes, raw.scale(sensitivity));
        assert_eq!(axes.x, 249);
    }

    #[test]
    fn test_full_scale_and_register_passthrough() {
        let (mut sensors, fake) = board_with_lis2dw12();

        sensors.set_full_scale(0, MotionFunction::Accelero, 5).unwrap();
        assert_eq!(sensors.full_scale(0, MotionFunction::Accelero).unwrap(), 8);

        sensors.write_register(0, 0x2E, 0x20).unwrap();
        assert_eq!(fake.get(0x2E), 0x20);
        assert_eq!(sensors.read_register(0, 0x0F).unwrap(), 0x44);
    }

    #[test]
    fn test_lsm6dsox_exposes_both_functions() {
        let fake = FakeRegisters::new().with(0x0F, 0x6C);
        let mut sensors = MotionSensors::new(1);
        sensors
            .init_by_name(0, "lsm6dsox", BusIo::i2c(fake.clone(), 0x6B, NoopDelay), GYRO_ACC)
            .unwrap();

        assert_eq!(sensors.functions(0).unwrap(), GYRO_ACC);
        assert!(sensors.output_data_rate(0, MotionFunction::Gyro).unwrap() > 0.0);
        assert!(sensors.output_data_rate(0, MotionFunction::Accelero).unwrap() > 0.0);
        assert_eq!(sensors.enable(0, MotionFunction::Magneto).unwrap_err(), BspError::WrongParam);
    }
}
