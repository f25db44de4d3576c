//! Services for the on-chip and external peripherals used by the printer.
//!
//! Every `use_*` function takes the tagged object at `key` of `node` and the
//! `user`, the expression through which the generated code reaches the
//! object owning the service. The user is what the interrupt bindings of the
//! service are attached to.

use crate::compiler::{
    config::ConfigNode,
    error::{ConfigError, ConfigResult},
    expr::Expr,
    pattern::is_avr_wdto,
    registry::Registry,
};

use super::{get_pin, BoardSelection};

const SPI_DEVICES: &[(&str, &str)] = &[
    ("At91Sam3xSpiDevice", "AMBRO_AT91SAM3X_SPI_GLOBAL"),
    ("At91Sam3uSpiDevice", "AMBRO_AT91SAM3U_SPI_GLOBAL"),
];

const I2C_DEVICES: &[(&str, i64)] = &[("At91SamI2cDevice1", 1)];

/// Looks up the device named at `Device` in one of the device tables.
fn lookup_device<'doc, V: Copy>(
    node: &ConfigNode<'doc>,
    devices: &[(&str, V)],
    what: &str,
) -> ConfigResult<(&'doc str, V)> {
    let dev = node.get_identifier("Device")?;
    match devices.iter().find(|(name, _)| *name == dev) {
        Some((_, value)) => Ok((dev, *value)),
        None => node.error(ConfigError::Invalid(format!("Incorrect {} device", what))),
    }
}

pub fn setup_watchdog<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
    user: &str,
) -> ConfigResult<Expr> {
    let sel = BoardSelection::<Expr>::new()
        .option("At91SamWatchdog", |reg, watchdog| {
            reg.emit().add_framework_include("system/At91SamWatchdog.h");
            Ok(Expr::inst(
                "At91SamWatchdogService",
                vec![watchdog.get_int("Wdv")?.into()],
            ))
        })
        .option("Mk20Watchdog", |reg, watchdog| {
            reg.emit().add_framework_include("system/Mk20Watchdog.h");
            reg.emit()
                .add_isr(&format!("AMBRO_MK20_WATCHDOG_GLOBAL({})", user));
            Ok(Expr::inst(
                "Mk20WatchdogService",
                vec![
                    watchdog.get_int("Toval")?.into(),
                    watchdog.get_int("Prescval")?.into(),
                ],
            ))
        })
        .option("AvrWatchdog", |reg, watchdog| {
            let wdto = watchdog.get_string("Timeout")?;
            if !is_avr_wdto(wdto) {
                return watchdog.key_error(
                    "Timeout",
                    ConfigError::FormatError("expected a WDTO_* constant".into()),
                );
            }
            reg.emit().add_framework_include("system/AvrWatchdog.h");
            reg.emit().add_isr("AMBRO_AVR_WATCHDOG_GLOBAL");
            Ok(Expr::inst("AvrWatchdogService", vec![wdto.into()]))
        });

    node.do_selection(key, reg, sel)
}

pub fn use_spi<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
    user: &str,
) -> ConfigResult<Expr> {
    let sel = BoardSelection::<Expr>::new()
        .option("At91SamSpi", |reg, spi| {
            reg.emit().add_framework_include("system/At91SamSpi.h");
            let (dev, isr_macro) = lookup_device(spi, SPI_DEVICES, "SPI")?;
            reg.emit()
                .add_isr(&format!("{}({}, MyContext())", isr_macro, user));
            Ok(Expr::inst("At91SamSpiService", vec![dev.into()]))
        })
        .option("AvrSpi", |reg, spi| {
            reg.emit().add_framework_include("system/AvrSpi.h");
            reg.emit()
                .add_isr(&format!("AMBRO_AVR_SPI_ISRS({}, MyContext())", user));
            Ok(Expr::inst(
                "AvrSpiService",
                vec![spi.get_int("SpeedDiv")?.into()],
            ))
        });

    node.do_selection(key, reg, sel)
}

/// Like the other services, but the I2C bus also declares its bus frequency
/// as the constant `{username}I2cFreq`.
pub fn use_i2c<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
    user: &str,
    username: &str,
) -> ConfigResult<Expr> {
    let sel = BoardSelection::<Expr>::new().option("At91SamI2c", |reg, i2c| {
        reg.emit().add_framework_include("system/At91SamI2c.h");
        let (dev, index) = lookup_device(i2c, I2C_DEVICES, "I2C")?;
        reg.emit().add_isr(&format!(
            "AMBRO_AT91SAM_I2C_GLOBAL({}, {}, MyContext())",
            index, user
        ));
        Ok(Expr::inst(
            "At91SamI2cService",
            vec![
                dev.into(),
                i2c.get_int("Ckdiv")?.into(),
                reg.emit()
                    .add_float_constant(&format!("{}I2cFreq", username), i2c.get_float("I2cFreq")?)
                    .into(),
            ],
        ))
    });

    node.do_selection(key, reg, sel)
}

pub fn use_eeprom<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
    user: &str,
) -> ConfigResult<Expr> {
    let sel = BoardSelection::<Expr>::new()
        .option("I2cEeprom", |reg, eeprom| {
            reg.emit().add_framework_include("devices/I2cEeprom.h");
            Ok(Expr::inst(
                "I2cEepromService",
                vec![
                    use_i2c(
                        reg,
                        eeprom,
                        "I2c",
                        &format!("{}::GetI2c", user),
                        "ConfigEeprom",
                    )?,
                    eeprom.get_int("I2cAddr")?.into(),
                    eeprom.get_int("Size")?.into(),
                    eeprom.get_int("BlockSize")?.into(),
                    reg.emit()
                        .add_float_constant(
                            "ConfigEepromWriteTimeout",
                            eeprom.get_float("WriteTimeout")?,
                        )
                        .into(),
                ],
            ))
        })
        .option("TeensyEeprom", |reg, eeprom| {
            reg.emit().add_framework_include("system/TeensyEeprom.h");
            Ok(Expr::inst(
                "TeensyEepromService",
                vec![
                    eeprom.get_int("Size")?.into(),
                    eeprom.get_int("FakeBlockSize")?.into(),
                ],
            ))
        })
        .option("AvrEeprom", |reg, eeprom| {
            reg.emit().add_framework_include("system/AvrEeprom.h");
            reg.emit()
                .add_isr(&format!("AMBRO_AVR_EEPROM_ISRS({}, MyContext())", user));
            Ok(Expr::inst(
                "AvrEepromService",
                vec![eeprom.get_int("FakeBlockSize")?.into()],
            ))
        });

    node.do_selection(key, reg, sel)
}

pub fn use_serial<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
    user: &str,
) -> ConfigResult<Expr> {
    let sel = BoardSelection::<Expr>::new()
        .option("AsfUsbSerial", |reg, _| {
            reg.emit().add_framework_include("system/AsfUsbSerial.h");
            reg.emit().add_init_call(0, "udc_start();");
            Ok("AsfUsbSerialService".into())
        })
        .option("At91Sam3xSerial", |reg, _| {
            let emit = reg.emit();
            emit.add_framework_include("system/At91Sam3xSerial.h");
            emit.add_framework_include("system/NewlibDebugWrite.h");
            emit.add_isr(&format!(
                "AMBRO_AT91SAM3X_SERIAL_GLOBAL({}, MyContext())",
                user
            ));
            emit.add_global_code(
                0,
                &format!(
                    "APRINTER_SETUP_NEWLIB_DEBUG_WRITE(At91Sam3xSerial_DebugWrite<{}>, MyContext())",
                    user
                ),
            );
            Ok("At91Sam3xSerialService".into())
        })
        .option("TeensyUsbSerial", |reg, _| {
            let emit = reg.emit();
            emit.add_framework_include("system/TeensyUsbSerial.h");
            emit.add_global_code(0, "extern \"C\" { void usb_init (void); }");
            emit.add_init_call(0, "usb_init();");
            Ok("TeensyUsbSerialService".into())
        })
        .option("AvrSerial", |reg, serial| {
            let emit = reg.emit();
            emit.add_framework_include("system/AvrSerial.h");
            emit.add_framework_include("system/AvrDebugWrite.h");
            emit.add_isr(&format!("AMBRO_AVR_SERIAL_ISRS({}, MyContext())", user));
            emit.add_global_code(
                0,
                &format!(
                    "APRINTER_SETUP_AVR_DEBUG_WRITE(AvrSerial_DebugPutChar<{}>, MyContext())",
                    user
                ),
            );
            emit.add_init_call(-2, "aprinter_init_avr_debug_write();");
            Ok(Expr::inst(
                "AvrSerialService",
                vec![serial.get_bool("DoubleSpeed")?.into()],
            ))
        });

    node.do_selection(key, reg, sel)
}

pub fn use_sdcard<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
    user: &str,
) -> ConfigResult<Expr> {
    let sel = BoardSelection::<Expr>::new().option("SpiSdCard", |reg, spi_sd| {
        reg.emit().add_framework_include("devices/SpiSdCard.h");
        Ok(Expr::inst(
            "SpiSdCardService",
            vec![
                get_pin(reg, spi_sd, "SsPin")?.into(),
                use_spi(reg, spi_sd, "SpiService", &format!("{}::GetSpi", user))?,
            ],
        ))
    });

    node.do_selection(key, reg, sel)
}

/// The configuration manager, which either bakes the configuration options
/// in as constants or keeps them in RAM, optionally backed by an EEPROM.
pub fn use_config_manager<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
    user: &str,
) -> ConfigResult<Expr> {
    let sel = BoardSelection::<Expr>::new()
        .option("ConstantConfigManager", |reg, _| {
            reg.emit()
                .add_framework_include("printer/config_manager/ConstantConfigManager.h");
            Ok("ConstantConfigManagerService".into())
        })
        .option("RuntimeConfigManager", |reg, manager| {
            reg.emit()
                .add_framework_include("printer/config_manager/RuntimeConfigManager.h");

            let stores = BoardSelection::<Expr>::new()
                .option("NoStore", |_, _| Ok("RuntimeConfigManagerNoStoreService".into()))
                .option("EepromConfigStore", |reg, store| {
                    reg.emit()
                        .add_framework_include("printer/config_store/EepromConfigStore.h");
                    Ok(Expr::inst(
                        "EepromConfigStoreService",
                        vec![
                            use_eeprom(
                                reg,
                                store,
                                "Eeprom",
                                &format!("{}::GetStore<>::GetEeprom", user),
                            )?,
                            store.get_int("StartBlock")?.into(),
                            store.get_int("EndBlock")?.into(),
                        ],
                    ))
                });

            Ok(Expr::inst(
                "RuntimeConfigManagerService",
                vec![manager.do_selection("ConfigStore", reg, stores)?],
            ))
        });

    node.do_selection(key, reg, sel)
}
