#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use crate::compiler::{
        board::OutputType,
        compile,
        error::ConfigError,
        generate,
        registry::{ObjectKind, SlotMap},
        template::TemplateError,
        GenerateError,
    };
    use crate::io::MAIN_TEMPLATE;

    const SAMPLE: &str = include_str!("../../configs/avr_sample.json");

    fn sample() -> Value {
        serde_json::from_str(SAMPLE).unwrap()
    }

    fn squash(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn slot<'s>(slots: &'s SlotMap, name: &str) -> &'s str {
        slots.get(name).unwrap()
    }

    /// The smallest document which compiles: an AVR board with one digital
    /// input and one stepper port, driving a single stepper.
    fn minimal() -> Value {
        json!({
            "selected_config": "main",
            "configurations": [{
                "name": "main",
                "board": "tiny",
                "InactiveTime": 60,
                "advanced": {"LedBlinkInterval": 0.5, "ForceTimeout": 0.1},
                "probe_config": {"probe": {"_compoundName": "NoProbe"}},
                "steppers": [{
                    "Name": "X",
                    "stepper_port": "X",
                    "InvertDir": false,
                    "StepsPerUnit": 80,
                    "MinPos": 0,
                    "MaxPos": 200,
                    "MaxSpeed": 300,
                    "MaxAccel": 1500,
                    "DistanceFactor": 1,
                    "CorneringDistance": 40,
                    "EnableCartesianSpeedLimit": true,
                    "homing": {"_compoundName": "no_homing"}
                }],
                "heaters": [],
                "transform": {"_compoundName": "NoTransform"},
                "fans": []
            }],
            "boards": [{
                "name": "tiny",
                "platform_config": {
                    "board_for_build": "tiny_board",
                    "output_type": "bin",
                    "board_helper_includes": [],
                    "platform": {
                        "_compoundName": "AVR ATmega1284p",
                        "clock": {
                            "_compoundName": "AvrClock",
                            "PrescaleDivide": 64,
                            "primary_timer": "TC1",
                            "timers": []
                        },
                        "pins": {"_compoundName": "AvrPins"},
                        "watchdog": {"_compoundName": "AvrWatchdog", "Timeout": "WDTO_2S"},
                        "adc": {"_compoundName": "AvrAdc", "RefSel": 1, "Prescaler": 7}
                    }
                },
                "LedPin": "AvrPin<AvrPortB,7>",
                "EventChannelTimer": {"oc_unit": "TC1_B"},
                "performance": {
                    "AxisDriverPrecisionParams": "AxisDriverAvrPrecisionParams",
                    "EventChannelTimerClearance": 0.002,
                    "MaxStepsPerCycle": 0.00137,
                    "StepperSegmentBufferSize": 10,
                    "EventChannelBufferSize": 15,
                    "LookaheadBufferSize": 15,
                    "LookaheadCommitCount": 8,
                    "FpType": "float"
                },
                "serial": {
                    "BaudRate": 115200,
                    "RecvBufferSizeExp": 7,
                    "SendBufferSizeExp": 7,
                    "GcodeMaxParts": 16,
                    "Service": {"_compoundName": "AvrSerial", "DoubleSpeed": false}
                },
                "sdcard_config": {"sdcard": {"_compoundName": "NoSdCard"}},
                "runtime_config": {"config_manager": {"_compoundName": "ConstantConfigManager"}},
                "digital_inputs": [
                    {"Name": "XMin", "Pin": "AvrPin<AvrPortC,2>", "InputMode": "AvrPinInputModePullUp"}
                ],
                "stepper_ports": [{
                    "Name": "X",
                    "DirPin": "AvrPin<AvrPortC,5>",
                    "StepPin": "AvrPin<AvrPortD,7>",
                    "EnablePin": "AvrPin<AvrPortD,6>",
                    "StepperTimer": {"oc_unit": "TC1_A"}
                }],
                "analog_inputs": [],
                "pwm_outputs": []
            }]
        })
    }

    #[test]
    fn minimal_config() {
        let doc = minimal();
        let compiled = compile(&doc, None).unwrap();
        assert_eq!(compiled.board_for_build, "tiny_board");
        assert_eq!(compiled.output_type, OutputType::Bin);

        let resources = squash(slot(&compiled.slots, "GlobalResourceExprs"));
        assert!(resources.contains("PrinterMainNoHomingParams"));
        assert!(resources.contains(&squash(
            "PrinterMainAxisParams<'X', AvrPin<AvrPortC,5>, AvrPin<AvrPortD,7>, AvrPin<AvrPortD,6>, XInvertDir,"
        )));
        assert!(resources.contains("usingMyPrinter=PrinterMain<MyContext,Program,PrinterMainParams<"));
        assert_eq!(
            slot(&compiled.slots, "GlobalResourceProgramChildren"),
            "    MyPins,\n    MyAdc,\n    MyPrinter,\n"
        );
        assert_eq!(slot(&compiled.slots, "BoardForBuild"), "tiny_board");
        assert_eq!(slot(&compiled.slots, "EmergencyProvider"), "MyPrinter");
        assert_eq!(
            squash(slot(&compiled.slots, "CLOCK")),
            "AvrClock<MyContext,Program,64,MakeTypeList<AvrClockTcSpec<AvrClockTc1>>>"
        );
    }

    #[test]
    fn config_options_follow_document_order() {
        let doc = minimal();
        let compiled = compile(&doc, None).unwrap();
        let options: Vec<&str> = slot(&compiled.slots, "ConfigOptions").lines().collect();
        assert_eq!(
            options.first(),
            Some(&"APRINTER_CONFIG_OPTION_DOUBLE(ForceTimeout, 1.0000000000000001E-1, ConfigNoProperties)")
        );
        let x_invert = options.iter().position(|o| o.contains("XInvertDir")).unwrap();
        let x_steps = options.iter().position(|o| o.contains("XStepsPerUnit")).unwrap();
        let inactive = options.iter().position(|o| o.contains("InactiveTime")).unwrap();
        assert!(x_invert < x_steps);
        assert!(x_steps < inactive);
    }

    #[test]
    fn deterministic_output() {
        let doc = sample();
        let first = generate(&doc, None, MAIN_TEMPLATE).unwrap();
        let second = generate(&doc, None, MAIN_TEMPLATE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn sample_generates_complete_source() {
        let doc = sample();
        let generated = generate(&doc, None, MAIN_TEMPLATE).unwrap();
        assert_eq!(generated.board_for_build, "RAMPS13");
        assert_eq!(generated.output_type, OutputType::Hex);

        let source = &generated.main_source;
        assert!(!source.contains("$${"));
        assert!(source.contains(" * Board for build: RAMPS13\n"));
        assert!(source.contains("#include <aprinter/board/AvrBoardHelpers.h>\n"));
        assert!(source.contains("AMBRO_AVR_SERIAL_ISRS(MyPrinter::GetSerial, MyContext())"));
        assert!(source.contains("    MyPrinter::emergency();\n"));
        assert!(squash(source).contains(&squash(
            "using MyAdc = AvrAdc<MyContext, Program, MakeTypeList<AvrPin<AvrPortK,5>, AvrPin<AvrPortK,6>>, AdcRefSel, AdcPrescaler>;"
        )));
    }

    #[test]
    fn sample_uses_every_declared_object() {
        let doc = sample();
        let compiled = compile(&doc, None).unwrap();
        let resources = squash(slot(&compiled.slots, "GlobalResourceExprs"));
        for homing in ["XHomeDir", "YHomeDir", "ZHomeDir"] {
            assert!(resources.contains(homing));
        }
        assert!(resources.contains("PrinterMainHeaterParams<'T',104,109"));
        assert!(resources.contains("PrinterMainHeaterParams<'B',140,190"));
        assert!(resources.contains(
            "PrinterMainFanParams<106,107,FanSpeedMultiply,HardPwmService<AvrClockPwmService<AvrClockTcChannel2B,AvrPin<AvrPortH,6>>>>"
        ));

        let code = slot(&compiled.slots, "GlobalCode");
        assert!(code.contains(
            "AMBRO_AVR_CLOCK_INTERRUPT_TIMER_ISRS(5, C, MyPrinter::GetEventChannelTimer, MyContext())"
        ));
        assert!(code.contains(
            "AMBRO_AVR_CLOCK_INTERRUPT_TIMER_ISRS(4, A, MyPrinter::GetAxisTimer<3>, MyContext())"
        ));
    }

    #[test]
    fn named_configuration() {
        let mut doc = minimal();
        let mut other = doc["configurations"][0].clone();
        other["name"] = json!("other");
        other["InactiveTime"] = json!(15);
        doc["configurations"].as_array_mut().unwrap().push(other);

        let compiled = compile(&doc, Some("other")).unwrap();
        assert!(slot(&compiled.slots, "ConfigOptions")
            .contains("APRINTER_CONFIG_OPTION_DOUBLE(InactiveTime, 1.5000000000000000E1, ConfigNoProperties)"));
    }

    #[test]
    fn unknown_configuration() {
        let doc = minimal();
        let err = compile(&doc, Some("missing")).unwrap_err();
        assert_eq!(
            err.inner(),
            &ConfigError::NotFound {
                field: "name".into(),
                value: "missing".into()
            }
        );
        assert_eq!(err.path().to_string(), "configurations");
    }

    #[test]
    fn missing_selected_config() {
        let mut doc = minimal();
        doc.as_object_mut().unwrap().remove("selected_config");
        let err = compile(&doc, None).unwrap_err();
        assert_eq!(err.inner(), &ConfigError::MissingField);
        assert_eq!(err.path().to_string(), "selected_config");
    }

    #[test]
    fn unknown_board() {
        let mut doc = minimal();
        doc["configurations"][0]["board"] = json!("huge");
        let err = compile(&doc, None).unwrap_err();
        assert_eq!(
            err.inner(),
            &ConfigError::NotFound {
                field: "name".into(),
                value: "huge".into()
            }
        );
        assert_eq!(err.path().to_string(), "boards");
    }

    #[test]
    fn unresolved_stepper_port() {
        let mut doc = minimal();
        doc["configurations"][0]["steppers"][0]["stepper_port"] = json!("Z");
        let err = compile(&doc, None).unwrap_err();
        assert_eq!(
            err.inner(),
            &ConfigError::UnknownReference(ObjectKind::StepperPort, "Z".into())
        );
        assert_eq!(
            err.path().to_string(),
            "configurations[0].steppers[0].stepper_port"
        );
    }

    #[test]
    fn duplicate_stepper_port() {
        let mut doc = minimal();
        let port = doc["boards"][0]["stepper_ports"][0].clone();
        doc["boards"][0]["stepper_ports"]
            .as_array_mut()
            .unwrap()
            .push(port);
        let err = compile(&doc, None).unwrap_err();
        assert_eq!(err.inner(), &ConfigError::DuplicateName("stepper_port".into()));
        assert_eq!(err.path().to_string(), "boards[0].stepper_ports[1]");
    }

    #[test]
    fn bad_output_type() {
        let mut doc = minimal();
        doc["boards"][0]["platform_config"]["output_type"] = json!("elf");
        let err = compile(&doc, None).unwrap_err();
        assert_eq!(err.path().to_string(), "boards[0].platform_config.output_type");
    }

    #[test]
    fn template_errors() {
        let doc = minimal();
        assert_eq!(
            generate(&doc, None, "$${BoardForBuild} $${Unknown}"),
            Err(GenerateError::Template(TemplateError::UnknownPlaceholder(
                "Unknown".into()
            )))
        );

        let generated = generate(&doc, None, "board $${BoardForBuild}").unwrap();
        assert_eq!(generated.main_source, "board tiny_board");
    }

    #[test]
    fn config_errors_come_first() {
        let mut doc = minimal();
        doc["configurations"][0]["steppers"] = json!([]);
        match generate(&doc, None, "$${Unknown}") {
            Err(GenerateError::Config(err)) => {
                assert_eq!(
                    err.inner(),
                    &ConfigError::CountOutOfRange {
                        count: 0,
                        min: 1,
                        max: 15
                    }
                );
                assert_eq!(err.path().to_string(), "configurations[0].steppers");
            }
            other => panic!("Expected a configuration error, got {:?}", other),
        }
    }
}
