//! Status and identification codes reported by the inverter.
//!
//! Each table is a transparent wrapper over the raw byte so that codes added by
//! newer firmware still decode; they render as `Unknown <Kind>(<value>)`.

use std::fmt::Display;

macro_rules! code_table {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($code:ident = $value:literal => $label:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $name(pub u8);

        impl $name {
            $(pub const $code: $name = $name($value);)*

            pub fn label(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some($label),)*
                    _ => None,
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.label() {
                    Some(label) => label.fmt(f),
                    None => write!(f, concat!("Unknown ", stringify!($name), "({})"), self.0),
                }
            }
        }

        impl From<u8> for $name {
            fn from(value: u8) -> Self {
                $name(value)
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

code_table! {
    /// Outcome of a request, reported in the first response byte.
    ///
    /// Numbered as in the vendor protocol document: 51 is the first error
    /// and 55 is "Not Toggled Service Mode". Some drivers start the list at
    /// 52 and skip 55, which shifts EEProm to 55.
    TransmissionState {
        OK = 0 => "Ok",
        COMMAND_NOT_IMPLEMENTED = 51 => "Command is not implemented",
        VARIABLE_DOES_NOT_EXIST = 52 => "Variable does not exist",
        VALUE_OUT_OF_RANGE = 53 => "Variable value is out of range",
        EEPROM_NOT_ACCESSIBLE = 54 => "EEProm not accessible",
        NOT_TOGGLED_SERVICE_MODE = 55 => "Not Toggled Service Mode",
        MICRO_ERROR = 56 => "Can not send the command to internal micro",
        NOT_EXECUTED = 57 => "Command not Executed",
        VARIABLE_NOT_AVAILABLE = 58 => "The variable is not available, retry",
    }
}

code_table! {
    GlobalState {
        SENDING_PARAMETERS = 0 => "Sending Parameters",
        WAITING_SUN_GRID = 1 => "Wait Sun/Grid",
        CHECKING_GRID = 2 => "Checking Grid",
        MEASURING_RISO = 3 => "Measuring Riso",
        DCDC_START = 4 => "DcDc Start",
        INVERTER_TURN_ON = 5 => "Inverter Turn-On",
        RUN = 6 => "Run",
        RECOVERY = 7 => "Recovery",
        PAUSE = 8 => "Pause",
        GROUND_FAULT = 9 => "Ground Fault",
        OTH_FAULT = 10 => "OTH Fault",
        ADDRESS_SETTING = 11 => "Address Setting",
        SELF_TEST = 12 => "Self Test",
        SELF_TEST_FAIL = 13 => "Self Test Fail",
        SENSOR_TEST_MEASURE_RISO = 14 => "Sensor Test + Meas.Riso",
        LEAK_FAULT = 15 => "Leak Fault",
        WAITING_MANUAL_RESET = 16 => "Waiting for manual reset",
        INTERNAL_ERROR_E026 = 17 => "Internal Error E026",
        INTERNAL_ERROR_E027 = 18 => "Internal Error E027",
        INTERNAL_ERROR_E028 = 19 => "Internal Error E028",
        INTERNAL_ERROR_E029 = 20 => "Internal Error E029",
        INTERNAL_ERROR_E030 = 21 => "Internal Error E030",
        SENDING_WIND_TABLE = 22 => "Sending Wind Table",
        FAILED_SENDING_TABLE = 23 => "Failed Sending table",
        UTH_FAULT = 24 => "UTH Fault",
        REMOTE_OFF = 25 => "Remote OFF",
        INTERLOCK_FAIL = 26 => "Interlock Fail",
        EXECUTING_AUTOTEST = 27 => "Executing Autotest",
        WAITING_SUN = 30 => "Waiting Sun",
        TEMPERATURE_FAULT = 31 => "Temperature Fault",
        FAN_STAUCKED = 32 => "Fan Staucked",
        INT_COM_FAIL = 33 => "Int.Com.Fail",
        SLAVE_INSERTION = 34 => "Slave Insertion",
        DC_SWITCH_OPEN = 35 => "DC Switch Open",
        TRAS_SWITCH_OPEN = 36 => "TRAS Switch Open",
        MASTER_EXCLUSION = 37 => "MASTER Exclusion",
        AUTO_EXCLUSION = 38 => "Auto Exclusion",
        ERASING_INTERNAL_EEPROM = 98 => "Erasing Internal EEprom",
        ERASING_EXTERNAL_EEPROM = 99 => "Erasing External EEprom",
        COUNTING_EEPROM = 100 => "Counting EEprom",
        FREEZE = 101 => "Freeze",
    }
}

code_table! {
    InverterState {
        STAND_BY = 0 => "Stand By",
        CHECKING_GRID = 1 => "Checking Grid",
        RUN = 2 => "Run",
        BULK_OVER_VOLTAGE = 3 => "Bulk OV",
        OUT_OVER_CURRENT = 4 => "Out OC",
        IGBT_SAT = 5 => "IGBT Sat",
        BULK_UNDER_VOLTAGE = 6 => "Bulk UV",
        DEGAUSS_ERROR = 7 => "Degauss Error",
        NO_PARAMETERS = 8 => "No Parameters",
        BULK_LOW = 9 => "Bulk Low",
        GRID_OVER_VOLTAGE = 10 => "Grid OV",
        COMMUNICATION_ERROR = 11 => "Communication Error",
        DEGAUSSING = 12 => "Degaussing",
        STARTING = 13 => "Starting",
        BULK_CAP_FAIL = 14 => "Bulk Cap Fail",
        LEAK_FAIL = 15 => "Leak Fail",
        DCDC_FAIL = 16 => "DcDc Fail",
        ILEAK_SENSOR_FAIL = 17 => "Ileak Sensor Fail",
        SELF_TEST_RELAY_INVERTER = 18 => "SelfTest: relay inverter",
        SELF_TEST_WAIT_SENSOR_TEST = 19 => "SelfTest: wait for sensor test",
        SELF_TEST_RELAY_DCDC_SENSOR = 20 => "SelfTest: test relay DcDc + sensor",
        SELF_TEST_RELAY_INVERTER_FAIL = 21 => "SelfTest: relay inverter fail",
        SELF_TEST_TIMEOUT_FAIL = 22 => "SelfTest timeout fail",
        SELF_TEST_RELAY_DCDC_FAIL = 23 => "SelfTest: relay DcDc fail",
        SELF_TEST_1 = 24 => "Self Test 1",
        WAITING_SELF_TEST_START = 25 => "Waiting self test start",
        DC_INJECTION = 26 => "Dc Injection",
        SELF_TEST_2 = 27 => "Self Test 2",
        SELF_TEST_3 = 28 => "Self Test 3",
        SELF_TEST_4 = 29 => "Self Test 4",
        INTERNAL_ERROR_30 = 30 => "Internal Error",
        INTERNAL_ERROR_31 = 31 => "Internal Error",
        FORBIDDEN_STATE = 40 => "Forbidden State",
        INPUT_UC = 41 => "Input UC",
        ZERO_POWER = 42 => "Zero Power",
        GRID_NOT_PRESENT = 43 => "Grid Not Present",
        WAITING_START = 44 => "Waiting Start",
        MPPT = 45 => "MPPT",
        GRID_FAIL = 46 => "Grid Fail",
        INPUT_OC = 47 => "Input OC",
    }
}

code_table! {
    /// State of one DC-DC input channel.
    DCDCState {
        OFF = 0 => "DcDc OFF",
        RAMP_START = 1 => "Ramp Start",
        MPPT = 2 => "MPPT",
        INPUT_OVER_CURRENT = 4 => "Input OC",
        INPUT_UNDER_VOLTAGE = 5 => "Input UV",
        INPUT_OVER_VOLTAGE = 6 => "Input OV",
        INPUT_LOW = 7 => "Input Low",
        NO_PARAMETERS = 8 => "No Parameters",
        BULK_OVER_VOLTAGE = 9 => "Bulk OV",
        COMMUNICATION_ERROR = 10 => "Communication Error",
        RAMP_FAIL = 11 => "Ramp Fail",
        INTERNAL_ERROR = 12 => "Internal Error",
        INPUT_MODE_ERROR = 13 => "Input mode Error",
        GROUND_FAULT = 14 => "Ground Fault",
        INVERTER_FAIL = 15 => "Inverter Fail",
        IGBT_SAT = 16 => "DcDc IGBT Sat",
        ILEAK_FAIL = 17 => "DcDc ILEAK Fail",
        GRID_FAIL = 18 => "DcDc Grid Fail",
        COMM_ERROR = 19 => "DcDc Comm.Error",
    }
}

code_table! {
    AlarmState {
        NONE = 0 => "No Alarm",
        SUN_LOW_1 = 1 => "Sun Low",
        INPUT_OVER_CURRENT = 2 => "Input OC",
        INPUT_UNDER_VOLTAGE = 3 => "Input UV",
        INPUT_OVER_VOLTAGE = 4 => "Input OV",
        SUN_LOW_5 = 5 => "Sun Low",
        NO_PARAMETERS = 6 => "No Parameters",
        BULK_OVER_VOLTAGE = 7 => "Bulk OV",
        COMM_ERROR = 8 => "Comm.Error",
        OUTPUT_OVER_CURRENT = 9 => "Output OC",
        IGBT_SAT = 10 => "IGBT Sat",
        BULK_UV_11 = 11 => "Bulk UV",
        E009 = 12 => "Internal error",
        GRID_FAIL = 13 => "Grid Fail",
        BULK_LOW = 14 => "Bulk Low",
        RAMP_FAIL = 15 => "Ramp Fail",
        DCDC_FAIL_16 = 16 => "Dc/Dc Fail",
        WRONG_MODE = 17 => "Wrong Mode",
        GROUND_FAULT_18 = 18 => "Ground Fault",
        OVER_TEMP = 19 => "Over Temp.",
        BULK_CAP_FAIL = 20 => "Bulk Cap Fail",
        INVERTER_FAIL = 21 => "Inverter Fail",
        START_TIMEOUT = 22 => "Start Timeout",
        GROUND_FAULT_23 = 23 => "Ground Fault",
        DEGAUSS_ERROR = 24 => "Degauss error",
        ILEAK_SENS_FAIL = 25 => "Ileak sens.fail",
        DCDC_FAIL_26 = 26 => "DcDc Fail",
        SELF_TEST_ERROR_1 = 27 => "Self Test Error 1",
        SELF_TEST_ERROR_2 = 28 => "Self Test Error 2",
        SELF_TEST_ERROR_3 = 29 => "Self Test Error 3",
        SELF_TEST_ERROR_4 = 30 => "Self Test Error 4",
        DC_INJ_ERROR = 31 => "DC inj error",
        GRID_OVER_VOLTAGE = 32 => "Grid OV",
        GRID_UNDER_VOLTAGE = 33 => "Grid UV",
        GRID_OF = 34 => "Grid OF",
        GRID_UF = 35 => "Grid UF",
        Z_GRID_HI = 36 => "Z grid Hi",
        E024 = 37 => "Internal error",
        RISO_LOW = 38 => "Riso Low",
        VREF_ERROR = 39 => "Vref Error",
        ERROR_MEAS_V = 40 => "Error Meas V",
        ERROR_MEAS_F = 41 => "Error Meas F",
        ERROR_MEAS_I = 42 => "Error Meas I",
        ERROR_MEAS_ILEAK = 43 => "Error Meas Ileak",
        READ_ERROR_V = 44 => "Read Error V",
        READ_ERROR_I = 45 => "Read Error I",
        TABLE_FAIL = 46 => "Table fail",
        FAN_FAIL = 47 => "Fan Fail",
        UTH = 48 => "UTH",
        INTERLOCK_FAIL = 49 => "Interlock fail",
        REMOTE_OFF = 50 => "Remote Off",
        VOUT_AVG_ERROR = 51 => "Vout Avg errror",
        BATTERY_LOW = 52 => "Battery low",
        CLK_FAIL = 53 => "Clk fail",
        INPUT_UC = 54 => "Input UC",
        ZERO_POWER = 55 => "Zero Power",
        FAN_STUCKED = 56 => "Fan Stucked",
        DC_SWITCH_OPEN = 57 => "DC Switch Open",
        BULK_UV_58 = 58 => "Bulk UV",
        AUTOEXCLUSION = 59 => "Autoexclusion",
        GRID_DF_DT = 60 => "Grid df/dt",
        DEN_SWITCH_OPEN = 61 => "Den switch Open",
        JBOX_FAIL = 62 => "Jbox fail",
    }
}

code_table! {
    /// Which input strings the inverter is configured to use.
    ConfigurationState {
        BOTH = 0 => "System operating with both strings.",
        STRING_1 = 1 => "String 1 connected, String 2 disconnected.",
        STRING_2 = 2 => "String 2 connected, String 1 disconnected.",
    }
}

code_table! {
    /// Model identifier, an ASCII character.
    Product {
        AURORA_2KW_INDOOR = b'i' => "Aurora 2.0kW indoor",
        AURORA_2KW_OUTDOOR = b'o' => "Aurora 2.0kW outdoor",
        AURORA_3_6KW_INDOOR = b'I' => "Aurora 3.6kW indoor",
        AURORA_3_6KW_OUTDOOR = b'O' => "Aurora 3.0-3.6 kW outdoor",
        AURORA_5KW_OUTDOOR = b'5' => "Aurora 5.0 kW outdoor",
        AURORA_6KW_OUTDOOR = b'6' => "Aurora 6 kW outdoor",
        THREE_PHASE_INTERFACE = b'P' => "3 - phase interface (3G74)",
        AURORA_50KW_MODULE = b'C' => "Aurora 50kW module",
        AURORA_4_2KW_NEW = b'4' => "Aurora 4.2kW new",
        AURORA_3_6KW_NEW = b'3' => "Aurora 3.6kW new",
        AURORA_3_3KW_NEW = b'2' => "Aurora 3.3kW new",
        AURORA_3_0KW_NEW = b'1' => "Aurora 3.0kW new",
        AURORA_12KW = b'D' => "Aurora 12.0kW",
        AURORA_10KW = b'X' => "Aurora 10.0kW",
    }
}

code_table! {
    /// Grid regulation the unit is certified for, an ASCII character.
    ProductSpec {
        UL1741 = b'A' => "UL1741",
        VDE0126 = b'E' => "VDE0126",
        DR1663_2000 = b'S' => "DR 1663/2000",
        ENEL_DK5950 = b'I' => "ENEL DK 5950",
        UK_G83 = b'U' => "UK G83",
        AS4777 = b'K' => "AS 4777",
        VDE_FRENCH = b'F' => "VDE French Model",
    }
}

code_table! {
    InverterType {
        TRANSFORMERLESS = b'N' => "Transformerless",
        TRANSFORMER = b'T' => "Transformer",
    }
}

code_table! {
    InputType {
        PHOTOVOLTAIC = b'N' => "Photovoltaic",
        WIND = b'W' => "Wind",
    }
}
