//! TraCI command, variable and type codes used by this crate

// Commands
pub const CMD_GETVERSION: u8 = 0x00;
pub const CMD_SIMSTEP: u8 = 0x02;
pub const CMD_GET_VEHICLE_VARIABLE: u8 = 0xa4;
pub const CMD_SUBSCRIBE_SIM_VARIABLE: u8 = 0xdb;

/// Response command ids are the request id plus this offset
pub const RESPONSE_OFFSET: u8 = 0x10;
pub const RESPONSE_GET_VEHICLE_VARIABLE: u8 = CMD_GET_VEHICLE_VARIABLE + RESPONSE_OFFSET;
pub const RESPONSE_SUBSCRIBE_SIM_VARIABLE: u8 = CMD_SUBSCRIBE_SIM_VARIABLE + RESPONSE_OFFSET;

// Status results
pub const RTYPE_OK: u8 = 0x00;
pub const RTYPE_NOTIMPLEMENTED: u8 = 0x01;
pub const RTYPE_ERR: u8 = 0xff;

// Vehicle variables
pub const ID_LIST: u8 = 0x00;
pub const VAR_SPEED: u8 = 0x40;

// Value types
pub const POSITION_2D: u8 = 0x01;
pub const TYPE_UBYTE: u8 = 0x07;
pub const TYPE_BYTE: u8 = 0x08;
pub const TYPE_INTEGER: u8 = 0x09;
pub const TYPE_DOUBLE: u8 = 0x0b;
pub const TYPE_STRING: u8 = 0x0c;
pub const TYPE_STRINGLIST: u8 = 0x0e;
pub const TYPE_COMPOUND: u8 = 0x0f;
