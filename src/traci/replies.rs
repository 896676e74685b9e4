//! Server-side reply builders for exercising the client without SUMO

use crate::engine::TraciValue;

use super::constants::{
    CMD_GETVERSION, CMD_GET_VEHICLE_VARIABLE, CMD_SIMSTEP, CMD_SUBSCRIBE_SIM_VARIABLE,
    RESPONSE_GET_VEHICLE_VARIABLE, RESPONSE_SUBSCRIBE_SIM_VARIABLE, RTYPE_OK,
};
use super::storage::{encode_command, encode_message, Storage};

pub fn status(command_id: u8, result: u8, description: &str) -> Vec<u8> {
    let mut content = Storage::new();
    content.write_u8(result);
    content.write_string(description);
    encode_command(command_id, content.as_bytes())
}

pub fn version_reply(api_version: i32, identifier: &str) -> Vec<u8> {
    let mut content = Storage::new();
    content.write_i32(api_version);
    content.write_string(identifier);
    encode_message(&[
        status(CMD_GETVERSION, RTYPE_OK, ""),
        encode_command(CMD_GETVERSION, content.as_bytes()),
    ])
}

/// Simulation-variable subscription response command
pub fn sim_subscription(values: &[(u8, TraciValue)]) -> Vec<u8> {
    let mut content = Storage::new();
    content.write_string("");
    content.write_u8(values.len() as u8);
    for (variable, value) in values {
        content.write_u8(*variable);
        content.write_u8(RTYPE_OK);
        content.write_value(value);
    }
    encode_command(RESPONSE_SUBSCRIBE_SIM_VARIABLE, content.as_bytes())
}

pub fn subscribe_reply(values: &[(u8, TraciValue)]) -> Vec<u8> {
    encode_message(&[
        status(CMD_SUBSCRIBE_SIM_VARIABLE, RTYPE_OK, ""),
        sim_subscription(values),
    ])
}

pub fn step_reply(responses: Vec<Vec<u8>>) -> Vec<u8> {
    let mut count = Storage::new();
    count.write_i32(responses.len() as i32);
    let mut parts = vec![status(CMD_SIMSTEP, RTYPE_OK, ""), count.into_bytes()];
    parts.extend(responses);
    encode_message(&parts)
}

pub fn vehicle_reply(variable: u8, vehicle_id: &str, value: TraciValue) -> Vec<u8> {
    let mut content = Storage::new();
    content.write_u8(variable);
    content.write_string(vehicle_id);
    content.write_value(&value);
    encode_message(&[
        status(CMD_GET_VEHICLE_VARIABLE, RTYPE_OK, ""),
        encode_command(RESPONSE_GET_VEHICLE_VARIABLE, content.as_bytes()),
    ])
}
