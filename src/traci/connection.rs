//! Request/response exchange with a TraCI server
//!
//! Every request is a message with a single command. The server answers with
//! a status command for it, optionally followed by a response command.

use log::debug;
use std::io::{Read, Write};

use crate::engine::{EngineError, SubscriptionRequest, SubscriptionResults, TraciValue};

use super::constants::{
    CMD_GETVERSION, CMD_GET_VEHICLE_VARIABLE, CMD_SIMSTEP, CMD_SUBSCRIBE_SIM_VARIABLE,
    RESPONSE_GET_VEHICLE_VARIABLE, RESPONSE_SUBSCRIBE_SIM_VARIABLE, RTYPE_ERR,
    RTYPE_NOTIMPLEMENTED, RTYPE_OK,
};
use super::storage::{encode_command, encode_message, Reader, Storage};

/// Object id of the simulation itself in simulation-domain commands
const SIMULATION_OBJECT_ID: &str = "";

/// A TraCI client over any byte stream
pub struct TraciConnection<S> {
    stream: S,
}

impl<S: Read + Write> TraciConnection<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Query the server's API version and identifier string
    pub fn get_version(&mut self) -> Result<(i32, String), EngineError> {
        let body = self.exchange(CMD_GETVERSION, &[])?;
        let mut reader = Reader::new(&body);
        let mut content = expect_response(&mut reader, CMD_GETVERSION)?;
        let api_version = content.read_i32()?;
        let identifier = content.read_string()?;
        Ok((api_version, identifier))
    }

    /// Advance the simulation. A target time of 0 performs exactly one step.
    /// Returns the simulation-variable subscription values carried by the
    /// step response.
    pub fn simulation_step(&mut self, target_time: f64) -> Result<SubscriptionResults, EngineError> {
        let mut content = Storage::new();
        content.write_f64(target_time);
        let body = self.exchange(CMD_SIMSTEP, content.as_bytes())?;

        let mut reader = Reader::new(&body);
        let count = reader.read_i32()?;
        let mut results = SubscriptionResults::new();
        for _ in 0..count {
            let (response_id, content) = reader.read_command()?;
            if response_id == RESPONSE_SUBSCRIBE_SIM_VARIABLE {
                results.extend(parse_subscription_response(content)?);
            } else {
                debug!(
                    "Ignoring subscription response 0x{:02x} ({} bytes)",
                    response_id,
                    content.remaining()
                );
            }
        }
        Ok(results)
    }

    /// Subscribe to simulation-level variables. Returns the values the
    /// server reports at subscription time.
    pub fn subscribe_simulation(
        &mut self,
        request: &SubscriptionRequest,
    ) -> Result<SubscriptionResults, EngineError> {
        let variable_count = u8::try_from(request.variables.len()).map_err(|_| {
            EngineError::Protocol(format!(
                "cannot subscribe to {} variables in one command",
                request.variables.len()
            ))
        })?;

        let mut content = Storage::new();
        content.write_f64(request.begin);
        content.write_f64(request.end);
        content.write_string(SIMULATION_OBJECT_ID);
        content.write_u8(variable_count);
        for variable in &request.variables {
            content.write_u8(*variable);
        }
        let body = self.exchange(CMD_SUBSCRIBE_SIM_VARIABLE, content.as_bytes())?;

        let mut reader = Reader::new(&body);
        if reader.is_empty() {
            return Ok(SubscriptionResults::new());
        }
        let content = expect_response(&mut reader, CMD_SUBSCRIBE_SIM_VARIABLE)?;
        parse_subscription_response(content)
    }

    /// Read one variable of one vehicle (`""` for domain-wide variables such
    /// as the id list)
    pub fn get_vehicle_variable(
        &mut self,
        variable: u8,
        vehicle_id: &str,
    ) -> Result<TraciValue, EngineError> {
        let mut content = Storage::new();
        content.write_u8(variable);
        content.write_string(vehicle_id);
        let body = self.exchange(CMD_GET_VEHICLE_VARIABLE, content.as_bytes())?;

        let mut reader = Reader::new(&body);
        let mut content = expect_response(&mut reader, CMD_GET_VEHICLE_VARIABLE)?;
        let returned_variable = content.read_u8()?;
        if returned_variable != variable {
            return Err(EngineError::Protocol(format!(
                "asked for variable 0x{:02x}, got 0x{:02x}",
                variable, returned_variable
            )));
        }
        let _object_id = content.read_string()?;
        content.read_value()
    }

    /// Send one command and return the message body following its status
    fn exchange(&mut self, command_id: u8, content: &[u8]) -> Result<Vec<u8>, EngineError> {
        let message = encode_message(&[encode_command(command_id, content)]);
        self.stream.write_all(&message)?;
        self.stream.flush()?;

        let mut body = self.receive()?;
        let status_len = {
            let mut reader = Reader::new(&body);
            check_status(&mut reader, command_id)?;
            reader.position()
        };
        Ok(body.split_off(status_len))
    }

    fn receive(&mut self) -> Result<Vec<u8>, EngineError> {
        let mut header = [0u8; 4];
        self.stream.read_exact(&mut header)?;
        let total_len = i32::from_be_bytes(header);
        let body_len = usize::try_from(total_len)
            .ok()
            .and_then(|len| len.checked_sub(header.len()))
            .ok_or_else(|| EngineError::Protocol(format!("invalid message length {}", total_len)))?;
        let mut body = vec![0u8; body_len];
        self.stream.read_exact(&mut body)?;
        Ok(body)
    }
}

fn check_status(reader: &mut Reader<'_>, command_id: u8) -> Result<(), EngineError> {
    let (status_id, mut status) = reader.read_command()?;
    if status_id != command_id {
        return Err(EngineError::Protocol(format!(
            "status for command 0x{:02x} while waiting for 0x{:02x}",
            status_id, command_id
        )));
    }
    let result = status.read_u8()?;
    let description = status.read_string()?;
    match result {
        RTYPE_OK => Ok(()),
        RTYPE_NOTIMPLEMENTED => Err(EngineError::CommandFailed {
            command: command_id,
            description: format!("not implemented: {}", description),
        }),
        RTYPE_ERR => Err(EngineError::CommandFailed {
            command: command_id,
            description,
        }),
        other => Err(EngineError::Protocol(format!(
            "unknown status 0x{:02x} for command 0x{:02x}",
            other, command_id
        ))),
    }
}

/// Read the response command for `command_id` (request id plus the response
/// offset, except for version queries which answer with the same id)
fn expect_response<'a>(reader: &mut Reader<'a>, command_id: u8) -> Result<Reader<'a>, EngineError> {
    let expected = match command_id {
        CMD_GETVERSION => CMD_GETVERSION,
        CMD_GET_VEHICLE_VARIABLE => RESPONSE_GET_VEHICLE_VARIABLE,
        CMD_SUBSCRIBE_SIM_VARIABLE => RESPONSE_SUBSCRIBE_SIM_VARIABLE,
        other => other,
    };
    let (response_id, content) = reader.read_command()?;
    if response_id != expected {
        return Err(EngineError::Protocol(format!(
            "expected response 0x{:02x}, got 0x{:02x}",
            expected, response_id
        )));
    }
    Ok(content)
}

fn parse_subscription_response(mut content: Reader<'_>) -> Result<SubscriptionResults, EngineError> {
    let _object_id = content.read_string()?;
    let count = content.read_u8()?;
    let mut results = SubscriptionResults::with_capacity(count as usize);
    for _ in 0..count {
        let variable = content.read_u8()?;
        let status = content.read_u8()?;
        let value = content.read_value()?;
        if status != RTYPE_OK {
            return Err(EngineError::CommandFailed {
                command: CMD_SUBSCRIBE_SIM_VARIABLE,
                description: format!("variable 0x{:02x}: {}", variable, value),
            });
        }
        results.push((variable, value));
    }
    Ok(results)
}
