//! SUMO engine backend speaking TraCI over TCP
//!
//! Loading launches the `sumo` binary with the given arguments and a remote
//! port, then connects to it. The session owns both the socket and the child
//! process; dropping it closes the socket, which ends the SUMO run.

mod connection;
mod constants;
#[cfg(test)]
mod replies;
mod storage;

pub use connection::TraciConnection;
pub use storage::{encode_command, encode_message, Reader, Storage};

use log::{debug, info};
use std::net::{Ipv4Addr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use crate::engine::{
    EngineError, SimulationEngine, SimulationSession, SubscriptionRequest, SubscriptionResults,
};

use constants::{ID_LIST, VAR_SPEED};

/// Number of connection attempts while the engine starts up
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 40;

/// Pause between connection attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// A SUMO installation that can load a simulation
#[derive(Debug, Clone)]
pub struct TraciEngine {
    binary: PathBuf,
    /// 0 picks a free local port at load time
    port: u16,
    connect_attempts: u32,
    retry_delay: Duration,
}

impl TraciEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            port: 0,
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_retries(mut self, attempts: u32, delay: Duration) -> Self {
        self.connect_attempts = attempts.max(1);
        self.retry_delay = delay;
        self
    }

    fn spawn(&self, args: &[String], port: u16) -> Result<Child, EngineError> {
        let args = launch_args(args, port);
        debug!("Launching {} {}", self.binary.display(), args.join(" "));
        Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Launch {
                binary: self.binary.display().to_string(),
                source,
            })
    }

    fn connect(&self, child: &mut Child, port: u16) -> Result<TcpStream, EngineError> {
        for attempt in 1..=self.connect_attempts {
            match TcpStream::connect((Ipv4Addr::LOCALHOST, port)) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => debug!("Connect attempt {} to port {} failed: {}", attempt, port, e),
            }
            if let Some(status) = child.try_wait()? {
                return Err(EngineError::EngineExited { status });
            }
            thread::sleep(self.retry_delay);
        }
        // The engine never opened its port; don't leave it running.
        if let Err(e) = child.kill() {
            debug!("Failed to stop unresponsive engine: {}", e);
        }
        Err(EngineError::Connect {
            port,
            attempts: self.connect_attempts,
        })
    }
}

impl SimulationEngine for TraciEngine {
    type Session = TraciSession;

    fn load(self, args: &[String]) -> Result<TraciSession, EngineError> {
        for path in config_paths(args) {
            if !Path::new(path).is_file() {
                return Err(EngineError::ConfigNotFound {
                    path: PathBuf::from(path),
                });
            }
        }

        let port = match self.port {
            0 => free_local_port()?,
            port => port,
        };
        let mut child = self.spawn(args, port)?;
        let stream = self.connect(&mut child, port)?;

        let mut connection = TraciConnection::new(stream);
        let (api_version, identifier) = connection.get_version()?;
        info!(
            "Connected to {} (TraCI API {}) on port {}",
            identifier, api_version, port
        );

        Ok(TraciSession {
            connection,
            _process: child,
            last_results: SubscriptionResults::new(),
        })
    }
}

/// A running SUMO simulation reachable over TraCI
pub struct TraciSession {
    connection: TraciConnection<TcpStream>,
    _process: Child,
    last_results: SubscriptionResults,
}

impl SimulationSession for TraciSession {
    fn subscribe(&mut self, request: &SubscriptionRequest) -> Result<(), EngineError> {
        self.last_results = self.connection.subscribe_simulation(request)?;
        Ok(())
    }

    fn step(&mut self) -> Result<(), EngineError> {
        self.last_results = self.connection.simulation_step(0.0)?;
        Ok(())
    }

    fn subscription_results(&mut self) -> Result<SubscriptionResults, EngineError> {
        Ok(self.last_results.clone())
    }

    fn vehicle_ids(&mut self) -> Result<Vec<String>, EngineError> {
        let value = self.connection.get_vehicle_variable(ID_LIST, "")?;
        value
            .into_string_list()
            .ok_or_else(|| EngineError::Protocol("vehicle id list is not a string list".into()))
    }

    fn vehicle_speed(&mut self, vehicle_id: &str) -> Result<f64, EngineError> {
        let value = self.connection.get_vehicle_variable(VAR_SPEED, vehicle_id)?;
        value.as_f64().ok_or_else(|| {
            EngineError::Protocol(format!("speed of {} is not numeric: {}", vehicle_id, value))
        })
    }
}

/// Configuration files named by `args`: a lone positional path, or the value
/// of `-c` / `--configuration-file`
fn config_paths(args: &[String]) -> Vec<&str> {
    if let [config] = args {
        if !config.starts_with('-') {
            return vec![config.as_str()];
        }
    }
    let mut paths = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(path) = arg.strip_prefix("--configuration-file=") {
            paths.push(path);
        } else if arg == "-c" || arg == "--configuration-file" {
            if let Some(path) = iter.next() {
                paths.push(path.as_str());
            }
        }
    }
    paths
}

/// Engine command line for `args` plus the TraCI port. SUMO only accepts a
/// positional configuration file as its sole argument, so a lone path is
/// passed as `-c <path>`; option-style arguments go through unchanged.
fn launch_args(args: &[String], port: u16) -> Vec<String> {
    let mut launch = Vec::with_capacity(args.len() + 3);
    match args {
        [config] if !config.starts_with('-') => {
            launch.push("-c".to_string());
            launch.push(config.clone());
        }
        _ => launch.extend(args.iter().cloned()),
    }
    launch.push("--remote-port".to_string());
    launch.push(port.to_string());
    launch
}

/// Ask the OS for a port nobody is listening on
fn free_local_port() -> Result<u16, EngineError> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    Ok(listener.local_addr()?.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_fails_before_launch() {
        // A binary that cannot exist: reaching spawn would yield Launch instead.
        let engine = TraciEngine::new("/nonexistent/sumo");
        let err = engine
            .load(&["/nonexistent/hello.sumocfg".to_string()])
            .err()
            .unwrap();
        match err {
            EngineError::ConfigNotFound { path } => {
                assert_eq!(path, PathBuf::from("/nonexistent/hello.sumocfg"))
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_binary_is_launch_error() {
        let config = std::env::temp_dir().join("sumo_demo_launch_test.sumocfg");
        std::fs::write(&config, "<configuration/>").unwrap();

        let engine = TraciEngine::new("/nonexistent/sumo").with_port(1);
        let err = engine
            .load(&[config.display().to_string()])
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Launch { .. }));

        std::fs::remove_file(&config).ok();
    }

    #[test]
    fn test_free_port_is_nonzero() {
        assert_ne!(free_local_port().unwrap(), 0);
    }

    #[test]
    fn test_lone_config_is_passed_with_dash_c() {
        let args = launch_args(&["data/hello/hello.sumocfg".to_string()], 8813);
        assert_eq!(
            args,
            vec!["-c", "data/hello/hello.sumocfg", "--remote-port", "8813"]
        );
    }

    #[test]
    fn test_option_arguments_pass_through() {
        let given: Vec<String> = ["-c", "a.sumocfg", "--begin", "0"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let args = launch_args(&given, 9000);
        assert_eq!(
            args,
            vec!["-c", "a.sumocfg", "--begin", "0", "--remote-port", "9000"]
        );
    }

    #[test]
    fn test_config_paths_ignore_option_values() {
        let given: Vec<String> = ["--begin", "0", "--configuration-file", "a.sumocfg"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(config_paths(&given), vec!["a.sumocfg"]);

        let given = vec!["--configuration-file=b.sumocfg".to_string()];
        assert_eq!(config_paths(&given), vec!["b.sumocfg"]);

        let given = vec!["hello.sumocfg".to_string()];
        assert_eq!(config_paths(&given), vec!["hello.sumocfg"]);
    }

    /// Full session against a stub engine binary and a loopback TraCI server
    #[cfg(unix)]
    #[test]
    fn test_session_over_loopback() {
        use super::constants::{
            CMD_GETVERSION, CMD_GET_VEHICLE_VARIABLE, CMD_SIMSTEP, CMD_SUBSCRIBE_SIM_VARIABLE,
        };
        use super::replies::{
            sim_subscription, step_reply, subscribe_reply, vehicle_reply, version_reply,
        };
        use crate::engine::TraciValue;
        use std::fs;
        use std::io::{Read, Write};
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join(format!("sumo_demo_session_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let config = dir.join("hello.sumocfg");
        fs::write(&config, "<configuration/>").unwrap();
        let argv_file = dir.join("argv");
        let stub = dir.join("sumo");
        fs::write(
            &stub,
            format!(
                "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\nexec sleep 2\n",
                argv_file.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&stub, fs::Permissions::from_mode(0o755)).unwrap();

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let replies = vec![
            version_reply(20, "SUMO 1.6.0"),
            subscribe_reply(&[(0x7a, TraciValue::StringList(vec![]))]),
            step_reply(vec![sim_subscription(&[(
                0x7a,
                TraciValue::StringList(vec!["veh1".into()]),
            )])]),
            vehicle_reply(ID_LIST, "", TraciValue::StringList(vec!["veh0".into()])),
            vehicle_reply(VAR_SPEED, "veh0", TraciValue::Double(12.5)),
        ];
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut commands = Vec::new();
            for reply in replies {
                let mut header = [0u8; 4];
                stream.read_exact(&mut header).unwrap();
                let mut body = vec![0u8; i32::from_be_bytes(header) as usize - 4];
                stream.read_exact(&mut body).unwrap();
                let (command_id, _) = Reader::new(&body).read_command().unwrap();
                commands.push(command_id);
                stream.write_all(&reply).unwrap();
            }
            commands
        });

        let config_arg = config.display().to_string();
        let engine = TraciEngine::new(&stub)
            .with_port(port)
            .with_connect_retries(5, Duration::from_millis(50));
        let mut session = engine.load(&[config_arg.clone()]).unwrap();

        session
            .subscribe(&SubscriptionRequest::arrived_vehicles())
            .unwrap();
        assert_eq!(
            session.subscription_results().unwrap(),
            vec![(0x7a, TraciValue::StringList(vec![]))]
        );
        session.step().unwrap();
        assert_eq!(
            session.subscription_results().unwrap(),
            vec![(0x7a, TraciValue::StringList(vec!["veh1".into()]))]
        );
        assert_eq!(session.vehicle_ids().unwrap(), vec!["veh0".to_string()]);
        assert_eq!(session.vehicle_speed("veh0").unwrap(), 12.5);

        assert_eq!(
            server.join().unwrap(),
            vec![
                CMD_GETVERSION,
                CMD_SUBSCRIBE_SIM_VARIABLE,
                CMD_SIMSTEP,
                CMD_GET_VEHICLE_VARIABLE,
                CMD_GET_VEHICLE_VARIABLE,
            ]
        );

        // The stub records its argv asynchronously.
        let mut argv = String::new();
        for _ in 0..50 {
            argv = fs::read_to_string(&argv_file).unwrap_or_default();
            if argv.lines().count() == 4 {
                break;
            }
            thread::sleep(Duration::from_millis(100));
        }
        let port_arg = port.to_string();
        assert_eq!(
            argv.lines().collect::<Vec<_>>(),
            vec!["-c", config_arg.as_str(), "--remote-port", port_arg.as_str()]
        );

        drop(session);
        fs::remove_dir_all(&dir).ok();
    }
}
