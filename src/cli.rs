//! Command line surface. Argument parsing and validation are kept separate
//! from the engine; nothing in this module touches a socket.

use crate::error::ValidationError;
use clap::Parser;
use std::path::Path;
use std::time::Duration;

/// `blast` is a load generator for TCP servers which maintain persistent
/// connections.
#[derive(Parser, Debug, Clone)]
#[command(name = "blast", version, about, long_about = None)]
pub struct Cli {
    /// Target address of the form host:port.
    pub target: String,

    /// Number of workers to run concurrently.
    #[arg(short = 'c', long = "concurrency", default_value_t = 50)]
    pub concurrency: u32,

    /// Number of connections to open with the target. Concurrency must be
    /// an exact multiple of this value.
    #[arg(long = "connections", default_value_t = 1)]
    pub connections: u32,

    /// Keep connections alive until a termination signal is sent, ignoring
    /// the duration and response-count goal triggers.
    #[arg(long = "keep-alive", default_value_t = false)]
    pub keep_connections_alive: bool,

    /// File path containing the load payload.
    #[arg(short = 'f', long = "file", default_value = "")]
    pub payload_file: String,

    /// Rate limit in requests per second, applied per worker.
    #[arg(long = "rps", default_value_t = 50.0)]
    pub requests_per_second: f64,

    /// Duration to send requests for, e.g. "10s" or "3m".
    #[arg(short = 'z', long = "duration", value_parser = parse_duration, default_value = "20s")]
    pub max_duration: Duration,

    /// Timeout for establishing a connection with the target.
    #[arg(short = 't', long = "dial-timeout", value_parser = parse_duration, default_value = "3s")]
    pub dial_timeout: Duration,

    /// Read responses from the target server.
    #[arg(long = "read-responses", default_value_t = false)]
    pub read_responses: bool,

    /// Size, in bytes, of each fixed-size response returned by the target.
    #[arg(long = "response-size", default_value_t = -1)]
    pub response_payload_size: i64,

    /// Deadline for read calls on the connection. Default is no deadline.
    #[arg(long = "read-deadline", value_parser = parse_duration, default_value = "0s")]
    pub read_deadline: Duration,

    /// Total number of responses to read before stopping.
    #[arg(long = "total-responses", default_value_t = 0)]
    pub total_responses_goal: u64,

    /// Total number of successful responses to read before stopping.
    #[arg(long = "successful-responses", default_value_t = 0)]
    pub successful_responses_goal: u64,

    /// Number of CPU cores to use.
    #[arg(long = "cpus", default_value_t = num_cpus::get() as i64)]
    pub cpus: i64,
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    humantime::parse_duration(raw).map_err(|e| e.to_string())
}

impl Cli {
    /// Validates the parsed arguments, mirroring the order the upstream
    /// project checks them in: URL, payload file, dial timeout, rps, max
    /// duration, the concurrency/connections relationship, response-reading
    /// option consistency, then cpus.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.target.trim().is_empty() {
            return Err(ValidationError::BlankUrl);
        }
        if self.payload_file.trim().is_empty() {
            return Err(ValidationError::BlankPayloadFilePath);
        }
        if !Path::new(&self.payload_file).is_file() {
            return Err(ValidationError::PayloadFileNotFound(
                self.payload_file.clone(),
            ));
        }
        if self.dial_timeout.is_zero() {
            return Err(ValidationError::NonPositiveDialTimeout);
        }
        if self.requests_per_second <= 0.0 {
            return Err(ValidationError::NonPositiveRequestsPerSecond);
        }
        if self.max_duration.is_zero() {
            return Err(ValidationError::NonPositiveMaxDuration);
        }
        if self.connections == 0 {
            return Err(ValidationError::NonPositiveConnections);
        }
        if self.concurrency == 0 {
            return Err(ValidationError::NonPositiveConcurrency);
        }
        if self.connections > self.concurrency {
            return Err(ValidationError::ConnectionsExceedConcurrency);
        }
        if self.concurrency % self.connections != 0 {
            return Err(ValidationError::ConcurrencyNotDivisibleByConnections);
        }
        if self.read_responses {
            if self.response_payload_size < 0 {
                return Err(ValidationError::NegativeResponsePayloadSize);
            }
            if self.total_responses_goal > 0 && self.successful_responses_goal > 0 {
                return Err(ValidationError::BothResponseGoalsSpecified);
            }
            if self.total_responses_goal == 0 && self.successful_responses_goal == 0 {
                return Err(ValidationError::NoResponseGoalSpecified);
            }
        }
        if self.cpus < 1 {
            return Err(ValidationError::NonPositiveCpus);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args(target: &str, file: &str) -> Cli {
        Cli {
            target: target.to_string(),
            concurrency: 50,
            connections: 1,
            keep_connections_alive: false,
            payload_file: file.to_string(),
            requests_per_second: 50.0,
            max_duration: Duration::from_secs(20),
            dial_timeout: Duration::from_secs(3),
            read_responses: false,
            response_payload_size: -1,
            read_deadline: Duration::from_secs(0),
            total_responses_goal: 0,
            successful_responses_goal: 0,
            cpus: 4,
        }
    }

    fn existing_file() -> String {
        let mut path = std::env::temp_dir();
        path.push(format!("blast-cli-test-{}", std::process::id()));
        std::fs::write(&path, b"payload").unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn rejects_blank_url() {
        let args = base_args("", &existing_file());
        assert_eq!(Err(ValidationError::BlankUrl), args.validate());
    }

    #[test]
    fn rejects_missing_payload_file() {
        let args = base_args("localhost:8080", "/nonexistent/blast-payload");
        assert_eq!(
            Err(ValidationError::PayloadFileNotFound(
                "/nonexistent/blast-payload".to_string()
            )),
            args.validate()
        );
    }

    #[test]
    fn rejects_connections_not_dividing_concurrency() {
        let mut args = base_args("localhost:8080", &existing_file());
        args.concurrency = 10;
        args.connections = 3;
        assert_eq!(
            Err(ValidationError::ConcurrencyNotDivisibleByConnections),
            args.validate()
        );
    }

    #[test]
    fn rejects_connections_greater_than_concurrency() {
        let mut args = base_args("localhost:8080", &existing_file());
        args.concurrency = 5;
        args.connections = 10;
        assert_eq!(
            Err(ValidationError::ConnectionsExceedConcurrency),
            args.validate()
        );
    }

    #[test]
    fn rejects_response_reading_without_a_goal() {
        let mut args = base_args("localhost:8080", &existing_file());
        args.read_responses = true;
        args.response_payload_size = 10;
        assert_eq!(
            Err(ValidationError::NoResponseGoalSpecified),
            args.validate()
        );
    }

    #[test]
    fn rejects_response_reading_with_both_goals() {
        let mut args = base_args("localhost:8080", &existing_file());
        args.read_responses = true;
        args.response_payload_size = 10;
        args.total_responses_goal = 5;
        args.successful_responses_goal = 5;
        assert_eq!(
            Err(ValidationError::BothResponseGoalsSpecified),
            args.validate()
        );
    }

    #[test]
    fn accepts_well_formed_arguments() {
        let args = base_args("localhost:8080", &existing_file());
        assert_eq!(Ok(()), args.validate());
    }

    #[test]
    fn parses_human_readable_durations() {
        assert_eq!(Duration::from_secs(10), parse_duration("10s").unwrap());
        assert_eq!(Duration::from_secs(180), parse_duration("3m").unwrap());
        assert_eq!(
            Duration::from_millis(500),
            parse_duration("500ms").unwrap()
        );
    }
}
