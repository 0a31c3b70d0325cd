use blast::cli::Cli;
use blast::{
    banner, logging, Blast, ConstantPayloadGenerator, FilePayloadProvider, GroupOptions,
    ResponseGoal, ResponseOptions,
};
use clap::{CommandFactory, Parser};
use log::info;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let args = Cli::parse();

    if let Err(e) = args.validate() {
        eprintln!("Error: {e}");
        eprintln!();
        let _ = Cli::command().print_help();
        eprintln!();
        return ExitCode::FAILURE;
    }

    logging::init();
    banner::print();
    info!("target: {}", args.target);
    info!(
        "concurrency={} connections={} rps={} duration={:?}",
        args.concurrency, args.connections, args.requests_per_second, args.max_duration
    );

    let payload = match FilePayloadProvider::new(&args.payload_file) {
        Ok(provider) => provider.get(),
        Err(e) => {
            eprintln!("Error: failed to read payload file {}: {e}", args.payload_file);
            return ExitCode::FAILURE;
        }
    };

    let group_options = GroupOptions {
        concurrency: args.concurrency as usize,
        connections: args.connections as usize,
        target_address: args.target.clone(),
        dial_timeout: args.dial_timeout,
        requests_per_second: args.requests_per_second,
        max_duration: args.max_duration,
        payload_generator: Arc::new(ConstantPayloadGenerator::new(payload)),
    };

    let blast = if args.read_responses {
        let goal = if args.total_responses_goal > 0 {
            ResponseGoal::TotalResponses(args.total_responses_goal)
        } else {
            ResponseGoal::SuccessfulResponses(args.successful_responses_goal)
        };
        let read_deadline = if args.read_deadline.is_zero() {
            None
        } else {
            Some(args.read_deadline)
        };
        let response_options = ResponseOptions {
            response_payload_size_bytes: args.response_payload_size as usize,
            read_deadline,
            goal,
        };
        Blast::with_response_reading(group_options, response_options, args.keep_connections_alive)
    } else {
        Blast::without_response_reading(group_options, args.keep_connections_alive)
    };

    let stop_handle = blast.stop_handle();
    let ctrlc_result = ctrlc::set_handler(move || {
        info!("received interrupt signal, stopping");
        stop_handle.stop();
    });
    if let Err(e) = ctrlc_result {
        info!("failed to install signal handler: {e}");
    }

    let mut out = std::io::stdout();
    blast.wait_for_completion(&mut out);

    ExitCode::SUCCESS
}
