use {deployer::arguments::Arguments, std::process::ExitCode};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Arguments::parse_or_exit(std::env::args_os()) {
        Ok(args) => args,
        Err(code) => return code,
    };
    let config = observe::Config::new(&args.log_filter, args.use_json_logs);
    observe::tracing::initialize(&config);
    tracing::info!("running deployer with validated arguments:\n{}", args);
    deployer::main(args).await
}
