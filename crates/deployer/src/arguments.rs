use {
    crate::runner,
    alloy::signers::local::PrivateKeySigner,
    clap::Parser,
    std::{
        ffi::OsString,
        fmt::{self, Display, Formatter},
        path::PathBuf,
        process::ExitCode,
        time::Duration,
    },
    url::Url,
};

#[derive(Parser)]
pub struct Arguments {
    /// Greeting passed to the contract constructor. Falls back to
    /// "Hello, Hardhat!" when unset or empty.
    #[clap(long, env)]
    pub initial_greeting: Option<String>,

    /// Name of the contract to deploy. Use `<source>:<contract>` if the name
    /// is not unique among the compiled sources.
    #[clap(long, env, default_value = "MyContract")]
    pub contract: String,

    /// Hardhat artifacts directory produced by compiling the contracts.
    #[clap(long, env, default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// The Ethereum node URL to connect to.
    #[clap(long, env, default_value = "http://localhost:8545")]
    pub node_url: Url,

    /// Private key of the account paying for the deployment. If omitted the
    /// first account managed by the node is used.
    #[clap(long, env)]
    pub private_key: Option<PrivateKeySigner>,

    /// Number of blocks to wait for before the deployment counts as
    /// confirmed.
    #[clap(long, env, default_value = "1")]
    pub confirmations: u64,

    /// Maximum time in seconds to wait for the deployment to be confirmed.
    /// Waits indefinitely if not set.
    #[clap(long, env, value_parser = duration_from_seconds)]
    pub confirmation_timeout: Option<Duration>,

    #[clap(long, env, default_value = "warn,deployer=info")]
    pub log_filter: String,

    /// Output log events as JSON.
    #[clap(long, env, action = clap::ArgAction::Set, default_value = "false")]
    pub use_json_logs: bool,
}

impl Arguments {
    /// Like [`Parser::try_parse_from`] but reports invalid configuration with
    /// exit code 1 instead of clap's 2. `--help` and `--version` exit with 0.
    pub fn parse_or_exit<I, T>(args: I) -> Result<Self, ExitCode>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|err| {
            let _ = err.print();
            if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        })
    }

    /// Constructor argument for the deployed contract.
    pub fn greeting(&self) -> &str {
        runner::initial_greeting(self.initial_greeting.as_deref())
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            initial_greeting,
            contract,
            artifacts,
            node_url,
            private_key,
            confirmations,
            confirmation_timeout,
            log_filter,
            use_json_logs,
        } = self;

        display_option(f, "initial_greeting", initial_greeting)?;
        writeln!(f, "contract: {contract}")?;
        writeln!(f, "artifacts: {}", artifacts.display())?;
        writeln!(f, "node_url: {node_url}")?;
        display_secret_option(f, "private_key", private_key)?;
        writeln!(f, "confirmations: {confirmations}")?;
        display_option(
            f,
            "confirmation_timeout",
            &confirmation_timeout.map(|timeout| format!("{timeout:?}")),
        )?;
        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "use_json_logs: {use_json_logs}")?;
        Ok(())
    }
}

pub fn duration_from_seconds(s: &str) -> anyhow::Result<Duration> {
    Ok(Duration::try_from_secs_f64(s.parse()?)?)
}

pub fn display_secret_option<T>(
    f: &mut Formatter<'_>,
    name: &str,
    option: &Option<T>,
) -> fmt::Result {
    display_option(f, name, &option.as_ref().map(|_| "SECRET"))
}

pub fn display_option(
    f: &mut Formatter<'_>,
    name: &str,
    option: &Option<impl Display>,
) -> fmt::Result {
    write!(f, "{name}: ")?;
    match option {
        Some(display) => writeln!(f, "{display}"),
        None => writeln!(f, "None"),
    }
}
