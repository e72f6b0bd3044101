pub mod arguments;
pub mod artifact;
pub mod node;
pub mod runner;
pub mod traits;

use {
    arguments::Arguments,
    node::NodeDeployer,
    std::{io::Write, process::ExitCode},
    traits::{ConfirmedDeployment, DeployError, Deployer},
};

pub async fn main(args: Arguments) -> ExitCode {
    let deployer = NodeDeployer::new(node::Config {
        node_url: args.node_url.clone(),
        signer: args.private_key.clone(),
        artifacts: args.artifacts.clone(),
        confirmations: args.confirmations,
        confirmation_timeout: args.confirmation_timeout,
    });
    let result = deploy(&deployer, &args, &mut std::io::stdout()).await;
    runner::exit_code(result.map_err(anyhow::Error::from), &mut std::io::stderr())
}

/// Deploys the configured contract with the configured greeting through
/// `deployer`.
pub async fn deploy(
    deployer: &dyn Deployer,
    args: &Arguments,
    out: &mut impl Write,
) -> Result<ConfirmedDeployment, DeployError> {
    runner::run(deployer, &args.contract, args.greeting(), out).await
}
