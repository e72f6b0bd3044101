use {
    crate::traits::{ConfirmedDeployment, DeployError, Deployer},
    std::{io::Write, process::ExitCode},
};

/// Constructor argument used when `INITIAL_GREETING` is unset or empty.
pub const DEFAULT_GREETING: &str = "Hello, Hardhat!";

/// Picks the greeting the contract gets initialized with. An empty value is
/// treated the same as a missing one.
pub fn initial_greeting(configured: Option<&str>) -> &str {
    configured
        .filter(|greeting| !greeting.is_empty())
        .unwrap_or(DEFAULT_GREETING)
}

/// Deploys `contract` once and writes `<contract> deployed to <address>` to
/// `out` after the deployment got confirmed.
///
/// Errors of the individual steps are returned unmodified. Nothing is retried
/// and nothing is written to `out` unless the deployment succeeded.
pub async fn run(
    deployer: &dyn Deployer,
    contract: &str,
    greeting: &str,
    out: &mut impl Write,
) -> Result<ConfirmedDeployment, DeployError> {
    let factory = deployer.resolve_factory(contract).await?;
    tracing::debug!(contract = %factory.fully_qualified_name(), "resolved contract factory");

    let pending = deployer
        .deploy(&factory, &[greeting.to_owned()])
        .await?;
    tracing::info!(tx_hash = ?pending.tx_hash, "deployment submitted, waiting for confirmation");

    let deployed = deployer.await_confirmation(pending).await?;
    tracing::info!(
        address = ?deployed.address(),
        block = ?deployed.block_number(),
        "deployment confirmed"
    );

    writeln!(
        out,
        "{} deployed to {}",
        factory.contract_name(),
        deployed.address()
    )?;
    Ok(deployed)
}

/// Error boundary of the binary: turns the outcome into the process exit
/// code and writes the complete error chain of a failure to `stderr`.
///
/// The error detail is written directly and not only logged, so a log
/// filter can not hide it.
pub fn exit_code<T>(result: anyhow::Result<T>, stderr: &mut impl Write) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "deployment failed");
            // Nothing sensible is left to do if stderr is gone.
            let _ = writeln!(stderr, "Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            artifact::Factory,
            traits::{MockDeployer, PendingDeployment},
        },
        alloy::{
            json_abi::JsonAbi,
            primitives::{Address, B256, Bytes, address},
        },
        anyhow::anyhow,
    };

    const DEPLOYED: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
    const TX_HASH: B256 = B256::repeat_byte(0x11);

    fn factory() -> Factory {
        Factory::new(
            "MyContract",
            "contracts/MyContract.sol",
            JsonAbi::default(),
            Bytes::from_static(&[0x60, 0x80]),
        )
    }

    fn init_logging() {
        observe::tracing::initialize_reentrant("deployer=debug");
    }

    fn resolving(deployer: &mut MockDeployer) {
        deployer
            .expect_resolve_factory()
            .withf(|name| name == "MyContract")
            .times(1)
            .returning(|_| Ok(factory()));
    }

    /// Mock deployer that succeeds and expects `greeting` as the only
    /// constructor argument.
    fn successful(greeting: &'static str) -> MockDeployer {
        let mut deployer = MockDeployer::new();
        resolving(&mut deployer);
        deployer
            .expect_deploy()
            .withf(move |factory, args| {
                factory.contract_name() == "MyContract" && args == [greeting.to_string()]
            })
            .times(1)
            .returning(|_, _| Ok(PendingDeployment { tx_hash: TX_HASH }));
        deployer
            .expect_await_confirmation()
            .withf(|pending| pending.tx_hash == TX_HASH)
            .times(1)
            .returning(|pending| {
                Ok(ConfirmedDeployment::new(
                    DEPLOYED,
                    pending.tx_hash,
                    Some(1),
                ))
            });
        deployer
    }

    #[test]
    fn greeting_defaults_when_unset_or_empty() {
        assert_eq!(initial_greeting(None), "Hello, Hardhat!");
        assert_eq!(initial_greeting(Some("")), "Hello, Hardhat!");
        assert_eq!(initial_greeting(Some("gm")), "gm");
        assert_eq!(initial_greeting(Some(" ")), " ");
    }

    #[tokio::test]
    async fn reports_deployed_address() {
        init_logging();
        let deployer = successful("Hello, Hardhat!");
        let mut out = Vec::new();

        let result = run(&deployer, "MyContract", initial_greeting(None), &mut out).await;

        let deployed = result.as_ref().unwrap();
        assert_eq!(deployed.address(), DEPLOYED);
        assert_eq!(deployed.tx_hash(), TX_HASH);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "MyContract deployed to 0x5FbDB2315678afecb367f032d93F642f64180aa3\n"
        );
        let mut stderr = Vec::new();
        assert_eq!(
            exit_code(result.map_err(anyhow::Error::from), &mut stderr),
            ExitCode::SUCCESS
        );
        assert!(stderr.is_empty());
    }

    #[tokio::test]
    async fn passes_configured_greeting() {
        init_logging();
        let deployer = successful("Hola, mundo!");
        let mut out = Vec::new();

        run(&deployer, "MyContract", initial_greeting(Some("Hola, mundo!")), &mut out)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn factory_resolution_failure() {
        init_logging();
        let mut deployer = MockDeployer::new();
        deployer.expect_resolve_factory().returning(|name| {
            Err(DeployError::FactoryResolution {
                contract: name.to_owned(),
                source: anyhow!("artifact not found"),
            })
        });
        deployer.expect_deploy().never();
        deployer.expect_await_confirmation().never();
        let mut out = Vec::new();

        let result = run(&deployer, "MyContract", DEFAULT_GREETING, &mut out).await;

        assert!(matches!(result, Err(DeployError::FactoryResolution { .. })));
        assert!(out.is_empty());
        assert_eq!(
            exit_code(result.map_err(anyhow::Error::from), &mut Vec::new()),
            ExitCode::FAILURE
        );
    }

    #[tokio::test]
    async fn submission_failure() {
        init_logging();
        let mut deployer = MockDeployer::new();
        resolving(&mut deployer);
        deployer
            .expect_deploy()
            .returning(|_, _| Err(DeployError::DeploymentSubmission(anyhow!("insufficient funds"))));
        deployer.expect_await_confirmation().never();
        let mut out = Vec::new();

        let result = run(&deployer, "MyContract", DEFAULT_GREETING, &mut out).await;

        assert!(matches!(result, Err(DeployError::DeploymentSubmission(_))));
        assert!(out.is_empty());
        assert_eq!(
            exit_code(result.map_err(anyhow::Error::from), &mut Vec::new()),
            ExitCode::FAILURE
        );
    }

    #[tokio::test]
    async fn confirmation_failure() {
        init_logging();
        let mut deployer = MockDeployer::new();
        resolving(&mut deployer);
        deployer
            .expect_deploy()
            .returning(|_, _| Ok(PendingDeployment { tx_hash: TX_HASH }));
        deployer.expect_await_confirmation().returning(|pending| {
            Err(DeployError::Confirmation {
                tx_hash: pending.tx_hash,
                source: anyhow!("transaction reverted"),
            })
        });
        let mut out = Vec::new();

        let result = run(&deployer, "MyContract", DEFAULT_GREETING, &mut out).await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains(&TX_HASH.to_string()), "{err}");
        assert!(matches!(err, DeployError::Confirmation { .. }));
        assert!(out.is_empty());
        let mut stderr = Vec::new();
        assert_eq!(
            exit_code::<()>(Err(err.into()), &mut stderr),
            ExitCode::FAILURE
        );
        let stderr = String::from_utf8(stderr).unwrap();
        assert!(stderr.contains("was not confirmed"), "{stderr}");
        assert!(stderr.contains("transaction reverted"), "{stderr}");
    }

    #[tokio::test]
    async fn independent_runs_deploy_twice() {
        init_logging();
        let mut deployer = MockDeployer::new();
        deployer
            .expect_resolve_factory()
            .times(2)
            .returning(|_| Ok(factory()));
        deployer
            .expect_deploy()
            .times(2)
            .returning(|_, _| Ok(PendingDeployment { tx_hash: TX_HASH }));
        let mut nonce = 0u8;
        deployer
            .expect_await_confirmation()
            .times(2)
            .returning(move |pending| {
                nonce += 1;
                Ok(ConfirmedDeployment::new(
                    Address::repeat_byte(nonce),
                    pending.tx_hash,
                    None,
                ))
            });

        let first = run(&deployer, "MyContract", DEFAULT_GREETING, &mut Vec::new())
            .await
            .unwrap();
        let second = run(&deployer, "MyContract", DEFAULT_GREETING, &mut Vec::new())
            .await
            .unwrap();
        assert_ne!(first.address(), second.address());
    }
}
